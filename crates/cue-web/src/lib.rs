pub mod runner;

pub use runner::TableRunner;

use std::cell::RefCell;

use cue_engine::{Shot, TableConfig};
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<TableRunner>> = const { RefCell::new(None) };
}

/// Run `f` against the live runner, or return `fallback` if `table_init` has not been called.
fn with_runner<R>(fallback: R, f: impl FnOnce(&mut TableRunner) -> R) -> R {
    RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(runner) => f(runner),
        None => {
            web_sys::console::warn_1(&JsValue::from_str("cue-web: table not initialized, call table_init() first"));
            fallback
        }
    })
}

/// Build the table from a JSON `TableConfig` (empty string for defaults).
/// Returns `false` and keeps any previous table if the config is rejected.
#[wasm_bindgen]
pub fn table_init(config_json: &str) -> bool {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = if config_json.trim().is_empty() {
        TableConfig::default()
    } else {
        match TableConfig::from_json(config_json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("cue-web: rejected table config: {}", e);
                return false;
            }
        }
    };

    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(TableRunner::new(config));
    });
    log::info!("cue-web: initialized");
    true
}

/// Returns the new ball's index, or -1 if the table is full.
#[wasm_bindgen]
pub fn table_add_ball(x: f32, z: f32) -> i32 {
    with_runner(-1, |r| r.add_ball(x, z).map_or(-1, |id| id as i32))
}

#[wasm_bindgen]
pub fn table_respot(index: u32, x: f32, z: f32) -> bool {
    with_runner(false, |r| r.respot(index, x, z))
}

#[wasm_bindgen]
pub fn table_shoot(index: u32, power: f32, angle: f32, spin_x: f32, spin_y: f32) -> bool {
    let shot = Shot::new(power, angle).with_spin(spin_x, spin_y);
    with_runner(false, |r| r.shoot(index, shot))
}

/// Advance one frame. Returns the number of physics substeps run.
#[wasm_bindgen]
pub fn table_tick(dt: f32) -> u32 {
    with_runner(0, |r| r.tick(dt))
}

#[wasm_bindgen]
pub fn table_all_stationary() -> bool {
    with_runner(true, |r| r.all_stationary())
}

#[wasm_bindgen]
pub fn table_describe_spin(index: u32) -> String {
    with_runner(String::new(), |r| r.describe_spin(index))
}

/// Write an aim line into the shared buffer. Returns the point count.
#[wasm_bindgen]
pub fn table_predict(index: u32, duration: f32) -> u32 {
    with_runner(0, |r| r.predict(index, duration))
}

/// An aim line as a standalone `Float32Array` of `(x, z, phase)` triples.
#[wasm_bindgen]
pub fn table_trajectory(index: u32, duration: f32) -> js_sys::Float32Array {
    let points = with_runner(Vec::new(), |r| r.trajectory_points(index, duration));
    js_sys::Float32Array::from(points.as_slice())
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_buffer_ptr() -> *const f32 {
    with_runner(std::ptr::null(), |r| r.buffer_ptr())
}

#[wasm_bindgen]
pub fn get_balls_ptr() -> *const f32 {
    with_runner(std::ptr::null(), |r| r.balls_ptr())
}

#[wasm_bindgen]
pub fn get_ball_count() -> u32 {
    with_runner(0, |r| r.ball_count())
}

#[wasm_bindgen]
pub fn get_events_ptr() -> *const f32 {
    with_runner(std::ptr::null(), |r| r.events_ptr())
}

#[wasm_bindgen]
pub fn get_event_count() -> u32 {
    with_runner(0, |r| r.event_count())
}

#[wasm_bindgen]
pub fn get_trajectory_ptr() -> *const f32 {
    with_runner(std::ptr::null(), |r| r.trajectory_ptr())
}

#[wasm_bindgen]
pub fn get_table_width() -> f32 {
    with_runner(0.0, |r| r.table_width())
}

#[wasm_bindgen]
pub fn get_table_length() -> f32 {
    with_runner(0.0, |r| r.table_length())
}

// ---- Capacity accessors ----

#[wasm_bindgen]
pub fn get_max_balls() -> u32 {
    with_runner(0, |r| r.max_balls())
}

#[wasm_bindgen]
pub fn get_max_events() -> u32 {
    with_runner(0, |r| r.max_events())
}

#[wasm_bindgen]
pub fn get_max_trajectory_points() -> u32 {
    with_runner(0, |r| r.max_trajectory_points())
}

#[wasm_bindgen]
pub fn get_buffer_total_floats() -> u32 {
    with_runner(0, |r| r.buffer_total_floats())
}
