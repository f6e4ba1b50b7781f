/// Fixed-substep accumulator.
/// Physics runs at a constant rate regardless of frame time, so a replay with
/// the same frame deltas produces the same table.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// The fixed delta time per substep.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
    /// Upper bound on substeps run for a single frame.
    max_steps: u32,
}

impl FixedTimestep {
    pub const DEFAULT_MAX_STEPS: u32 = 10;

    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        if !(frame_dt.is_finite() && frame_dt > 0.0) {
            return 0;
        }
        self.accumulator += frame_dt;
        // Cap to prevent spiral of death; the excess is dropped
        self.accumulator = self.accumulator.min(self.dt * self.max_steps as f32);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Fraction of a substep left over (0.0 to 1.0), for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Forget any partial substep. The table calls this when a shot starts from rest.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBSTEP: f32 = 1.0 / 240.0;

    #[test]
    fn one_frame_is_four_substeps() {
        let mut ts = FixedTimestep::new(SUBSTEP);
        let steps = ts.accumulate(1.0 / 60.0);
        assert!(steps == 4 || steps == 3, "steps = {steps}");
        let total = steps + ts.accumulate(1.0 / 60.0);
        assert!(total == 8 || total == 7, "total = {total}");
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(SUBSTEP);
        let steps = ts.accumulate(0.002); // half a substep
        assert_eq!(steps, 0);
        let steps = ts.accumulate(0.003); // over one substep total
        assert_eq!(steps, 1);
    }

    #[test]
    fn caps_at_max_steps() {
        let mut ts = FixedTimestep::new(SUBSTEP);
        assert_eq!(ts.accumulate(1.0), 10);

        let mut ts = FixedTimestep::new(SUBSTEP).with_max_steps(16);
        assert_eq!(ts.accumulate(1.0), 16);
        assert_eq!(ts.max_steps(), 16);
    }

    #[test]
    fn ignores_bad_frame_times() {
        let mut ts = FixedTimestep::new(SUBSTEP);
        assert_eq!(ts.accumulate(-1.0), 0);
        assert_eq!(ts.accumulate(f32::NAN), 0);
        assert_eq!(ts.alpha(), 0.0);
    }

    #[test]
    fn alpha_is_between_zero_and_one() {
        let mut ts = FixedTimestep::new(SUBSTEP);
        ts.accumulate(0.002);
        let a = ts.alpha();
        assert!((0.0..=1.0).contains(&a), "alpha was {}", a);
        ts.reset();
        assert_eq!(ts.alpha(), 0.0);
    }
}
