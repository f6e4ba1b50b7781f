pub mod ball;
pub mod config;
pub mod rails;
pub mod table;
pub mod time;
