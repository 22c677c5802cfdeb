// Public API - what other modules can use
pub use clock::{Clock, FixedClock, SystemClock};
pub use handlers::{get_meeting, schedule_meeting};

// Internal modules
pub mod clock;
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
