pub mod sweep;

pub use sweep::{SweepService, SweepStats};
