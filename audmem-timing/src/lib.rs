pub mod frame;
pub mod timer;

pub use frame::{CalibrationStats, FrameClock};
pub use timer::{ns_to_secs, secs_to_ns, HighPrecisionTimer, ManualTimer, Timer};
