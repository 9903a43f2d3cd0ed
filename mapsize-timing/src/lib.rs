pub mod manual;
pub mod oneshot;
pub mod timer;

pub use manual::ManualTimer;
pub use oneshot::OneShot;
pub use timer::{FrameStats, HighPrecisionTimer, Timer};
