pub mod phase;
pub mod screen;
pub mod trial;

pub use phase::{DisplayState, Phase};
pub use screen::Screen;
pub use trial::{PercentDifference, Response, TrialRecord};
