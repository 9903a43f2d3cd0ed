use std::fmt;

/// Participant judgment for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Bigger,
    Smaller,
}

impl Response {
    pub fn label(&self) -> &'static str {
        match self {
            Response::Bigger => "Bigger",
            Response::Smaller => "Smaller",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signed size change of the presented map relative to the reference, in percent.
///
/// The label follows the actual change, not the participant's answer. A change of
/// exactly zero is labelled `Smaller`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentDifference {
    value: f64,
}

impl PercentDifference {
    /// `(presented - reference) / reference * 100`, rounded to two decimals.
    pub fn between(reference_px: u32, presented_px: u32) -> Self {
        let raw = (presented_px as f64 - reference_px as f64) / reference_px as f64 * 100.0;
        Self {
            value: (raw * 100.0).round() / 100.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn direction(&self) -> Response {
        if self.value > 0.0 {
            Response::Bigger
        } else {
            Response::Smaller
        }
    }
}

impl fmt::Display for PercentDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction() {
            Response::Bigger => write!(f, "Bigger (+{:.2}%)", self.value),
            Response::Smaller => write!(f, "Smaller ({:.2}%)", self.value),
        }
    }
}

/// Recorded result per completed trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    /// 1-based, in completion order.
    pub trial_index: usize,
    pub response: Response,
    pub reaction_time_s: f64,
    pub presented_size_px: u32,
    pub percent_difference: PercentDifference,
}
