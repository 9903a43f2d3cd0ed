/// The trial currently on screen.
#[derive(Debug, Clone)]
pub struct Trial<T> {
    /// 1-based.
    pub index: usize,
    /// Equals the reference size until randomized after the flash.
    pub presented_size_px: u32,
    pub timestamps: TrialTimestamps<T>,
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps<T> {
    pub flash_start: T,
    pub reference_start: Option<T>,
    /// Reaction-time zero point.
    pub altered_start: Option<T>,
}

impl<T: Copy> Trial<T> {
    pub fn new(index: usize, reference_size_px: u32, flash_start: T) -> Self {
        Self {
            index,
            presented_size_px: reference_size_px,
            timestamps: TrialTimestamps {
                flash_start,
                reference_start: None,
                altered_start: None,
            },
        }
    }
}
