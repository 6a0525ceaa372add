/// An immutable view of a probe's accumulated outcome, taken at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultSnapshot {
    pub successful: u64,
    pub failed: u64,
    pub total: u64,
    pub valid: bool,
}

impl ResultSnapshot {
    pub fn new(successful: u64, failed: u64, valid: bool) -> Self {
        Self {
            successful,
            failed,
            total: successful + failed,
            valid,
        }
    }
}
