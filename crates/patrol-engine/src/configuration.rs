use patrol_core::ThresholdKind;

use crate::error::{Error, Result};

/// A probe's naming and failure-tolerance policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Configuration {
    Flat { name: String, threshold: u64 },
    Percentage { name: String, threshold: f64 },
}

impl Configuration {
    pub fn flat(name: impl Into<String>, threshold: u64) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Configuration("probe name must not be empty".into()));
        }
        Ok(Self::Flat { name, threshold })
    }

    pub fn percentage(name: impl Into<String>, threshold: f64) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Configuration("probe name must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Configuration(format!(
                "percentage threshold out of range [0,1]: {threshold}"
            )));
        }
        Ok(Self::Percentage { name, threshold })
    }

    /// Builds a configuration from a pre-parsed threshold kind, as produced by
    /// `patrol_core::parse_threshold`.
    pub fn from_threshold(name: impl Into<String>, threshold: ThresholdKind) -> Result<Self> {
        match threshold {
            ThresholdKind::Flat(value) => Self::flat(name, value),
            ThresholdKind::Percentage(value) => Self::percentage(name, value),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Flat { name, .. } => name,
            Self::Percentage { name, .. } => name,
        }
    }

    /// Whether a run with the given counters satisfies this configuration's
    /// failure tolerance.
    pub fn valid_run(&self, successful: u64, failed: u64) -> bool {
        match self {
            Self::Flat { threshold, .. } => failed <= *threshold,
            Self::Percentage { threshold, .. } => {
                let total = successful + failed;
                if total == 0 {
                    true
                } else {
                    (failed as f64 / total as f64) <= *threshold
                }
            }
        }
    }
}
