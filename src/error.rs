use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the collision-geometry core.
///
/// Every failure is fatal for the run that raised it: an invalid configuration
/// is rejected before any event is generated, and an exhausted placement
/// budget aborts event generation rather than skipping nucleons.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value (binning, radius range, density family
    /// parameters, nucleon counts, impact-parameter range).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Hard-core exclusion resampling exhausted its retry budget while
    /// placing a nucleon. Signals an infeasible configuration: the exclusion
    /// radius is too large for the nucleus volume or profile granularity.
    #[error("nucleon {nucleon} rejected {attempts} consecutive times; exclusion radius is infeasible for this profile")]
    SamplingExhausted { nucleon: usize, attempts: u32 },

    /// Propagated I/O errors (host drivers exporting statistics).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidConfig("maxRadius must exceed minRadius".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("maxRadius"));
    }

    #[test]
    fn sampling_exhausted_names_the_nucleon() {
        let e = Error::SamplingExhausted {
            nucleon: 17,
            attempts: 200,
        };
        let msg = format!("{e}");
        assert!(msg.contains("17"));
        assert!(msg.contains("200"));
    }
}
