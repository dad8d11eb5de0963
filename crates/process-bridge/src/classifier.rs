//! Parameter roles by naming convention.
//!
//! Indicator parameters are classified by name only. The vocabulary is
//! closed: anything outside it is [`ParameterRole::Unrecognized`] and is not
//! published as a process input.

/// Short names of gridded physical variables accepted as file inputs.
pub const GRIDDED_VARIABLES: [&str; 5] = ["tas", "tasmin", "tasmax", "pr", "prsn"];

/// Dataset-derived inputs such as percentile climatologies.
pub const AUXILIARY_VARIABLES: [&str; 4] = ["tn10", "tn90", "t10", "t90"];

/// Semantic role of an indicator parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterRole {
    GriddedVariable,
    Auxiliary,
    Threshold,
    Frequency,
    Window,
    Unrecognized,
}

impl ParameterRole {
    /// Whether the parameter is bound to file references.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::GriddedVariable | Self::Auxiliary)
    }
}

/// Classify a parameter name.
pub fn classify(name: &str) -> ParameterRole {
    if GRIDDED_VARIABLES.contains(&name) {
        ParameterRole::GriddedVariable
    } else if AUXILIARY_VARIABLES.contains(&name) {
        ParameterRole::Auxiliary
    } else if name == "thresh" || name.starts_with("thresh_") {
        ParameterRole::Threshold
    } else if name == "freq" {
        ParameterRole::Frequency
    } else if name == "window" {
        ParameterRole::Window
    } else {
        ParameterRole::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_vocabulary() {
        for name in GRIDDED_VARIABLES {
            assert_eq!(classify(name), ParameterRole::GriddedVariable);
        }
        assert_eq!(classify("tn10"), ParameterRole::Auxiliary);
        assert_eq!(classify("thresh"), ParameterRole::Threshold);
        assert_eq!(classify("thresh_tasmin"), ParameterRole::Threshold);
        assert_eq!(classify("freq"), ParameterRole::Frequency);
        assert_eq!(classify("window"), ParameterRole::Window);
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(classify("threshold"), ParameterRole::Unrecognized);
        assert_eq!(classify("TAS"), ParameterRole::Unrecognized);
        assert_eq!(classify(""), ParameterRole::Unrecognized);
        assert_eq!(classify("phase"), ParameterRole::Unrecognized);
    }

    #[test]
    fn test_file_roles() {
        assert!(classify("pr").is_file());
        assert!(classify("t90").is_file());
        assert!(!classify("window").is_file());
    }
}
