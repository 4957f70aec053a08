use thiserror::Error;

/// Errors raised while turning dealer and campaign configuration into a runnable marketplace.
/// A dealer that fails validation never enters the roster.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("dealer '{dealer}' is missing required field '{field}'")]
    MissingField { dealer: String, field: &'static str },

    #[error("dealer '{dealer}' is missing quality attribute '{attribute}' and has no quality_score override")]
    MissingAttribute { dealer: String, attribute: &'static str },

    #[error("dealer '{dealer}' has non-positive {field}: {value}")]
    NonPositive { dealer: String, field: &'static str, value: f64 },

    #[error("dealer '{dealer}' has quality_score {value} outside [0, 10]")]
    InvalidQualityScore { dealer: String, value: f64 },

    #[error("a dealer named '{0}' is already registered")]
    DuplicateName(String),

    #[error("searches per day must be a finite non-negative number, got {0}")]
    InvalidSearchVolume(f64),

    #[error("search space has no {0}")]
    EmptySearchSpace(&'static str),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigurationError {
    /// Name of the dealer the error refers to, if any
    pub fn dealer_name(&self) -> Option<&str> {
        match self {
            Self::MissingField { dealer, .. }
            | Self::MissingAttribute { dealer, .. }
            | Self::NonPositive { dealer, .. }
            | Self::InvalidQualityScore { dealer, .. } => Some(dealer),
            Self::DuplicateName(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_dealer() {
        let err = ConfigurationError::MissingField { dealer: "Keenan Motors".to_string(), field: "max_bid" };
        assert_eq!(err.to_string(), "dealer 'Keenan Motors' is missing required field 'max_bid'");
        assert_eq!(err.dealer_name(), Some("Keenan Motors"));

        let err = ConfigurationError::InvalidSearchVolume(-1.0);
        assert_eq!(err.dealer_name(), None);
    }
}
