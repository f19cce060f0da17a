//! Domain error types.

/// Top-level error type for sweeptrader.
#[derive(Debug, thiserror::Error)]
pub enum SweeptraderError {
    #[error("data format error: {reason}")]
    DataFormat { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("parameter range for {parameter} is empty")]
    EmptyRange { parameter: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SweeptraderError {
    pub fn data_format(reason: impl Into<String>) -> Self {
        SweeptraderError::DataFormat {
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        SweeptraderError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SweeptraderError> for std::process::ExitCode {
    fn from(err: &SweeptraderError) -> Self {
        let code: u8 = match err {
            SweeptraderError::Io(_) => 1,
            SweeptraderError::ConfigParse { .. }
            | SweeptraderError::ConfigMissing { .. }
            | SweeptraderError::ConfigInvalid { .. } => 2,
            SweeptraderError::DataFormat { .. } => 3,
            SweeptraderError::EmptyRange { .. } | SweeptraderError::InvalidParameter { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
