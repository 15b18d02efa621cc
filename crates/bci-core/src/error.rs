//! Error handling for the EEG bridge
//!
//! One error type for every crate in the workspace. Variants are grouped by
//! how the cycle driver reacts to them: connection failures are retried on the
//! next cycle, everything else abandons the current cycle.

use std::fmt;

/// Result type alias for bridge operations
pub type BciResult<T> = Result<T, BciError>;

/// Error type for all bridge operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BciError {
    /// Acquisition device could not be opened, started or polled
    DeviceError {
        /// Device-related error description
        reason: String,
    },

    /// Outbound message sink could not be created
    SinkError {
        /// Sink-related error description
        reason: String,
    },

    /// Sample data has an unexpected shape or content
    InvalidSignalData {
        /// Description of the data issue
        reason: String,
    },

    /// A channel selection token could not be parsed
    InvalidChannelSelection {
        /// Offending token
        token: String,
    },

    /// Configuration value rejected
    ConfigurationError {
        /// Description of the configuration error
        message: String,
    },

    /// Failure inside a processing stage
    ProcessingError {
        /// Description of the processing failure
        message: String,
    },

    /// Channel count changed between cycles
    ChannelCountMismatch {
        /// Channel count the persistent state was sized for
        expected: usize,
        /// Channel count delivered this cycle
        actual: usize,
    },
}

impl BciError {
    /// Device or sink initialisation problems, retried on the next cycle
    pub fn is_connection_error(&self) -> bool {
        matches!(self, BciError::DeviceError { .. } | BciError::SinkError { .. })
    }

    pub fn device(reason: impl Into<String>) -> Self {
        BciError::DeviceError { reason: reason.into() }
    }

    pub fn sink(reason: impl Into<String>) -> Self {
        BciError::SinkError { reason: reason.into() }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        BciError::ProcessingError { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        BciError::ConfigurationError { message: message.into() }
    }
}

impl fmt::Display for BciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BciError::DeviceError { reason } => {
                write!(f, "Device error: {}", reason)
            }
            BciError::SinkError { reason } => {
                write!(f, "Sink error: {}", reason)
            }
            BciError::InvalidSignalData { reason } => {
                write!(f, "Invalid signal data: {}", reason)
            }
            BciError::InvalidChannelSelection { token } => {
                write!(f, "Invalid channel selection token '{}'", token)
            }
            BciError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BciError::ProcessingError { message } => {
                write!(f, "Processing error: {}", message)
            }
            BciError::ChannelCountMismatch { expected, actual } => {
                write!(f, "Channel count mismatch: state sized for {}, got {}",
                       expected, actual)
            }
        }
    }
}

impl std::error::Error for BciError {}
