use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProvisioningError>;
pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;

/// The three failure kinds a caller can observe, plus the pipeline-only WBXML failure.
///
/// A call either returns a complete, internally consistent result, or exactly one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("out of memory")]
    OutOfMemory,

    #[error("corrupt input: {reason}")]
    Corrupt { reason: String },

    #[error("authentication denied: {reason}")]
    Denied { reason: &'static str },

    #[error("failed to decode WBXML body: {message}")]
    Wbxml { message: String },
}

impl ProvisioningError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        ProvisioningError::Corrupt {
            reason: reason.into(),
        }
    }

    pub(crate) fn denied(reason: &'static str) -> Self {
        ProvisioningError::Denied { reason }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, ProvisioningError::Corrupt { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, ProvisioningError::Denied { .. })
    }
}

/// Low level byte reading errors, raised by the push envelope reader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeserializationError {
    #[error("buffer too small for {what} at offset {offset} (need {need} bytes, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("{what} at offset {offset} is longer than {max} bytes")]
    UintvarTooLong {
        what: &'static str,
        offset: u64,
        max: usize,
    },

    #[error("{what} at offset {offset} is not terminated")]
    Unterminated { what: &'static str, offset: u64 },

    #[error("{what} at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { what: &'static str, offset: u64 },

    #[error("expected {what} `{expected:#04x}` at offset {offset}, found `{found:#04x}`")]
    UnexpectedByte {
        what: &'static str,
        offset: u64,
        expected: u8,
        found: u8,
    },
}

impl From<DeserializationError> for ProvisioningError {
    fn from(err: DeserializationError) -> Self {
        ProvisioningError::Corrupt {
            reason: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for ProvisioningError {
    fn from(err: quick_xml::Error) -> Self {
        ProvisioningError::Corrupt {
            reason: format!("malformed markup: {}", err),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for ProvisioningError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ProvisioningError::Corrupt {
            reason: format!("malformed attribute: {}", err),
        }
    }
}
