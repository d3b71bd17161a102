// Error types for ticket validation

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TicketValidationError {
    #[error("Ticket rejected by CAS ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("Ticket validation timed out after {0:?}")]
    Timeout(Duration),

    #[error("CAS server answered with HTTP status {0}")]
    Status(u16),

    #[error("Malformed CAS response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid validation URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TicketValidationError {
    /// The CAS server looked at the ticket and said no.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// CAS failure code, when the server sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TicketValidationError>;
