// Error types for the authentication bridge

use shibcas_cas::TicketValidationError;
use shibcas_config::ConfigError;
use thiserror::Error;

/// Failures reported by the external authentication host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No suspended authentication request matches the inbound request.
    #[error("No conversation state: {0}")]
    NoConversation(String),

    #[error("Conversation expired: {0}")]
    Expired(String),

    #[error("Host failure: {0}")]
    Failed(String),
}

impl HostError {
    /// The suspended request is gone and cannot be resumed.
    pub fn is_conversation_lost(&self) -> bool {
        matches!(self, Self::NoConversation(_) | Self::Expired(_))
    }
}

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Assertion carries no principal name")]
    MissingPrincipal,

    /// The assertion must not be accepted at all.
    #[error("Assertion rejected: {0}")]
    AssertionRejected(String),

    #[error("Translation failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Cannot build service URL: {0}")]
    InvalidServiceUrl(String),

    #[error("Unknown {kind} '{key}'")]
    UnknownComponent { kind: &'static str, key: String },

    #[error("Bridge is not fully configured: {0}")]
    Incomplete(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ticket validator error: {0}")]
    Validator(#[from] TicketValidationError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
