// Authentication outcome handed back to the host

use std::collections::HashMap;
use std::fmt;

/// Password-protected transport authentication context class.
pub const PASSWORD_PROTECTED_TRANSPORT: &str =
    "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";

/// Machine-readable reason an authentication did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthnErrorCode {
    /// CAS rejected the ticket, or it could not be validated
    InvalidTicket,
    /// Gateway attempt came back without a ticket
    NoPassiveCredentials,
    InternalError,
}

impl AuthnErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTicket => "invalid-ticket",
            Self::NoPassiveCredentials => "no-passive-credentials",
            Self::InternalError => "internal-error",
        }
    }
}

impl fmt::Display for AuthnErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replacement for the requested authentication context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedPrincipalOverride {
    pub class_ref: String,
    pub operator: &'static str,
}

impl RequestedPrincipalOverride {
    /// Require exactly this class reference.
    pub fn exact(class_ref: impl Into<String>) -> Self {
        Self {
            class_ref: class_ref.into(),
            operator: "exact",
        }
    }
}

/// Identity and error data for `finish_conversation`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationOutcome {
    pub principal_name: Option<String>,
    pub attributes: HashMap<String, Vec<String>>,
    pub requested_principal: Option<RequestedPrincipalOverride>,
    pub error: Option<AuthnErrorCode>,
}

impl AuthenticationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure(code: AuthnErrorCode) -> Self {
        Self {
            error: Some(code),
            ..Self::default()
        }
    }

    /// Mark the outcome failed and drop any identity gathered so far.
    pub fn fail(&mut self, code: AuthnErrorCode) {
        *self = Self::failure(code);
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.principal_name.is_some()
    }

    pub fn add_attribute<I, S>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }
}
