use super::ParameterBuilder;
use crate::Conversation;
use tracing::debug;

/// CAS-side multi-factor provider that satisfies REFEDS MFA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthnMethodTarget {
    DuoSecurity,
    GoogleAuthenticator,
}

impl AuthnMethodTarget {
    pub fn cas_method(&self) -> &'static str {
        match self {
            Self::DuoSecurity => "mfa-duo",
            Self::GoogleAuthenticator => "mfa-gauth",
        }
    }
}

/// Asks CAS for a specific `authn_method` when REFEDS MFA was requested.
///
/// Every target shares one kind, so a chain carries at most one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasAuthnMethodParameterBuilder {
    target: AuthnMethodTarget,
}

impl CasAuthnMethodParameterBuilder {
    pub const KIND: &'static str = "cas-authn-method";

    pub fn new(target: AuthnMethodTarget) -> Self {
        Self { target }
    }

    pub fn duo() -> Self {
        Self::new(AuthnMethodTarget::DuoSecurity)
    }

    pub fn gauth() -> Self {
        Self::new(AuthnMethodTarget::GoogleAuthenticator)
    }

    pub fn target(&self) -> AuthnMethodTarget {
        self.target
    }
}

impl ParameterBuilder for CasAuthnMethodParameterBuilder {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn build(&self, conversation: &Conversation) -> String {
        if !conversation.requests_refeds_mfa() {
            return String::new();
        }

        let method = self.target.cas_method();
        debug!(method, "Requesting CAS authentication method for REFEDS MFA");
        format!("&authn_method={}", method)
    }
}
