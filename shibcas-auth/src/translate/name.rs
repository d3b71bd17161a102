use super::Translator;
use crate::{AuthenticationOutcome, Conversation, TranslationError};
use shibcas_cas::Assertion;
use tracing::debug;

/// Passes the CAS principal name through as the authenticated principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedNameTranslator;

impl AuthenticatedNameTranslator {
    pub const KIND: &'static str = "authenticated-name";
}

impl Translator for AuthenticatedNameTranslator {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn translate(
        &self,
        _conversation: &Conversation,
        assertion: &Assertion,
        outcome: &mut AuthenticationOutcome,
    ) -> Result<(), TranslationError> {
        let name = assertion.principal_name();
        if name.is_empty() {
            return Err(TranslationError::MissingPrincipal);
        }

        debug!(principal = name, "Passing principal name to the IdP");
        outcome.principal_name = Some(name.to_string());
        Ok(())
    }
}
