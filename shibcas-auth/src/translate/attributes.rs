use super::Translator;
use crate::{AuthenticationOutcome, Conversation, TranslationError};
use shibcas_cas::Assertion;
use tracing::debug;

/// Releases every CAS attribute to the IdP.
#[derive(Debug, Clone, Copy, Default)]
pub struct CasAttributeTranslator;

impl CasAttributeTranslator {
    pub const KIND: &'static str = "cas-attributes";
}

impl Translator for CasAttributeTranslator {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn translate(
        &self,
        _conversation: &Conversation,
        assertion: &Assertion,
        outcome: &mut AuthenticationOutcome,
    ) -> Result<(), TranslationError> {
        for (name, values) in assertion.attributes() {
            outcome.add_attribute(name.clone(), values.iter().cloned());
        }

        debug!(count = assertion.attributes().len(), "Released CAS attributes");
        Ok(())
    }
}
