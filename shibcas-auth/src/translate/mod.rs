// CAS assertion to IdP identity translators

mod attributes;
mod duo;
mod name;

pub use attributes::CasAttributeTranslator;
pub use duo::{AUTHN_CONTEXT_CLASS_ATTRIBUTE, DUO_METHOD, DuoAuthnMethodRequiredTranslator, DuoRefedsAuthnMethodTranslator};
pub use name::AuthenticatedNameTranslator;

use crate::{AuthenticationOutcome, AuthnErrorCode, Conversation, TranslationError};
use shibcas_cas::Assertion;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Moves data from a validated assertion into the outcome.
pub trait Translator: Send + Sync {
    /// Stable tag; two translators with the same kind are interchangeable.
    fn kind(&self) -> &'static str;

    fn translate(
        &self,
        conversation: &Conversation,
        assertion: &Assertion,
        outcome: &mut AuthenticationOutcome,
    ) -> Result<(), TranslationError>;
}

/// Ordered, kind-deduplicated translators.
#[derive(Clone, Default)]
pub struct TranslatorChain {
    translators: Vec<Arc<dyn Translator>>,
}

impl TranslatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a translator unless one of the same kind is already registered.
    pub fn push(&mut self, translator: Arc<dyn Translator>) -> bool {
        if self.contains(translator.kind()) {
            debug!(kind = translator.kind(), "Translator already registered");
            return false;
        }
        self.translators.push(translator);
        true
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.translators.iter().any(|t| t.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.translators.iter().map(|t| t.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// Run every translator over the assertion.
    ///
    /// A failing translator does not stop the others. If any of them rejected
    /// the assertion outright, the outcome becomes `invalid-ticket` once all
    /// have run.
    pub fn apply(&self, conversation: &Conversation, assertion: &Assertion) -> AuthenticationOutcome {
        let mut outcome = AuthenticationOutcome::new();
        let mut rejected = false;

        for translator in &self.translators {
            match translator.translate(conversation, assertion, &mut outcome) {
                Ok(()) => {}
                Err(TranslationError::AssertionRejected(reason)) => {
                    error!(
                        translator = translator.kind(),
                        conversation = %conversation.key,
                        %reason,
                        "Assertion rejected by translator"
                    );
                    rejected = true;
                }
                Err(e) => {
                    warn!(
                        translator = translator.kind(),
                        conversation = %conversation.key,
                        error = %e,
                        "Translator failed, identity may be incomplete"
                    );
                }
            }
        }

        if rejected {
            outcome.fail(AuthnErrorCode::InvalidTicket);
        }
        outcome
    }
}

impl std::fmt::Debug for TranslatorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
