// Duo Security multi-factor translators

use super::Translator;
use crate::conversation::REFEDS_MFA;
use crate::outcome::{PASSWORD_PROTECTED_TRANSPORT, RequestedPrincipalOverride};
use crate::{AuthenticationOutcome, Conversation, TranslationError};
use shibcas_cas::Assertion;
use tracing::{debug, info};

/// Attribute CAS uses to report the satisfied authentication context.
pub const AUTHN_CONTEXT_CLASS_ATTRIBUTE: &str = "authnContextClass";

/// CAS authentication context value for Duo Security.
pub const DUO_METHOD: &str = "mfa-duo";

fn asserted_context(assertion: &Assertion) -> Option<&[String]> {
    assertion
        .attribute(AUTHN_CONTEXT_CLASS_ATTRIBUTE)
        .filter(|values| !values.is_empty())
}

/// Re-derives the requested authentication context from what CAS asserted.
///
/// When REFEDS MFA was requested and CAS reports `mfa-duo`, the request is
/// narrowed to REFEDS MFA. Otherwise the first asserted class replaces the
/// request as-is, since an override names exactly one class. Without a REFEDS request or an asserted class the request falls
/// back to password-protected transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuoRefedsAuthnMethodTranslator;

impl DuoRefedsAuthnMethodTranslator {
    pub const KIND: &'static str = "duo-refeds-authn-method";

    fn select(conversation: &Conversation, assertion: &Assertion) -> String {
        if conversation.requested_authn_contexts.is_empty() {
            debug!("No requested authentication context");
            return PASSWORD_PROTECTED_TRANSPORT.to_string();
        }

        if !conversation.requests_refeds_mfa() {
            debug!("REFEDS MFA was not requested");
            return PASSWORD_PROTECTED_TRANSPORT.to_string();
        }

        let Some(asserted) = asserted_context(assertion) else {
            debug!("CAS asserted no authentication context class");
            return PASSWORD_PROTECTED_TRANSPORT.to_string();
        };

        if asserted.iter().any(|c| c == DUO_METHOD) {
            info!("CAS asserted {}, satisfying {}", DUO_METHOD, REFEDS_MFA);
            REFEDS_MFA.to_string()
        } else {
            debug!(
                asserted = %asserted.join(","),
                "Asserted context class is not Duo Security, using the first"
            );
            asserted[0].clone()
        }
    }
}

impl Translator for DuoRefedsAuthnMethodTranslator {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn translate(
        &self,
        conversation: &Conversation,
        assertion: &Assertion,
        outcome: &mut AuthenticationOutcome,
    ) -> Result<(), TranslationError> {
        let class_ref = Self::select(conversation, assertion);
        info!(class_ref = %class_ref, "Overriding requested authentication context class");
        outcome.requested_principal = Some(RequestedPrincipalOverride::exact(class_ref));
        Ok(())
    }
}

/// Rejects the assertion unless CAS confirms Duo Security when the IdP
/// asked for a specific authentication method.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuoAuthnMethodRequiredTranslator;

impl DuoAuthnMethodRequiredTranslator {
    pub const KIND: &'static str = "duo-authn-method-required";
}

impl Translator for DuoAuthnMethodRequiredTranslator {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn translate(
        &self,
        conversation: &Conversation,
        assertion: &Assertion,
        _outcome: &mut AuthenticationOutcome,
    ) -> Result<(), TranslationError> {
        let Some(method) = &conversation.authn_method else {
            debug!("No authentication method requested");
            return Ok(());
        };

        match asserted_context(assertion) {
            Some(asserted) if asserted.iter().any(|c| c == DUO_METHOD) => {
                info!(method = %method, "CAS asserted {}", DUO_METHOD);
                Ok(())
            }
            Some(asserted) => Err(TranslationError::AssertionRejected(format!(
                "authentication method '{}' requested but CAS asserted '{}'",
                method,
                asserted.join(",")
            ))),
            None => Err(TranslationError::AssertionRejected(format!(
                "authentication method '{}' requested but CAS asserted no {}",
                method, AUTHN_CONTEXT_CLASS_ATTRIBUTE
            ))),
        }
    }
}
