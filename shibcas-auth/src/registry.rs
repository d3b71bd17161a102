// Startup registry of translators and parameter builders

use crate::params::{CasAuthnMethodParameterBuilder, EntityIdParameterBuilder, ParameterBuilder};
use crate::translate::{
    AuthenticatedNameTranslator, CasAttributeTranslator, DuoAuthnMethodRequiredTranslator,
    DuoRefedsAuthnMethodTranslator, Translator,
};
use crate::{BridgeError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type TranslatorFactory = Arc<dyn Fn() -> Arc<dyn Translator> + Send + Sync>;
pub type ParameterBuilderFactory = Arc<dyn Fn() -> Arc<dyn ParameterBuilder> + Send + Sync>;

/// Registry keys of the built-in components.
pub mod names {
    pub const AUTHENTICATED_NAME: &str = "authenticated-name";
    pub const CAS_ATTRIBUTES: &str = "cas-attributes";
    pub const DUO_REFEDS_AUTHN_METHOD: &str = "duo-refeds-authn-method";
    pub const DUO_AUTHN_METHOD_REQUIRED: &str = "duo-authn-method-required";

    pub const ENTITY_ID: &str = "entity-id";
    pub const REFEDS_MFA_TO_DUO: &str = "refeds-mfa-to-duo";
    pub const REFEDS_MFA_TO_GAUTH: &str = "refeds-mfa-to-gauth";
}

/// Maps configured component keys to factories.
///
/// Lookups of unknown keys fail, so a typo in the settings stops the bridge
/// from starting.
#[derive(Clone)]
pub struct ComponentRegistry {
    translators: BTreeMap<String, TranslatorFactory>,
    parameter_builders: BTreeMap<String, ParameterBuilderFactory>,
}

impl ComponentRegistry {
    /// Registry with no components at all.
    pub fn empty() -> Self {
        Self {
            translators: BTreeMap::new(),
            parameter_builders: BTreeMap::new(),
        }
    }

    /// Registry with the built-in components.
    pub fn new() -> Self {
        Self::empty()
            .with_translator(names::AUTHENTICATED_NAME, || Arc::new(AuthenticatedNameTranslator))
            .with_translator(names::CAS_ATTRIBUTES, || Arc::new(CasAttributeTranslator))
            .with_translator(names::DUO_REFEDS_AUTHN_METHOD, || {
                Arc::new(DuoRefedsAuthnMethodTranslator)
            })
            .with_translator(names::DUO_AUTHN_METHOD_REQUIRED, || {
                Arc::new(DuoAuthnMethodRequiredTranslator)
            })
            .with_parameter_builder(names::ENTITY_ID, || Arc::new(EntityIdParameterBuilder))
            .with_parameter_builder(names::REFEDS_MFA_TO_DUO, || {
                Arc::new(CasAuthnMethodParameterBuilder::duo())
            })
            .with_parameter_builder(names::REFEDS_MFA_TO_GAUTH, || {
                Arc::new(CasAuthnMethodParameterBuilder::gauth())
            })
    }

    /// Register a translator factory, replacing any with the same key.
    pub fn with_translator<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Translator> + Send + Sync + 'static,
    {
        self.translators.insert(key.into(), Arc::new(factory));
        self
    }

    /// Register a parameter builder factory, replacing any with the same key.
    pub fn with_parameter_builder<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn ParameterBuilder> + Send + Sync + 'static,
    {
        self.parameter_builders.insert(key.into(), Arc::new(factory));
        self
    }

    pub fn translator(&self, key: &str) -> Result<Arc<dyn Translator>> {
        self.translators
            .get(key.trim())
            .map(|factory| factory())
            .ok_or_else(|| BridgeError::UnknownComponent {
                kind: "translator",
                key: key.to_string(),
            })
    }

    pub fn parameter_builder(&self, key: &str) -> Result<Arc<dyn ParameterBuilder>> {
        self.parameter_builders
            .get(key.trim())
            .map(|factory| factory())
            .ok_or_else(|| BridgeError::UnknownComponent {
                kind: "parameter builder",
                key: key.to_string(),
            })
    }

    pub fn translator_keys(&self) -> Vec<&str> {
        self.translators.keys().map(String::as_str).collect()
    }

    pub fn parameter_builder_keys(&self) -> Vec<&str> {
        self.parameter_builders.keys().map(String::as_str).collect()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys() {
        let registry = ComponentRegistry::new();
        assert_eq!(
            registry.translator_keys(),
            vec![
                "authenticated-name",
                "cas-attributes",
                "duo-authn-method-required",
                "duo-refeds-authn-method"
            ]
        );
        assert_eq!(
            registry.parameter_builder_keys(),
            vec!["entity-id", "refeds-mfa-to-duo", "refeds-mfa-to-gauth"]
        );
    }

    #[test]
    fn test_kinds_match_keys() {
        let registry = ComponentRegistry::new();
        for key in registry.translator_keys() {
            assert_eq!(registry.translator(key).unwrap().kind(), key);
        }
        assert_eq!(
            registry.parameter_builder(names::REFEDS_MFA_TO_GAUTH).unwrap().kind(),
            CasAuthnMethodParameterBuilder::KIND
        );
    }

    #[test]
    fn test_unknown_key() {
        let registry = ComponentRegistry::new();
        let err = registry
            .translator("net.unicon.idp.externalauth.Missing")
            .err()
            .unwrap();
        assert!(matches!(err, BridgeError::UnknownComponent { kind: "translator", .. }));
        assert!(registry.parameter_builder("nope").is_err());
        assert!(ComponentRegistry::empty().translator(names::AUTHENTICATED_NAME).is_err());
    }

    #[test]
    fn test_custom_registration() {
        let registry = ComponentRegistry::empty()
            .with_parameter_builder("idp-entity", || Arc::new(EntityIdParameterBuilder));
        assert!(registry.parameter_builder("idp-entity").is_ok());
    }
}
