// CAS login parameter builders

mod authn_method;
mod entity_id;

pub use authn_method::{AuthnMethodTarget, CasAuthnMethodParameterBuilder};
pub use entity_id::EntityIdParameterBuilder;

use crate::Conversation;
use std::sync::Arc;
use tracing::debug;

/// Contributes one `&name=value` fragment to the CAS login URL.
pub trait ParameterBuilder: Send + Sync {
    /// Stable tag; two builders with the same kind are interchangeable.
    fn kind(&self) -> &'static str;

    /// The encoded fragment, or an empty string when not applicable.
    fn build(&self, conversation: &Conversation) -> String;
}

/// Ordered, kind-deduplicated parameter builders.
#[derive(Clone, Default)]
pub struct ParameterBuilderChain {
    builders: Vec<Arc<dyn ParameterBuilder>>,
}

impl ParameterBuilderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a builder unless one of the same kind is already registered.
    pub fn push(&mut self, builder: Arc<dyn ParameterBuilder>) -> bool {
        if self.contains(builder.kind()) {
            debug!(kind = builder.kind(), "Parameter builder already registered");
            return false;
        }
        self.builders.push(builder);
        true
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.builders.iter().any(|b| b.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.builders.iter().map(|b| b.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Concatenated fragments, in registration order.
    pub fn build(&self, conversation: &Conversation) -> String {
        self.builders
            .iter()
            .map(|b| b.build(conversation))
            .collect()
    }
}

impl std::fmt::Debug for ParameterBuilderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
