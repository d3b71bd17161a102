// Validated CAS assertions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The authenticated principal and the attributes CAS released for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePrincipal {
    /// Principal name (the CAS username)
    pub name: String,

    /// Released attributes; every attribute may carry several values
    pub attributes: HashMap<String, Vec<String>>,
}

impl AttributePrincipal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }
}

/// Result of a successful ticket validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub principal: AttributePrincipal,

    /// When the bridge received the validation answer
    pub validated_at: DateTime<Utc>,
}

impl Assertion {
    /// Create an assertion for a principal without attributes.
    pub fn new(principal_name: impl Into<String>) -> Self {
        Self::from_principal(AttributePrincipal::new(principal_name))
    }

    pub fn from_principal(principal: AttributePrincipal) -> Self {
        Self {
            principal,
            validated_at: Utc::now(),
        }
    }

    /// Add values for an attribute, keeping any values already present.
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.principal
            .attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn principal_name(&self) -> &str {
        &self.principal.name
    }

    pub fn attributes(&self) -> &HashMap<String, Vec<String>> {
        &self.principal.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.principal.attributes.get(name).map(Vec::as_slice)
    }

    /// First value of a (possibly multi-valued) attribute.
    pub fn first_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.principal.attributes.contains_key(name)
    }
}
