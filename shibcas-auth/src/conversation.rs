// Conversation and inbound request model

use std::fmt;
use url::form_urlencoded;

pub const TICKET_PARAM: &str = "ticket";
pub const SERVICE_PARAM: &str = "service";
pub const GATEWAY_ATTEMPTED_PARAM: &str = "gatewayAttempted";
pub const ENTITY_ID_PARAM: &str = "entityId";

/// REFEDS multi-factor authentication context class.
pub const REFEDS_MFA: &str = "https://refeds.org/profile/mfa";

/// Opaque correlator for one suspended IdP authentication request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthenticationKey(String);

impl AuthenticationKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthenticationKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for AuthenticationKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Snapshot of the suspended authentication the host handed us.
///
/// Immutable for the lifetime of one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub key: AuthenticationKey,
    /// Caller requires fresh credentials
    pub force: bool,
    /// Caller forbids interactive prompting
    pub passive: bool,
    /// Entity ID of the requesting relying party
    pub relying_party: Option<String>,
    /// Requested authentication context class references
    pub requested_authn_contexts: Vec<String>,
    /// Authentication method the IdP asked for, if any
    pub authn_method: Option<String>,
}

impl Conversation {
    pub fn new(key: impl Into<AuthenticationKey>) -> Self {
        Self {
            key: key.into(),
            force: false,
            passive: false,
            relying_party: None,
            requested_authn_contexts: Vec::new(),
            authn_method: None,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }

    pub fn with_relying_party(mut self, entity_id: impl Into<String>) -> Self {
        self.relying_party = Some(entity_id.into());
        self
    }

    pub fn with_requested_authn_context(mut self, class_ref: impl Into<String>) -> Self {
        self.requested_authn_contexts.push(class_ref.into());
        self
    }

    pub fn with_authn_method(mut self, method: impl Into<String>) -> Self {
        self.authn_method = Some(method.into());
        self
    }

    pub fn requests_authn_context(&self, class_ref: &str) -> bool {
        self.requested_authn_contexts.iter().any(|c| c == class_ref)
    }

    pub fn requests_refeds_mfa(&self) -> bool {
        self.requests_authn_context(REFEDS_MFA)
    }
}

/// The parts of an inbound HTTP request the bridge looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    path: String,
    query: Vec<(String, String)>,
}

impl BridgeRequest {
    /// Build from a request path and raw (still encoded) query string.
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        let query = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();

        Self {
            path: path.into(),
            query,
        }
    }

    pub fn from_http<B>(request: &http::Request<B>) -> Self {
        let uri = request.uri();
        Self::new(uri.path(), uri.query().unwrap_or(""))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query parameters in their original order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of a parameter. Empty values count as absent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn ticket(&self) -> Option<&str> {
        self.param(TICKET_PARAM)
    }

    /// Return leg of a passive attempt
    pub fn gateway_attempted(&self) -> bool {
        self.param(GATEWAY_ATTEMPTED_PARAM).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let request = BridgeRequest::new(
            "/idp/Authn/External",
            "conversation=e1s1&ticket=ST-1-abc&entityId=http%3A%2F%2Ftest.edu%2Fsp",
        );

        assert_eq!(request.path(), "/idp/Authn/External");
        assert_eq!(request.ticket(), Some("ST-1-abc"));
        assert_eq!(request.param("entityId"), Some("http://test.edu/sp"));
        assert!(!request.gateway_attempted());
        assert_eq!(request.query_pairs().len(), 3);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let request = BridgeRequest::new("/idp/Authn/External", "ticket=&gatewayAttempted=");
        assert_eq!(request.ticket(), None);
        assert!(!request.gateway_attempted());
    }

    #[test]
    fn test_gateway_attempted() {
        let request = BridgeRequest::new("/idp/Authn/External", "?conversation=e1s1&gatewayAttempted=true");
        assert!(request.gateway_attempted());
        assert_eq!(request.ticket(), None);
    }

    #[test]
    fn test_from_http() {
        let request = http::Request::builder()
            .uri("https://idp.example.edu/idp/Authn/External?conversation=e1s1&ticket=ST-9")
            .body(())
            .unwrap();

        let request = BridgeRequest::from_http(&request);
        assert_eq!(request.path(), "/idp/Authn/External");
        assert_eq!(request.ticket(), Some("ST-9"));
    }

    #[test]
    fn test_refeds_requested() {
        let conversation = Conversation::new("e1s1").with_requested_authn_context(REFEDS_MFA);
        assert!(conversation.requests_refeds_mfa());
        assert!(!Conversation::new("e1s1").requests_refeds_mfa());
    }
}
