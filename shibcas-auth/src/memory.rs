// In-memory external authentication host

use crate::{
    AuthenticationKey, AuthenticationOutcome, BridgeRequest, Conversation, ExternalAuthentication,
    HostError,
};
use async_trait::async_trait;
use http::{HeaderValue, Response, StatusCode, header};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::form_urlencoded;

/// Query parameter carrying the authentication key by default.
pub const DEFAULT_KEY_PARAM: &str = "conversation";

#[derive(Default)]
struct HostState {
    pending: HashMap<AuthenticationKey, Conversation>,
    started: usize,
    finished: Vec<(Conversation, AuthenticationOutcome)>,
}

/// Host that keeps suspended conversations in a map.
///
/// Useful for embedding the bridge without an IdP and for exercising it in
/// tests: every started and finished conversation is recorded.
pub struct InMemoryHost {
    key_param: String,
    resume_url: String,
    state: Mutex<HostState>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self {
            key_param: DEFAULT_KEY_PARAM.to_string(),
            resume_url: "/idp/profile/SAML2/Redirect/SSO".to_string(),
            state: Mutex::new(HostState::default()),
        }
    }

    /// Read the authentication key from this query parameter.
    pub fn with_key_param(mut self, name: impl Into<String>) -> Self {
        self.key_param = name.into();
        self
    }

    /// Where `finish_conversation` sends the browser.
    pub fn with_resume_url(mut self, url: impl Into<String>) -> Self {
        self.resume_url = url.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspend an authentication request until the bridge finishes it.
    pub fn suspend(&self, conversation: Conversation) -> AuthenticationKey {
        let key = conversation.key.clone();
        self.state().pending.insert(key.clone(), conversation);
        key
    }

    pub fn is_pending(&self, key: &AuthenticationKey) -> bool {
        self.state().pending.contains_key(key)
    }

    pub fn start_count(&self) -> usize {
        self.state().started
    }

    pub fn finish_count(&self) -> usize {
        self.state().finished.len()
    }

    /// Outcomes passed to `finish_conversation`, oldest first.
    pub fn outcomes(&self) -> Vec<AuthenticationOutcome> {
        self.state()
            .finished
            .iter()
            .map(|(_, outcome)| outcome.clone())
            .collect()
    }

    pub fn last_outcome(&self) -> Option<AuthenticationOutcome> {
        self.state()
            .finished
            .last()
            .map(|(_, outcome)| outcome.clone())
    }

    fn resume_location(&self, key: &AuthenticationKey) -> String {
        let sep = if self.resume_url.contains('?') { '&' } else { '?' };
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("execution", key.as_str())
            .finish();
        format!("{}{}{}", self.resume_url, sep, query)
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalAuthentication for InMemoryHost {
    async fn start_conversation(&self, request: &BridgeRequest) -> Result<Conversation, HostError> {
        let key = request.param(&self.key_param).ok_or_else(|| {
            HostError::NoConversation(format!("request carries no '{}'", self.key_param))
        })?;

        let mut state = self.state();
        let conversation = state
            .pending
            .get(&AuthenticationKey::new(key))
            .cloned()
            .ok_or_else(|| HostError::NoConversation(format!("unknown conversation '{}'", key)))?;
        state.started += 1;

        Ok(conversation)
    }

    async fn finish_conversation(
        &self,
        conversation: Conversation,
        outcome: AuthenticationOutcome,
    ) -> Result<Response<String>, HostError> {
        let location = self.resume_location(&conversation.key);
        let location =
            HeaderValue::from_str(&location).map_err(|e| HostError::Failed(e.to_string()))?;

        let mut state = self.state();
        if state.pending.remove(&conversation.key).is_none() {
            return Err(HostError::Expired(conversation.key.to_string()));
        }
        state.finished.push((conversation, outcome));

        let mut response = Response::new(String::new());
        *response.status_mut() = StatusCode::FOUND;
        response.headers_mut().insert(header::LOCATION, location);
        Ok(response)
    }
}
