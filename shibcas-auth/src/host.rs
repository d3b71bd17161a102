// External authentication host seam

use crate::{AuthenticationOutcome, BridgeRequest, Conversation, HostError};
use async_trait::async_trait;

/// The IdP side of the external authentication handshake.
///
/// `start_conversation` is called once per inbound request and fails when
/// no suspended authentication request matches it. `finish_conversation`
/// resumes the IdP flow with the outcome and is called at most once per
/// request.
#[async_trait]
pub trait ExternalAuthentication: Send + Sync {
    async fn start_conversation(&self, request: &BridgeRequest) -> Result<Conversation, HostError>;

    async fn finish_conversation(
        &self,
        conversation: Conversation,
        outcome: AuthenticationOutcome,
    ) -> Result<http::Response<String>, HostError>;
}
