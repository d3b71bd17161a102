// Authentication bridge state machine

use crate::params::{EntityIdParameterBuilder, ParameterBuilder, ParameterBuilderChain};
use crate::registry::{ComponentRegistry, names};
use crate::service_url::{ServiceUrlBuilder, login_url};
use crate::translate::{AuthenticatedNameTranslator, Translator, TranslatorChain};
use crate::{
    AuthenticationOutcome, AuthnErrorCode, BridgeError, BridgeRequest, BridgeResponse,
    Conversation, ExternalAuthentication, Result,
};
use shibcas_cas::{ProtocolVersion, TicketValidator, ValidationRequest, ticket_validator};
use shibcas_config::{BridgeSettings, ConfigValidator, EntityIdLocation, Validate, keys};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Phases one request moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Start,
    Redirecting,
    Validating,
    Translating,
    Finishing,
    Error,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Redirecting => "redirecting",
            Self::Validating => "validating",
            Self::Translating => "translating",
            Self::Finishing => "finishing",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Bridges the IdP's external authentication handshake to CAS.
///
/// Each request is handled on its own; the bridge holds only immutable
/// configuration and can be shared freely between tasks. A request either
/// redirects to CAS, validates one ticket, or reports a failed passive
/// attempt, and never calls CAS more than once.
pub struct AuthenticationBridge {
    host: Arc<dyn ExternalAuthentication>,
    validator: Arc<dyn TicketValidator>,
    login_url: String,
    service_urls: ServiceUrlBuilder,
    translators: TranslatorChain,
    parameter_builders: ParameterBuilderChain,
}

impl AuthenticationBridge {
    pub fn builder() -> AuthenticationBridgeBuilder {
        AuthenticationBridgeBuilder::new()
    }

    /// Assemble a bridge from startup settings.
    ///
    /// Fails on invalid settings or on component keys the registry does not
    /// know.
    pub fn from_settings(
        settings: &BridgeSettings,
        host: Arc<dyn ExternalAuthentication>,
        registry: &ComponentRegistry,
    ) -> Result<Self> {
        settings.validate()?;
        let validator = ticket_validator(settings.ticket_validator, settings.cas_client_config())?;

        let mut builder = Self::builder()
            .host(host)
            .validator(validator)
            .login_url(&settings.cas_server_login_url)
            .server_name(&settings.server_name)
            .entity_id_location(settings.entity_id_location)
            .translator(registry.translator(names::AUTHENTICATED_NAME)?);

        for key in &settings.translators {
            builder = builder.translator(registry.translator(key)?);
        }

        if settings.entity_id_location == EntityIdLocation::Append {
            builder = builder.parameter_builder(registry.parameter_builder(names::ENTITY_ID)?);
        }
        for key in &settings.parameter_builders {
            builder = builder.parameter_builder(registry.parameter_builder(key)?);
        }

        builder.build()
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.validator.protocol()
    }

    pub fn service_urls(&self) -> &ServiceUrlBuilder {
        &self.service_urls
    }

    pub fn translators(&self) -> &TranslatorChain {
        &self.translators
    }

    pub fn parameter_builders(&self) -> &ParameterBuilderChain {
        &self.parameter_builders
    }

    fn enter(&self, conversation: &Conversation, state: BridgeState) {
        trace!(conversation = %conversation.key, %state, "Bridge state");
    }

    /// Handle one inbound request.
    pub async fn handle(&self, request: &BridgeRequest) -> BridgeResponse {
        let ticket = request.ticket();
        let gateway_attempted = request.gateway_attempted();

        let conversation = match self.host.start_conversation(request).await {
            Ok(conversation) => conversation,
            Err(e) if e.is_conversation_lost() => {
                warn!(
                    path = request.path(),
                    error = %e,
                    "Cannot start external authentication; conversation state is lost"
                );
                return BridgeResponse::ConversationLost;
            }
            Err(e) => {
                error!(path = request.path(), error = %e, "Host failed to start external authentication");
                return BridgeResponse::ConversationLost;
            }
        };
        self.enter(&conversation, BridgeState::Start);

        match (ticket, gateway_attempted) {
            (None, false) => {
                debug!(
                    conversation = %conversation.key,
                    "No ticket and no gateway attempt; redirecting to CAS login"
                );
                match self.login_redirect(request, &conversation) {
                    Ok(url) => BridgeResponse::Redirect(url),
                    Err(e) => {
                        self.enter(&conversation, BridgeState::Error);
                        error!(conversation = %conversation.key, error = %e, "Cannot build CAS login redirect");
                        let outcome = AuthenticationOutcome::failure(AuthnErrorCode::InternalError);
                        self.finish(conversation, outcome).await
                    }
                }
            }
            (None, true) => {
                self.enter(&conversation, BridgeState::Error);
                debug!(
                    conversation = %conversation.key,
                    "Gateway attempt returned no ticket"
                );
                let outcome = AuthenticationOutcome::failure(AuthnErrorCode::NoPassiveCredentials);
                self.finish(conversation, outcome).await
            }
            (Some(ticket), _) => {
                let outcome = self.validate(request, &conversation, ticket).await;
                self.finish(conversation, outcome).await
            }
        }
    }

    /// Handle an `http` request and render the response.
    pub async fn handle_http<B>(&self, request: &http::Request<B>) -> http::Response<String> {
        self.handle(&BridgeRequest::from_http(request)).await.into_http()
    }

    /// The CAS login URL for a request that carries no ticket.
    pub fn login_redirect(
        &self,
        request: &BridgeRequest,
        conversation: &Conversation,
    ) -> Result<String> {
        self.enter(conversation, BridgeState::Redirecting);

        if conversation.force && conversation.passive {
            warn!(
                conversation = %conversation.key,
                relying_party = conversation.relying_party.as_deref().unwrap_or("-"),
                "Both forced and passive authentication requested; check the relying party configuration"
            );
        }

        let service = self.service_urls.for_redirect(request, conversation)?;
        let fragments = self.parameter_builders.build(conversation);
        let url = login_url(
            &self.login_url,
            &service,
            conversation.force,
            conversation.passive,
            &fragments,
        );

        debug!(conversation = %conversation.key, login_url = %url, "CAS login redirect");
        Ok(url)
    }

    async fn validate(
        &self,
        request: &BridgeRequest,
        conversation: &Conversation,
        ticket: &str,
    ) -> AuthenticationOutcome {
        self.enter(conversation, BridgeState::Validating);

        let service = match self.service_urls.for_validation(request) {
            Ok(service) => service,
            Err(e) => {
                self.enter(conversation, BridgeState::Error);
                error!(conversation = %conversation.key, error = %e, "Cannot build service URL for validation");
                return AuthenticationOutcome::failure(AuthnErrorCode::InternalError);
            }
        };

        let validation = ValidationRequest::new(ticket, service).with_renew(conversation.force);
        debug!(
            conversation = %conversation.key,
            ticket,
            service = %validation.service,
            "Validating ticket"
        );

        match self.validator.validate(&validation).await {
            Ok(assertion) => {
                self.enter(conversation, BridgeState::Translating);
                let mut outcome = self.translators.apply(conversation, &assertion);
                if outcome.error.is_none() && outcome.principal_name.is_none() {
                    warn!(conversation = %conversation.key, "Validated assertion yielded no principal");
                    outcome.fail(AuthnErrorCode::InvalidTicket);
                }
                outcome
            }
            Err(e) => {
                self.enter(conversation, BridgeState::Error);
                error!(
                    conversation = %conversation.key,
                    ticket,
                    service = %validation.service,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Ticket validation failed, returning invalid-ticket"
                );
                AuthenticationOutcome::failure(AuthnErrorCode::InvalidTicket)
            }
        }
    }

    async fn finish(
        &self,
        conversation: Conversation,
        outcome: AuthenticationOutcome,
    ) -> BridgeResponse {
        self.enter(&conversation, BridgeState::Finishing);
        let key = conversation.key.clone();

        match &outcome.error {
            Some(code) => info!(conversation = %key, error = %code, "Finishing external authentication"),
            None => info!(
                conversation = %key,
                principal = outcome.principal_name.as_deref().unwrap_or("-"),
                "Finishing external authentication"
            ),
        }

        match self.host.finish_conversation(conversation, outcome).await {
            Ok(response) => BridgeResponse::Resume(response),
            Err(e) => {
                warn!(conversation = %key, error = %e, "Cannot resume external authentication; conversation state is lost");
                BridgeResponse::ConversationLost
            }
        }
    }
}

impl fmt::Debug for AuthenticationBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationBridge")
            .field("protocol", &self.protocol())
            .field("login_url", &self.login_url)
            .field("service_urls", &self.service_urls)
            .field("translators", &self.translators)
            .field("parameter_builders", &self.parameter_builders)
            .finish()
    }
}

/// Builder for [`AuthenticationBridge`].
#[derive(Default)]
pub struct AuthenticationBridgeBuilder {
    host: Option<Arc<dyn ExternalAuthentication>>,
    validator: Option<Arc<dyn TicketValidator>>,
    login_url: Option<String>,
    server_name: Option<String>,
    entity_id_location: EntityIdLocation,
    translators: Vec<Arc<dyn Translator>>,
    parameter_builders: Vec<Arc<dyn ParameterBuilder>>,
}

impl AuthenticationBridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: Arc<dyn ExternalAuthentication>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn TicketValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// CAS login endpoint
    pub fn login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    /// Canonical server name of this IdP
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn entity_id_location(mut self, location: EntityIdLocation) -> Self {
        self.entity_id_location = location;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translators.push(translator);
        self
    }

    pub fn parameter_builder(mut self, builder: Arc<dyn ParameterBuilder>) -> Self {
        self.parameter_builders.push(builder);
        self
    }

    /// Build the bridge.
    ///
    /// The principal name translator always runs first. In `append` mode the
    /// entity ID builder is added ahead of the others; in `embed` mode it is
    /// dropped, since the entity ID already rides inside the service URL.
    pub fn build(self) -> Result<AuthenticationBridge> {
        let host = self.host.ok_or(BridgeError::Incomplete("host"))?;
        let validator = self.validator.ok_or(BridgeError::Incomplete("validator"))?;
        let login_url = self.login_url.ok_or(BridgeError::Incomplete("login_url"))?;
        let server_name = self.server_name.ok_or(BridgeError::Incomplete("server_name"))?;

        ConfigValidator::is_url(&login_url, keys::CAS_SERVER_LOGIN_URL)?;
        ConfigValidator::not_empty(&server_name, keys::SERVER_NAME)?;

        let mut translators = TranslatorChain::new();
        translators.push(Arc::new(AuthenticatedNameTranslator));
        for translator in self.translators {
            translators.push(translator);
        }

        let mut parameter_builders = ParameterBuilderChain::new();
        if self.entity_id_location == EntityIdLocation::Append {
            parameter_builders.push(Arc::new(EntityIdParameterBuilder));
        }
        for builder in self.parameter_builders {
            if builder.kind() == EntityIdParameterBuilder::KIND
                && self.entity_id_location != EntityIdLocation::Append
            {
                warn!(
                    entity_id_location = %self.entity_id_location,
                    "Ignoring entity ID parameter builder outside append mode"
                );
                continue;
            }
            parameter_builders.push(builder);
        }

        let bridge = AuthenticationBridge {
            host,
            validator,
            login_url,
            service_urls: ServiceUrlBuilder::new(&server_name, self.entity_id_location),
            translators,
            parameter_builders,
        };

        info!(
            protocol = %bridge.protocol(),
            server = bridge.service_urls.server(),
            entity_id_location = %self.entity_id_location,
            translators = ?bridge.translators.kinds(),
            parameter_builders = ?bridge.parameter_builders.kinds(),
            "Authentication bridge ready"
        );
        Ok(bridge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryHost;
    use shibcas_cas::CasClientConfig;
    use tracing_test::traced_test;

    fn bridge() -> AuthenticationBridge {
        let validator = ticket_validator(
            ProtocolVersion::Cas30,
            CasClientConfig::new("https://cas.example.edu/cas"),
        )
        .unwrap();

        AuthenticationBridge::builder()
            .host(Arc::new(InMemoryHost::new()))
            .validator(validator)
            .login_url("https://cas.example.edu/cas/login")
            .server_name("idp.example.edu")
            .build()
            .unwrap()
    }

    fn request() -> BridgeRequest {
        BridgeRequest::new("/idp/Authn/External", "conversation=e1s1")
    }

    #[test]
    #[traced_test]
    fn test_forced_and_passive_is_logged() {
        let conversation = Conversation::new("e1s1").with_force(true).with_passive(true);
        let url = bridge().login_redirect(&request(), &conversation).unwrap();

        assert!(url.contains("&renew=true&gateway=true"));
        assert!(logs_contain("Both forced and passive authentication requested"));
    }

    #[test]
    #[traced_test]
    fn test_plain_redirect_has_no_conflict_warning() {
        let url = bridge().login_redirect(&request(), &Conversation::new("e1s1")).unwrap();

        assert!(!url.contains("renew=true"));
        assert!(!logs_contain("Both forced and passive"));
        assert!(logs_contain("CAS login redirect"));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(BridgeState::Validating.to_string(), "validating");
        assert_eq!(BridgeState::Error.to_string(), "error");
    }
}
