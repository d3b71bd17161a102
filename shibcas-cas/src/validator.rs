// Service ticket validators

use crate::response::{parse_cas10_response, parse_service_response};
use crate::{Assertion, CasClientConfig, ProtocolVersion, Result, TicketValidationError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// One ticket validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Opaque service ticket returned by CAS
    pub ticket: String,
    /// Service URL, byte-identical to the one sent on the login redirect
    pub service: String,
    /// Ask CAS to confirm the ticket came from a fresh credential entry
    pub renew: bool,
}

impl ValidationRequest {
    pub fn new(ticket: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            service: service.into(),
            renew: false,
        }
    }

    pub fn with_renew(mut self, renew: bool) -> Self {
        self.renew = renew;
        self
    }
}

/// Ticket validator trait.
///
/// Network, timeout and protocol failures all surface as
/// [`TicketValidationError`]; callers that only care whether the ticket was
/// good can treat every error alike.
#[async_trait]
pub trait TicketValidator: Send + Sync {
    /// Protocol variant spoken by this validator.
    fn protocol(&self) -> ProtocolVersion;

    /// Validate a ticket against the CAS server.
    async fn validate(&self, request: &ValidationRequest) -> Result<Assertion>;
}

/// URL-based validator for all three CAS protocol variants.
pub struct ServiceTicketValidator {
    version: ProtocolVersion,
    config: CasClientConfig,
    client: reqwest::Client,
}

impl ServiceTicketValidator {
    pub fn new(version: ProtocolVersion, config: CasClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            version,
            config,
            client,
        })
    }

    pub fn config(&self) -> &CasClientConfig {
        &self.config
    }

    /// Build the validation URL for a request.
    pub fn validation_url(&self, request: &ValidationRequest) -> Result<Url> {
        let prefix = self.config.server_url_prefix.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/{}", prefix, self.version.endpoint()))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ticket", &request.ticket);
            query.append_pair("service", &request.service);
            if request.renew {
                query.append_pair("renew", "true");
            }
        }

        Ok(url)
    }

    fn transport_error(&self, error: reqwest::Error) -> TicketValidationError {
        if error.is_timeout() {
            TicketValidationError::Timeout(self.config.timeout)
        } else {
            TicketValidationError::Http(error)
        }
    }
}

#[async_trait]
impl TicketValidator for ServiceTicketValidator {
    fn protocol(&self) -> ProtocolVersion {
        self.version
    }

    async fn validate(&self, request: &ValidationRequest) -> Result<Assertion> {
        let url = self.validation_url(request)?;
        debug!(
            protocol = %self.version,
            ticket = %request.ticket,
            service = %request.service,
            renew = request.renew,
            "Validating service ticket"
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TicketValidationError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        let assertion = if self.version.is_xml() {
            parse_service_response(&body)?
        } else {
            parse_cas10_response(&body)?
        };

        debug!(
            principal = %assertion.principal_name(),
            attributes = assertion.attributes().len(),
            "Service ticket validated"
        );
        Ok(assertion)
    }
}

/// Build the validator for a configured protocol variant.
pub fn ticket_validator(
    version: ProtocolVersion,
    config: CasClientConfig,
) -> Result<Arc<dyn TicketValidator>> {
    Ok(Arc::new(ServiceTicketValidator::new(version, config)?))
}
