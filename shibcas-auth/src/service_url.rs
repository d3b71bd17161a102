// Service URL and CAS login URL construction

use crate::conversation::{ENTITY_ID_PARAM, GATEWAY_ATTEMPTED_PARAM, SERVICE_PARAM, TICKET_PARAM};
use crate::{BridgeError, BridgeRequest, Conversation, Result};
use shibcas_config::EntityIdLocation;
use url::form_urlencoded;

/// Builds the callback URL CAS redirects back to.
///
/// The redirect leg and the validation leg must produce the same string or
/// CAS refuses the ticket. Both legs start from the decoded query of the
/// inbound request and re-encode it with one serializer; anything the
/// redirect leg adds comes back verbatim in the returning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrlBuilder {
    server: String,
    entity_id_location: EntityIdLocation,
}

impl ServiceUrlBuilder {
    /// `server_name` may omit the scheme; `https://` is assumed.
    pub fn new(server_name: &str, entity_id_location: EntityIdLocation) -> Self {
        let server_name = server_name.trim();
        let server = if server_name.contains("://") {
            server_name.to_string()
        } else {
            format!("https://{}", server_name)
        };

        Self {
            server: server.trim_end_matches('/').to_string(),
            entity_id_location,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn entity_id_location(&self) -> EntityIdLocation {
        self.entity_id_location
    }

    /// Service URL sent to CAS when redirecting to login.
    pub fn for_redirect(&self, request: &BridgeRequest, conversation: &Conversation) -> Result<String> {
        let mut pairs = callback_pairs(request);

        if self.entity_id_location == EntityIdLocation::Embed
            && let Some(entity_id) = &conversation.relying_party
        {
            pairs.retain(|(k, _)| *k != ENTITY_ID_PARAM);
            pairs.push((ENTITY_ID_PARAM, entity_id.as_str()));
        }

        if conversation.passive {
            pairs.retain(|(k, _)| *k != GATEWAY_ATTEMPTED_PARAM);
            pairs.push((GATEWAY_ATTEMPTED_PARAM, "true"));
        }

        self.assemble(request.path(), &pairs)
    }

    /// Service URL sent to CAS when validating the returned ticket.
    pub fn for_validation(&self, request: &BridgeRequest) -> Result<String> {
        self.assemble(request.path(), &callback_pairs(request))
    }

    fn assemble(&self, path: &str, pairs: &[(&str, &str)]) -> Result<String> {
        if !path.starts_with('/') {
            return Err(BridgeError::InvalidServiceUrl(format!(
                "request path '{}' is not absolute",
                path
            )));
        }

        let mut url = format!("{}{}", self.server, path);
        if !pairs.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            url.push('?');
            url.push_str(&query);
        }

        Ok(url)
    }
}

fn callback_pairs(request: &BridgeRequest) -> Vec<(&str, &str)> {
    request
        .query_pairs()
        .iter()
        .filter(|(k, _)| k != TICKET_PARAM && k != SERVICE_PARAM)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

/// CAS login URL with the service, protocol flags and builder fragments.
pub fn login_url(login_url: &str, service: &str, renew: bool, gateway: bool, fragments: &str) -> String {
    let sep = if login_url.contains('?') { '&' } else { '?' };
    let service: String = form_urlencoded::byte_serialize(service.as_bytes()).collect();

    let mut url = format!("{}{}{}={}", login_url, sep, SERVICE_PARAM, service);
    if renew {
        url.push_str("&renew=true");
    }
    if gateway {
        url.push_str("&gateway=true");
    }
    url.push_str(fragments);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "https://shibserver.example.edu";

    fn request(query: &str) -> BridgeRequest {
        BridgeRequest::new("/idp/Authn/ExtCas", query)
    }

    fn conversation() -> Conversation {
        Conversation::new("e1s1").with_relying_party("http://test.edu/sp")
    }

    #[test]
    fn test_server_name_normalization() {
        assert_eq!(
            ServiceUrlBuilder::new("shibserver.example.edu/", EntityIdLocation::Append).server(),
            SERVER
        );
        assert_eq!(
            ServiceUrlBuilder::new("http://localhost:8080", EntityIdLocation::Append).server(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_append_mode_leaves_entity_id_out() {
        let builder = ServiceUrlBuilder::new(SERVER, EntityIdLocation::Append);
        let url = builder.for_redirect(&request("conversation=e1s1"), &conversation()).unwrap();
        assert_eq!(url, "https://shibserver.example.edu/idp/Authn/ExtCas?conversation=e1s1");
    }

    #[test]
    fn test_embed_mode() {
        let builder = ServiceUrlBuilder::new(SERVER, EntityIdLocation::Embed);
        let url = builder.for_redirect(&request("conversation=e1s1"), &conversation()).unwrap();
        assert_eq!(
            url,
            "https://shibserver.example.edu/idp/Authn/ExtCas?conversation=e1s1&entityId=http%3A%2F%2Ftest.edu%2Fsp"
        );
    }

    #[test]
    fn test_embed_replaces_inbound_entity_id() {
        let builder = ServiceUrlBuilder::new(SERVER, EntityIdLocation::Embed);
        let url = builder
            .for_redirect(&request("entityId=spoofed&conversation=e1s1"), &conversation())
            .unwrap();
        assert_eq!(url.matches("entityId=").count(), 1);
        assert!(url.ends_with("?conversation=e1s1&entityId=http%3A%2F%2Ftest.edu%2Fsp"));
    }

    #[test]
    fn test_passive_marks_gateway_attempt() {
        let builder = ServiceUrlBuilder::new(SERVER, EntityIdLocation::Embed);
        let url = builder
            .for_redirect(&request("conversation=e1s1"), &conversation().with_passive(true))
            .unwrap();
        assert!(url.ends_with("&entityId=http%3A%2F%2Ftest.edu%2Fsp&gatewayAttempted=true"));
    }

    #[test]
    fn test_passive_replaces_empty_gateway_flag() {
        let builder = ServiceUrlBuilder::new(SERVER, EntityIdLocation::Append);
        let url = builder
            .for_redirect(
                &request("conversation=e1s1&gatewayAttempted="),
                &conversation().with_passive(true),
            )
            .unwrap();
        assert_eq!(
            url,
            "https://shibserver.example.edu/idp/Authn/ExtCas?conversation=e1s1&gatewayAttempted=true"
        );

        // the returning leg must read as a gateway attempt
        let (path, query) = url.strip_prefix(SERVER).and_then(|r| r.split_once('?')).unwrap();
        assert!(BridgeRequest::new(path, query).gateway_attempted());
    }

    #[test]
    fn test_validation_leg_matches_redirect_leg() {
        for location in [EntityIdLocation::Append, EntityIdLocation::Embed, EntityIdLocation::None] {
            for passive in [false, true] {
                let builder = ServiceUrlBuilder::new(SERVER, location);
                let conversation = conversation().with_passive(passive);
                let sent = builder
                    .for_redirect(&request("conversation=e1s1&service=stale"), &conversation)
                    .unwrap();

                // CAS appends the ticket to the service URL it was given
                let (path, query) = sent
                    .strip_prefix(SERVER)
                    .and_then(|rest| rest.split_once('?'))
                    .unwrap();
                let returning = BridgeRequest::new(path, &format!("{}&ticket=ST-1", query));

                assert_eq!(builder.for_validation(&returning).unwrap(), sent);
            }
        }
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let builder = ServiceUrlBuilder::new(SERVER, EntityIdLocation::Append);
        let request = BridgeRequest::new("idp/Authn/ExtCas", "");
        assert!(matches!(
            builder.for_validation(&request),
            Err(BridgeError::InvalidServiceUrl(_))
        ));
    }

    #[test]
    fn test_no_query() {
        let builder = ServiceUrlBuilder::new(SERVER, EntityIdLocation::Append);
        let url = builder.for_validation(&request("ticket=ST-1")).unwrap();
        assert_eq!(url, "https://shibserver.example.edu/idp/Authn/ExtCas");
    }

    #[test]
    fn test_login_url() {
        let service = "https://shibserver.example.edu/idp/Authn/ExtCas?conversation=e1s1";
        assert_eq!(
            login_url("https://cas.example.edu/cas/login", service, false, false, ""),
            "https://cas.example.edu/cas/login?service=https%3A%2F%2Fshibserver.example.edu%2Fidp%2FAuthn%2FExtCas%3Fconversation%3De1s1"
        );
        assert_eq!(
            login_url("https://cas.example.edu/cas/login?locale=en", service, true, true, "&x=1"),
            "https://cas.example.edu/cas/login?locale=en&service=https%3A%2F%2Fshibserver.example.edu%2Fidp%2FAuthn%2FExtCas%3Fconversation%3De1s1&renew=true&gateway=true&x=1"
        );
    }
}
