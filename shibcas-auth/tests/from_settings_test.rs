//! Bridges assembled from startup settings against a mock CAS server.

use shibcas_auth::*;
use shibcas_cas::ProtocolVersion;
use shibcas_config::{BridgeSettings, EntityIdLocation};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE: &str = "https://idp.example.edu/idp/Authn/External?conversation=e1s1";

fn settings(server: &MockServer) -> BridgeSettings {
    BridgeSettings::new(
        format!("{}/cas", server.uri()),
        format!("{}/cas/login", server.uri()),
        "idp.example.edu",
    )
}

fn suspended_host() -> Arc<InMemoryHost> {
    let host = Arc::new(InMemoryHost::new());
    host.suspend(
        Conversation::new("e1s1")
            .with_force(true)
            .with_relying_party("https://sp.example.org/shibboleth"),
    );
    host
}

#[tokio::test]
async fn test_cas20_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cas/serviceValidate"))
        .and(query_param("ticket", "ST-42"))
        .and(query_param("service", SERVICE))
        .and(query_param("renew", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
                <cas:authenticationSuccess><cas:user>jsmith</cas:user></cas:authenticationSuccess>
            </cas:serviceResponse>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let host = suspended_host();
    let bridge = AuthenticationBridge::from_settings(
        &settings(&server).with_ticket_validator(ProtocolVersion::Cas20),
        host.clone(),
        &ComponentRegistry::new(),
    )
    .unwrap();
    assert_eq!(bridge.protocol(), ProtocolVersion::Cas20);

    let response = bridge
        .handle(&BridgeRequest::new(
            "/idp/Authn/External",
            "conversation=e1s1&ticket=ST-42",
        ))
        .await;

    assert!(matches!(response, BridgeResponse::Resume(_)));
    let outcome = host.last_outcome().unwrap();
    assert_eq!(outcome.principal_name.as_deref(), Some("jsmith"));
    assert_eq!(outcome.error, None);
}

#[tokio::test]
async fn test_cas_failure_is_invalid_ticket() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cas/p3/serviceValidate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
                <cas:authenticationFailure code="INVALID_TICKET">expired</cas:authenticationFailure>
            </cas:serviceResponse>"#,
        ))
        .mount(&server)
        .await;

    let host = suspended_host();
    let bridge =
        AuthenticationBridge::from_settings(&settings(&server), host.clone(), &ComponentRegistry::new())
            .unwrap();

    bridge
        .handle(&BridgeRequest::new(
            "/idp/Authn/External",
            "conversation=e1s1&ticket=ST-old",
        ))
        .await;

    assert_eq!(
        host.last_outcome().unwrap().error,
        Some(AuthnErrorCode::InvalidTicket)
    );
}

#[tokio::test]
async fn test_unreachable_cas_is_invalid_ticket() {
    let host = suspended_host();
    let settings = BridgeSettings::new(
        "http://127.0.0.1:1/cas",
        "https://cas.example.edu/cas/login",
        "idp.example.edu",
    );
    let bridge =
        AuthenticationBridge::from_settings(&settings, host.clone(), &ComponentRegistry::new())
            .unwrap();

    bridge
        .handle(&BridgeRequest::new(
            "/idp/Authn/External",
            "conversation=e1s1&ticket=ST-1",
        ))
        .await;

    assert_eq!(host.finish_count(), 1);
    assert_eq!(
        host.last_outcome().unwrap().error,
        Some(AuthnErrorCode::InvalidTicket)
    );
}

#[tokio::test]
async fn test_configured_components() {
    let server = MockServer::start().await;
    let settings = settings(&server)
        .with_translators(["cas-attributes", "duo-refeds-authn-method", "cas-attributes"])
        .with_parameter_builders(["refeds-mfa-to-gauth", "refeds-mfa-to-duo"]);

    let bridge =
        AuthenticationBridge::from_settings(&settings, suspended_host(), &ComponentRegistry::new())
            .unwrap();

    assert_eq!(
        bridge.translators().kinds(),
        vec!["authenticated-name", "cas-attributes", "duo-refeds-authn-method"]
    );
    assert_eq!(
        bridge.parameter_builders().kinds(),
        vec!["entity-id", "cas-authn-method"]
    );

    let conversation = Conversation::new("e1s1").with_requested_authn_context(REFEDS_MFA);
    let url = bridge
        .login_redirect(&BridgeRequest::new("/idp/Authn/External", "conversation=e1s1"), &conversation)
        .unwrap();
    assert!(url.ends_with("&authn_method=mfa-gauth"));
}

#[tokio::test]
async fn test_embed_mode_registers_no_entity_id_builder() {
    let server = MockServer::start().await;
    let settings = settings(&server).with_entity_id_location(EntityIdLocation::Embed);

    let bridge =
        AuthenticationBridge::from_settings(&settings, suspended_host(), &ComponentRegistry::new())
            .unwrap();
    assert!(bridge.parameter_builders().is_empty());
    assert_eq!(
        bridge.service_urls().entity_id_location(),
        EntityIdLocation::Embed
    );
}

#[tokio::test]
async fn test_unknown_component_fails_startup() {
    let server = MockServer::start().await;
    let settings = settings(&server).with_translators(["net.unicon.idp.externalauth.Custom"]);

    let err = AuthenticationBridge::from_settings(&settings, suspended_host(), &ComponentRegistry::new())
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnknownComponent { kind: "translator", .. }));

    let settings = self::settings(&server).with_parameter_builders(["nope"]);
    let err = AuthenticationBridge::from_settings(&settings, suspended_host(), &ComponentRegistry::new())
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnknownComponent { kind: "parameter builder", .. }));
}

#[tokio::test]
async fn test_invalid_settings_fail_startup() {
    let settings = BridgeSettings::new("cas.example.edu", "https://cas.example.edu/cas/login", "idp");
    let err = AuthenticationBridge::from_settings(&settings, suspended_host(), &ComponentRegistry::new())
        .unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));
}
