//! Loading bridge settings from files on disk.

use shibcas_cas::ProtocolVersion;
use shibcas_config::*;
use std::io::Write;
use std::time::Duration;
use tempfile::{Builder, NamedTempFile};

fn file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const IDP_PROPERTIES: &str = r#"
# CAS Client properties
shibcas.casServerUrlPrefix = https://cassserver.example.edu/cas
shibcas.casServerLoginUrl = ${shibcas.casServerUrlPrefix}/login
shibcas.serverName = https://shibserver.example.edu
shibcas.casToShibTranslators = cas-attributes
shibcas.entityIdLocation = embed
"#;

#[test]
fn test_properties_file() {
    let file = file_with(
        ".properties",
        &IDP_PROPERTIES.replace(
            "${shibcas.casServerUrlPrefix}",
            "https://cassserver.example.edu/cas",
        ),
    );

    let settings = BridgeSettings::builder().add_file(file.path()).build().unwrap();

    assert_eq!(
        settings.cas_server_url_prefix,
        "https://cassserver.example.edu/cas"
    );
    assert_eq!(
        settings.cas_server_login_url,
        "https://cassserver.example.edu/cas/login"
    );
    assert_eq!(settings.server_name, "https://shibserver.example.edu");
    assert_eq!(settings.translators, vec!["cas-attributes"]);
    assert_eq!(settings.entity_id_location, EntityIdLocation::Embed);
}

#[test]
fn test_toml_file() {
    let file = file_with(
        ".toml",
        r#"
[shibcas]
casServerUrlPrefix = "https://cas.example.edu/cas"
casServerLoginUrl = "https://cas.example.edu/cas/login"
serverName = "idp.example.edu"
ticketValidatorName = "cas10"
parameterBuilders = ["refeds-mfa-to-duo"]
validationTimeout = 3000
"#,
    );

    let settings = BridgeSettings::builder().add_file(file.path()).build().unwrap();

    assert_eq!(settings.ticket_validator, ProtocolVersion::Cas10);
    assert_eq!(settings.parameter_builders, vec!["refeds-mfa-to-duo"]);
    assert_eq!(settings.validation_timeout, Duration::from_secs(3));
}

#[test]
fn test_later_file_wins() {
    let base = file_with(
        ".json",
        r#"{"shibcas": {
            "casServerUrlPrefix": "https://cas.example.edu/cas",
            "casServerLoginUrl": "https://cas.example.edu/cas/login",
            "serverName": "idp.example.edu",
            "ticketValidatorName": "cas20"
        }}"#,
    );
    let local = file_with(".properties", "shibcas.ticketValidatorName = cas30\n");

    let settings = BridgeSettings::builder()
        .add_file(base.path())
        .add_file(local.path())
        .build()
        .unwrap();

    assert_eq!(settings.ticket_validator, ProtocolVersion::Cas30);
}

#[test]
fn test_dotenv_file() {
    let dotenv = file_with(
        ".env",
        "SHIBCAS_CAS_SERVER_URL_PREFIX=https://cas.example.edu/cas\n\
         SHIBCAS_CAS_SERVER_LOGIN_URL=https://cas.example.edu/cas/login\n\
         SHIBCAS_SERVER_NAME=idp.example.edu\n\
         UNRELATED=ignored\n",
    );

    let store = BridgeSettings::builder()
        .load_dotenv(Some(dotenv.path().to_path_buf()))
        .load()
        .unwrap();

    assert_eq!(store.len(), 3);
    assert!(!store.has("unrelated"));

    let settings = BridgeSettings::from_store(&store).unwrap();
    assert_eq!(settings.server_name, "idp.example.edu");
}

#[test]
fn test_env_file_format_via_add_file() {
    let file = file_with(".env", "SHIBCAS_SERVER_NAME=idp.example.edu\n");
    let store = SettingsBuilder::new()
        .add_file_with_format(file.path(), FileFormat::Env)
        .load()
        .unwrap();
    assert_eq!(store.get(keys::SERVER_NAME), Some("idp.example.edu"));
}

#[test]
fn test_missing_file() {
    let err = BridgeSettings::builder()
        .add_file("/nonexistent/idp.properties")
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}

#[test]
fn test_unsupported_extension() {
    let file = file_with(".yaml", "shibcas: {}");
    let err = BridgeSettings::builder()
        .add_file(file.path())
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}
