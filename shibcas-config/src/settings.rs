// Bridge settings and their builder

use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigError, ConfigLoader, EnvLoader, FileFormat, Result};
use shibcas_cas::{CasClientConfig, ProtocolVersion};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Setting keys, in their `idp.properties` spelling.
pub mod keys {
    pub const CAS_SERVER_URL_PREFIX: &str = "shibcas.casServerUrlPrefix";
    pub const CAS_SERVER_LOGIN_URL: &str = "shibcas.casServerLoginUrl";
    pub const SERVER_NAME: &str = "shibcas.serverName";
    pub const TICKET_VALIDATOR_NAME: &str = "shibcas.ticketValidatorName";
    pub const ENTITY_ID_LOCATION: &str = "shibcas.entityIdLocation";
    pub const TRANSLATORS: &str = "shibcas.casToShibTranslators";
    pub const PARAMETER_BUILDERS: &str = "shibcas.parameterBuilders";
    pub const VALIDATION_TIMEOUT: &str = "shibcas.validationTimeout";
}

pub const DEFAULT_VALIDATION_TIMEOUT_MS: u64 = 10_000;
pub const MAX_VALIDATION_TIMEOUT_MS: u64 = 120_000;

/// Canonical form of a setting key.
///
/// Case, `.` and `_` are ignored and a leading `shibcas` is dropped, so
/// `shibcas.casServerUrlPrefix` and `SHIBCAS_CAS_SERVER_URL_PREFIX` match.
pub fn normalize_key(key: &str) -> String {
    let flat: String = key
        .chars()
        .filter(|c| *c != '.' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect();

    match flat.strip_prefix("shibcas") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => flat,
    }
}

/// Where the relying party's entity ID travels on the CAS round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntityIdLocation {
    /// Separate `entityId` parameter on the login URL
    #[default]
    Append,
    /// Inside the service URL's own query string
    Embed,
    /// Not sent at all
    None,
}

impl EntityIdLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Embed => "embed",
            Self::None => "none",
        }
    }
}

impl FromStr for EntityIdLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "embed" => Ok(Self::Embed),
            "none" => Ok(Self::None),
            other => Err(ConfigError::invalid_value(
                keys::ENTITY_ID_LOCATION,
                format!("unknown location '{}', expected append, embed or none", other),
            )),
        }
    }
}

impl fmt::Display for EntityIdLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw settings collected from every source, keyed by [`normalize_key`].
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    values: HashMap<String, String>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing whatever an earlier source set.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    pub fn extend<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in pairs {
            self.set(&key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Value of a required key; blank counts as missing.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `;`-separated list, blanks dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(split_list).unwrap_or_default()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Immutable startup settings of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub cas_server_url_prefix: String,
    pub cas_server_login_url: String,
    /// Canonical server name of this IdP, scheme optional
    pub server_name: String,
    pub ticket_validator: ProtocolVersion,
    pub entity_id_location: EntityIdLocation,
    /// Translator registry keys, in order
    pub translators: Vec<String>,
    /// Parameter builder registry keys, in order
    pub parameter_builders: Vec<String>,
    pub validation_timeout: Duration,
}

impl BridgeSettings {
    pub fn new(
        cas_server_url_prefix: impl Into<String>,
        cas_server_login_url: impl Into<String>,
        server_name: impl Into<String>,
    ) -> Self {
        Self {
            cas_server_url_prefix: cas_server_url_prefix.into(),
            cas_server_login_url: cas_server_login_url.into(),
            server_name: server_name.into(),
            ticket_validator: ProtocolVersion::default(),
            entity_id_location: EntityIdLocation::default(),
            translators: Vec::new(),
            parameter_builders: Vec::new(),
            validation_timeout: Duration::from_millis(DEFAULT_VALIDATION_TIMEOUT_MS),
        }
    }

    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    pub fn with_ticket_validator(mut self, version: ProtocolVersion) -> Self {
        self.ticket_validator = version;
        self
    }

    pub fn with_entity_id_location(mut self, location: EntityIdLocation) -> Self {
        self.entity_id_location = location;
        self
    }

    pub fn with_translators<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translators = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameter_builders<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_builders = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Read settings out of a populated store. Does not validate.
    pub fn from_store(store: &SettingsStore) -> Result<Self> {
        let mut settings = Self::new(
            store.require(keys::CAS_SERVER_URL_PREFIX)?,
            store.require(keys::CAS_SERVER_LOGIN_URL)?,
            store.require(keys::SERVER_NAME)?,
        );

        if let Some(name) = store.get(keys::TICKET_VALIDATOR_NAME) {
            settings.ticket_validator = name
                .parse()
                .map_err(|e| ConfigError::invalid_value(keys::TICKET_VALIDATOR_NAME, e))?;
        }

        if let Some(location) = store.get(keys::ENTITY_ID_LOCATION) {
            settings.entity_id_location = location.parse()?;
        }

        settings.translators = store.get_list(keys::TRANSLATORS);
        settings.parameter_builders = store.get_list(keys::PARAMETER_BUILDERS);

        if let Some(timeout) = store.get(keys::VALIDATION_TIMEOUT) {
            let millis: u64 = timeout.trim().parse().map_err(|_| {
                ConfigError::invalid_value(
                    keys::VALIDATION_TIMEOUT,
                    format!("'{}' is not a number of milliseconds", timeout),
                )
            })?;
            settings.validation_timeout = Duration::from_millis(millis);
        }

        Ok(settings)
    }

    /// Connection settings for the ticket validator.
    pub fn cas_client_config(&self) -> CasClientConfig {
        CasClientConfig::new(self.cas_server_url_prefix.clone())
            .with_timeout(self.validation_timeout)
    }
}

impl Validate for BridgeSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::is_url(&self.cas_server_url_prefix, keys::CAS_SERVER_URL_PREFIX)?;
        ConfigValidator::is_url(&self.cas_server_login_url, keys::CAS_SERVER_LOGIN_URL)?;
        ConfigValidator::not_empty(&self.server_name, keys::SERVER_NAME)?;

        let millis = u64::try_from(self.validation_timeout.as_millis()).unwrap_or(u64::MAX);
        ConfigValidator::in_range(
            millis,
            1,
            MAX_VALIDATION_TIMEOUT_MS,
            keys::VALIDATION_TIMEOUT,
        )?;

        for key in self.translators.iter().chain(&self.parameter_builders) {
            ConfigValidator::not_empty(key, "component key")?;
        }

        Ok(())
    }
}

/// Builder for [`BridgeSettings`].
///
/// Sources are applied in a fixed order regardless of call order: files (in
/// the order added), then `.env`, then the environment, then explicit
/// [`set`](Self::set) values. Later sources win.
#[derive(Default)]
pub struct SettingsBuilder {
    files: Vec<(PathBuf, Option<FileFormat>)>,
    load_dotenv: bool,
    dotenv_path: Option<PathBuf>,
    load_env: bool,
    env_vars: Option<Vec<(String, String)>>,
    overrides: Vec<(String, String)>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable loading `SHIBCAS_*` entries from a `.env` file
    pub fn load_dotenv(mut self, path: Option<PathBuf>) -> Self {
        self.load_dotenv = true;
        self.dotenv_path = path;
        self
    }

    /// Enable loading `SHIBCAS_*` environment variables
    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Use these variables in place of the process environment.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.load_env = true;
        self.env_vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Add a settings file; the format comes from its extension
    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), None));
        self
    }

    pub fn add_file_with_format(mut self, path: impl Into<PathBuf>, format: FileFormat) -> Self {
        self.files.push((path.into(), Some(format)));
        self
    }

    /// Set a value directly
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Collect every source into a store.
    pub fn load(self) -> Result<SettingsStore> {
        let mut store = SettingsStore::new();
        let env = EnvLoader::shibcas();

        for (path, format) in &self.files {
            let loader = match format {
                Some(format) => ConfigLoader::new(*format),
                None => ConfigLoader::auto(path)?,
            };
            let pairs = loader.load_file(path)?;
            debug!(path = %path.display(), entries = pairs.len(), "Loaded settings file");
            store.extend(pairs);
        }

        if self.load_dotenv {
            store.extend(env.load_dotenv(self.dotenv_path.as_deref())?);
        }

        if self.load_env {
            let vars = match self.env_vars {
                Some(vars) => env.filter(vars),
                None => env.load(),
            };
            store.extend(vars);
        }

        store.extend(self.overrides);
        Ok(store)
    }

    /// Load, parse and validate the settings
    pub fn build(self) -> Result<BridgeSettings> {
        let store = self.load()?;
        let settings = BridgeSettings::from_store(&store)?;
        settings.validate()?;

        info!(
            cas_server_url_prefix = %settings.cas_server_url_prefix,
            cas_server_login_url = %settings.cas_server_login_url,
            server_name = %settings.server_name,
            ticket_validator = %settings.ticket_validator,
            entity_id_location = %settings.entity_id_location,
            "Bridge settings loaded"
        );
        Ok(settings)
    }
}
