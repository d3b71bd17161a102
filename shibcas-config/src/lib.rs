//! Startup settings for the Shibboleth CAS bridge.
//!
//! Settings are read once, validated, and handed to the bridge as an
//! immutable [`BridgeSettings`]. Sources may be mixed:
//!
//! ```rust,no_run
//! use shibcas_config::BridgeSettings;
//!
//! # fn run() -> shibcas_config::Result<()> {
//! let settings = BridgeSettings::builder()
//!     .add_file("/opt/shibboleth-idp/conf/idp.properties")
//!     .load_dotenv(None)
//!     .load_env()
//!     .build()?;
//!
//! println!("validating against {}", settings.cas_server_url_prefix);
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{
    BridgeSettings, DEFAULT_VALIDATION_TIMEOUT_MS, EntityIdLocation, MAX_VALIDATION_TIMEOUT_MS,
    SettingsBuilder, SettingsStore, keys, normalize_key,
};
pub use validation::{ConfigValidator, Validate};
