//! Shibboleth IdP external authentication bridge to CAS.
//!
//! The IdP suspends an authentication request and hands the browser to the
//! bridge. For each inbound request the [`AuthenticationBridge`] either
//! redirects to the CAS login page, validates the service ticket CAS sent
//! back, or reports a failed passive attempt, then resumes the IdP flow
//! through the [`ExternalAuthentication`] host.
//!
//! ```rust,no_run
//! use shibcas_auth::{AuthenticationBridge, BridgeRequest, ComponentRegistry, InMemoryHost};
//! use shibcas_config::BridgeSettings;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = BridgeSettings::builder()
//!     .add_file("idp.properties")
//!     .load_env()
//!     .build()?;
//!
//! let host = Arc::new(InMemoryHost::new());
//! let bridge = AuthenticationBridge::from_settings(&settings, host, &ComponentRegistry::new())?;
//!
//! let request = BridgeRequest::new("/idp/Authn/External", "conversation=e1s1");
//! let response = bridge.handle(&request).await.into_http();
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod conversation;
pub mod error;
pub mod host;
pub mod memory;
pub mod outcome;
pub mod params;
pub mod registry;
pub mod response;
pub mod service_url;
pub mod translate;

pub use bridge::{AuthenticationBridge, AuthenticationBridgeBuilder, BridgeState};
pub use conversation::{AuthenticationKey, BridgeRequest, Conversation, REFEDS_MFA};
pub use error::{BridgeError, HostError, Result, TranslationError};
pub use host::ExternalAuthentication;
pub use memory::InMemoryHost;
pub use outcome::{
    AuthenticationOutcome, AuthnErrorCode, PASSWORD_PROTECTED_TRANSPORT,
    RequestedPrincipalOverride,
};
pub use params::{
    AuthnMethodTarget, CasAuthnMethodParameterBuilder, EntityIdParameterBuilder, ParameterBuilder,
    ParameterBuilderChain,
};
pub use registry::ComponentRegistry;
pub use response::BridgeResponse;
pub use service_url::{ServiceUrlBuilder, login_url};
pub use translate::{
    AuthenticatedNameTranslator, CasAttributeTranslator, DuoAuthnMethodRequiredTranslator,
    DuoRefedsAuthnMethodTranslator, Translator, TranslatorChain,
};
