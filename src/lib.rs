// shibcas - Shibboleth IdP external authentication bridge to CAS
//
// Redirects the browser to a CAS server, validates the service ticket it
// returns, and hands the authenticated principal back to the IdP.

// Re-export the bridge
pub use shibcas_auth::*;

// Re-export member crates
pub use shibcas_auth;
pub use shibcas_cas;
pub use shibcas_config;

#[cfg(feature = "log")]
pub use shibcas_log;

/// Initialize logging from `SHIBCAS_LOG_*` environment variables.
#[cfg(feature = "log")]
pub fn init_logging() {
    shibcas_log::init();
}

// Prelude for common imports
pub mod prelude {
    pub use shibcas_auth::{
        AuthenticationBridge,
        AuthenticationOutcome,
        AuthnErrorCode,
        BridgeRequest,
        BridgeResponse,
        ComponentRegistry,
        Conversation,
        ExternalAuthentication,
        HostError,
        InMemoryHost,
        ParameterBuilder,
        Translator,
    };
    pub use shibcas_cas::{
        Assertion,
        CasClientConfig,
        ProtocolVersion,
        TicketValidator,
        ValidationRequest,
    };
    pub use shibcas_config::{BridgeSettings, EntityIdLocation};
}
