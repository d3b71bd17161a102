//! CAS service ticket validation.
//!
//! Three protocol variants are supported, selected once by name:
//!
//! | name    | endpoint                | response            |
//! |---------|-------------------------|---------------------|
//! | `cas10` | `/validate`             | `yes\n<user>\n`     |
//! | `cas20` | `/serviceValidate`      | XML                 |
//! | `cas30` | `/p3/serviceValidate`   | XML with attributes |
//!
//! ```rust,no_run
//! use shibcas_cas::{CasClientConfig, ProtocolVersion, ValidationRequest, ticket_validator};
//!
//! # async fn run() -> shibcas_cas::Result<()> {
//! let config = CasClientConfig::new("https://cas.example.edu/cas");
//! let validator = ticket_validator(ProtocolVersion::Cas30, config)?;
//!
//! let request = ValidationRequest::new("ST-1-abc", "https://idp.example.edu/idp/Authn/External?conversation=e1s1");
//! let assertion = validator.validate(&request).await?;
//! println!("authenticated {}", assertion.principal_name());
//! # Ok(())
//! # }
//! ```

pub mod assertion;
pub mod config;
pub mod error;
pub mod protocol;
pub mod response;
pub mod validator;

pub use assertion::{Assertion, AttributePrincipal};
pub use config::CasClientConfig;
pub use error::{Result, TicketValidationError};
pub use protocol::{ProtocolVersion, UnknownProtocol};
pub use validator::{ServiceTicketValidator, TicketValidator, ValidationRequest, ticket_validator};
