// CAS protocol variants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The CAS protocol spoken by the ticket validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProtocolVersion {
    Cas10,
    Cas20,
    #[default]
    Cas30,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown CAS protocol variant: '{0}' (expected cas10, cas20 or cas30)")]
pub struct UnknownProtocol(pub String);

impl ProtocolVersion {
    /// Configuration name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolVersion::Cas10 => "cas10",
            ProtocolVersion::Cas20 => "cas20",
            ProtocolVersion::Cas30 => "cas30",
        }
    }

    /// Validation endpoint, relative to the CAS server prefix.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ProtocolVersion::Cas10 => "validate",
            ProtocolVersion::Cas20 => "serviceValidate",
            ProtocolVersion::Cas30 => "p3/serviceValidate",
        }
    }

    /// Whether the server answers in XML.
    pub fn is_xml(&self) -> bool {
        !matches!(self, ProtocolVersion::Cas10)
    }
}

impl FromStr for ProtocolVersion {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cas10" => Ok(ProtocolVersion::Cas10),
            "cas20" => Ok(ProtocolVersion::Cas20),
            "cas30" => Ok(ProtocolVersion::Cas30),
            _ => Err(UnknownProtocol(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProtocolVersion {
    type Error = UnknownProtocol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProtocolVersion> for String {
    fn from(value: ProtocolVersion) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
