use crate::SupervisorError;

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

const DEFAULT_START_COMMAND_JAVA: &str = "java -jar server.jar nogui";
const DEFAULT_START_COMMAND_BEDROCK: &str = "LD_LIBRARY_PATH=. ./bedrock_server";
const DEFAULT_STOP_COMMAND: &str = "stop";

const JAVA_PORT_KEYS: &[&str] = &["server-port", "query.port", "rcon.port"];
const BEDROCK_PORT_KEYS: &[&str] = &["server-port", "server-portv6"];
const RCON_PORT_OFFSET: u16 = 10;
const IPV6_PORT_OFFSET: u16 = 1;

/// Game server edition managed by an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    Java,
    Bedrock,
}

impl Edition {
    pub fn default_start_command(self) -> &'static str {
        match self {
            Self::Java => DEFAULT_START_COMMAND_JAVA,
            Self::Bedrock => DEFAULT_START_COMMAND_BEDROCK,
        }
    }

    pub fn default_stop_command(self) -> &'static str {
        DEFAULT_STOP_COMMAND
    }

    /// `server.properties` keys holding this edition's ports.
    pub fn port_keys(self) -> &'static [&'static str] {
        match self {
            Self::Java => JAVA_PORT_KEYS,
            Self::Bedrock => BEDROCK_PORT_KEYS,
        }
    }

    /// Port values derived from a base port, or None if one would overflow.
    ///
    /// Java: server-port and query.port = base, rcon.port = base + 10.
    /// Bedrock: server-port = base, server-portv6 = base + 1.
    pub fn port_assignments(self, base: u16) -> Option<Vec<(&'static str, u16)>> {
        match self {
            Self::Java => Some(vec![
                ("server-port", base),
                ("query.port", base),
                ("rcon.port", base.checked_add(RCON_PORT_OFFSET)?),
            ]),
            Self::Bedrock => Some(vec![
                ("server-port", base),
                ("server-portv6", base.checked_add(IPV6_PORT_OFFSET)?),
            ]),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Bedrock => "bedrock",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edition {
    type Err = SupervisorError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "java" => Ok(Self::Java),
            "bedrock" => Ok(Self::Bedrock),
            _ => Err(SupervisorError::InvalidEdition {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
