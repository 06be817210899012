use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shares its screen and writes the Offer.
    Host,
    /// Types the room code and writes the Answer.
    Viewer,
}

impl Role {
    /// Name of the mailbox this role appends its candidates to.
    pub fn mailbox(&self) -> &'static str {
        match self {
            Role::Host => "host_ice",
            Role::Viewer => "viewer_ice",
        }
    }

    pub fn peer(&self) -> Role {
        match self {
            Role::Host => Role::Viewer,
            Role::Viewer => Role::Host,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Viewer => f.write_str("viewer"),
        }
    }
}
