//! Governance permission values.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Controls whether the controller may take a protocol-advancing action.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// The action is never taken automatically.
    Deny,
    /// The action may be taken exactly once, then degrades to [`Deny`](Self::Deny).
    Once,
    /// The action is always taken automatically.
    Always,
}

impl Permission {
    /// Returns `true` when the value denies the action.
    #[must_use]
    pub const fn is_deny(self) -> bool {
        matches!(self, Self::Deny)
    }

    /// Returns `true` for the single-use permission.
    #[must_use]
    pub const fn is_once(self) -> bool {
        matches!(self, Self::Once)
    }

    /// Returns the lower-case wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deny => "deny",
            Self::Once => "once",
            Self::Always => "always",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    /// Case-insensitive parse; anything but the three known values errors.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "once" => Ok(Self::Once),
            "always" => Ok(Self::Always),
            _ => Err(Error::InvalidPermission {
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ALWAYS".parse::<Permission>(), Ok(Permission::Always));
        assert_eq!("Once".parse::<Permission>(), Ok(Permission::Once));
        assert_eq!("deny".parse::<Permission>(), Ok(Permission::Deny));
    }

    #[test]
    fn rejects_unknown_values() {
        let err = "maybe".parse::<Permission>().expect_err("should error");
        assert_eq!(
            err,
            Error::InvalidPermission {
                value: "maybe".into()
            }
        );
    }

    #[test]
    fn renders_lower_case() {
        assert_eq!(Permission::Always.to_string(), "always");
    }
}
