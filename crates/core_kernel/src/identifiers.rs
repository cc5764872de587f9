//! Strongly-typed identifiers
//!
//! Audit runs are keyed by UUID newtypes. Line items carry a readable
//! positional identifier (`bill-3`, `eob-1`) that findings reference as
//! evidence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(AuditId, "AUD");

/// Which document a line item was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    Bill,
    Eob,
}

impl LineSource {
    /// Returns the lowercase tag used in line identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            LineSource::Bill => "bill",
            LineSource::Eob => "eob",
        }
    }
}

impl fmt::Display for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a normalized line item, e.g. `bill-2`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    /// Creates the identifier for the 1-based `position` within a document
    pub fn new(source: LineSource, position: usize) -> Self {
        Self(format!("{}-{}", source.as_str(), position))
    }

    /// Returns the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the source document encoded in the identifier, if recognizable
    pub fn source(&self) -> Option<LineSource> {
        if self.0.starts_with("bill-") {
            Some(LineSource::Bill)
        } else if self.0.starts_with("eob-") {
            Some(LineSource::Eob)
        } else {
            None
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_id_display() {
        let id = AuditId::new();
        assert!(id.to_string().starts_with("AUD-"));
    }

    #[test]
    fn test_audit_id_parsing() {
        let original = AuditId::new_v7();
        let parsed: AuditId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_line_id_format() {
        let id = LineId::new(LineSource::Bill, 3);
        assert_eq!(id.as_str(), "bill-3");
        assert_eq!(id.source(), Some(LineSource::Bill));
        assert_eq!(LineId::from("eob-1").source(), Some(LineSource::Eob));
        assert_eq!(LineId::from("other").source(), None);
    }
}
