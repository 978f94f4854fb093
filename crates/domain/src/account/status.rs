//! Frequent-flier status tiers.

use serde::{Deserialize, Serialize};

/// Status tier of a frequent-flier account.
///
/// Tiers are conceptually ranked Red < Silver < Gold, but no ordering is
/// derived: status only changes through explicit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    /// Base tier every account opens with.
    #[default]
    Red,

    /// Intermediate tier, usually granted by a status match.
    Silver,

    /// Top tier.
    Gold,
}

impl Status {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Red => "Red",
            Status::Silver => "Silver",
            Status::Gold => "Gold",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_red() {
        assert_eq!(Status::default(), Status::Red);
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::Red.to_string(), "Red");
        assert_eq!(Status::Silver.to_string(), "Silver");
        assert_eq!(Status::Gold.to_string(), "Gold");
    }

    #[test]
    fn test_serializes_as_variant_name() {
        let json = serde_json::to_string(&Status::Silver).unwrap();
        assert_eq!(json, "\"Silver\"");
        let status: Status = serde_json::from_str("\"Gold\"").unwrap();
        assert_eq!(status, Status::Gold);
    }
}
