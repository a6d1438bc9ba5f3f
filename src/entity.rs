use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of marketplace object a conversation is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Vehicle,
    Auction,
    SearchRequest,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Vehicle => "vehicle",
            EntityKind::Auction => "auction",
            EntityKind::SearchRequest => "search_request",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vehicle" => Ok(EntityKind::Vehicle),
            "auction" => Ok(EntityKind::Auction),
            "search_request" => Ok(EntityKind::SearchRequest),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

/// Reference to the marketplace object a conversation is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn vehicle(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Vehicle, id)
    }

    pub fn auction(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Auction, id)
    }

    pub fn search_request(id: impl Into<String>) -> Self {
        Self::new(EntityKind::SearchRequest, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            EntityKind::Vehicle,
            EntityKind::Auction,
            EntityKind::SearchRequest,
        ] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn kind_rejects_unknown_values() {
        assert!("listing".parse::<EntityKind>().is_err());
        assert!("".parse::<EntityKind>().is_err());
    }

    #[test]
    fn kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&EntityKind::SearchRequest).unwrap();
        assert_eq!(json, "\"search_request\"");
        let back: EntityKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityKind::SearchRequest);
    }
}
