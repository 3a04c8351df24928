use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Strongly typed identifier for one routing call, backed by ULID.
///
/// Every log line emitted while routing a URL carries the same id, as does the
/// [`HandlerRequest`](crate::dispatcher::HandlerRequest) passed to the handler.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RoutingId(pub ulid::Ulid);

impl RoutingId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(id)
    }
}

impl Default for RoutingId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoutingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoutingId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(RoutingId(id))
    }
}

impl Serialize for RoutingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RoutingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RoutingId>()
            .map_err(|_| serde::de::Error::custom("invalid routing id"))
    }
}

#[cfg(test)]
mod tests {
    use super::RoutingId;

    #[test]
    fn test_routing_id_round_trips_through_string() {
        let id = RoutingId::new();
        let parsed: RoutingId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_routing_id_rejects_garbage() {
        assert!("not-a-ulid".parse::<RoutingId>().is_err());
        let err = serde_json::from_str::<RoutingId>("\"nope\"").unwrap_err();
        assert!(err.to_string().contains("invalid routing id"));
    }
}
