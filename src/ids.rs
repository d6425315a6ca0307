use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Strongly typed subscription identifier backed by ULID.
///
/// Returned by `subscribe` and accepted by `unsubscribe`; sortable by
/// registration time thanks to the ULID timestamp component.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct SubscriptionId(pub ulid::Ulid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(id)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(SubscriptionId(id))
    }
}

impl Serialize for SubscriptionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SubscriptionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<SubscriptionId>()
            .map_err(|_| serde::de::Error::custom("invalid subscription id"))
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriptionId;

    #[test]
    fn test_round_trips_through_display_and_parse() {
        let id = SubscriptionId::new();
        let parsed: SubscriptionId = id.to_string().parse().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("not-a-ulid".parse::<SubscriptionId>().is_err());
    }
}
