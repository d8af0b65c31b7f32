//! Seed (de)serialization: emitted as a string so large seeds survive
//! JSON tooling that narrows numbers, accepted back as string or number.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(seed: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&seed.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeedRepr {
        Text(String),
        Numeric(u64),
    }

    match SeedRepr::deserialize(deserializer)? {
        SeedRepr::Text(raw) => raw.parse::<u64>().map_err(D::Error::custom),
        SeedRepr::Numeric(seed) => Ok(seed),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Seeded {
        #[serde(with = "super")]
        seed: u64,
    }

    #[test]
    fn accepts_string_and_number_forms() {
        let from_text: Seeded = serde_json::from_str(r#"{"seed":"42"}"#).expect("string seed");
        let from_number: Seeded = serde_json::from_str(r#"{"seed":42}"#).expect("numeric seed");
        assert_eq!(from_text, from_number);
    }

    #[test]
    fn serializes_as_string() {
        let encoded = serde_json::to_string(&Seeded { seed: 1337 }).expect("serialize");
        assert_eq!(encoded, r#"{"seed":"1337"}"#);
    }

    #[test]
    fn rejects_non_numeric_text() {
        let parsed: Result<Seeded, _> = serde_json::from_str(r#"{"seed":"abc"}"#);
        assert!(parsed.is_err());
    }
}
