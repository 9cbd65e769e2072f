//! Deserialization helpers for the inbound log entry schema.
//!
//! Producers serialize nulls explicitly and emit key/value collections either as
//! JSON objects or as `[{"key": .., "value": ..}]` lists, so the plain derives
//! are not enough.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;

/// Treats an explicit JSON `null` like a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered key/value pairs that keep duplicates and source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyValueList<V>(pub Vec<(String, V)>);

impl<V> KeyValueList<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for KeyValueList<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Deserialize)]
struct KeyValueItem<V> {
    #[serde(alias = "Key")]
    key: String,
    #[serde(alias = "Value")]
    value: V,
}

struct KeyValueListVisitor<V>(PhantomData<V>);

impl<'de, V: DeserializeOwned> Visitor<'de> for KeyValueListVisitor<V> {
    type Value = KeyValueList<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object or a list of key/value pairs")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(KeyValueList(Vec::new()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(KeyValueList(Vec::new()))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, V>()? {
            entries.push((key, value));
        }
        Ok(KeyValueList(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<KeyValueItem<V>>()? {
            entries.push((item.key, item.value));
        }
        Ok(KeyValueList(entries))
    }
}

impl<'de, V: DeserializeOwned> Deserialize<'de> for KeyValueList<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(KeyValueListVisitor(PhantomData))
    }
}

/// Raw HTTP body bytes, sent either base64-encoded or as a JSON byte array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawBody(pub Vec<u8>);

impl RawBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for RawBody {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

struct RawBodyVisitor;

impl<'de> Visitor<'de> for RawBodyVisitor {
    type Value = RawBody;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a base64 string or an array of bytes")
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawBody, E> {
        Ok(RawBody::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<RawBody, E> {
        Ok(RawBody::default())
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<RawBody, E> {
        STANDARD
            .decode(value)
            .map(RawBody)
            .map_err(|e| E::custom(format!("invalid base64 body: {e}")))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawBody, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(RawBody(bytes))
    }
}

impl<'de> Deserialize<'de> for RawBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawBodyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_key_value_list_from_object_keeps_order() {
        let list: KeyValueList<Value> =
            serde_json::from_str(r#"{"zeta": 1, "alpha": "two", "mid": null}"#).unwrap();
        let keys: Vec<&str> = list.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_key_value_list_from_pairs_keeps_duplicates() {
        let list: KeyValueList<String> = serde_json::from_str(
            r#"[{"key": "Accept", "value": "a"}, {"Key": "Accept", "Value": "b"}]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.0[1], ("Accept".to_string(), "b".to_string()));
    }

    #[test]
    fn test_raw_body_from_base64_and_array() {
        let from_base64: RawBody = serde_json::from_str(r#""aGVsbG8=""#).unwrap();
        assert_eq!(from_base64.as_bytes(), b"hello");

        let from_array: RawBody = serde_json::from_str("[104, 105]").unwrap();
        assert_eq!(from_array.as_bytes(), b"hi");

        let from_null: RawBody = serde_json::from_str("null").unwrap();
        assert!(from_null.as_bytes().is_empty());
    }
}
