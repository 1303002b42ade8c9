//! Canonical byte encodings fed to the MAC.
//!
//! Signer and verifier must build exactly the same bytes. Two modes exist and
//! are never mixed: structured mode for envelopes and query mode for proxy
//! parameters.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of the payload field inside the signed envelope material.
///
/// Requests sign `{"body": .., "timestamp": ..}` and responses sign
/// `{"data": .., "timestamp": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeField {
    Body,
    Data,
}

impl EnvelopeField {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeField::Body => "body",
            EnvelopeField::Data => "data",
        }
    }
}

struct SignedMaterial<'a> {
    field: EnvelopeField,
    payload: &'a Value,
    timestamp_ms: i64,
}

impl Serialize for SignedMaterial<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.field.as_str(), self.payload)?;
        map.serialize_entry("timestamp", &self.timestamp_ms)?;
        map.end()
    }
}

/// Structured mode: compact JSON of `{<field>: payload, "timestamp": ts}`.
///
/// Object keys inside `payload` keep the order they were parsed or built in.
pub fn structured(field: EnvelopeField, payload: &Value, timestamp_ms: i64) -> Vec<u8> {
    let material = SignedMaterial {
        field,
        payload,
        timestamp_ms,
    };
    serde_json::to_vec(&material).expect("JSON values with string keys always serialize")
}

/// Query mode: keys sorted, each pair rendered `key=value`, no separator.
///
/// The caller is responsible for leaving the signature parameter out.
pub fn query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect()
}

/// Collect decoded query pairs into the map that query mode signs.
///
/// A key that repeats keeps one entry, its values joined with `,` in arrival
/// order.
pub fn collect_params<I, K, V>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut params: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in pairs {
        params
            .entry(key.into())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(value.as_ref());
            })
            .or_insert_with(|| value.as_ref().to_string());
    }
    params
}
