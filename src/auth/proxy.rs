//! Verification of query parameters signed by the upstream forwarder.
//!
//! The forwarder removes nothing and adds a `signature` parameter: the hex
//! HMAC of every other parameter, sorted by key and concatenated as
//! `key=value` with no separator. Identity parameters such as `shop` are only
//! trusted after that signature checks out.

use std::collections::BTreeMap;
use std::fmt;

use super::canonical;
use super::error::AuthError;
use super::replay;
use super::signature::{self, SignatureEncoding};

/// Query parameter holding the hex signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Query parameter some forwarders include with the request time, in seconds.
pub const TIMESTAMP_PARAM: &str = "timestamp";

/// Parameter conventionally carrying the tenant identifier.
pub const DEFAULT_IDENTITY_PARAM: &str = "shop";

/// Decoded query parameters with the signature split out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyQuery {
    params: BTreeMap<String, String>,
    signature: String,
}

impl ProxyQuery {
    /// Build from already-decoded pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut params = canonical::collect_params(pairs);
        let signature = params
            .remove(SIGNATURE_PARAM)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingCredentials("signature"))?;
        Ok(Self { params, signature })
    }

    /// Build from a raw (percent-encoded) query string, with or without `?`.
    pub fn from_query_string(raw: &str) -> Result<Self, AuthError> {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        Self::from_pairs(url::form_urlencoded::parse(raw.as_bytes()))
    }

    /// Parameters covered by the signature.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// What is safe to log about this query.
    pub fn diagnostics(&self) -> ProxyDiagnostics {
        ProxyDiagnostics {
            param_names: self.params.keys().cloned().collect(),
            has_timestamp: self.params.contains_key(TIMESTAMP_PARAM),
            signature_len: self.signature.len(),
        }
    }
}

/// Log-safe summary of a proxy query. Never holds the signature itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDiagnostics {
    pub param_names: Vec<String>,
    pub has_timestamp: bool,
    pub signature_len: usize,
}

impl fmt::Display for ProxyDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "params=[{}] timestamp={} signature_len={}",
            self.param_names.join(","),
            self.has_timestamp,
            self.signature_len
        )
    }
}

/// Parameters that passed verification, with the identity pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProxy {
    pub identity: Option<String>,
    pub params: BTreeMap<String, String>,
}

/// Compute the signature the forwarder attaches to `params`.
pub fn sign_params(secret: &[u8], params: &BTreeMap<String, String>) -> String {
    signature::sign(
        secret,
        canonical::query(params).as_bytes(),
        SignatureEncoding::Hex,
    )
}

/// Verify the forwarder's signature and extract `identity_param`.
pub fn verify_proxy(
    secret: &[u8],
    query: &ProxyQuery,
    identity_param: &str,
) -> Result<VerifiedProxy, AuthError> {
    let message = canonical::query(&query.params);
    if !signature::verify(
        secret,
        message.as_bytes(),
        &query.signature,
        SignatureEncoding::Hex,
    ) {
        return Err(AuthError::SignatureMismatch);
    }

    Ok(VerifiedProxy {
        identity: query.params.get(identity_param).cloned(),
        params: query.params.clone(),
    })
}

/// Optional freshness check on the forwarder's `timestamp` parameter.
///
/// Requests without the parameter pass; the forwarder does not always send it.
pub fn check_timestamp_param(
    query: &ProxyQuery,
    max_age_secs: u64,
    now_ms: i64,
) -> Result<(), AuthError> {
    let Some(raw) = query.params.get(TIMESTAMP_PARAM) else {
        return Ok(());
    };
    let secs = replay::parse_timestamp(Some(raw.as_str()))?;
    let timestamp_ms = secs.saturating_mul(1000);
    let tolerance_ms = i64::try_from(max_age_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    if replay::check_freshness(timestamp_ms, now_ms, tolerance_ms) {
        Ok(())
    } else {
        Err(AuthError::ExpiredTimestamp {
            drift_ms: now_ms.saturating_sub(timestamp_ms).saturating_abs(),
        })
    }
}
