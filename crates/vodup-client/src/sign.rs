//! Signed query construction for control-plane requests.
//!
//! The control plane authenticates GET requests with an HMAC-SHA256
//! signature over `method + host + path + "?" + sorted query string`,
//! base64-encoded and appended as the `Signature` parameter.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

const SIGNATURE_METHOD: &str = "HmacSHA256";

/// Immutable signing configuration for one upload invocation.
///
/// Built by the client from its construction-time configuration and passed
/// explicitly to each remote caller; nothing here is shared mutable state.
#[derive(Debug, Clone)]
pub struct SigningContext {
    pub secret_id: String,
    pub secret_key: String,
    pub method: String,
    /// Validity of the temporary storage credentials requested alongside
    /// the signature, not of the request signature itself.
    pub expires_in: Duration,
}

impl SigningContext {
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        method: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            method: method.into(),
            expires_in,
        }
    }
}

/// Build the full signed query for a request: the caller's parameters plus
/// the common auth parameters and the trailing `Signature`.
pub fn signed_query(
    ctx: &SigningContext,
    host: &str,
    path: &str,
    params: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let nonce: u32 = rand::random();

    let mut sorted: BTreeMap<String, String> = params.into_iter().collect();
    sorted.insert("SecretId".to_string(), ctx.secret_id.clone());
    sorted.insert("SignatureMethod".to_string(), SIGNATURE_METHOD.to_string());
    sorted.insert("Timestamp".to_string(), timestamp.to_string());
    sorted.insert("Nonce".to_string(), nonce.to_string());

    let canonical = canonical_string(&ctx.method, host, path, &sorted);
    let signature = signature(&ctx.secret_key, &canonical);

    let mut query: Vec<(String, String)> = sorted.into_iter().collect();
    query.push(("Signature".to_string(), signature));
    query
}

/// Canonical request string: the signature is computed over the plain
/// (unencoded) sorted query.
fn canonical_string(
    method: &str,
    host: &str,
    path: &str,
    params: &BTreeMap<String, String>,
) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{method}{host}{path}?{joined}")
}

fn signature(secret_key: &str, canonical: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret_key.as_bytes())
        .expect("HMAC accepts any key size");
    mac.update(canonical.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
