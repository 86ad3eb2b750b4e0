//! Token payload decoding.
//!
//! Only the payload segment is read. Signatures are never checked here;
//! the server verifies them on every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identity and expiry claims embedded in a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry in seconds since the Unix epoch.
    #[serde(default, deserialize_with = "deserialize_exp")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// True when there is no expiry claim or `now_secs` has reached it.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        self.exp.is_none_or(|exp| now_secs >= exp)
    }

    /// Best display name for the token holder.
    pub fn display_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.sub.as_deref())
            .or_else(|| self.extra.get("AUsername").and_then(Value::as_str))
    }
}

/// Decodes the claims of a `header.payload.signature` token.
///
/// Returns `None` for anything that is not three segments with a base64url
/// JSON object in the middle. Padded payloads are accepted.
pub fn decode(token: &str) -> Option<Claims> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload = parts[1].trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let json: Value = serde_json::from_slice(&decoded).ok()?;
    if !json.is_object() {
        return None;
    }
    serde_json::from_value(json).ok()
}

// `exp` is a NumericDate and may legally carry a fractional part.
fn deserialize_exp<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        _ => None,
    })
}

#[cfg(test)]
pub(crate) fn encode_unsigned(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}
