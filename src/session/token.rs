//! Access token payload decoding and expiry checks.
//!
//! Tokens are compact JWTs (`header.payload.signature`). Only the payload is
//! decoded; the signature is never verified here because the server is the
//! trust boundary. Decoded claims are a display and routing aid, not proof of
//! identity.

use crate::error::{Error, Result};
use base64ct::{Base64Unpadded, Encoding};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Privilege tier carried in the `role` claim.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    #[serde(other)]
    Unknown,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Decoded access token payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(default, deserialize_with = "role_or_default")]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
}

impl Claims {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        is_expired(self.exp)
    }

    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        is_expired_at(self.exp, now)
    }
}

// The backend emits `"role": null` for accounts without a tier.
fn role_or_default<'de, D>(deserializer: D) -> std::result::Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Role>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode the payload segment of a compact token.
///
/// Both the standard and the URL-safe base64 alphabets are accepted, with or
/// without padding.
///
/// # Errors
/// Returns `Error::MalformedToken` if the token does not have three segments,
/// the payload is not base64, or the decoded payload is not a claims object.
pub fn decode(raw: &str) -> Result<Claims> {
    let mut parts = raw.trim().split('.');
    let _header = parts.next().ok_or(Error::MalformedToken("missing header"))?;
    let payload = parts
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or(Error::MalformedToken("missing payload segment"))?;
    if parts.next().is_none() {
        return Err(Error::MalformedToken("missing signature segment"));
    }
    if parts.next().is_some() {
        return Err(Error::MalformedToken("too many segments"));
    }

    let bytes = decode_segment(payload)?;
    serde_json::from_slice(&bytes).map_err(|_| Error::MalformedToken("payload is not a claims object"))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    let standard: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    Base64Unpadded::decode_vec(&standard).map_err(|_| Error::MalformedToken("payload is not base64"))
}

/// Current wall-clock time in whole seconds since the Unix epoch.
#[must_use]
pub fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

#[must_use]
pub fn is_expired(exp: i64) -> bool {
    is_expired_at(exp, now_seconds())
}

#[must_use]
pub fn is_expired_at(exp: i64, now: i64) -> bool {
    now >= exp
}

/// Build an unsigned token around a JSON payload.
#[cfg(test)]
pub(crate) fn unsigned_token(payload: &serde_json::Value) -> String {
    use base64ct::Base64UrlUnpadded;

    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = Base64UrlUnpadded::encode_string(payload.to_string().as_bytes());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_reads_claims() {
        let token = unsigned_token(&json!({
            "sub": "alice",
            "role": "admin",
            "iat": 1_700_000_000,
            "exp": 1_700_000_900,
            "type": "access"
        }));

        let claims = decode(&token).expect("token should decode");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iat, Some(1_700_000_000));
        assert_eq!(claims.exp, 1_700_000_900);
        assert_eq!(claims.token_type, Some(TokenType::Access));
    }

    #[test]
    fn decode_defaults_missing_and_null_role() {
        let token = unsigned_token(&json!({"sub": "bob", "exp": 10}));
        let claims = decode(&token).expect("token should decode");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iat, None);
        assert_eq!(claims.token_type, None);

        let token = unsigned_token(&json!({"sub": "bob", "role": null, "exp": 10}));
        assert_eq!(decode(&token).map(|c| c.role), Ok(Role::User));

        let token = unsigned_token(&json!({"sub": "bob", "role": "auditor", "exp": 10}));
        assert_eq!(decode(&token).map(|c| c.role), Ok(Role::Unknown));
    }

    #[test]
    fn decode_accepts_both_alphabets_and_padding() {
        // `?~` in a string encodes to bytes whose base64 contains `+`/`/`.
        let payload = json!({"sub": "??>>~~", "exp": 42});
        let url_safe = unsigned_token(&payload);
        let segment = url_safe.split('.').nth(1).unwrap_or_default().to_string();
        assert!(segment.contains('-') || segment.contains('_'));

        let standard_segment: String = segment
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        let padding = "=".repeat((4 - standard_segment.len() % 4) % 4);
        let standard = format!("e30.{standard_segment}{padding}.sig");

        assert_eq!(decode(&url_safe).map(|c| c.sub), Ok("??>>~~".to_string()));
        assert_eq!(decode(&standard).map(|c| c.sub), Ok("??>>~~".to_string()));
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        let not_json = format!(
            "e30.{}.sig",
            base64ct::Base64UrlUnpadded::encode_string(b"not json")
        );
        let not_claims = format!(
            "e30.{}.sig",
            base64ct::Base64UrlUnpadded::encode_string(br#"{"sub":"x"}"#)
        );

        for raw in [
            "",
            "no-separator",
            "header.",
            "header..sig",
            "a.b.c.d",
            "e30.***.sig",
            not_json.as_str(),
            not_claims.as_str(),
        ] {
            assert!(
                matches!(decode(raw), Err(Error::MalformedToken(_))),
                "expected MalformedToken for {raw:?}"
            );
        }
    }

    #[test]
    fn expiry_is_inclusive_of_exp() {
        let token = unsigned_token(&json!({"sub": "alice", "exp": 1_000}));
        let claims = decode(&token).expect("token should decode");

        assert!(!claims.is_expired_at(999));
        assert!(claims.is_expired_at(1_000));
        assert!(claims.is_expired_at(1_001));
    }

    #[test]
    fn wall_clock_expiry() {
        assert!(is_expired(now_seconds() - 1));
        assert!(!is_expired(now_seconds() + 3_600));
    }
}
