//! Stateless password-reset tokens.
//!
//! A token is `<issued-at in base36>-<truncated HMAC-SHA256>`. The MAC covers
//! the user's id, email, password hash, and last login, so a token stops
//! verifying as soon as the password changes or the user logs in again.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

const KEY_SALT: &str = "skycrm.auth.password-reset";
const MAC_BYTES: usize = 20;

pub const VALIDITY_DAYS: i64 = 3;

pub fn make_token(user: &User, secret: &str, now: DateTime<Utc>) -> Result<String, String> {
    let issued_at = u64::try_from(now.timestamp())
        .map_err(|_| "Reset token timestamp predates the epoch".to_string())?;
    let mac = mac_hex(user, secret, issued_at)?;
    Ok(format!("{}-{mac}", to_base36(issued_at)))
}

pub fn check_token(user: &User, token: &str, secret: &str, now: DateTime<Utc>) -> bool {
    let Some((ts_part, mac_part)) = token.split_once('-') else {
        return false;
    };
    let Some(issued_at) = from_base36(ts_part) else {
        return false;
    };
    let Ok(expected) = mac_hex(user, secret, issued_at) else {
        return false;
    };
    if !bool::from(expected.as_bytes().ct_eq(mac_part.as_bytes())) {
        return false;
    }

    let Some(issued) = i64::try_from(issued_at)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    else {
        return false;
    };
    now - issued <= Duration::days(VALIDITY_DAYS)
}

/// Opaque user reference carried in reset links.
pub fn encode_uid(user_id: Uuid) -> String {
    hex::encode(user_id.as_bytes())
}

pub fn decode_uid(uid: &str) -> Option<Uuid> {
    let bytes = hex::decode(uid).ok()?;
    Uuid::from_slice(&bytes).ok()
}

fn mac_hex(user: &User, secret: &str, issued_at: u64) -> Result<String, String> {
    let key = format!("{KEY_SALT}{secret}");
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| format!("Invalid reset key: {e}"))?;

    let last_login = user
        .last_login
        .map(|t| t.timestamp_micros().to_string())
        .unwrap_or_default();

    mac.update(user.id.as_bytes());
    mac.update(user.password_hash.as_bytes());
    mac.update(last_login.as_bytes());
    mac.update(user.email.as_bytes());
    mac.update(issued_at.to_string().as_bytes());

    let digest = mac.finalize().into_bytes();
    Ok(hex::encode(&digest[..MAC_BYTES]))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(s: &str) -> Option<u64> {
    // 12 base36 digits always fit in a u64
    if s.is_empty() || s.len() > 12 {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            password_hash: "$argon2id$v=19$stub".to_string(),
            is_active: true,
            is_deleted: false,
            is_superuser: false,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn fresh_token_verifies() {
        let user = user();
        let now = Utc::now();
        let token = make_token(&user, "secret", now).unwrap();
        assert!(check_token(&user, &token, "secret", now + Duration::hours(1)));
    }

    #[test]
    fn token_expires_after_three_days() {
        let user = user();
        let issued = Utc::now() - Duration::days(VALIDITY_DAYS) - Duration::minutes(1);
        let token = make_token(&user, "secret", issued).unwrap();
        assert!(!check_token(&user, &token, "secret", Utc::now()));
    }

    #[test]
    fn password_change_invalidates_token() {
        let mut user = user();
        let now = Utc::now();
        let token = make_token(&user, "secret", now).unwrap();

        user.password_hash = "$argon2id$v=19$changed".to_string();
        assert!(!check_token(&user, &token, "secret", now));
    }

    #[test]
    fn login_invalidates_token() {
        let mut user = user();
        let now = Utc::now();
        let token = make_token(&user, "secret", now).unwrap();

        user.last_login = Some(now);
        assert!(!check_token(&user, &token, "secret", now));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let user = user();
        let now = Utc::now();
        for token in ["", "-", "abc", "zzzzzzzzzzzzzzzz-00", "1-deadbeef"] {
            assert!(!check_token(&user, token, "secret", now), "{token}");
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user = user();
        let now = Utc::now();
        let token = make_token(&user, "secret", now).unwrap();
        assert!(!check_token(&user, &token, "another", now));
    }

    #[test]
    fn uid_round_trips() {
        let id = Uuid::new_v4();
        assert_eq!(decode_uid(&encode_uid(id)), Some(id));
        assert_eq!(decode_uid("not-hex"), None);
        assert_eq!(decode_uid("abcd"), None);
    }

    #[test]
    fn base36_matches_radix_parsing() {
        for n in [0u64, 1, 35, 36, 1_700_000_000] {
            assert_eq!(from_base36(&to_base36(n)), Some(n));
        }
    }

    #[test]
    fn base36_length_bound() {
        assert_eq!(from_base36("zzzzzzzzzzzz"), Some(36u64.pow(12) - 1));
        assert_eq!(to_base36(u64::MAX), "3w5e11264sgsf");
        assert_eq!(from_base36("3w5e11264sgsf"), None);
    }
}
