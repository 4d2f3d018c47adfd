use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub email: String,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
}

pub fn sign_session(email: &str, key: &[u8]) -> Result<String, SessionError> {
    let exp = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
    let payload = format!("{}|{}", email, exp.timestamp());
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    ))
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(SessionError::Invalid);
    }
    let payload_bytes = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SessionError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| SessionError::Invalid)?;
    let (email, exp_raw) = payload.rsplit_once('|').ok_or(SessionError::Invalid)?;
    let exp: i64 = exp_raw.parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims {
        email: email.to_string(),
        exp,
    })
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                if let Some(rest) = pair.trim().strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

/// Axum extractor gating the dashboard routes: a valid session cookie whose
/// subject is the configured admin account.
pub struct AdminSession(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    crate::state::SharedState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared = crate::state::SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;
        let claims = verify_session(&token, &shared.session_key).map_err(|e| {
            tracing::warn!("session verification failed: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        if claims.email != shared.admin_email {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(AdminSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-session-key-test-session-ke";

    #[test]
    fn sign_and_verify_round_trip() {
        let token = sign_session("admin@example.com", KEY).unwrap();
        let claims = verify_session(&token, KEY).unwrap();
        assert_eq!(claims.email, "admin@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn rejects_tampered_token() {
        let token = sign_session("admin@example.com", KEY).unwrap();
        let forged = sign_session("intruder@example.com", b"other-key-other-key-other-key-ot").unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let (payload, _) = forged.split_once('.').unwrap();
        let spliced = format!("{payload}.{sig}");
        assert!(matches!(
            verify_session(&spliced, KEY),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn rejects_garbage_token() {
        assert!(matches!(
            verify_session("definitely.not-a-token", KEY),
            Err(SessionError::Invalid)
        ));
        assert!(matches!(verify_session("nodot", KEY), Err(SessionError::Invalid)));
    }

    #[test]
    fn extracts_cookie_and_bearer_tokens() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; session=tok123".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok123"));

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer tok456".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok456"));
    }
}
