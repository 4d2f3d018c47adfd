use crate::state::SharedState;
use crate::web::session::{self, AdminSession};
use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub email: String,
}

#[derive(Serialize)]
pub struct CurrentSession {
    pub email: String,
    pub expires_at: i64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}

pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

fn session_cookie(value: &str, max_age: Option<i64>) -> String {
    let secure = if std::env::var("PRODUCTION").is_ok() {
        "; Secure"
    } else {
        ""
    };
    match max_age {
        Some(age) => format!("session={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={age}{secure}"),
        None => format!("session={value}; HttpOnly; SameSite=Lax; Path=/{secure}"),
    }
}

async fn login(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let ip = client_ip(&headers);
    if !state.login_limiter.check(&ip).await {
        tracing::warn!("login rate limit exceeded for IP: {}", ip);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    if !payload.email.eq_ignore_ascii_case(&state.admin_email) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let parsed_hash =
        PasswordHash::new(&state.admin_password_hash).map_err(|_| StatusCode::UNAUTHORIZED)?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let token = session::sign_session(&state.admin_email, &state.session_key)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        axum::http::header::SET_COOKIE,
        session_cookie(&token, None)
            .parse()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    );

    tracing::info!("admin login from {}", ip);
    Ok((
        response_headers,
        Json(LoginResponse {
            email: state.admin_email.clone(),
        }),
    ))
}

async fn logout() -> Result<impl IntoResponse, StatusCode> {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::SET_COOKIE,
        session_cookie("", Some(0))
            .parse()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    );
    Ok((headers, StatusCode::NO_CONTENT))
}

async fn me(AdminSession(claims): AdminSession) -> Json<CurrentSession> {
    Json(CurrentSession {
        email: claims.email,
        expires_at: claims.exp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.9".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.0.0.1");
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn logout_cookie_expires_immediately() {
        let cookie = session_cookie("", Some(0));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.starts_with("session=;"));
    }
}
