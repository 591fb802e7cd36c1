// src/web/handlers/auth_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

use crate::error::OAuthError;
use crate::oauth::OAuthClient;
use crate::web::types::*;

fn oauth_error(e: OAuthError) -> ApiError {
    let (status, suggestions): (Status, &[&str]) = match &e {
        OAuthError::NotConfigured => (
            Status::ServiceUnavailable,
            &["Set LINKEDIN_CLIENT_ID and LINKEDIN_CLIENT_SECRET"],
        ),
        OAuthError::InvalidState => (
            Status::BadRequest,
            &["Start the login again from /auth/linkedin/login"],
        ),
        OAuthError::Exchange(_) => (
            Status::BadGateway,
            &["Check the redirect URI registered with LinkedIn"],
        ),
        OAuthError::Store(_) => (Status::InternalServerError, &["Try again in a few moments"]),
    };
    error!("OAuth error: {}", e);
    api_error(status, e.to_string(), e.error_code(), suggestions)
}

fn client(state: &ServerState) -> Result<&OAuthClient, ApiError> {
    state
        .oauth
        .as_ref()
        .ok_or_else(|| oauth_error(OAuthError::NotConfigured))
}

pub async fn login_handler(
    user_id: Option<String>,
    state: &State<ServerState>,
) -> Result<Json<AuthLoginResponse>, ApiError> {
    let client = client(state)?;
    let user_id = user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let (authorization_url, oauth_state) = client
        .authorization_url(&user_id)
        .await
        .map_err(oauth_error)?;

    Ok(Json(AuthLoginResponse {
        success: true,
        authorization_url,
        state: oauth_state,
        user_id,
    }))
}

pub async fn callback_handler(
    code: Option<String>,
    oauth_state: Option<String>,
    denied: Option<String>,
    state: &State<ServerState>,
) -> Result<Json<AuthCallbackResponse>, ApiError> {
    let client = client(state)?;

    if let Some(reason) = denied {
        warn!("LinkedIn authorization denied: {}", reason);
        return Err(api_error(
            Status::BadRequest,
            format!("Authorization denied: {}", reason),
            "OAUTH_DENIED",
            &["Approve the requested permissions on LinkedIn"],
        ));
    }

    let (Some(code), Some(oauth_state)) = (code, oauth_state) else {
        return Err(api_error(
            Status::BadRequest,
            "Missing code or state parameter",
            "BAD_REQUEST",
            &["This endpoint is called by LinkedIn after login"],
        ));
    };

    let (user_id, token) = client
        .exchange_code(&code, &oauth_state)
        .await
        .map_err(oauth_error)?;

    info!("LinkedIn login completed for user: {}", user_id);
    Ok(Json(AuthCallbackResponse {
        success: true,
        message: "LinkedIn authentication successful".to_string(),
        user_id,
        expires_in: token.expires_in,
    }))
}

pub async fn status_handler(
    user_id: &str,
    state: &State<ServerState>,
) -> Result<Json<AuthStatusResponse>, ApiError> {
    let client = client(state)?;
    let authenticated = client
        .tokens()
        .is_authenticated(user_id)
        .await
        .map_err(|e| oauth_error(OAuthError::Store(e)))?;

    Ok(Json(AuthStatusResponse {
        success: true,
        user_id: user_id.to_string(),
        authenticated,
    }))
}

pub async fn logout_handler(
    user_id: &str,
    state: &State<ServerState>,
) -> Result<Json<ActionResponse>, ApiError> {
    let client = client(state)?;
    let removed = client
        .tokens()
        .remove_token(user_id)
        .await
        .map_err(|e| oauth_error(OAuthError::Store(e)))?;

    let message = if removed {
        format!("Logged out user: {}", user_id)
    } else {
        format!("No active session for user: {}", user_id)
    };
    Ok(Json(ActionResponse {
        success: true,
        message,
    }))
}
