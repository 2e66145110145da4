use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::tokens::Identity;
use crate::db::models::{Role, User};
use crate::AppState;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("received registration request");

    let user = state
        .auth_service
        .register(&req.full_name, &req.email, &req.password, req.role)
        .await?;

    Ok(HttpResponse::Created().json(UserSummary::from(user)))
}

pub async fn login(
    http_req: HttpRequest,
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let device_fingerprint = http_req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let pair = state
        .auth_service
        .login(&req.email, &req.password, device_fingerprint)
        .await?;

    Ok(HttpResponse::Ok().json(pair))
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let pair = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(HttpResponse::Ok().json(pair))
}

/// Always 200: a stale or malformed refresh token makes logout a no-op, not
/// an error.
pub async fn logout(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    state.auth_service.logout(&req.refresh_token).await;
    HttpResponse::Ok().json(json!({ "message": "Successfully logged out" }))
}

/// Gate-protected: revokes every session of the authenticated caller.
pub async fn logout_all(
    identity: Identity,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.auth_service.logout_all(identity.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "All sessions revoked" })))
}
