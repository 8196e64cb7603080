use std::env;
use std::future::Future;

use axum::{
    extract::{FromRequestParts, Json, Path, State},
    http::{header::HeaderMap, request::Parts, StatusCode},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::{
    self,
    models::{NewUser, Role, User, UserPatch},
};
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
    #[serde(rename = "type")]
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "type")]
    pub role: Role,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub token: String,
}

#[derive(Serialize, Clone)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(rename = "type")]
    pub role: Role,
}

// Claims for our JWT
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    email: String,
    role: Role,
}

/// Authenticated principal, resolved from the bearer token. Every core
/// operation receives one explicitly; nothing reads identity from globals.
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync + 'static,
{
    type Rejection = (StatusCode, String);

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let token = extract_token_from_headers(&parts.headers)
                .ok_or((StatusCode::UNAUTHORIZED, "Missing auth token".to_string()))?;
            let claims = decode_claims(&token).map_err(|e| {
                tracing::warn!("Token error: {}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            })?;

            Ok(AuthenticatedUser {
                id: claims.sub,
                email: claims.email,
                role: claims.role,
            })
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&req.name, "Name")?;
    require_field(&req.email, "Email")?;
    require_field(&req.password, "Password")?;
    require_field(&req.phone, "Phone")?;
    require_field(&req.address, "Address")?;

    let hashed = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let user = db::create_user(
        &state.db,
        NewUser {
            name: req.name,
            email: req.email,
            password: hashed,
            phone: req.phone,
            address: req.address,
            role: req.role,
        },
    )
    .await?;

    let token = create_jwt(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&req.email, "Email")?;
    require_field(&req.password, "Password")?;

    let user = db::find_user_by_email_and_role(&state.db, &req.email, req.role)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let matches =
        bcrypt::verify(&req.password, &user.password).map_err(|e| ApiError::Internal(e.into()))?;
    if !matches {
        return Err(ApiError::Unauthorized);
    }

    let token = create_jwt(&user)?;
    Ok(Json(AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let record = db::find_user(&state.db, &user.id).await?;
    Ok(Json(profile(record)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn update_profile(
    Path(id): Path<String>,
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if user.id != id {
        return Err(ApiError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let record = db::find_user(&state.db, &id).await?;

    // A password change requires proof of the current password.
    let password = match req.new_password {
        Some(new_password) => {
            let current = req.current_password.unwrap_or_default();
            let matches = bcrypt::verify(&current, &record.password)
                .map_err(|e| ApiError::Internal(e.into()))?;
            if !matches {
                return Err(ApiError::Validation(
                    "Current password is incorrect".to_string(),
                ));
            }
            let hashed = bcrypt::hash(&new_password, bcrypt::DEFAULT_COST)
                .map_err(|e| ApiError::Internal(e.into()))?;
            Some(hashed)
        }
        None => None,
    };

    let updated = db::update_user(
        &state.db,
        &id,
        UserPatch {
            name: req.name.filter(|s| !s.trim().is_empty()),
            phone: req.phone.filter(|s| !s.trim().is_empty()),
            address: req.address.filter(|s| !s.trim().is_empty()),
            password,
        },
    )
    .await?;
    Ok(Json(profile(updated)))
}

fn profile(user: User) -> UserProfile {
    UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        address: user.address,
        role: user.role,
    }
}

fn require_field(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} field is required")));
    }
    Ok(())
}

fn create_jwt(user: &User) -> Result<String, ApiError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(1))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user.id.clone(),
        exp: expiration as usize,
        email: user.email.clone(),
        role: user.role,
    };

    let secret = env::var("JWT_SECRET")
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("JWT_SECRET environment variable not set")))?;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    auth_header.strip_prefix("Bearer ").map(|t| t.to_string())
}

pub fn validate_token_str(token: &str) -> anyhow::Result<()> {
    decode_claims(token).map(|_| ())
}

fn decode_claims(token: &str) -> anyhow::Result<Claims> {
    let secret = env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;
    Ok(token_data.claims)
}
