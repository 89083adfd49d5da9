use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::config::AppConfig;
use crate::entity::user;
use crate::error::{store, AppError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    fn from_column(role: Option<&str>) -> Self {
        match role {
            Some(r) if r.eq_ignore_ascii_case("ADMIN") => Role::Admin,
            _ => Role::User,
        }
    }
}

/// The authenticated caller. Authorization decisions read `role` only.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolves to `None` when the token is absent or invalid; the service decides
/// whether a caller is required.
#[derive(Clone, Debug)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl FromRequest for OptionalAuthUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some((db, config)) = app_state(req) else {
            return Box::pin(async { Ok(OptionalAuthUser(None)) });
        };
        let token = extract_token(req, &config);

        Box::pin(async move {
            if let Some(token) = token {
                let auth = authenticate_token(&db, &config, &token).await.ok();
                return Ok(OptionalAuthUser(auth));
            }
            Ok(OptionalAuthUser(None))
        })
    }
}

fn app_state(req: &HttpRequest) -> Option<(web::Data<DatabaseConnection>, web::Data<AppConfig>)> {
    let db = req.app_data::<web::Data<DatabaseConnection>>()?.clone();
    let config = req.app_data::<web::Data<AppConfig>>()?.clone();
    Some((db, config))
}

fn extract_token(req: &HttpRequest, config: &AppConfig) -> Option<String> {
    let header = config.token_header.as_str();
    req.headers()
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn authenticate_token(
    db: &DatabaseConnection,
    config: &AppConfig,
    token: &str,
) -> Result<AuthUser, AppError> {
    let claims = decode_jwt(config, token)?;
    let user_id = extract_user_id(&claims).ok_or_else(AppError::need_login)?;
    let user_model = user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(store("load caller"))?
        .ok_or_else(AppError::need_login)?;

    Ok(AuthUser {
        user_id: user_model.id,
        role: Role::from_column(user_model.role.as_deref()),
    })
}

fn decode_jwt(config: &AppConfig, token: &str) -> Result<serde_json::Value, AppError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    decode::<serde_json::Value>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::need_login())
}

fn extract_user_id(claims: &serde_json::Value) -> Option<i32> {
    for key in ["loginId", "userId", "id", "sub", "login_id"] {
        if let Some(value) = claims.get(key) {
            if let Some(id) = value.as_i64() {
                return i32::try_from(id).ok();
            }
            if let Some(s) = value.as_str() {
                if let Ok(id) = s.parse::<i32>() {
                    return Some(id);
                }
            }
        }
    }
    None
}
