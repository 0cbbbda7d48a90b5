use crate::{
    auth::jwt::verify_token,
    config::Config,
    error::{AppError, AppResult},
    models::{Claims, TokenType},
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, http::header, web::Data};
use anyhow::anyhow;
use futures::future::{Ready, ready};
use tracing::debug;
use uuid::Uuid;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.sub,
        }
    }
}

/// Reads and verifies the bearer access token of a request.
pub fn bearer_claims(req: &HttpRequest, secret: &str) -> AppResult<Claims> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;

    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Authorization header must start with Bearer".to_string())
    })?;

    let claims = verify_token(token, secret).map_err(|e| {
        debug!(error = %e, "token rejected");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized(
            "Access token required".to_string(),
        ));
    }

    Ok(claims)
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::Internal(anyhow!("App config missing"))));
        };

        ready(bearer_claims(req, &config.jwt_secret).map(AuthUser::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_token;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_claims_map_to_caller() {
        let user = Uuid::new_v4();
        let token = issue_token(user, TokenType::Access, "secret", 60);
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_http_request();

        let caller = AuthUser::from(bearer_claims(&req, "secret").unwrap());
        assert_eq!(caller.user_id, user);
        assert_eq!(caller.username, format!("user-{user}"));
    }

    #[test]
    fn test_refresh_token_rejected() {
        let token = issue_token(Uuid::new_v4(), TokenType::Refresh, "secret", 60);
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_http_request();
        assert!(matches!(
            bearer_claims(&req, "secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
