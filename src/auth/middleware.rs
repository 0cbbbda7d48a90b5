use crate::auth::auth::{AuthUser, bearer_claims};
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let claims = match bearer_claims(req.request(), &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            let resp = e.error_response();
            return Ok(req.into_response(resp));
        }
    };

    let user = AuthUser::from(claims);
    debug!(user_id = %user.user_id, username = %user.username, "request authenticated");
    req.extensions_mut().insert(user);

    next.call(req).await
}
