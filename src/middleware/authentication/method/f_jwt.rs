use crate::configuration::Settings;
use crate::middleware::authentication::get_header;
use crate::middleware::authentication::jwt::{
    extract_bearer_token, user_from_jwt_claims, validate_jwt_expiration, verify_jwt,
};
use actix_web::{dev::ServiceRequest, web, HttpMessage};
use std::sync::Arc;

#[tracing::instrument(name = "Authenticate with JWT", skip(req))]
pub async fn try_jwt(req: &mut ServiceRequest) -> Result<bool, String> {
    let authorization = match get_header::<String>(req, "authorization")? {
        Some(authorization) => authorization,
        None => return Ok(false),
    };

    let token = match extract_bearer_token(&authorization) {
        Ok(token) => token,
        Err(_) => return Ok(false),
    };

    let secret = match req.app_data::<web::Data<Settings>>() {
        Some(settings) => settings.auth.jwt_secret.clone(),
        None => {
            tracing::error!("settings are not registered, cannot verify tokens");
            return Err("authentication is not configured".to_string());
        }
    };

    let claims = verify_jwt(token, secret.as_bytes()).map_err(|err| {
        tracing::warn!("JWT rejected: {}", err);
        "invalid token".to_string()
    })?;
    validate_jwt_expiration(&claims)?;

    let user = user_from_jwt_claims(&claims);
    if req.extensions_mut().insert(Arc::new(user)).is_some() {
        return Err("user already logged".to_string());
    }

    tracing::info!("JWT authentication successful for role: {}", claims.role);
    Ok(true)
}
