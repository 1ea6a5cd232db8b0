use crate::configuration::Settings;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::web;
use std::sync::Arc;

/// The authenticated user when their role is one of the configured admin roles, 403 otherwise.
pub fn admin_user(
    user: Option<web::ReqData<Arc<models::User>>>,
    settings: &Settings,
) -> Result<Arc<models::User>, actix_web::Error> {
    match user {
        Some(user) if user.has_role(&settings.auth.admin_roles) => Ok(user.into_inner()),
        Some(user) => {
            tracing::info!("User {} with role {} denied admin access", user.id, user.role);
            Err(JsonResponse::<()>::build().forbidden("Admin role required"))
        }
        None => Err(JsonResponse::<()>::build().forbidden("Authentication required")),
    }
}
