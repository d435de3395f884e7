use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::user::UserView;
use crate::service::user;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ProfileImage {
    #[schema(example = "uploads/profiles/7.png")]
    pub path: String,
}

async fn load(pool: &MySqlPool, user_id: u64) -> Result<crate::model::user::User, AppError> {
    user::find(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "The caller's profile", body = UserView),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let me = load(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(UserView::from(me)))
}

/// Self-service update of name, email, password and personal details.
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body(content = Object, example = json!({ "phoneNumber": "+91 98450 12345", "bloodGroup": "O+" })),
    responses(
        (status = 200, description = "Updated profile", body = UserView),
        (status = 400, description = "Field not editable or bad value"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let updated = user::update_profile(pool.get_ref(), auth.user_id, &payload).await?;
    tracing::info!(user_id = auth.user_id, "Profile updated");
    Ok(HttpResponse::Ok().json(UserView::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/profile/image",
    request_body = ProfileImage,
    responses(
        (status = 200, description = "Image path recorded", body = UserView),
        (status = 400, description = "Empty path"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn set_image(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ProfileImage>,
) -> actix_web::Result<impl Responder> {
    let path = payload.path.trim();
    if path.is_empty() {
        return Err(AppError::validation("Image path is required").into());
    }

    user::set_profile_image(pool.get_ref(), auth.user_id, Some(path)).await?;
    let me = load(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(UserView::from(me)))
}

#[utoipa::path(
    delete,
    path = "/api/profile/image",
    responses(
        (status = 200, description = "Image cleared"),
        (status = 400, description = "No profile image to remove"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn remove_image(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let me = load(pool.get_ref(), auth.user_id).await?;
    if me.profile_image.is_none() {
        return Err(AppError::validation("No profile image to remove").into());
    }

    user::set_profile_image(pool.get_ref(), auth.user_id, None).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Profile image removed" })))
}
