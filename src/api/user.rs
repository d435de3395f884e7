use crate::auth::auth::AuthUser;
use crate::model::user::UserView;
use crate::service::user::{self, CreateUser};
use actix_web::{HttpResponse, Responder, web};
use serde_json::Value;
use sqlx::MySqlPool;

/// HR sees employees and interns; the CEO sees everybody.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users visible to the caller", body = [UserView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let users: Vec<UserView> = user::list(pool.get_ref(), &auth)
        .await?
        .into_iter()
        .map(UserView::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// The CEO creates HR accounts; HR creates employees and interns.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 400, description = "Missing fields or email already registered", body = Object, example = json!({
            "message": "User already exists"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role outside the caller's reach")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    let created = user::create(pool.get_ref(), &auth, &payload).await?;
    Ok(HttpResponse::Created().json(UserView::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User id")),
    request_body(content = Object, example = json!({ "shiftId": 2, "isActive": true, "role": "Intern" })),
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 400, description = "Unknown field or bad value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role outside the caller's reach"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let updated = user::update(pool.get_ref(), &auth, path.into_inner(), &payload).await?;
    Ok(HttpResponse::Ok().json(UserView::from(updated)))
}
