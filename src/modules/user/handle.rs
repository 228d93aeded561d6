use actix_web::{get, post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::{get_extensions, resolve_caller},
    modules::user::{model, service::UserService},
    utils::{Claims, ValidatedJson},
};

#[get("/me")]
pub async fn get_me(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let (_, user) = resolve_caller(&req, &user_service).await?;
    Ok(success::Success::ok(Some(model::UserResponse::from(user)))
        .message("User retrieved successfully"))
}

#[post("/me")]
pub async fn sync_me(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    profile: ValidatedJson<model::SyncUserModel>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let claims = get_extensions::<Claims>(&req)?;
    let user = user_service.sync(&claims, profile.0).await?;
    Ok(success::Success::ok(Some(model::UserResponse::from(user))).message("User synced"))
}
