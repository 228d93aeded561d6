use actix_web::{delete, get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::resolve_caller,
    modules::{
        friend::{
            model::{
                AcceptResponse, CountResponse, CreateRequestByEmail, CreateRequestByUsername,
                FriendResponse, RequestWithSender,
            },
            repository_pg::FriendRepositoryPg,
            service::FriendService,
        },
        message::model::CreatedId,
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
    utils::ValidatedJson,
};

pub type FriendSvc = FriendService<FriendRepositoryPg, UserRepositoryPg>;

#[get("")]
pub async fn list_requests(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<RequestWithSender>>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let requests = friend_service.get_requests(caller.id).await?;
    Ok(success::Success::ok(Some(requests)))
}

#[get("/count")]
pub async fn count_requests(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<CountResponse>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let count = friend_service.count_requests(caller.id).await?;
    Ok(success::Success::ok(Some(CountResponse { count })))
}

#[post("")]
pub async fn create_request(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    body: ValidatedJson<CreateRequestByEmail>,
    req: HttpRequest,
) -> Result<success::Success<CreatedId>, error::Error> {
    let (claims, caller) = resolve_caller(&req, &user_service).await?;
    let id = friend_service.create_by_email(&caller, claims.email.as_deref(), &body.0.email).await?;
    Ok(success::Success::created(Some(CreatedId { id })).message("Request sent"))
}

#[post("/by-username")]
pub async fn create_request_by_username(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    body: ValidatedJson<CreateRequestByUsername>,
    req: HttpRequest,
) -> Result<success::Success<CreatedId>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let id = friend_service.create_by_username(&caller, &body.0.username).await?;
    Ok(success::Success::created(Some(CreatedId { id })).message("Request sent"))
}

#[post("/{request_id}/accept")]
pub async fn accept_request(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<AcceptResponse>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let conversation_id = friend_service.accept(caller.id, request_id.into_inner()).await?;
    Ok(success::Success::ok(Some(AcceptResponse { conversation_id })).message("Request accepted"))
}

#[post("/{request_id}/deny")]
pub async fn deny_request(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    friend_service.deny(caller.id, request_id.into_inner()).await?;
    Ok(success::Success::no_content())
}

#[get("")]
pub async fn list_friends(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendResponse>>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let friends = friend_service.get_friends(caller.id).await?;
    Ok(success::Success::ok(Some(friends)))
}

#[delete("/{conversation_id}")]
pub async fn remove_friend(
    friend_service: web::Data<FriendSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    friend_service.remove_friend(caller.id, conversation_id.into_inner()).await?;
    Ok(success::Success::no_content())
}
