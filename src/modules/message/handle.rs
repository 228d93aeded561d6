use actix_web::{get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::resolve_caller,
    modules::{
        conversation::repository_pg::ConversationPgRepository,
        message::{
            model::{CreatedId, MessageWithSender, SendMessageModel},
            repository_pg::MessageRepositoryPg,
            service::MessageService,
        },
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
    utils::ValidatedJson,
};

pub type MessageSvc = MessageService<MessageRepositoryPg, ConversationPgRepository, UserRepositoryPg>;

#[get("/{conversation_id}")]
pub async fn get_messages(
    message_service: web::Data<MessageSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<Vec<MessageWithSender>>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let messages = message_service.get_messages(caller.id, conversation_id.into_inner()).await?;
    Ok(success::Success::ok(Some(messages)))
}

#[post("")]
pub async fn send_message(
    message_service: web::Data<MessageSvc>,
    user_service: web::Data<UserService>,
    body: ValidatedJson<SendMessageModel>,
    req: HttpRequest,
) -> Result<success::Success<CreatedId>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let id = message_service.send_message(caller.id, body.0).await?;
    Ok(success::Success::created(Some(CreatedId { id })).message("Message sent"))
}
