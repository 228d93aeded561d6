use actix_web::{delete, get, patch, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::resolve_caller,
    modules::{
        conversation::{
            model::{
                AddMembersModel, AddMembersResponse, ConversationDetail, ConversationSummary,
                CreateGroupModel, ItemOutcome, MarkReadModel, UpdateGroupImageModel,
                UpdateGroupNameModel,
            },
            repository_pg::ConversationPgRepository,
            service::ConversationService,
        },
        message::{model::CreatedId, repository_pg::MessageRepositoryPg},
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
    utils::ValidatedJson,
};

pub type ConversationSvc =
    ConversationService<ConversationPgRepository, MessageRepositoryPg, UserRepositoryPg>;

#[get("")]
pub async fn get_conversations(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<ConversationSummary>>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let outcomes = conversation_service.get_conversations(caller.id).await;

    let total = outcomes.len();
    let summaries: Vec<ConversationSummary> =
        outcomes.into_iter().filter_map(ItemOutcome::into_option).collect();
    if summaries.len() < total {
        log::warn!(
            "{} of {} conversations omitted for {}",
            total - summaries.len(),
            total,
            caller.id
        );
    }

    Ok(success::Success::ok(Some(summaries)))
}

#[get("/{conversation_id}")]
pub async fn get_conversation(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<ConversationDetail>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let detail =
        conversation_service.get_conversation(caller.id, conversation_id.into_inner()).await?;
    Ok(success::Success::ok(Some(detail)))
}

#[post("/groups")]
pub async fn create_group(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    body: ValidatedJson<CreateGroupModel>,
    req: HttpRequest,
) -> Result<success::Success<CreatedId>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let id = conversation_service.create_group(caller.id, body.0).await?;
    Ok(success::Success::created(Some(CreatedId { id })).message("Group created"))
}

#[get("/{conversation_id}/is-creator")]
pub async fn is_group_creator(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<bool>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let is_creator =
        conversation_service.is_group_creator(caller.id, conversation_id.into_inner()).await?;
    Ok(success::Success::ok(Some(is_creator)))
}

#[patch("/{conversation_id}/name")]
pub async fn update_group_name(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    body: ValidatedJson<UpdateGroupNameModel>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    conversation_service
        .update_group_name(caller.id, conversation_id.into_inner(), &body.0.value)
        .await?;
    Ok(success::Success::ok(Some(success::Ack::ok())).message("Group name updated"))
}

#[patch("/{conversation_id}/image")]
pub async fn update_group_image(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    body: ValidatedJson<UpdateGroupImageModel>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    conversation_service
        .update_group_image(caller.id, conversation_id.into_inner(), &body.0.value)
        .await?;
    Ok(success::Success::ok(Some(success::Ack::ok())).message("Group image updated"))
}

#[post("/{conversation_id}/members")]
pub async fn add_group_members(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    body: ValidatedJson<AddMembersModel>,
    req: HttpRequest,
) -> Result<success::Success<AddMembersResponse>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let added = conversation_service
        .add_group_members(caller.id, conversation_id.into_inner(), body.0.member_ids)
        .await?;
    Ok(success::Success::ok(Some(added)))
}

#[delete("/{conversation_id}/members/{member_id}")]
pub async fn remove_group_member(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    path: web::Path<(Uuid, Uuid)>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    let (conversation_id, member_id) = path.into_inner();
    conversation_service.remove_group_member(caller.id, conversation_id, member_id).await?;
    Ok(success::Success::ok(Some(success::Ack::ok())).message("Member removed"))
}

#[post("/{conversation_id}/leave")]
pub async fn leave_group(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    conversation_service.leave_group(caller.id, conversation_id.into_inner()).await?;
    Ok(success::Success::ok(Some(success::Ack::ok())))
}

#[delete("/{conversation_id}")]
pub async fn delete_group(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    conversation_service.delete_group(caller.id, conversation_id.into_inner()).await?;
    Ok(success::Success::ok(Some(success::Ack::ok())).message("Group deleted"))
}

#[post("/{conversation_id}/read")]
pub async fn mark_read(
    conversation_service: web::Data<ConversationSvc>,
    user_service: web::Data<UserService>,
    conversation_id: web::Path<Uuid>,
    body: web::Json<MarkReadModel>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let (_, caller) = resolve_caller(&req, &user_service).await?;
    conversation_service
        .mark_read(caller.id, conversation_id.into_inner(), body.message_id)
        .await?;
    Ok(success::Success::no_content())
}
