use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use crate::server::{ConnectionAcceptor, SessionHub};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn rejected(rejection: ApiRejection) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: rejection.code,
                message: rejection.message,
                retry_after_hours: rejection.retry_after_hours,
            }),
        }
    }
}

fn reply<T: Serialize>(data: T) -> warp::reply::Json {
    warp::reply::json(&ApiResponse::ok(data))
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// region contacts

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateContactRequest {
    pub recipient_id: Option<UserId>,
    pub message: Option<String>,
}

pub async fn create_contact_request(
    post_id: PostId,
    body: CreateContactRequest,
    user_id: UserId,
    contact_service: Arc<dyn ContactService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = CreateContactInput {
        requester: user_id,
        post_id,
        recipient: body.recipient_id,
        message: body.message,
    };
    let request = contact_service
        .create_request(input)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(request))
}

pub async fn list_received_requests(
    user_id: UserId,
    contact_service: Arc<dyn ContactService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requests = contact_service
        .list_received(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(requests))
}

pub async fn list_sent_requests(
    user_id: UserId,
    contact_service: Arc<dyn ContactService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requests = contact_service
        .list_sent(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(requests))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ContactDecision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    #[serde(flatten)]
    pub request: ContactRequest,
    pub conversation_id: Option<ConversationId>,
}

pub async fn update_request_status(
    request_id: ContactRequestId,
    body: UpdateStatusRequest,
    user_id: UserId,
    contact_service: Arc<dyn ContactService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let update = contact_service
        .update_status(request_id, user_id, body.status)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(UpdateStatusResponse {
        request: update.request,
        conversation_id: update.conversation_id,
    }))
}

pub async fn delete_contact_request(
    request_id: ContactRequestId,
    user_id: UserId,
    contact_service: Arc<dyn ContactService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    contact_service
        .delete(request_id, user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(()))
}

// endregion

// region chat

pub async fn list_conversations(
    user_id: UserId,
    chat_service: Arc<dyn ChatService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let conversations = chat_service
        .list_conversations(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(conversations))
}

pub async fn peek_conversation(
    other: UserId,
    user_id: UserId,
    chat_service: Arc<dyn ChatService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let conversation = chat_service
        .peek_conversation(user_id, other)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(conversation))
}

pub async fn delete_conversation(
    conversation_id: ConversationId,
    user_id: UserId,
    chat_service: Arc<dyn ChatService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    chat_service
        .delete_conversation(user_id, conversation_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(()))
}

pub async fn get_messages(
    conversation_id: ConversationId,
    user_id: UserId,
    chat_service: Arc<dyn ChatService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let messages = chat_service
        .get_messages(user_id, conversation_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(messages))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: UserId,
    pub text: String,
}

pub async fn send_message(
    body: SendMessageRequest,
    user_id: UserId,
    chat_service: Arc<dyn ChatService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let message = chat_service
        .send_message(user_id, body.recipient_id, &body.text)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(message))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub marked_read: u64,
}

pub async fn mark_conversation_read(
    conversation_id: ConversationId,
    user_id: UserId,
    chat_service: Arc<dyn ChatService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let marked_read = chat_service
        .mark_read(conversation_id, user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(MarkReadResponse { marked_read }))
}

pub async fn total_unread(
    user_id: UserId,
    chat_service: Arc<dyn ChatService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let count = chat_service
        .total_unread(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(CountResponse { count }))
}

// endregion

// region notifications

pub async fn list_notifications(
    user_id: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let notifications = notification_service
        .list(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(notifications))
}

pub async fn unread_notifications(
    user_id: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let count = notification_service
        .unread_count(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(CountResponse { count }))
}

pub async fn mark_notification_read(
    notification_id: NotificationId,
    user_id: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    notification_service
        .mark_read(notification_id, user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(()))
}

pub async fn mark_all_notifications_read(
    user_id: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let count = notification_service
        .mark_all_read(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(CountResponse { count }))
}

pub async fn delete_notification(
    notification_id: NotificationId,
    user_id: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    notification_service
        .delete(notification_id, user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(()))
}

// endregion

// region users, presence, feed

pub async fn block_user(
    target: UserId,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    user_service
        .block(user_id, target)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(()))
}

pub async fn unblock_user(
    target: UserId,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    user_service
        .unblock(user_id, target)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(()))
}

pub async fn list_blocked(
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let blocked = user_service
        .list_blocked(user_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(blocked))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub user_id: UserId,
    pub online: bool,
}

pub async fn presence(
    target: UserId,
    _user_id: UserId,
    session_hub: Arc<SessionHub>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(reply(PresenceResponse {
        user_id: target,
        online: session_hub.is_online(target),
    }))
}

pub async fn announce_post(
    post_id: PostId,
    user_id: UserId,
    feed_service: Arc<dyn FeedService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let post = feed_service
        .announce(user_id, post_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(reply(post))
}

// endregion

pub async fn join_socket(
    socket: warp::ws::WebSocket,
    user_id: UserId,
    connection_acceptor: Arc<dyn ConnectionAcceptor>,
) {
    let (s2c, c2s) = socket.split();
    match connection_acceptor
        .accept_connection(Box::new(s2c), Box::new(c2s), user_id)
        .await
    {
        Ok(connection_id) => debug!(%user_id, %connection_id, "socket accepted"),
        Err(e) => error!("accepting connection: {}", e),
    }
}
