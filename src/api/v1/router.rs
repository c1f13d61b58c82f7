use super::error::*;
use super::handler;
use crate::application_port::TokenVerifier;
use crate::domain_model::*;
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let auth = || with_verification(server.token_verifier.clone());

    // region contacts
    let create_request = warp::post()
        .and(warp::path!("contacts" / PostId))
        .and(json_body::<handler::CreateContactRequest>())
        .and(auth())
        .and(with(server.contact_service.clone()))
        .and_then(handler::create_contact_request);

    let received = warp::get()
        .and(warp::path!("contacts" / "received"))
        .and(auth())
        .and(with(server.contact_service.clone()))
        .and_then(handler::list_received_requests);

    let sent = warp::get()
        .and(warp::path!("contacts" / "sent"))
        .and(auth())
        .and(with(server.contact_service.clone()))
        .and_then(handler::list_sent_requests);

    let update_status = warp::put()
        .and(warp::path!("contacts" / ContactRequestId / "status"))
        .and(json_body::<handler::UpdateStatusRequest>())
        .and(auth())
        .and(with(server.contact_service.clone()))
        .and_then(handler::update_request_status);

    let delete_request = warp::delete()
        .and(warp::path!("contacts" / ContactRequestId))
        .and(auth())
        .and(with(server.contact_service.clone()))
        .and_then(handler::delete_contact_request);

    let contacts = received
        .or(sent)
        .or(create_request)
        .or(update_status)
        .or(delete_request);
    // endregion

    // region chat
    let conversations = warp::get()
        .and(warp::path!("chat" / "conversations"))
        .and(auth())
        .and(with(server.chat_service.clone()))
        .and_then(handler::list_conversations);

    let peek = warp::get()
        .and(warp::path!("chat" / "conversation" / UserId))
        .and(auth())
        .and(with(server.chat_service.clone()))
        .and_then(handler::peek_conversation);

    let delete_conversation = warp::delete()
        .and(warp::path!("chat" / "conversations" / ConversationId))
        .and(auth())
        .and(with(server.chat_service.clone()))
        .and_then(handler::delete_conversation);

    let messages = warp::get()
        .and(warp::path!("chat" / "messages" / ConversationId))
        .and(auth())
        .and(with(server.chat_service.clone()))
        .and_then(handler::get_messages);

    let send = warp::post()
        .and(warp::path!("chat" / "message"))
        .and(json_body::<handler::SendMessageRequest>())
        .and(auth())
        .and(with(server.chat_service.clone()))
        .and_then(handler::send_message);

    let mark_read = warp::put()
        .and(warp::path!("chat" / "read" / ConversationId))
        .and(auth())
        .and(with(server.chat_service.clone()))
        .and_then(handler::mark_conversation_read);

    let unread = warp::get()
        .and(warp::path!("chat" / "unread" / "count"))
        .and(auth())
        .and(with(server.chat_service.clone()))
        .and_then(handler::total_unread);

    let chat = conversations
        .or(peek)
        .or(delete_conversation)
        .or(messages)
        .or(send)
        .or(mark_read)
        .or(unread);
    // endregion

    // region notifications
    let list_notifications = warp::get()
        .and(warp::path!("notifications"))
        .and(auth())
        .and(with(server.notification_service.clone()))
        .and_then(handler::list_notifications);

    let unread_notifications = warp::get()
        .and(warp::path!("notifications" / "unread" / "count"))
        .and(auth())
        .and(with(server.notification_service.clone()))
        .and_then(handler::unread_notifications);

    let read_all = warp::put()
        .and(warp::path!("notifications" / "read-all"))
        .and(auth())
        .and(with(server.notification_service.clone()))
        .and_then(handler::mark_all_notifications_read);

    let read_one = warp::put()
        .and(warp::path!("notifications" / NotificationId / "read"))
        .and(auth())
        .and(with(server.notification_service.clone()))
        .and_then(handler::mark_notification_read);

    let delete_notification = warp::delete()
        .and(warp::path!("notifications" / NotificationId))
        .and(auth())
        .and(with(server.notification_service.clone()))
        .and_then(handler::delete_notification);

    let notifications = list_notifications
        .or(unread_notifications)
        .or(read_all)
        .or(read_one)
        .or(delete_notification);
    // endregion

    // region users, presence, feed
    let block = warp::post()
        .and(warp::path!("users" / UserId / "block"))
        .and(auth())
        .and(with(server.user_service.clone()))
        .and_then(handler::block_user);

    let unblock = warp::delete()
        .and(warp::path!("users" / UserId / "block"))
        .and(auth())
        .and(with(server.user_service.clone()))
        .and_then(handler::unblock_user);

    let blocked = warp::get()
        .and(warp::path!("users" / "blocked"))
        .and(auth())
        .and(with(server.user_service.clone()))
        .and_then(handler::list_blocked);

    let presence = warp::get()
        .and(warp::path!("presence" / UserId))
        .and(auth())
        .and(with(server.session_hub.clone()))
        .and_then(handler::presence);

    let announce = warp::post()
        .and(warp::path!("posts" / PostId / "announce"))
        .and(auth())
        .and(with(server.feed_service.clone()))
        .and_then(handler::announce_post);

    let users = blocked.or(block).or(unblock).or(presence).or(announce);
    // endregion

    let socket = warp::get()
        .and(warp::path!("socket"))
        .and(auth())
        .and(warp::ws())
        .and(with(server.connection_acceptor.clone()))
        .map(
            |user_id: UserId, ws: warp::ws::Ws, connection_acceptor: Arc<dyn ConnectionAcceptor>| {
                ws.on_upgrade(move |socket| {
                    handler::join_socket(socket, user_id, connection_acceptor)
                })
            },
        );

    contacts.or(chat).or(notifications).or(users).or(socket)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_verification(
    token_verifier: Arc<dyn TokenVerifier>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let token_verifier = token_verifier.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let user_id = token_verifier
                    .verify_token(token)
                    .await
                    .map_err(ApiRejection::from)
                    .map_err(reject::custom)?;
                Ok(user_id)
            } else {
                Err(reject::custom(ApiRejection::from(ApiErrorCode::InvalidToken)))
            }
        }
    })
}
