mod common;

use chrono::{Duration, Utc};
use common::*;
use serde_json::json;
use tradepost::domain_model::*;
use tradepost::domain_port::ContactRequestRepo;
use warp::http::StatusCode;

#[tokio::test]
async fn request_approve_then_message_reaches_owner() {
    let h = Harness::new().await;
    let u1 = h.store.insert_user("Bruno", None);
    let u2 = h.store.insert_user("Olive", None);
    let p1 = h.store.insert_post(u2, "Road bike", Some("+15550100"), None);

    let mut owner = h.connect(u2).await;

    let (status, body) = h
        .call("POST", &format!("/contacts/{p1}"), Some(u1), Some(json!({"message": "still available?"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    let request_id = id_of(&body["data"]);

    let pushed = owner
        .next_matching(|e| matches!(e, S2CEvent::NewNotification(_)))
        .await;
    assert!(matches!(
        pushed,
        S2CEvent::NewNotification(n) if n.kind.type_name() == "request"
    ));

    let (status, body) = h
        .call(
            "PUT",
            &format!("/contacts/{request_id}/status"),
            Some(u2),
            Some(json!({"status": "approved"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");
    let conversation = body["data"]["conversationId"].as_str().unwrap().to_owned();

    let (status, body) = h
        .call("POST", "/chat/message", Some(u1), Some(json!({"recipientId": u2, "text": "hi"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["conversationId"], conversation.as_str());

    let delivered = owner
        .next_matching(|e| matches!(e, S2CEvent::ReceiveMessage(_)))
        .await;
    match delivered {
        S2CEvent::ReceiveMessage(m) => {
            assert_eq!(m.conversation_id.to_string(), conversation);
            assert_eq!(m.message.text, "hi");
            assert_eq!(m.message.sender.user_id, u1);
        }
        other => panic!("unexpected {other:?}"),
    }

    let (_, body) = h
        .call("GET", &format!("/chat/messages/{conversation}"), Some(u2), None)
        .await;
    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "hi");
}

#[tokio::test]
async fn requesting_own_post_is_a_validation_error() {
    let h = Harness::new().await;
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Oak desk", None, None);

    let (status, body) = h
        .call("POST", &format!("/contacts/{post}"), Some(owner), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ValidationError");
}

#[tokio::test]
async fn concurrent_duplicate_requests_admit_exactly_one() {
    let h = Harness::new().await;
    let buyer = h.store.insert_user("Bruno", None);
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Oak desk", None, None);
    let path = format!("/contacts/{post}");

    let (a, b) = tokio::join!(
        h.call("POST", &path, Some(buyer), Some(json!({}))),
        h.call("POST", &path, Some(buyer), Some(json!({}))),
    );

    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
    let loser = if a.0 == StatusCode::OK { b.1 } else { a.1 };
    assert_eq!(loser["error"]["code"], "DuplicateRequest");

    let (_, sent) = h.call("GET", "/contacts/sent", Some(buyer), None).await;
    assert_eq!(sent["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_approve_and_reject_settle_once() {
    let h = Harness::new().await;
    let buyer = h.store.insert_user("Bruno", None);
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Oak desk", None, None);

    let (_, body) = h
        .call("POST", &format!("/contacts/{post}"), Some(buyer), Some(json!({})))
        .await;
    let status_path = format!("/contacts/{}/status", id_of(&body["data"]));

    let (a, b) = tokio::join!(
        h.call("PUT", &status_path, Some(owner), Some(json!({"status": "approved"}))),
        h.call("PUT", &status_path, Some(owner), Some(json!({"status": "rejected"}))),
    );

    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let (_, count) = h.call("GET", "/notifications/unread/count", Some(buyer), None).await;
    assert_eq!(count["data"]["count"], 1);
}

#[tokio::test]
async fn immediate_retry_after_rejection_waits_under_a_day() {
    let h = Harness::new().await;
    let buyer = h.store.insert_user("Bruno", None);
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Oak desk", None, None);
    let path = format!("/contacts/{post}");

    let (_, body) = h.call("POST", &path, Some(buyer), Some(json!({}))).await;
    let request_id = id_of(&body["data"]);

    let (status, _) = h
        .call(
            "PUT",
            &format!("/contacts/{request_id}/status"),
            Some(owner),
            Some(json!({"status": "rejected"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h.call("POST", &path, Some(buyer), Some(json!({}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "Cooldown");
    assert_eq!(body["error"]["retryAfterHours"], 23);
}

#[tokio::test]
async fn retry_after_rejection_reports_cooldown() {
    let h = Harness::new().await;
    let buyer = h.store.insert_user("Bruno", None);
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Oak desk", None, None);
    let path = format!("/contacts/{post}");

    let (_, body) = h.call("POST", &path, Some(buyer), Some(json!({}))).await;
    let request_id: ContactRequestId = id_of(&body["data"]).parse().unwrap();

    // rejected three hours ago
    let settled = ContactRequestRepo::settle_pending(
        h.store.as_ref(),
        request_id,
        ContactStatus::Rejected,
        Utc::now() - Duration::hours(3),
    )
    .await
    .unwrap();
    assert!(settled);

    let (status, body) = h.call("POST", &path, Some(buyer), Some(json!({}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "Cooldown");
    assert_eq!(body["error"]["retryAfterHours"], 20);
}

#[tokio::test]
async fn only_the_recipient_decides() {
    let h = Harness::new().await;
    let buyer = h.store.insert_user("Bruno", None);
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Oak desk", None, None);

    let (_, body) = h
        .call("POST", &format!("/contacts/{post}"), Some(buyer), Some(json!({})))
        .await;
    let request_id = id_of(&body["data"]);

    let (status, body) = h
        .call(
            "PUT",
            &format!("/contacts/{request_id}/status"),
            Some(buyer),
            Some(json!({"status": "approved"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "Unauthorized");

    let (status, _) = h
        .call(
            "PUT",
            &format!("/contacts/{request_id}/status"),
            Some(owner),
            Some(json!({"status": "pending"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn received_list_hides_contact_details_until_approved() {
    let h = Harness::new().await;
    let buyer = h.store.insert_user("Bruno", None);
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Road bike", Some("+15550100"), Some("+15550100"));

    let (_, body) = h
        .call("POST", &format!("/contacts/{post}"), Some(buyer), Some(json!({})))
        .await;
    let request_id = id_of(&body["data"]);

    let (_, sent) = h.call("GET", "/contacts/sent", Some(buyer), None).await;
    assert_eq!(sent["data"][0]["post"]["contactPhone"], serde_json::Value::Null);
    assert_eq!(sent["data"][0]["counterpart"]["displayName"], "Olive");

    h.call(
        "PUT",
        &format!("/contacts/{request_id}/status"),
        Some(owner),
        Some(json!({"status": "approved"})),
    )
    .await;

    let (_, sent) = h.call("GET", "/contacts/sent", Some(buyer), None).await;
    assert_eq!(sent["data"][0]["post"]["contactPhone"], "+15550100");

    let (status, _) = h
        .call("DELETE", &format!("/contacts/{request_id}"), Some(buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, received) = h.call("GET", "/contacts/received", Some(owner), None).await;
    assert!(received["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn notifications_are_owned_by_their_recipient() {
    let h = Harness::new().await;
    let buyer = h.store.insert_user("Bruno", None);
    let owner = h.store.insert_user("Olive", None);
    let post = h.store.insert_post(owner, "Oak desk", None, None);

    h.call("POST", &format!("/contacts/{post}"), Some(buyer), Some(json!({})))
        .await;

    let (_, list) = h.call("GET", "/notifications", Some(owner), None).await;
    let items = list["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "request");
    assert_eq!(items[0]["postId"], post.to_string());
    let notification = id_of(&items[0]);

    let (_, count) = h.call("GET", "/notifications/unread/count", Some(owner), None).await;
    assert_eq!(count["data"]["count"], 1);

    let (status, _) = h
        .call("DELETE", &format!("/notifications/{notification}"), Some(buyer), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .call("PUT", &format!("/notifications/{notification}/read"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, count) = h.call("GET", "/notifications/unread/count", Some(owner), None).await;
    assert_eq!(count["data"]["count"], 0);

    let (_, all) = h.call("PUT", "/notifications/read-all", Some(owner), None).await;
    assert_eq!(all["data"]["count"], 0);
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let h = Harness::new().await;
    let (status, body) = h.call("GET", "/chat/conversations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "InvalidToken");
}
