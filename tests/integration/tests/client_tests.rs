//! Client scenarios against the in-memory backend
//!
//! Run with: cargo test -p integration-tests --test client_tests

use std::collections::HashSet;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use futures::future::join_all;
use integration_tests::*;
use roomchat_client::dto::{ImageUpload, SendDirectMessageRequest, SendMessageRequest, SignInRequest};
use roomchat_client::services::{
    AuthService, AvatarService, BackgroundService, ChatroomService, DirectMessageService,
    MessageService, ProfileService, RealtimeService, PAGE_SIZE,
};
use roomchat_client::{Feed, RequestScope, ServiceError};
use roomchat_core::traits::{MessageQuery, MessageRepository};
use roomchat_core::{
    AvatarUrls, ChangeKinds, DomainError, Message, MessageWithAuthor, NewMessage, RateLimitPolicy,
    Role, Snowflake,
};
use serde_json::json;

const EVENT_WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// Membership
// ============================================================================

#[tokio::test]
async fn test_concurrent_joins_create_one_membership() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let user = seed_user(&client.backend, Role::User);

    let service = ChatroomService::new(&client.ctx);
    let outcomes = join_all((0..16).map(|_| service.verify_or_join(catalog.chatroom.id, user.id))).await;

    let new_rows = outcomes
        .iter()
        .filter(|o| o.as_ref().unwrap().is_new())
        .count();
    assert_eq!(new_rows, 1);
    assert_eq!(service.member_count(catalog.chatroom.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_join_rejects_full_and_inactive_rooms() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 1);
    let first = seed_user(&client.backend, Role::User);
    let second = seed_user(&client.backend, Role::User);
    let service = ChatroomService::new(&client.ctx);

    service.verify_or_join(catalog.chatroom.id, first.id).await.unwrap();
    let err = service
        .verify_or_join(catalog.chatroom.id, second.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::ChatroomFull { max: 1 })));

    // An existing member is still admitted once the room is full
    let again = service.verify_or_join(catalog.chatroom.id, first.id).await.unwrap();
    assert!(!again.is_new());

    client.backend.set_chatroom_active(catalog.chatroom.id, false);
    let err = service
        .verify_or_join(catalog.chatroom.id, second.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::ChatroomInactive)));
}

#[tokio::test]
async fn test_leave_then_my_chatrooms() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let other = seed_chatroom(&client.backend, catalog.province.id, "Night Owls");
    let user = seed_user(&client.backend, Role::User);
    let service = ChatroomService::new(&client.ctx);

    service.verify_or_join(catalog.chatroom.id, user.id).await.unwrap();
    service.verify_or_join(other.id, user.id).await.unwrap();
    assert_eq!(service.my_chatrooms(user.id).await.unwrap().len(), 2);

    assert!(service.leave(other.id, user.id).await.unwrap());
    assert!(!service.leave(other.id, user.id).await.unwrap());

    let mine = service.my_chatrooms(user.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, catalog.chatroom.id);

    let members = service.list_members(catalog.chatroom.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].profile.as_ref().map(|p| p.id), Some(user.id));
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_pagination_walks_history_without_overlap() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let user = seed_user(&client.backend, Role::User);

    for i in 0..120 {
        let message = NewMessage::new(catalog.chatroom.id, user.id, format!("message {i}"));
        MessageRepository::create(&client.backend, &message).await.unwrap();
    }

    let service = MessageService::new(&client.ctx);
    let mut seen: Vec<Snowflake> = Vec::new();
    let mut cursor = None;
    let mut sizes = Vec::new();

    loop {
        let page = service.list_messages(catalog.chatroom.id, cursor).await.unwrap();
        sizes.push(page.items.len());

        let ids: Vec<Snowflake> = page.items.iter().map(|m| m.message.id).collect();
        assert!(ids.windows(2).all(|w| w[0] > w[1]), "page must be newest first");
        if let Some(last) = seen.last() {
            assert!(ids.iter().all(|id| id < last), "pages must be strictly older");
        }
        assert!(page.items.iter().all(|m| m.author.is_some()));
        seen.extend(ids);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(sizes, vec![PAGE_SIZE, PAGE_SIZE, 20]);
    assert_eq!(seen.len(), 120);
}

#[tokio::test]
async fn test_send_requires_membership_and_valid_content() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let user = seed_user(&client.backend, Role::User);
    let service = MessageService::new(&client.ctx);

    let err = service
        .send_message(catalog.chatroom.id, user.id, SendMessageRequest::text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::NotChatroomMember(_))));

    ChatroomService::new(&client.ctx)
        .verify_or_join(catalog.chatroom.id, user.id)
        .await
        .unwrap();

    let err = service
        .send_message(catalog.chatroom.id, user.id, SendMessageRequest::text("   "))
        .await
        .unwrap_err();
    assert!(err.is_local());

    let sent = service
        .send_message(
            catalog.chatroom.id,
            user.id,
            SendMessageRequest {
                content: "<b>hello</b>".to_string(),
                bubble_color: Some("#FFAA00".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(sent.message.content, "&lt;b&gt;hello&lt;/b&gt;");
    assert_eq!(sent.author.as_ref().map(|a| a.id), Some(user.id));
}

#[tokio::test]
async fn test_two_clients_sending_in_one_room() {
    let alice_client = TestClient::new().unwrap();
    let bob_client = alice_client.sibling().unwrap();
    let catalog = seed_catalog(&alice_client.backend, 100);
    let room = catalog.chatroom.id;
    let alice = seed_user(&alice_client.backend, Role::User);
    let bob = seed_user(&alice_client.backend, Role::User);
    ChatroomService::new(&alice_client.ctx).verify_or_join(room, alice.id).await.unwrap();
    ChatroomService::new(&bob_client.ctx).verify_or_join(room, bob.id).await.unwrap();

    let alice_service = MessageService::new(&alice_client.ctx);
    let bob_service = MessageService::new(&bob_client.ctx);
    let mut ids = HashSet::new();
    for i in 0..20 {
        let (a, b) = tokio::join!(
            alice_service.send_message(room, alice.id, SendMessageRequest::text(format!("alice {i}"))),
            bob_service.send_message(room, bob.id, SendMessageRequest::text(format!("bob {i}"))),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(ids.insert(a.message.id));
        assert!(ids.insert(b.message.id));
    }

    let stored = MessageRepository::find_page(&alice_client.backend, room, MessageQuery::before(None, 100))
        .await
        .unwrap();
    assert_eq!(stored.len(), 40);
    assert!(stored.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn test_send_quota_is_enforced() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let user = seed_user(&client.backend, Role::User);
    ChatroomService::new(&client.ctx)
        .verify_or_join(catalog.chatroom.id, user.id)
        .await
        .unwrap();
    let service = MessageService::new(&client.ctx);

    for i in 0..RateLimitPolicy::DEFAULT_MAX_REQUESTS {
        service
            .send_message(catalog.chatroom.id, user.id, SendMessageRequest::text(format!("m{i}")))
            .await
            .unwrap();
    }

    let err = service
        .send_message(catalog.chatroom.id, user.id, SendMessageRequest::text("one too many"))
        .await
        .unwrap_err();
    let ServiceError::RateLimited { retry_after_secs } = err else {
        panic!("expected RateLimited, got {err:?}");
    };
    assert!(retry_after_secs > 0 && retry_after_secs <= RateLimitPolicy::DEFAULT_WINDOW_SECS);

    let stored = MessageRepository::find_page(
        &client.backend,
        catalog.chatroom.id,
        MessageQuery::before(None, 100),
    )
    .await
    .unwrap();
    assert_eq!(stored.len(), RateLimitPolicy::DEFAULT_MAX_REQUESTS as usize);
}

#[tokio::test]
async fn test_quota_resets_after_window() {
    let client = TestClient::build(memory_backend(), |b| {
        b.send_policy(RateLimitPolicy::new(2, ChronoDuration::seconds(1)))
    })
    .unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let user = seed_user(&client.backend, Role::User);
    ChatroomService::new(&client.ctx)
        .verify_or_join(catalog.chatroom.id, user.id)
        .await
        .unwrap();
    let service = MessageService::new(&client.ctx);
    let send = || service.send_message(catalog.chatroom.id, user.id, SendMessageRequest::text("tick"));

    send().await.unwrap();
    send().await.unwrap();
    assert!(matches!(send().await, Err(ServiceError::RateLimited { .. })));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    send().await.unwrap();
}

#[tokio::test]
async fn test_edit_and_delete_permissions() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let author = seed_user(&client.backend, Role::User);
    let stranger = seed_user(&client.backend, Role::User);
    let moderator = seed_user(&client.backend, Role::Moderator);
    ChatroomService::new(&client.ctx)
        .verify_or_join(catalog.chatroom.id, author.id)
        .await
        .unwrap();
    let service = MessageService::new(&client.ctx);

    let sent = service
        .send_message(catalog.chatroom.id, author.id, SendMessageRequest::text("first draft"))
        .await
        .unwrap();
    let id = sent.message.id;

    let err = service.edit_message(id, stranger.id, "hijack").await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::NotMessageAuthor)));

    let edited = service.edit_message(id, author.id, "final").await.unwrap();
    assert!(edited.is_edited);
    assert_eq!(edited.content, "final");

    let err = service.delete_message(id, stranger.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::NotMessageAuthor)));

    service.delete_message(id, moderator.id).await.unwrap();

    // Deleted messages stay in history as placeholders but are no longer editable
    let page = service.list_messages(catalog.chatroom.id, None).await.unwrap();
    assert!(page.items[0].message.is_deleted);
    assert!(service.edit_message(id, author.id, "again").await.is_err());
    assert!(service.delete_message(id, author.id).await.is_err());
}

// ============================================================================
// Direct messages
// ============================================================================

#[tokio::test]
async fn test_direct_message_relays_push() {
    let (_server, push, captured) = mock_push_relay(200).await.unwrap();
    let client = TestClient::build(memory_backend(), |b| b.push(push)).unwrap();
    let sender = seed_user(&client.backend, Role::User);
    let receiver = seed_user(&client.backend, Role::User);
    assert!(client
        .backend
        .set_push_token(receiver.id, Some("ExponentPushToken[abc]".to_string())));

    let long = "x".repeat(150);
    DirectMessageService::new(&client.ctx)
        .send(
            sender.id,
            SendDirectMessageRequest {
                receiver_id: receiver.id,
                content: long,
            },
        )
        .await
        .unwrap();

    let bodies = captured.lock().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["to"], "ExponentPushToken[abc]");
    assert_eq!(bodies[0]["title"], json!(sender.display_label()));
    assert_eq!(bodies[0]["body"].as_str().unwrap().chars().count(), 100);
    assert_eq!(bodies[0]["sound"], "default");
}

#[tokio::test]
async fn test_push_body_is_plain_text() {
    let (_server, push, captured) = mock_push_relay(200).await.unwrap();
    let client = TestClient::build(memory_backend(), |b| b.push(push)).unwrap();
    let sender = seed_user(&client.backend, Role::User);
    let receiver = seed_user(&client.backend, Role::User);
    assert!(client
        .backend
        .set_push_token(receiver.id, Some("ExponentPushToken[abc]".to_string())));

    let sent = DirectMessageService::new(&client.ctx)
        .send(
            sender.id,
            SendDirectMessageRequest {
                receiver_id: receiver.id,
                content: "Tom & Jerry <3 \"cheese\"".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(sent.content, "Tom &amp; Jerry &lt;3 &quot;cheese&quot;");
    let bodies = captured.lock().clone();
    assert_eq!(bodies[0]["body"], "Tom & Jerry <3 \"cheese\"");
}

#[tokio::test]
async fn test_push_failure_does_not_fail_send() {
    let (_server, push, captured) = mock_push_relay(500).await.unwrap();
    let client = TestClient::build(memory_backend(), |b| b.push(push)).unwrap();
    let sender = seed_user(&client.backend, Role::User);
    let receiver = seed_user(&client.backend, Role::User);
    client
        .backend
        .set_push_token(receiver.id, Some("ExponentPushToken[def]".to_string()));

    let sent = DirectMessageService::new(&client.ctx)
        .send(
            sender.id,
            SendDirectMessageRequest {
                receiver_id: receiver.id,
                content: "are you there?".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(sent.receiver_id, receiver.id);
    assert_eq!(captured.lock().len(), 1);
}

#[tokio::test]
async fn test_no_push_without_token() {
    let (_server, push, captured) = mock_push_relay(200).await.unwrap();
    let client = TestClient::build(memory_backend(), |b| b.push(push)).unwrap();
    let sender = seed_user(&client.backend, Role::User);
    let receiver = seed_user(&client.backend, Role::User);

    DirectMessageService::new(&client.ctx)
        .send(
            sender.id,
            SendDirectMessageRequest {
                receiver_id: receiver.id,
                content: "quiet".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(captured.lock().is_empty());
}

#[tokio::test]
async fn test_conversations_and_read_state() {
    let client = TestClient::new().unwrap();
    let me = seed_user(&client.backend, Role::User);
    let alice = seed_user(&client.backend, Role::User);
    let bob = seed_user(&client.backend, Role::User);
    let service = DirectMessageService::new(&client.ctx);
    let dm = |receiver_id, content: &str| SendDirectMessageRequest {
        receiver_id,
        content: content.to_string(),
    };

    service.send(alice.id, dm(me.id, "hi from alice")).await.unwrap();
    service.send(alice.id, dm(me.id, "still there?")).await.unwrap();
    service.send(me.id, dm(bob.id, "hey bob")).await.unwrap();

    let err = service.send(me.id, dm(me.id, "note to self")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::CannotMessageSelf)));

    assert_eq!(service.unread_count(me.id).await.unwrap(), 2);

    let conversations = service.list_conversations(me.id).await.unwrap();
    assert_eq!(conversations.len(), 2);
    let with_alice = conversations
        .iter()
        .find(|c| c.counterpart_id == alice.id)
        .unwrap();
    assert_eq!(with_alice.unread_count, 2);
    assert_eq!(with_alice.last_message.content, "still there?");
    assert_eq!(with_alice.counterpart.as_ref().map(|p| p.id), Some(alice.id));

    let page = service.list_conversation(me.id, alice.id, None).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].content, "still there?");

    assert_eq!(service.mark_read(me.id, alice.id).await.unwrap(), 2);
    assert_eq!(service.unread_count(me.id).await.unwrap(), 0);
    assert_eq!(service.mark_read(me.id, alice.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_direct_message_to_unknown_user() {
    let client = TestClient::new().unwrap();
    let me = seed_user(&client.backend, Role::User);

    let err = DirectMessageService::new(&client.ctx)
        .send(
            me.id,
            SendDirectMessageRequest {
                receiver_id: next_id(),
                content: "hello?".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::ProfileNotFound(_))));
}

// ============================================================================
// Profiles and avatars
// ============================================================================

#[tokio::test]
async fn test_avatar_upload_replaces_generated_avatar() {
    let client = TestClient::new().unwrap();
    let user = seed_user(&client.backend, Role::User);
    let avatars = AvatarService::new(&client.ctx);

    let before = avatars.resolve(user.id).await.unwrap();
    assert_eq!(before, AvatarUrls::resolve(None, &user.username));

    let updated = avatars
        .upload_avatar(
            user.id,
            ImageUpload {
                bytes: png_bytes(256),
                content_type: "image/png".to_string(),
            },
        )
        .await
        .unwrap();
    let stored = updated.avatar_url.clone().unwrap();
    assert!(stored.ends_with(".png"));

    let after = avatars.resolve(user.id).await.unwrap();
    assert_eq!(after.primary, stored);
    assert_eq!(after.fallback, before.fallback);
}

#[tokio::test]
async fn test_avatar_upload_limits() {
    let client = TestClient::new().unwrap();
    let user = seed_user(&client.backend, Role::User);
    let avatars = AvatarService::new(&client.ctx);

    let err = avatars
        .upload_avatar(
            user.id,
            ImageUpload {
                bytes: png_bytes(5 * 1024 * 1024 + 1),
                content_type: "image/png".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::FileTooLarge { .. })));

    let err = avatars
        .upload_avatar(
            user.id,
            ImageUpload {
                bytes: b"%PDF-1.4".to_vec(),
                content_type: "application/pdf".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::UnsupportedMediaType(_))));
}

#[tokio::test]
async fn test_username_change_and_search() {
    let client = TestClient::new().unwrap();
    let taken = seed_user(&client.backend, Role::User);
    let user = seed_user(&client.backend, Role::User);
    let profiles = ProfileService::new(&client.ctx);

    let err = profiles
        .change_username(user.id, &taken.username)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let new_name = format!("renamed_{}", unique_suffix());
    let updated = profiles.change_username(user.id, &new_name).await.unwrap();
    assert_eq!(updated.username, new_name);

    let found = profiles.search("renamed_", 100).await.unwrap();
    assert!(found.iter().any(|p| p.id == user.id));
    assert_eq!(profiles.get_by_username(&new_name).await.unwrap().id, user.id);
}

// ============================================================================
// Backgrounds
// ============================================================================

#[tokio::test]
async fn test_background_search_uses_results() {
    let body = json!({
        "results": [{
            "id": "abc",
            "urls": { "regular": "https://images.test/abc.jpg", "small": "https://images.test/abc-s.jpg" },
            "alt_description": "sunset"
        }]
    });
    let (_server, images) = mock_image_search(200, body).await.unwrap();
    let client = TestClient::build(memory_backend(), |b| b.images(images)).unwrap();

    let found = BackgroundService::new(&client.ctx).search("sunset").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].url, "https://images.test/abc.jpg");
}

#[tokio::test]
async fn test_background_search_falls_back() {
    let fallback = roomchat_client::http::fallback_backgrounds();

    let (_server, images) = mock_image_search(500, json!({ "errors": ["boom"] })).await.unwrap();
    let client = TestClient::build(memory_backend(), |b| b.images(images)).unwrap();
    let found = BackgroundService::new(&client.ctx).search("sunset").await;
    assert_eq!(found.len(), fallback.len());

    let (_server, images) = mock_image_search(200, json!({ "results": [] })).await.unwrap();
    let client = TestClient::build(memory_backend(), |b| b.images(images)).unwrap();
    let found = BackgroundService::new(&client.ctx).search("nothing").await;
    assert_eq!(found.len(), fallback.len());

    let client = TestClient::new().unwrap();
    assert_eq!(BackgroundService::new(&client.ctx).search("any").await.len(), fallback.len());
}

// ============================================================================
// Cancellation and realtime
// ============================================================================

#[tokio::test]
async fn test_cancelled_scope_sends_nothing() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let user = seed_user(&client.backend, Role::User);
    ChatroomService::new(&client.ctx)
        .verify_or_join(catalog.chatroom.id, user.id)
        .await
        .unwrap();

    let scope = RequestScope::new();
    scope.cancel();
    let service = MessageService::new(&client.ctx);
    let result = scope
        .run(service.send_message(catalog.chatroom.id, user.id, SendMessageRequest::text("late")))
        .await;
    assert!(matches!(result, Err(ServiceError::Cancelled)));

    let page = service.list_messages(catalog.chatroom.id, None).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_optimistic_send_and_echo_dedupe() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let user = seed_user(&client.backend, Role::User);
    ChatroomService::new(&client.ctx)
        .verify_or_join(catalog.chatroom.id, user.id)
        .await
        .unwrap();

    let mut stream = RealtimeService::new(&client.ctx)
        .chatroom_messages(catalog.chatroom.id, ChangeKinds::ALL)
        .await
        .unwrap();

    let mut feed: Feed<MessageWithAuthor> = Feed::new();
    let sent = MessageService::new(&client.ctx)
        .send_message(catalog.chatroom.id, user.id, SendMessageRequest::text("echo me"))
        .await
        .unwrap();
    feed.upsert(sent.clone());

    let echo = next_event(&mut stream, EVENT_WAIT).await.expect("echo event");
    feed.apply(&echo).unwrap();

    assert_eq!(feed.len(), 1);
    assert_eq!(feed.items()[0].message.id, sent.message.id);
    assert!(feed.items()[0].author.is_some());
}

#[tokio::test]
async fn test_other_rooms_are_filtered_out() {
    let client = TestClient::new().unwrap();
    let catalog = seed_catalog(&client.backend, 100);
    let elsewhere = seed_chatroom(&client.backend, catalog.province.id, "Elsewhere");
    let user = seed_user(&client.backend, Role::User);
    let rooms = ChatroomService::new(&client.ctx);
    rooms.verify_or_join(catalog.chatroom.id, user.id).await.unwrap();
    rooms.verify_or_join(elsewhere.id, user.id).await.unwrap();

    let mut stream = RealtimeService::new(&client.ctx)
        .chatroom_messages(catalog.chatroom.id, ChangeKinds::INSERT)
        .await
        .unwrap();

    let messages = MessageService::new(&client.ctx);
    messages
        .send_message(elsewhere.id, user.id, SendMessageRequest::text("not here"))
        .await
        .unwrap();
    let here = messages
        .send_message(catalog.chatroom.id, user.id, SendMessageRequest::text("here"))
        .await
        .unwrap();

    let event = next_event(&mut stream, EVENT_WAIT).await.expect("event");
    let row: Message = event.decode_record().unwrap().unwrap();
    assert_eq!(row.id, here.message.id);
}

#[tokio::test]
async fn test_incoming_direct_messages_stream() {
    let client = TestClient::new().unwrap();
    let sender = seed_user(&client.backend, Role::User);
    let receiver = seed_user(&client.backend, Role::User);
    let bystander = seed_user(&client.backend, Role::User);

    let mut stream = RealtimeService::new(&client.ctx)
        .incoming_direct_messages(receiver.id)
        .await
        .unwrap();

    let service = DirectMessageService::new(&client.ctx);
    service
        .send(
            sender.id,
            SendDirectMessageRequest {
                receiver_id: bystander.id,
                content: "not for receiver".to_string(),
            },
        )
        .await
        .unwrap();
    let sent = service
        .send(
            sender.id,
            SendDirectMessageRequest {
                receiver_id: receiver.id,
                content: "for receiver".to_string(),
            },
        )
        .await
        .unwrap();

    let event = next_event(&mut stream, EVENT_WAIT).await.expect("event");
    let row: roomchat_core::DirectMessage = event.decode_record().unwrap().unwrap();
    assert_eq!(row.id, sent.id);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_sign_up_sign_in_and_refresh_rotation() {
    let client = TestClient::new().unwrap();
    let auth = AuthService::new(&client.ctx);
    let request = unique_sign_up();
    let email = request.email.clone();
    let password = request.password.clone();

    let signed_up = auth.sign_up(request).await.unwrap();
    assert_eq!(client.ctx.session().user_id().unwrap(), signed_up.profile.id);
    assert_eq!(auth.current_user().await.unwrap().id, signed_up.profile.id);

    let first_refresh = client.ctx.session().refresh_token().unwrap();
    let rotated = auth.refresh().await.unwrap();
    assert_ne!(rotated.refresh_token, first_refresh);

    // A second client replaying the old token is rejected
    let replay = client.sibling().unwrap();
    let replayed = replay.ctx.auth().refresh(&first_refresh).await;
    assert!(matches!(replayed, Err(DomainError::InvalidSession)));

    auth.sign_out().await.unwrap();
    assert!(auth.current_session().is_none());
    assert!(matches!(auth.current_user().await, Err(ServiceError::NotAuthenticated)));

    let signed_in = auth.sign_in(SignInRequest { email, password }).await.unwrap();
    assert_eq!(signed_in.profile.id, signed_up.profile.id);
}

#[tokio::test]
async fn test_sign_up_rejects_bad_input_locally() {
    let client = TestClient::new().unwrap();
    let auth = AuthService::new(&client.ctx);

    let mut request = unique_sign_up();
    request.email = "not-an-email".to_string();
    assert!(auth.sign_up(request).await.unwrap_err().is_local());

    let mut request = unique_sign_up();
    request.password = "short".to_string();
    assert!(auth.sign_up(request).await.unwrap_err().is_local());

    assert!(auth.current_session().is_none());
}

#[tokio::test]
async fn test_sign_out_clears_avatar_cache() {
    let client = TestClient::new().unwrap();
    let auth = AuthService::new(&client.ctx);
    let other = seed_user(&client.backend, Role::User);

    auth.sign_up(unique_sign_up()).await.unwrap();
    AvatarService::new(&client.ctx).resolve(other.id).await.unwrap();
    assert_eq!(client.ctx.session().avatars().len(), 1);

    auth.sign_out().await.unwrap();
    assert!(client.ctx.session().avatars().is_empty());
}
