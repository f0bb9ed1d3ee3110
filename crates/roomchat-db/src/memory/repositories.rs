//! Relational ports for the in-memory backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use roomchat_core::entities::{
    Chatroom, ChatroomMembership, ConversationId, ConversationSummary, DirectMessage, JoinOutcome,
    Message, NewDirectMessage, NewMessage, Profile, Province, RateLimitAction, RateLimitCounter,
    RateLimitDecision, RateLimitPolicy, Region,
};
use roomchat_core::error::DomainError;
use roomchat_core::events::Table;
use roomchat_core::traits::{
    ChatroomRepository, DirectMessageRepository, MembershipRepository, MessageQuery,
    MessageRepository, ProfileRepository, RateLimitRepository, RepoResult,
};
use roomchat_core::value_objects::Snowflake;

use super::{delete_event, insert_event, public_profile, update_event, MemoryBackend};
use crate::repositories::MAX_PAGE_SIZE;

fn page_limit(query: &MessageQuery) -> usize {
    query.limit.clamp(1, MAX_PAGE_SIZE) as usize
}

#[async_trait]
impl ProfileRepository for MemoryBackend {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Profile>> {
        Ok(self.with_state(|s| s.profiles.get(&id).cloned()))
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Profile>> {
        Ok(self.with_state(|s| s.profiles.values().find(|p| p.username == username).cloned()))
    }

    async fn find_many(&self, ids: &[Snowflake]) -> RepoResult<Vec<Profile>> {
        Ok(self.with_state(|s| ids.iter().filter_map(|id| s.profiles.get(id).cloned()).collect()))
    }

    async fn search_by_username(&self, prefix: &str, limit: i64) -> RepoResult<Vec<Profile>> {
        let prefix = prefix.to_lowercase();
        let limit = limit.clamp(1, 100) as usize;
        Ok(self.with_state(|s| {
            let mut found: Vec<Profile> = s
                .profiles
                .values()
                .filter(|p| p.username.to_lowercase().starts_with(&prefix))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.username.cmp(&b.username));
            found.truncate(limit);
            found
        }))
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        Ok(self.with_state(|s| s.profiles.values().any(|p| p.username == username)))
    }

    async fn create(&self, profile: &Profile) -> RepoResult<()> {
        let event = self.with_state(|s| {
            if s.profiles.values().any(|p| p.username == profile.username) {
                return Err(DomainError::UsernameTaken);
            }
            s.profiles.insert(profile.id, profile.clone());
            Ok(insert_event(Table::Profiles, &public_profile(profile)))
        })?;
        self.emit(event);
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> RepoResult<()> {
        let event = self.with_state(|s| {
            if s
                .profiles
                .values()
                .any(|p| p.id != profile.id && p.username == profile.username)
            {
                return Err(DomainError::UsernameTaken);
            }
            let stored = s
                .profiles
                .get_mut(&profile.id)
                .ok_or(DomainError::ProfileNotFound(profile.id))?;
            let old = public_profile(stored);
            stored.username.clone_from(&profile.username);
            stored.display_name.clone_from(&profile.display_name);
            stored.avatar_url.clone_from(&profile.avatar_url);
            stored.status_message.clone_from(&profile.status_message);
            stored.updated_at = profile.updated_at;
            Ok(update_event(Table::Profiles, &old, &public_profile(stored)))
        })?;
        self.emit(event);
        Ok(())
    }
}

#[async_trait]
impl ChatroomRepository for MemoryBackend {
    async fn list_regions(&self) -> RepoResult<Vec<Region>> {
        Ok(self.with_state(|s| {
            let mut regions: Vec<Region> = s.regions.values().cloned().collect();
            regions.sort_by_key(|r| (r.order_sequence, r.id));
            regions
        }))
    }

    async fn list_provinces(&self, region_id: Snowflake) -> RepoResult<Vec<Province>> {
        Ok(self.with_state(|s| {
            let mut provinces: Vec<Province> = s
                .provinces
                .values()
                .filter(|p| p.region_id == region_id)
                .cloned()
                .collect();
            provinces.sort_by_key(|p| (p.order_sequence, p.id));
            provinces
        }))
    }

    async fn list_by_province(&self, province_id: Snowflake) -> RepoResult<Vec<Chatroom>> {
        Ok(self.with_state(|s| {
            let mut rooms: Vec<Chatroom> = s
                .chatrooms
                .values()
                .filter(|c| c.province_id == province_id && c.is_active)
                .cloned()
                .collect();
            rooms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            rooms
        }))
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Chatroom>> {
        Ok(self.with_state(|s| s.chatrooms.get(&id).cloned()))
    }
}

#[async_trait]
impl MembershipRepository for MemoryBackend {
    async fn join(
        &self,
        chatroom_id: Snowflake,
        user_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<JoinOutcome> {
        let (outcome, event) = self.with_state(|s| {
            if let Some(existing) = s.members.get(&(chatroom_id, user_id)) {
                return Ok((JoinOutcome::AlreadyMember(existing.clone()), None));
            }
            let room = s
                .chatrooms
                .get(&chatroom_id)
                .ok_or(DomainError::ChatroomNotFound(chatroom_id))?;
            if !room.is_active {
                return Err(DomainError::ChatroomInactive);
            }
            if !room.has_capacity(s.member_count(chatroom_id)) {
                return Err(DomainError::ChatroomFull {
                    max: room.max_members,
                });
            }
            let membership = ChatroomMembership::new(chatroom_id, user_id, at);
            s.members.insert((chatroom_id, user_id), membership.clone());
            let event = insert_event(Table::ChatroomMembers, &membership);
            Ok((JoinOutcome::Joined(membership), event))
        })?;
        self.emit(event);
        Ok(outcome)
    }

    async fn leave(&self, chatroom_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let removed = self.with_state(|s| s.members.remove(&(chatroom_id, user_id)));
        let left = removed.is_some();
        self.emit(removed.and_then(|m| delete_event(Table::ChatroomMembers, &m)));
        Ok(left)
    }

    async fn is_member(&self, chatroom_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.with_state(|s| s.members.contains_key(&(chatroom_id, user_id))))
    }

    async fn count(&self, chatroom_id: Snowflake) -> RepoResult<i64> {
        Ok(self.with_state(|s| s.member_count(chatroom_id)))
    }

    async fn list_members(&self, chatroom_id: Snowflake) -> RepoResult<Vec<ChatroomMembership>> {
        Ok(self.with_state(|s| {
            let mut members: Vec<ChatroomMembership> = s
                .members
                .values()
                .filter(|m| m.chatroom_id == chatroom_id)
                .cloned()
                .collect();
            members.sort_by_key(|m| (m.joined_at, m.user_id));
            members
        }))
    }

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Chatroom>> {
        Ok(self.with_state(|s| {
            let mut joined: Vec<&ChatroomMembership> =
                s.members.values().filter(|m| m.user_id == user_id).collect();
            joined.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
            joined
                .into_iter()
                .filter_map(|m| s.chatrooms.get(&m.chatroom_id).cloned())
                .collect()
        }))
    }
}

#[async_trait]
impl MessageRepository for MemoryBackend {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        Ok(self.with_state(|s| s.messages.get(&id).cloned()))
    }

    async fn find_page(&self, chatroom_id: Snowflake, query: MessageQuery) -> RepoResult<Vec<Message>> {
        let limit = page_limit(&query);
        Ok(self.with_state(|s| {
            s.messages
                .values()
                .rev()
                .filter(|m| m.chatroom_id == chatroom_id && query.admits(m.id))
                .take(limit)
                .cloned()
                .collect()
        }))
    }

    async fn create(&self, message: &NewMessage) -> RepoResult<Message> {
        let (stored, event) = self.with_state(|s| {
            if !s.profiles.contains_key(&message.user_id) {
                return Err(DomainError::backend("23503", "messages_user_id_fkey"));
            }
            if !s.chatrooms.contains_key(&message.chatroom_id) {
                return Err(DomainError::backend("23503", "messages_chatroom_id_fkey"));
            }
            let stored = message.clone().assign(self.ids.generate());
            s.messages.insert(stored.id, stored.clone());
            let event = insert_event(Table::Messages, &stored);
            Ok((stored, event))
        })?;
        self.emit(event);
        Ok(stored)
    }

    async fn update(&self, message: &Message) -> RepoResult<()> {
        let event = self.with_state(|s| {
            let stored = s
                .messages
                .get_mut(&message.id)
                .filter(|m| !m.is_deleted)
                .ok_or(DomainError::MessageNotFound(message.id))?;
            let old = stored.clone();
            stored.content.clone_from(&message.content);
            stored.is_edited = message.is_edited;
            stored.bubble_color.clone_from(&message.bubble_color);
            Ok(update_event(Table::Messages, &old, &*stored))
        })?;
        self.emit(event);
        Ok(())
    }

    async fn soft_delete(&self, id: Snowflake) -> RepoResult<bool> {
        let event = self.with_state(|s| {
            let stored = s.messages.get_mut(&id)?;
            let old = stored.clone();
            stored.is_deleted = true;
            Some(update_event(Table::Messages, &old, &*stored))
        });
        let found = event.is_some();
        self.emit(event.flatten());
        Ok(found)
    }
}

#[async_trait]
impl DirectMessageRepository for MemoryBackend {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<DirectMessage>> {
        Ok(self.with_state(|s| s.direct_messages.get(&id).cloned()))
    }

    async fn find_conversation_page(
        &self,
        conversation_id: &ConversationId,
        query: MessageQuery,
    ) -> RepoResult<Vec<DirectMessage>> {
        let limit = page_limit(&query);
        Ok(self.with_state(|s| {
            s.direct_messages
                .values()
                .rev()
                .filter(|m| m.conversation_id == *conversation_id && query.admits(m.id))
                .take(limit)
                .cloned()
                .collect()
        }))
    }

    async fn create(&self, message: &NewDirectMessage) -> RepoResult<DirectMessage> {
        let (stored, event) = self.with_state(|s| {
            if message.sender_id == message.receiver_id {
                return Err(DomainError::backend("23514", "direct_messages_check"));
            }
            for id in [message.sender_id, message.receiver_id] {
                if !s.profiles.contains_key(&id) {
                    return Err(DomainError::backend("23503", "direct_messages_profile_fkey"));
                }
            }
            let stored = message.clone().assign(self.ids.generate());
            s.direct_messages.insert(stored.id, stored.clone());
            let event = insert_event(Table::DirectMessages, &stored);
            Ok((stored, event))
        })?;
        self.emit(event);
        Ok(stored)
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let events: Vec<_> = self.with_state(|s| {
            s.direct_messages
                .values_mut()
                .filter(|m| {
                    m.conversation_id == *conversation_id && m.receiver_id == reader_id && m.is_unread()
                })
                .filter_map(|m| {
                    let old = m.clone();
                    m.mark_read(at);
                    update_event(Table::DirectMessages, &old, &*m)
                })
                .collect()
        });
        let changed = events.len() as u64;
        self.emit(events);
        Ok(changed)
    }

    async fn unread_count(&self, user_id: Snowflake) -> RepoResult<i64> {
        Ok(self.with_state(|s| {
            s.direct_messages
                .values()
                .filter(|m| m.receiver_id == user_id && m.is_unread())
                .count() as i64
        }))
    }

    async fn conversation_summaries(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationSummary>> {
        Ok(self.with_state(|s| {
            let mut latest: HashMap<&ConversationId, ConversationSummary> = HashMap::new();
            // Ascending ids: later messages overwrite the summary's last_message
            for m in s
                .direct_messages
                .values()
                .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            {
                let unread = i64::from(m.receiver_id == user_id && m.is_unread());
                latest
                    .entry(&m.conversation_id)
                    .and_modify(|summary| {
                        summary.last_message = m.clone();
                        summary.unread_count += unread;
                    })
                    .or_insert_with(|| ConversationSummary {
                        conversation_id: m.conversation_id.clone(),
                        counterpart_id: m.counterpart(user_id),
                        counterpart: None,
                        last_message: m.clone(),
                        unread_count: unread,
                    });
            }
            let mut summaries: Vec<ConversationSummary> = latest.into_values().collect();
            summaries.sort_by(|a, b| b.last_message.id.cmp(&a.last_message.id));
            summaries
        }))
    }
}

#[async_trait]
impl RateLimitRepository for MemoryBackend {
    async fn hit(
        &self,
        user_id: Snowflake,
        action: RateLimitAction,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RepoResult<RateLimitDecision> {
        Ok(self.with_state(|s| match s.rate_limits.get_mut(&(user_id, action)) {
            Some(counter) => counter.register(policy, now),
            None => {
                let counter = RateLimitCounter::first(user_id, action, now);
                let remaining = policy.max_requests.saturating_sub(1);
                s.rate_limits.insert((user_id, action), counter);
                RateLimitDecision::Allowed { remaining }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_backend;
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    fn seeded() -> (MemoryBackend, Snowflake, Snowflake) {
        let backend = test_backend();
        let region = Region {
            id: Snowflake::new(1),
            name: "North".to_string(),
            order_sequence: 1,
        };
        let province = Province {
            id: Snowflake::new(2),
            region_id: region.id,
            name: "Hill".to_string(),
            order_sequence: 1,
        };
        let room = Chatroom::new(Snowflake::new(3), province.id, "Lobby".to_string(), 100);
        backend.seed_region(region);
        backend.seed_province(province);
        backend.seed_chatroom(room.clone());
        let user = Profile::new(Snowflake::new(10), "alice".to_string());
        backend.seed_profile(user.clone());
        (backend, room.id, user.id)
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let (backend, room, user) = seeded();
        let first = backend.join(room, user, Utc::now()).await.unwrap();
        let second = backend.join(room, user, Utc::now()).await.unwrap();
        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.membership(), second.membership());
        assert_eq!(MembershipRepository::count(&backend, room).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_join_rejects_missing_inactive_and_full_rooms() {
        let (backend, room, user) = seeded();
        let missing = backend.join(Snowflake::new(999), user, Utc::now()).await;
        assert!(matches!(missing, Err(DomainError::ChatroomNotFound(_))));

        backend.set_chatroom_active(room, false);
        let inactive = backend.join(room, user, Utc::now()).await;
        assert!(matches!(inactive, Err(DomainError::ChatroomInactive)));

        let tiny = Chatroom::new(Snowflake::new(4), Snowflake::new(2), "Tiny".to_string(), 1);
        backend.seed_chatroom(tiny.clone());
        backend.join(tiny.id, user, Utc::now()).await.unwrap();
        let full = backend.join(tiny.id, Snowflake::new(11), Utc::now()).await;
        assert!(matches!(full, Err(DomainError::ChatroomFull { max: 1 })));
    }

    #[tokio::test]
    async fn test_pages_are_newest_first_and_disjoint() {
        let (backend, room, user) = seeded();
        for i in 0..5 {
            let message = NewMessage::new(room, user, format!("m{i}"));
            MessageRepository::create(&backend, &message).await.unwrap();
        }

        let first = backend.find_page(room, MessageQuery::latest(3)).await.unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0].id > w[1].id));

        let cursor = first.last().map(|m| m.id);
        let second = backend
            .find_page(room, MessageQuery::before(cursor, 3))
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|m| Some(m.id) < cursor));
    }

    #[tokio::test]
    async fn test_clones_assign_distinct_ids() {
        let (backend, room, alice) = seeded();
        let bob = Profile::new(Snowflake::new(20), "bob".to_string());
        backend.seed_profile(bob.clone());
        let other = backend.clone();

        let mut ids = HashSet::new();
        for i in 0..50 {
            let msg_a = NewMessage::new(room, alice, format!("a{i}"));
            let msg_b = NewMessage::new(room, bob.id, format!("b{i}"));
            let (a, b) = tokio::join!(
                MessageRepository::create(&backend, &msg_a),
                MessageRepository::create(&other, &msg_b),
            );
            let (a, b) = (a.unwrap(), b.unwrap());
            assert_eq!(a.created_at, a.id.created_at());
            ids.insert(a.id);
            ids.insert(b.id);
        }
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_author() {
        let (backend, room, _) = seeded();
        let result =
            MessageRepository::create(&backend, &NewMessage::new(room, Snowflake::new(77), "x".to_string())).await;
        assert!(matches!(result, Err(DomainError::Backend { .. })));
    }

    #[tokio::test]
    async fn test_soft_deleted_messages_stay_in_pages() {
        let (backend, room, user) = seeded();
        let message = MessageRepository::create(&backend, &NewMessage::new(room, user, "x".to_string()))
            .await
            .unwrap();

        assert!(backend.soft_delete(message.id).await.unwrap());
        assert!(!backend.soft_delete(Snowflake::new(1)).await.unwrap());

        let page = backend.find_page(room, MessageQuery::latest(10)).await.unwrap();
        assert!(page[0].is_deleted);
    }

    #[tokio::test]
    async fn test_conversation_summaries_count_unread_per_reader() {
        let (backend, _, alice) = seeded();
        let bob = Profile::new(Snowflake::new(20), "bob".to_string());
        backend.seed_profile(bob.clone());

        for text in ["one", "two"] {
            let dm = NewDirectMessage::new(bob.id, alice, text.to_string());
            DirectMessageRepository::create(&backend, &dm).await.unwrap();
        }
        let reply = NewDirectMessage::new(alice, bob.id, "three".to_string());
        let reply = DirectMessageRepository::create(&backend, &reply).await.unwrap();

        let summaries = backend.conversation_summaries(alice).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].counterpart_id, bob.id);
        assert_eq!(summaries[0].unread_count, 2);
        assert_eq!(summaries[0].last_message.id, reply.id);

        let conversation = ConversationId::between(alice, bob.id);
        let changed = backend
            .mark_conversation_read(&conversation, alice, Utc::now())
            .await
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(backend.unread_count(alice).await.unwrap(), 0);
        assert_eq!(backend.unread_count(bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_counts_first_call() {
        let (backend, _, user) = seeded();
        let policy = RateLimitPolicy::new(2, Duration::seconds(60));
        let now = Utc::now();
        let action = RateLimitAction::SendMessage;

        assert_eq!(
            backend.hit(user, action, &policy, now).await.unwrap(),
            RateLimitDecision::Allowed { remaining: 1 }
        );
        assert!(backend.hit(user, action, &policy, now).await.unwrap().is_allowed());
        assert!(!backend.hit(user, action, &policy, now).await.unwrap().is_allowed());
        assert!(backend
            .hit(user, RateLimitAction::SendDirectMessage, &policy, now)
            .await
            .unwrap()
            .is_allowed());
    }
}
