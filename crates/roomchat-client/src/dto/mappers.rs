//! Joins between rows and the profiles they reference

use std::collections::HashMap;

use roomchat_core::{
    ChatroomMembership, ConversationSummary, Message, MessageWithAuthor, Profile, ProfileSummary,
    Snowflake,
};

use super::MemberResponse;

/// Distinct ids, first-seen order
pub fn distinct_ids(ids: impl IntoIterator<Item = Snowflake>) -> Vec<Snowflake> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn summaries_by_id(profiles: &[Profile]) -> HashMap<Snowflake, ProfileSummary> {
    profiles.iter().map(|p| (p.id, ProfileSummary::from(p))).collect()
}

/// Attach author summaries; unknown authors stay `None`
pub fn attach_authors(messages: Vec<Message>, profiles: &[Profile]) -> Vec<MessageWithAuthor> {
    let authors = summaries_by_id(profiles);
    messages
        .into_iter()
        .map(|message| MessageWithAuthor {
            author: authors.get(&message.user_id).cloned(),
            message,
        })
        .collect()
}

pub fn attach_member_profiles(
    members: Vec<ChatroomMembership>,
    profiles: &[Profile],
) -> Vec<MemberResponse> {
    let by_id = summaries_by_id(profiles);
    members
        .into_iter()
        .map(|m| MemberResponse {
            profile: by_id.get(&m.user_id).cloned(),
            user_id: m.user_id,
            joined_at: m.joined_at,
        })
        .collect()
}

pub fn attach_counterparts(
    summaries: Vec<ConversationSummary>,
    profiles: &[Profile],
) -> Vec<ConversationSummary> {
    let by_id = summaries_by_id(profiles);
    summaries
        .into_iter()
        .map(|mut s| {
            s.counterpart = by_id.get(&s.counterpart_id).cloned();
            s
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_ids_keeps_order() {
        let ids = [3, 1, 3, 2, 1].map(Snowflake::new);
        assert_eq!(distinct_ids(ids), [3, 1, 2].map(Snowflake::new).to_vec());
    }

    #[test]
    fn test_missing_author_is_none() {
        let kim = Profile::new(Snowflake::new(1), "kim".to_string());
        let messages = vec![
            Message::new(Snowflake::new(10), Snowflake::new(5), kim.id, "hi".to_string()),
            Message::new(Snowflake::new(11), Snowflake::new(5), Snowflake::new(2), "yo".to_string()),
        ];

        let joined = attach_authors(messages, &[kim]);
        assert_eq!(joined[0].author.as_ref().unwrap().username, "kim");
        assert!(joined[1].author.is_none());
    }
}
