//! Conversation summaries derived from the message log
//!
//! A conversation is never stored. It is recomputed per viewing user from
//! every message the user sent or received.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Message, UserProfile};
use crate::value_objects::UserId;

/// Per-viewer summary of the exchange with one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// The other party
    pub user: UserProfile,
    /// Most recent message in either direction
    pub last_message: Message,
    /// Messages from the peer to the viewer with no read timestamp
    pub unread_count: u64,
}

/// Group `messages` by peer and summarize them for `viewer`.
///
/// Messages not involving the viewer are ignored. The newest message by
/// `created_at` wins; on equal timestamps the one seen first in `messages`
/// is kept. The result is sorted by last message time, newest first, with a
/// stable sort so equal timestamps keep first-seen peer order.
pub fn summarize_conversations(
    viewer: &UserId,
    messages: &[Message],
    profiles: &HashMap<UserId, UserProfile>,
) -> Vec<Conversation> {
    struct Group<'a> {
        last: &'a Message,
        unread: u64,
    }

    let mut order: Vec<&UserId> = Vec::new();
    let mut groups: HashMap<&UserId, Group<'_>> = HashMap::new();

    for message in messages {
        let Some(peer) = message.peer_of(viewer) else {
            continue;
        };
        let unread = u64::from(message.is_unread_for(viewer));

        match groups.get_mut(peer) {
            Some(group) => {
                if message.created_at > group.last.created_at {
                    group.last = message;
                }
                group.unread += unread;
            }
            None => {
                order.push(peer);
                groups.insert(
                    peer,
                    Group {
                        last: message,
                        unread,
                    },
                );
            }
        }
    }

    let mut conversations: Vec<Conversation> = order
        .into_iter()
        .filter_map(|peer| {
            let group = groups.get(peer)?;
            let user = profiles
                .get(peer)
                .cloned()
                .unwrap_or_else(|| UserProfile::placeholder(peer));
            Some(Conversation {
                user,
                last_message: group.last.clone(),
                unread_count: group.unread,
            })
        })
        .collect();

    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    conversations
}
