//! Persisted RAG chat transcripts.
//!
//! A chat belongs to the identity that created it. Every read and write
//! checks ownership; another identity's chat answers `Forbidden`, never the
//! transcript.

use crate::error::{LaunchpadError, Result};
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const CHATS_COLLECTION: &str = "rag_chats";
pub const RECENT_CHAT_LIMIT: usize = 20;
const TITLE_MAX_CHARS: usize = 50;
const UNTITLED: &str = "New Chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Transcription, sources and document counts from the RAG service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(rename = "_id")]
    pub chat_id: String,
    pub session_id: String,
    pub user_id: String,
    pub title: String,
    pub messages: Vec<RagMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sidebar entry: everything but the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSummary {
    #[serde(rename = "_id")]
    pub chat_id: String,
    pub session_id: String,
    pub title: String,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&ChatRecord> for ChatSummary {
    fn from(chat: &ChatRecord) -> Self {
        Self {
            chat_id: chat.chat_id.clone(),
            session_id: chat.session_id.clone(),
            title: chat.title.clone(),
            message_count: chat.messages.len(),
            updated_at: chat.updated_at,
        }
    }
}

/// Result of [`delete_all`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedChats {
    pub deleted_count: usize,
    /// Distinct remote sessions the deleted chats referenced.
    pub session_ids: Vec<String>,
}

/// First user message, truncated to 50 characters.
pub fn derive_title(messages: &[RagMessage]) -> String {
    let Some(first) = messages
        .iter()
        .find(|m| m.role == MessageRole::User && !m.content.trim().is_empty())
    else {
        return UNTITLED.to_string();
    };
    let content = first.content.trim();
    if content.chars().count() <= TITLE_MAX_CHARS {
        content.to_string()
    } else {
        let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str("...");
        title
    }
}

fn owned_by(store: &dyn DocumentStore, owner: &str) -> Result<Vec<ChatRecord>> {
    let mut chats = Vec::new();
    for (key, doc) in store.list(CHATS_COLLECTION)? {
        match serde_json::from_value::<ChatRecord>(doc) {
            Ok(chat) if chat.user_id == owner => chats.push(chat),
            Ok(_) => {}
            Err(e) => tracing::warn!(chat_id = %key, error = %e, "skipping unreadable chat"),
        }
    }
    Ok(chats)
}

fn fetch(store: &dyn DocumentStore, owner: &str, chat_id: &str) -> Result<ChatRecord> {
    let doc = store
        .get(CHATS_COLLECTION, chat_id)?
        .ok_or_else(|| LaunchpadError::ChatNotFound(chat_id.to_string()))?;
    let chat: ChatRecord = serde_json::from_value(doc)?;
    if chat.user_id != owner {
        return Err(LaunchpadError::Forbidden);
    }
    Ok(chat)
}

/// Newest first, at most `limit` entries.
pub fn list_recent(
    store: &dyn DocumentStore,
    owner: &str,
    limit: usize,
) -> Result<Vec<ChatSummary>> {
    let mut chats = owned_by(store, owner)?;
    chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(chats.iter().take(limit).map(ChatSummary::from).collect())
}

/// Create a chat, or replace the transcript of an owned chat when
/// `chat_id` names one. Returns the chat id.
pub fn save_chat(
    store: &dyn DocumentStore,
    owner: &str,
    session_id: &str,
    messages: Vec<RagMessage>,
    chat_id: Option<&str>,
) -> Result<String> {
    if session_id.trim().is_empty() {
        return Err(LaunchpadError::validation(
            "session_id and messages are required",
        ));
    }
    let now = Utc::now();
    let title = derive_title(&messages);

    let existing = match chat_id {
        Some(id) => match fetch(store, owner, id) {
            Ok(chat) => Some(chat),
            Err(LaunchpadError::ChatNotFound(_)) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    let chat = match existing {
        Some(prev) => ChatRecord {
            session_id: session_id.to_string(),
            title,
            messages,
            updated_at: now,
            ..prev
        },
        None => ChatRecord {
            chat_id: chat_id
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            session_id: session_id.to_string(),
            user_id: owner.to_string(),
            title,
            messages,
            created_at: now,
            updated_at: now,
        },
    };

    store.put(CHATS_COLLECTION, &chat.chat_id, &serde_json::to_value(&chat)?)?;
    tracing::debug!(chat_id = %chat.chat_id, messages = chat.messages.len(), "chat saved");
    Ok(chat.chat_id)
}

pub fn load_chat(store: &dyn DocumentStore, owner: &str, chat_id: &str) -> Result<ChatRecord> {
    fetch(store, owner, chat_id)
}

/// Delete an owned chat and return it, so the caller can release its
/// remote session.
pub fn delete_chat(store: &dyn DocumentStore, owner: &str, chat_id: &str) -> Result<ChatRecord> {
    let chat = fetch(store, owner, chat_id)?;
    if !store.delete(CHATS_COLLECTION, chat_id)? {
        return Err(LaunchpadError::ChatNotFound(chat_id.to_string()));
    }
    Ok(chat)
}

pub fn delete_all(store: &dyn DocumentStore, owner: &str) -> Result<DeletedChats> {
    let chats = owned_by(store, owner)?;
    let mut session_ids = BTreeSet::new();
    let mut deleted_count = 0;
    for chat in &chats {
        if store.delete(CHATS_COLLECTION, &chat.chat_id)? {
            deleted_count += 1;
        }
        session_ids.insert(chat.session_id.clone());
    }
    Ok(DeletedChats {
        deleted_count,
        session_ids: session_ids.into_iter().collect(),
    })
}

/// Whether any remaining chat of `owner` still uses `session_id`.
pub fn session_referenced(store: &dyn DocumentStore, owner: &str, session_id: &str) -> Result<bool> {
    Ok(owned_by(store, owner)?
        .iter()
        .any(|c| c.session_id == session_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn msg(role: MessageRole, content: &str) -> RagMessage {
        RagMessage {
            id: None,
            role,
            content: content.to_string(),
            timestamp: None,
            metadata: None,
        }
    }

    #[test]
    fn title_from_first_user_message() {
        let messages = vec![
            msg(MessageRole::System, "Documents uploaded"),
            msg(MessageRole::User, "What is our burn rate?"),
        ];
        assert_eq!(derive_title(&messages), "What is our burn rate?");
        assert_eq!(derive_title(&[]), "New Chat");

        let long = "x".repeat(80);
        let title = derive_title(&[msg(MessageRole::User, &long)]);
        assert_eq!(title, format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn message_wire_shape_uses_type_field() {
        let m: RagMessage = serde_json::from_str(
            r#"{"id":"m1","type":"assistant","content":"hi","timestamp":"2025-01-01T00:00:00Z",
                "metadata":{"sources":["deck.pdf"]}}"#,
        )
        .unwrap();
        assert_eq!(m.role, MessageRole::Assistant);
        assert_eq!(m.metadata.unwrap()["sources"][0], "deck.pdf");
    }

    #[test]
    fn save_then_update_owned_chat() {
        let store = MemoryStore::new();
        let id = save_chat(&store, "a@x.io", "s-1", vec![msg(MessageRole::User, "hi")], None)
            .unwrap();
        let again = save_chat(
            &store,
            "a@x.io",
            "s-1",
            vec![msg(MessageRole::User, "hi"), msg(MessageRole::Assistant, "hello")],
            Some(&id),
        )
        .unwrap();
        assert_eq!(id, again);

        let chat = load_chat(&store, "a@x.io", &id).unwrap();
        assert_eq!(chat.messages.len(), 2);
        assert!(chat.updated_at >= chat.created_at);
        assert_eq!(list_recent(&store, "a@x.io", RECENT_CHAT_LIMIT).unwrap().len(), 1);
    }

    #[test]
    fn other_identity_is_forbidden() {
        let store = MemoryStore::new();
        let id = save_chat(&store, "a@x.io", "s-1", vec![], None).unwrap();

        assert!(matches!(
            load_chat(&store, "b@x.io", &id),
            Err(LaunchpadError::Forbidden)
        ));
        assert!(matches!(
            delete_chat(&store, "b@x.io", &id),
            Err(LaunchpadError::Forbidden)
        ));
        assert!(matches!(
            save_chat(&store, "b@x.io", "s-2", vec![], Some(&id)),
            Err(LaunchpadError::Forbidden)
        ));
        assert!(list_recent(&store, "b@x.io", 20).unwrap().is_empty());
    }

    #[test]
    fn missing_chat_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            load_chat(&store, "a@x.io", "nope"),
            Err(LaunchpadError::ChatNotFound(_))
        ));
    }

    #[test]
    fn list_is_newest_first_and_limited() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(save_chat(&store, "a@x.io", &format!("s-{i}"), vec![], None).unwrap());
        }
        // Touch the first chat so it becomes the newest.
        std::thread::sleep(std::time::Duration::from_millis(5));
        save_chat(&store, "a@x.io", "s-0", vec![], Some(&ids[0])).unwrap();

        let recent = list_recent(&store, "a@x.io", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].chat_id, ids[0]);
    }

    #[test]
    fn delete_all_reports_distinct_sessions() {
        let store = MemoryStore::new();
        save_chat(&store, "a@x.io", "s-1", vec![], None).unwrap();
        save_chat(&store, "a@x.io", "s-1", vec![], None).unwrap();
        save_chat(&store, "a@x.io", "s-2", vec![], None).unwrap();
        save_chat(&store, "b@x.io", "s-3", vec![], None).unwrap();

        let deleted = delete_all(&store, "a@x.io").unwrap();
        assert_eq!(deleted.deleted_count, 3);
        assert_eq!(deleted.session_ids, vec!["s-1", "s-2"]);
        assert_eq!(list_recent(&store, "b@x.io", 20).unwrap().len(), 1);
    }

    #[test]
    fn session_reference_survives_until_last_chat_deleted() {
        let store = MemoryStore::new();
        let first = save_chat(&store, "a@x.io", "s-1", vec![], None).unwrap();
        let second = save_chat(&store, "a@x.io", "s-1", vec![], None).unwrap();

        let deleted = delete_chat(&store, "a@x.io", &first).unwrap();
        assert_eq!(deleted.session_id, "s-1");
        assert!(session_referenced(&store, "a@x.io", "s-1").unwrap());

        delete_chat(&store, "a@x.io", &second).unwrap();
        assert!(!session_referenced(&store, "a@x.io", "s-1").unwrap());
    }
}
