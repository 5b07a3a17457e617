//! Conversation sessions persisted as JSON files.
//!
//! The store root holds `current_session.json`, a copy of the active session, and a
//! `sessions/` directory with one `<id>.json` file per session that has at least one turn.

use std::io;

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utf8path::Path;

use crate::error::{Error, Result};
use crate::types::{ChatMessage, ChatRole};
use crate::utils::time as timestamps;

const CURRENT_SESSION_FILE: &str = "current_session.json";
const SESSIONS_DIR: &str = "sessions";
const PREVIEW_CHARS: usize = 50;
const ID_SUFFIX_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ID_SUFFIX_LEN: usize = 6;

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

impl From<&HistoryMessage> for ChatMessage {
    fn from(message: &HistoryMessage) -> Self {
        ChatMessage::new(message.role, message.content.clone())
    }
}

/// A conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,
    #[serde(with = "crate::utils::time")]
    pub updated_at: OffsetDateTime,
}

impl Session {
    fn new() -> Self {
        let now = timestamps::now();
        Self {
            id: generate_session_id(now),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The first user message, truncated for display.
    pub fn preview(&self) -> String {
        let Some(first) = self.messages.iter().find(|m| m.role == ChatRole::User) else {
            return String::new();
        };
        if first.content.chars().count() > PREVIEW_CHARS {
            let mut preview: String = first.content.chars().take(PREVIEW_CHARS).collect();
            preview.push_str("...");
            preview
        } else {
            first.content.clone()
        }
    }
}

/// Summary of a stored session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub preview: String,
    pub message_count: usize,
}

/// Generate a session id of the form `YYYYMMDD-HHMMSS-xxxxxx`.
pub fn generate_session_id(at: OffsetDateTime) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_LETTERS[rng.random_range(0..ID_SUFFIX_LETTERS.len())] as char)
        .collect();
    format!("{}-{}", timestamps::session_stamp(at), suffix)
}

fn check_session_id(id: &str) -> Result<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(Error::validation(
            format!("invalid session id: {id:?}"),
            Some("session".to_string()),
        ));
    }
    Ok(())
}

/// The session store.
#[derive(Debug)]
pub struct SessionStore {
    root: Path<'static>,
    current: Session,
}

impl SessionStore {
    /// Open the store rooted at `root`, resuming the current session or starting a new one.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root.clone().into_owned();
        let sessions = root.join(SESSIONS_DIR).into_owned();
        std::fs::create_dir_all(&sessions).map_err(|err| {
            Error::io(
                format!("failed to create history directory {}", sessions.as_str()),
                err,
            )
        })?;
        let current_path = root.join(CURRENT_SESSION_FILE).into_owned();
        match read_session(&current_path) {
            Ok(current) => Ok(Self { root, current }),
            Err(err) => {
                if !err.is_not_found() {
                    tracing::warn!(error = %err, "could not load current session; starting a new one");
                }
                let store = Self {
                    root,
                    current: Session::new(),
                };
                store.save_current()?;
                Ok(store)
            }
        }
    }

    fn sessions_dir(&self) -> Path<'static> {
        self.root.join(SESSIONS_DIR).into_owned()
    }

    fn session_path(&self, id: &str) -> Path<'static> {
        let file = format!("{id}.json");
        self.sessions_dir().join(file.as_str()).into_owned()
    }

    fn save_current(&self) -> Result<()> {
        write_session(&self.root.join(CURRENT_SESSION_FILE), &self.current)
    }

    /// The active session.
    pub fn current(&self) -> &Session {
        &self.current
    }

    pub fn current_id(&self) -> &str {
        &self.current.id
    }

    pub fn messages(&self) -> &[HistoryMessage] {
        &self.current.messages
    }

    pub fn is_empty(&self) -> bool {
        self.current.messages.is_empty()
    }

    /// The active session as messages to prepend to a request.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.current.messages.iter().map(ChatMessage::from).collect()
    }

    /// Append a question and its answer to the active session and persist it.
    pub fn record_turn(&mut self, question: &str, answer: &str) -> Result<()> {
        let now = timestamps::now();
        self.current.messages.push(HistoryMessage {
            role: ChatRole::User,
            content: question.to_string(),
            timestamp: now,
        });
        self.current.messages.push(HistoryMessage {
            role: ChatRole::Assistant,
            content: answer.to_string(),
            timestamp: now,
        });
        self.current.updated_at = now;
        self.save_current()?;
        write_session(&self.session_path(&self.current.id), &self.current)?;
        tracing::debug!(session = %self.current.id, messages = self.current.messages.len(), "recorded turn");
        Ok(())
    }

    /// Start a new, empty session and make it current.
    pub fn new_session(&mut self) -> Result<&Session> {
        self.current = Session::new();
        self.save_current()?;
        Ok(&self.current)
    }

    /// Every stored session, most recently updated first.  Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<SessionInfo>> {
        let dir = self.sessions_dir();
        let entries = std::fs::read_dir(&dir).map_err(|err| {
            Error::io(format!("failed to read {}", dir.as_str()), err)
        })?;
        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(id) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let session = match read_session(&self.session_path(id)) {
                Ok(session) => session,
                Err(err) => {
                    tracing::warn!(session = %id, error = %err, "skipping unreadable session");
                    continue;
                }
            };
            sessions.push(SessionInfo {
                preview: session.preview(),
                message_count: session.messages.len(),
                id: session.id,
                created_at: session.created_at,
                updated_at: session.updated_at,
            });
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Turn a 1-based list number or a session id into a session id.
    pub fn resolve(&self, identifier: &str) -> Result<String> {
        let Ok(index) = identifier.parse::<usize>() else {
            return Ok(identifier.to_string());
        };
        let sessions = self.list()?;
        if index < 1 || index > sessions.len() {
            return Err(Error::validation(
                format!("invalid session number: {index}"),
                Some("session".to_string()),
            ));
        }
        Ok(sessions[index - 1].id.clone())
    }

    /// Make the stored session `id` current.
    pub fn switch(&mut self, id: &str) -> Result<()> {
        check_session_id(id)?;
        self.current = read_session(&self.session_path(id))?;
        self.save_current()
    }

    /// Delete the stored session `id`.  The current session cannot be deleted.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        check_session_id(id)?;
        if id == self.current.id {
            return Err(Error::validation(
                "cannot delete the current session, please switch to another session first",
                Some("session".to_string()),
            ));
        }
        let path = self.session_path(id);
        std::fs::remove_file(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => session_not_found(id),
            _ => Error::io(format!("failed to delete {}", path.as_str()), err),
        })
    }
}

fn session_not_found(id: &str) -> Error {
    Error::not_found(id, Some("session".to_string()), None)
}

fn read_session(path: &Path) -> Result<Session> {
    let data = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => {
            let id = std::path::Path::new(path.as_str())
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(path.as_str());
            session_not_found(id)
        }
        _ => Error::io(format!("failed to read {}", path.as_str()), err),
    })?;
    serde_json::from_str(&data).map_err(|err| {
        Error::serialization(
            format!("failed to parse session {}: {err}", path.as_str()),
            Some(Box::new(err)),
        )
    })
}

fn write_session(path: &Path, session: &Session) -> Result<()> {
    let data = serde_json::to_string_pretty(session)?;
    std::fs::write(path, data)
        .map_err(|err| Error::io(format!("failed to write {}", path.as_str()), err))
}
