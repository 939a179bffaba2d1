//! Conversation sessions.
//!
//! A session owns one [`DialogState`] plus the transcript of the
//! conversation. Sessions are stored as JSONL files: the first line holds
//! metadata (timestamps and the dialog state), every following line is one
//! message.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::dialog::DialogState;

/// A conversation with its dialog state and transcript.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: String,
    pub state: DialogState,
    pub messages: Vec<SessionMessage>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize)]
struct Metadata {
    #[serde(rename = "_type")]
    kind: String,
    /// Files written before keys were recorded fall back to the file stem.
    #[serde(default)]
    key: String,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    state: DialogState,
}

impl Session {
    pub fn new(key: &str) -> Self {
        let now = chrono::Local::now().to_rfc3339();
        Self {
            key: key.to_string(),
            state: DialogState::new(),
            messages: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, role: &str, content: &str) {
        let now = chrono::Local::now().to_rfc3339();
        self.messages.push(SessionMessage {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: now.clone(),
        });
        self.updated_at = now;
    }

    /// Drop the transcript and any half-finished dialog.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.state.reset();
        self.updated_at = chrono::Local::now().to_rfc3339();
    }
}

/// Keyed sessions with file-based persistence.
pub struct SessionManager {
    sessions_dir: PathBuf,
    cache: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new(sessions_dir: &Path) -> Self {
        if let Err(e) = std::fs::create_dir_all(sessions_dir) {
            warn!(dir = %sessions_dir.display(), error = %e, "Could not create sessions directory");
        }

        Self {
            sessions_dir: sessions_dir.to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Get an existing session (from cache or disk) or create a new one.
    pub fn get_or_create(&mut self, key: &str) -> &mut Session {
        let dir = &self.sessions_dir;
        self.cache
            .entry(key.to_string())
            .or_insert_with(|| load(dir, key).unwrap_or_else(|| Session::new(key)))
    }

    /// Save a cached session to disk. Unknown keys are a no-op.
    pub fn save(&self, key: &str) -> anyhow::Result<()> {
        let Some(session) = self.cache.get(key) else {
            return Ok(());
        };

        let metadata = Metadata {
            kind: "metadata".into(),
            key: session.key.clone(),
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
            state: session.state.clone(),
        };
        let mut lines = vec![serde_json::to_string(&metadata)?];
        for msg in &session.messages {
            lines.push(serde_json::to_string(msg)?);
        }

        let path = session_path(&self.sessions_dir, key);
        std::fs::write(&path, lines.join("\n") + "\n")
            .with_context(|| format!("Failed to write session {}", path.display()))?;
        debug!(session = key, messages = session.messages.len(), "Saved session");
        Ok(())
    }

    /// Delete a session from cache and disk. Returns whether a file was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.cache.remove(key);
        let path = session_path(&self.sessions_dir, key);
        path.exists() && std::fs::remove_file(path).is_ok()
    }

    /// List saved sessions as `(key, updated_at)`, newest first.
    pub fn list_sessions(&self) -> Vec<(String, String)> {
        let mut sessions = Vec::new();

        if let Ok(entries) = std::fs::read_dir(&self.sessions_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "jsonl") {
                    let stem = path
                        .file_stem()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string();

                    let meta = std::fs::read_to_string(&path)
                        .ok()
                        .and_then(|c| c.lines().next().map(|l| l.to_string()))
                        .and_then(|l| serde_json::from_str::<Metadata>(&l).ok());
                    let (key, updated) = match meta {
                        Some(m) if !m.key.is_empty() => (m.key, m.updated_at),
                        Some(m) => (stem, m.updated_at),
                        None => (stem, String::new()),
                    };

                    sessions.push((key, updated));
                }
            }
        }

        sessions.sort_by(|a, b| b.1.cmp(&a.1));
        sessions
    }
}

fn session_path(dir: &Path, key: &str) -> PathBuf {
    let safe_name = key.replace([':', '/', '\\'], "_");
    dir.join(format!("{}.jsonl", safe_name))
}

fn load(dir: &Path, key: &str) -> Option<Session> {
    let content = std::fs::read_to_string(session_path(dir, key)).ok()?;

    let mut session = Session::new(key);
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Ok(meta) = serde_json::from_str::<Metadata>(line) {
            if meta.kind == "metadata" {
                session.created_at = meta.created_at;
                session.updated_at = meta.updated_at;
                session.state = meta.state;
                continue;
            }
        }
        match serde_json::from_str::<SessionMessage>(line) {
            Ok(msg) => session.messages.push(msg),
            Err(e) => warn!(session = key, error = %e, "Skipping unparseable session line"),
        }
    }

    debug!(session = key, messages = session.messages.len(), "Loaded session");
    Some(session)
}
