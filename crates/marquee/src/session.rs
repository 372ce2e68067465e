use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::models::message::Message;

/// One conversation's history. Only the conversation loop serving it mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
}

impl Session {
    /// Start a fresh session whose history opens with `system_prompt`
    pub fn new<S: Into<String>>(id: S, system_prompt: &str) -> Self {
        Self {
            id: id.into(),
            messages: vec![Message::system(system_prompt)],
        }
    }
}

/// Where session histories live between turns
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Vec<Message>>>;
    async fn save(&self, id: &str, messages: &[Message]) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Vec<Message>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<Vec<Message>>> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn save(&self, id: &str, messages: &[Message]) -> Result<()> {
        self.sessions
            .lock()
            .await
            .insert(id.to_string(), messages.to_vec());
        Ok(())
    }
}

/// Sessions as JSONL files, one message per line
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    /// The default location, ~/.config/marquee/sessions
    pub fn in_config_dir() -> Result<Self> {
        Self::new(ensure_session_dir()?)
    }

    /// Where the session `id` is recorded. Ids that could step outside the
    /// sessions directory are rejected.
    pub fn session_file(&self, id: &str) -> Result<PathBuf> {
        validate_session_id(id)?;
        Ok(self.dir.join(format!("{}.jsonl", id)))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: &str) -> Result<Option<Vec<Message>>> {
        let path = self.session_file(id)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(deserialize_messages(File::open(path)?)?))
    }

    async fn save(&self, id: &str, messages: &[Message]) -> Result<()> {
        persist_messages(&self.session_file(id)?, messages)
    }
}

fn validate_session_id(id: &str) -> Result<()> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(anyhow::anyhow!("invalid session id: {:?}", id));
    }
    Ok(())
}

pub fn ensure_session_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_dir = home_dir.join(".config").join("marquee").join("sessions");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn persist_messages(session_file: &Path, messages: &[Message]) -> Result<()> {
    let file = File::create(session_file)?; // Create or truncate the file
    let mut writer = std::io::BufWriter::new(file);

    for message in messages {
        serde_json::to_writer(&mut writer, &message)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn deserialize_messages(file: File) -> Result<Vec<Message>> {
    let reader = BufReader::new(file);
    let mut messages = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        messages.push(serde_json::from_str(&line)?);
    }

    Ok(messages)
}
