use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::models::function_call::FunctionCall;
use crate::models::tool::Tool;

pub const PLAN: &str = "plan.md";
pub const INDEX_HTML: &str = "index.html";
pub const STYLE_CSS: &str = "style.css";

/// Every document the implementation agent sees, in prompt order
pub const ARTIFACTS: [&str; 3] = [PLAN, INDEX_HTML, STYLE_CSS];

/// Name of the function that writes an artifact
pub const UPDATE_ARTIFACT: &str = "updateArtifact";

/// Arguments of an `updateArtifact` call: a whole replacement document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactUpdate {
    pub filename: String,
    pub contents: String,
}

impl ArtifactUpdate {
    pub fn new<F: Into<String>, C: Into<String>>(filename: F, contents: C) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }

    /// Read the update out of an `updateArtifact` function call
    pub fn from_call(call: &FunctionCall) -> Result<Self> {
        if call.function_name != UPDATE_ARTIFACT {
            return Err(anyhow!("not an {} call: {}", UPDATE_ARTIFACT, call.function_name));
        }
        serde_json::from_value(serde_json::Value::Object(call.arguments.clone()))
            .context("updateArtifact needs string `filename` and `contents`")
    }

    pub fn tool() -> Tool {
        Tool::new(
            UPDATE_ARTIFACT,
            "Update an artifact file",
            json!({
                "type": "object",
                "properties": {
                    "filename": {"type": "string"},
                    "contents": {"type": "string"}
                },
                "required": ["filename", "contents"]
            }),
        )
    }
}

/// Acknowledgment that an artifact was written
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactAck {
    pub filename: String,
    pub bytes: usize,
}

/// The owner of the artifact documents
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Current contents, or an empty string for a document that doesn't exist yet
    async fn read(&self, filename: &str) -> Result<String>;

    /// Replace a document wholesale
    async fn update(&self, update: ArtifactUpdate) -> Result<ArtifactAck>;
}

fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
    {
        return Err(anyhow!("invalid artifact name: {:?}", filename));
    }
    Ok(())
}

/// Artifacts as files in one directory
pub struct DirectoryArtifactStore {
    dir: PathBuf,
}

impl DirectoryArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create artifact directory {}", dir.display()))?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl ArtifactStore for DirectoryArtifactStore {
    async fn read(&self, filename: &str) -> Result<String> {
        validate_filename(filename)?;
        match tokio::fs::read_to_string(self.dir.join(filename)).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read artifact {}", filename)),
        }
    }

    async fn update(&self, update: ArtifactUpdate) -> Result<ArtifactAck> {
        validate_filename(&update.filename)?;
        tokio::fs::write(self.dir.join(&update.filename), &update.contents)
            .await
            .with_context(|| format!("Failed to write artifact {}", update.filename))?;
        Ok(ArtifactAck {
            bytes: update.contents.len(),
            filename: update.filename,
        })
    }
}

/// Artifacts held in memory; keeps a log of every write
#[derive(Default)]
pub struct MemoryArtifactStore {
    files: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<ArtifactUpdate>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<F: Into<String>, C: Into<String>>(mut self, filename: F, contents: C) -> Self {
        self.files
            .get_mut()
            .insert(filename.into(), contents.into());
        self
    }

    /// Every update applied so far, oldest first
    pub async fn writes(&self) -> Vec<ArtifactUpdate> {
        self.writes.lock().await.clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn read(&self, filename: &str) -> Result<String> {
        Ok(self
            .files
            .lock()
            .await
            .get(filename)
            .cloned()
            .unwrap_or_default())
    }

    async fn update(&self, update: ArtifactUpdate) -> Result<ArtifactAck> {
        validate_filename(&update.filename)?;
        self.files
            .lock()
            .await
            .insert(update.filename.clone(), update.contents.clone());
        let ack = ArtifactAck {
            filename: update.filename.clone(),
            bytes: update.contents.len(),
        };
        self.writes.lock().await.push(update);
        Ok(ack)
    }
}
