//! Durable conversation transcripts.
//!
//! Persistence is best-effort: the engine logs and swallows every failure
//! from this layer, so a broken gateway degrades durability but never the
//! user-facing turn.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

use crate::types::TurnMessage;

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Create or replace the stored transcript for a conversation.
    async fn upsert_conversation(
        &self,
        project_id: &str,
        user_id: &str,
        messages: &[TurnMessage],
    ) -> Result<()>;

    /// Remove every stored transcript for a project. Idempotent.
    async fn delete_conversation(&self, project_id: &str) -> Result<()>;
}

/// Gateway that stores nothing. Useful for tests and ephemeral sessions.
pub struct NullGateway {}

impl NullGateway {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for NullGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for NullGateway {
    async fn upsert_conversation(
        &self,
        _project_id: &str,
        _user_id: &str,
        _messages: &[TurnMessage],
    ) -> Result<()> {
        Ok(())
    }

    async fn delete_conversation(&self, _project_id: &str) -> Result<()> {
        Ok(())
    }
}

/// One JSON file per (project, user) under a data directory.
pub struct JsonFileGateway {
    dir: PathBuf,
}

impl JsonFileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    // Ids come from callers; flatten anything that is not filename-safe.
    fn sanitize(id: &str) -> String {
        id.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    }

    fn transcript_path(&self, project_id: &str, user_id: &str) -> PathBuf {
        self.dir.join(format!(
            "{}--{}.json",
            Self::sanitize(project_id),
            Self::sanitize(user_id)
        ))
    }

    /// Load a stored transcript, tolerating absence.
    pub fn load(&self, project_id: &str, user_id: &str) -> Result<Option<Vec<TurnMessage>>> {
        let path = self.transcript_path(project_id, user_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&json) {
            Ok(messages) => Ok(Some(messages)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt transcript, ignoring");
                Ok(None)
            }
        }
    }

    fn project_files(&self, project_id: &str) -> Vec<PathBuf> {
        let prefix = format!("{}--", Self::sanitize(project_id));
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect()
    }
}

#[async_trait]
impl PersistenceGateway for JsonFileGateway {
    async fn upsert_conversation(
        &self,
        project_id: &str,
        user_id: &str,
        messages: &[TurnMessage],
    ) -> Result<()> {
        let json = serde_json::to_string(messages)?;
        std::fs::write(self.transcript_path(project_id, user_id), json)?;
        Ok(())
    }

    async fn delete_conversation(&self, project_id: &str) -> Result<()> {
        for path in self.project_files(project_id) {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}
