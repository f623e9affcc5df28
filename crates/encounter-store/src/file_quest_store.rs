//! File-backed implementation of the `QuestStore` trait.
//!
//! Each player's document lives in `<data_dir>/<player_uuid>.json`. Saves go
//! through a temporary file and a rename so a crash never leaves a torn
//! document behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use encounter_core::error::DomainError;
use encounter_core::ids::PlayerId;
use encounter_core::store::{QuestStore, StoredRecord};
use tracing::{debug, warn};
use uuid::Uuid;

const EXTENSION: &str = "json";

/// A store keeping one JSON document per player in a directory.
#[derive(Debug, Clone)]
pub struct FileQuestStore {
    root: PathBuf,
}

impl FileQuestStore {
    /// Opens the store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the directory cannot be
    /// created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error("create data dir", &root, &e))?;
        Ok(Self { root })
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, player_id: PlayerId) -> PathBuf {
        self.root.join(format!("{}.{EXTENSION}", player_id.0))
    }
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> DomainError {
    DomainError::Infrastructure(format!("{action} {}: {err}", path.display()))
}

#[async_trait]
impl QuestStore for FileQuestStore {
    async fn load(&self, player_id: PlayerId) -> Result<Option<StoredRecord>, DomainError> {
        let path = self.path_for(player_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error("read", &path, &err)),
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::Infrastructure(format!("decode {}: {e}", path.display()))
        })?;
        Ok(Some(record))
    }

    async fn save(&self, record: StoredRecord) -> Result<(), DomainError> {
        let path = self.path_for(record.player_id);
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| DomainError::Infrastructure(format!("encode {}: {e}", path.display())))?;
        // Each save stages to its own file; concurrent saves never share one.
        let staging = path.with_extension(format!("{EXTENSION}.{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|e| io_error("write", &staging, &e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| io_error("rename", &path, &e))?;
        debug!(player_id = %record.player_id, bytes = bytes.len(), "quest record saved");
        Ok(())
    }

    async fn list_players(&self) -> Result<Vec<PlayerId>, DomainError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| io_error("list", &self.root, &e))?;
        let mut players = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("list", &self.root, &e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match Uuid::parse_str(stem) {
                Ok(uuid) => players.push(PlayerId::from(uuid)),
                Err(_) => warn!(path = %path.display(), "ignoring stray file in data dir"),
            }
        }
        players.sort_by_key(|player| player.0);
        Ok(players)
    }
}
