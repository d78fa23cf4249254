use crate::domain::Session;
use crowdsolve_errors::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";

/// Client-local persistence for the credential and profile.
///
/// Nothing is cached in memory: every [`SessionStore::load`] reads the file again,
/// so a logout in another process is visible to the next authenticated call.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable sessions both read as logged out.
    pub fn load(&self) -> Option<Session> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read session from {}: {}", self.path.display(), e);
                return None;
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| {
                tracing::warn!("Discarding corrupted session file {}: {}", self.path.display(), e);
            })
            .ok()
    }

    pub fn save(&self, session: &Session) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| AppError::Session(e.to_string()))?;
        }

        let raw = serde_json::to_string_pretty(session).map_err(|e| AppError::Session(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| AppError::Session(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| AppError::Session(e.to_string()))?;

        tracing::info!("Session stored for {}", session.user.username);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), AppError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Session(e.to_string())),
        }
    }
}
