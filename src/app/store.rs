//! Session persistence
//!
//! One JSON snapshot per wallet under the state directory, so every
//! subcommand resumes from the phase the previous one reached.

use aegis_core::RecoverySession;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed session store
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshot path for a wallet
    pub fn path_for(&self, wallet: Address) -> PathBuf {
        self.dir
            .join(format!("session-{}.json", wallet.to_string().to_lowercase()))
    }

    /// Load the saved session of `wallet`, if any
    pub fn load(&self, wallet: Address) -> Result<Option<RecoverySession>> {
        let path = self.path_for(wallet);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let session: RecoverySession = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file {}", path.display()))?;
        Ok(Some(session))
    }

    /// Persist `session`, replacing any previous snapshot atomically
    pub fn save(&self, session: &RecoverySession) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create state directory")?;
        let path = self.path_for(session.wallet);
        let tmp = path.with_extension("json.tmp");
        let content =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        fs::write(&tmp, content).context("Failed to write session file")?;
        fs::rename(&tmp, &path).context("Failed to replace session file")?;
        debug!(path = %path.display(), phase = %session.phase, "session saved");
        Ok(())
    }

    /// Remove the snapshot of `wallet`
    pub fn remove(&self, wallet: Address) -> Result<bool> {
        let path = self.path_for(wallet);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).context("Failed to remove session file")?;
        Ok(true)
    }

    /// State directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{GuardianIdentity, Phase};

    fn session(wallet: Address) -> RecoverySession {
        RecoverySession::new(wallet, GuardianIdentity::new("guardian@example.com").unwrap())
    }

    #[test]
    fn test_missing_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load(Address::repeat_byte(1)).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("state"));
        let wallet = Address::repeat_byte(0xab);

        let mut saved = session(wallet);
        saved.phase = Phase::GuardianAccepted;
        store.save(&saved).unwrap();

        let loaded = store.load(wallet).unwrap().unwrap();
        assert_eq!(loaded.phase, Phase::GuardianAccepted);
        assert_eq!(loaded.wallet, wallet);
        assert_eq!(loaded.guardian.as_str(), "guardian@example.com");
    }

    #[test]
    fn test_sessions_are_per_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&session(Address::repeat_byte(1))).unwrap();

        assert!(store.load(Address::repeat_byte(2)).unwrap().is_none());
        assert!(store.remove(Address::repeat_byte(1)).unwrap());
        assert!(!store.remove(Address::repeat_byte(1)).unwrap());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let wallet = Address::repeat_byte(3);
        fs::write(store.path_for(wallet), "{not json").unwrap();
        assert!(store.load(wallet).is_err());
    }
}
