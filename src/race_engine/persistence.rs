//! Persistence - Best-effort save of the human's name and balance
//!
//! One JSON file under a single well-known key. Nothing here may stop the
//! game: every I/O or decode failure is logged and swallowed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Storage key, also the file stem
pub const PLAYER_DATA_KEY: &str = "horseRacingPlayerData";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub player_name: String,
    pub bux: u64,
    /// Milliseconds since the Unix epoch
    pub saved_at: u64,
}

/// JSON store rooted at a directory
#[derive(Debug, Clone)]
pub struct PlayerStore {
    dir: PathBuf,
}

impl PlayerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `~/.derby/`, if a home directory can be found
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".derby")))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", PLAYER_DATA_KEY))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, player_name: &str, bux: u64) {
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let data = SavedPlayer {
            player_name: player_name.to_string(),
            bux,
            saved_at,
        };

        if let Err(e) = self.write(&data) {
            log::warn!("Could not save player data: {}", e);
        }
    }

    fn write(&self, data: &SavedPlayer) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.path(), json)?;
        Ok(())
    }

    pub fn load(&self) -> Option<SavedPlayer> {
        let json = fs::read_to_string(self.path()).ok()?;
        match serde_json::from_str(&json) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("Ignoring unreadable player data: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) {
        let path = self.path();
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Could not clear player data: {}", e);
            }
        }
    }
}
