//! Persistent client state.
//!
//! Everything the client remembers between runs lives in one TOML file, `~/.buddycart/state.toml` by default:
//! the signed-in session, an in-flight buddy-queue entry, and the clubbed order produced by the last match. The
//! record is typed and transitions are explicit, so flows cannot leave half-cleared state behind. The file and
//! its directory are created owner-only, since the session token lives in it.

use std::{
    fs,
    io,
    io::{Error, ErrorKind},
    path::{Path, PathBuf},
};

use buddycart_common::{Rupee, Secret};
use chrono::{DateTime, Duration, Utc};
use dirs::home_dir;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    data_objects::{ClubbedOrderId, QueueId, User},
    errors::ClientError,
};

//--------------------------------------   SessionRecord   ---------------------------------------

/// A stored sign-in: the bearer token and the profile it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: Secret<String>,
    pub user: User,
}

//--------------------------------------    QueueMarker    ---------------------------------------

/// The record of a live buddy-queue entry.
///
/// Only the start time is stored. The remaining wait is always derived from it at the moment of asking, never
/// counted down in memory, so restarts and reconnects cannot stretch the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMarker {
    pub queue_id: QueueId,
    pub started_at: DateTime<Utc>,
    pub duration_secs: i64,
}

impl QueueMarker {
    pub fn new(queue_id: QueueId, started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self { queue_id, started_at, duration_secs: duration.num_seconds() }
    }

    /// Seconds left in the wait window at `now`, clamped at zero.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = (now - self.started_at).num_seconds();
        (self.duration_secs - elapsed).max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }
}

//---------------------------------------    ClubMarker    ---------------------------------------

/// The clubbed order the last successful match placed us in, with the discount the matcher granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubMarker {
    pub clubbed_order_id: ClubbedOrderId,
    pub discount_given: Rupee,
}

//---------------------------------------    ClientState   ---------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientState {
    pub session: Option<SessionRecord>,
    pub queue: Option<QueueMarker>,
    pub club: Option<ClubMarker>,
}

//---------------------------------------    StateStore    ---------------------------------------

/// Handle to the state file. Cheap to clone; every read goes back to disk, so concurrent holders observe each
/// other's writes.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Opens the store at the default location, creating the file (owner-only) on first use.
    pub fn from_home() -> Result<Self, ClientError> {
        let path = default_state_path().map_err(|e| ClientError::State(format!("Could not open the state file: {e}")))?;
        Ok(Self { path })
    }

    /// Opens a store on an explicit path. The parent directory must already exist.
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current state. A missing file reads as the default (signed-out, no markers).
    pub fn read(&self) -> Result<ClientState, ClientError> {
        if !self.path.exists() {
            return Ok(ClientState::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| ClientError::State(format!("Could not read the state file: {e}")))?;
        toml::from_str(&raw).map_err(|e| ClientError::State(format!("The state file is not valid TOML: {e}")))
    }

    pub fn write(&self, state: &ClientState) -> Result<(), ClientError> {
        let raw = toml::to_string(state).map_err(|e| ClientError::State(format!("Could not serialize the client state: {e}")))?;
        fs::write(&self.path, raw).map_err(|e| ClientError::State(format!("Could not write the state file: {e}")))
    }

    /// Read-modify-write in one step. Returns the state as written.
    pub fn update<F>(&self, f: F) -> Result<ClientState, ClientError>
    where F: FnOnce(&mut ClientState) {
        let mut state = self.read()?;
        f(&mut state);
        self.write(&state)?;
        Ok(state)
    }

    pub fn session(&self) -> Result<Option<SessionRecord>, ClientError> {
        Ok(self.read()?.session)
    }

    pub fn set_session(&self, record: SessionRecord) -> Result<(), ClientError> {
        self.update(|state| state.session = Some(record)).map(|_| ())
    }

    pub fn queue_marker(&self) -> Result<Option<QueueMarker>, ClientError> {
        Ok(self.read()?.queue)
    }

    pub fn set_queue_marker(&self, marker: QueueMarker) -> Result<(), ClientError> {
        self.update(|state| state.queue = Some(marker)).map(|_| ())
    }

    pub fn clear_queue_marker(&self) -> Result<(), ClientError> {
        self.update(|state| state.queue = None).map(|_| ())
    }

    pub fn club_marker(&self) -> Result<Option<ClubMarker>, ClientError> {
        Ok(self.read()?.club)
    }

    pub fn set_club_marker(&self, marker: ClubMarker) -> Result<(), ClientError> {
        self.update(|state| state.club = Some(marker)).map(|_| ())
    }

    pub fn clear_club_marker(&self) -> Result<(), ClientError> {
        self.update(|state| state.club = None).map(|_| ())
    }

    /// Wipes the lot: session, queue marker and club marker. Sign-out calls this.
    pub fn reset(&self) -> Result<(), ClientError> {
        self.write(&ClientState::default())
    }
}

fn default_state_path() -> io::Result<PathBuf> {
    let home = home_dir().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
    let state_dir = home.join(".buddycart");
    if !state_dir.exists() {
        fs::create_dir_all(&state_dir)?;
        set_permissions(&state_dir, 0o700)?;
    }
    let state_file = state_dir.join("state.toml");
    if !state_file.exists() {
        info!("Creating default client state file");
        let default_state = toml::to_string(&ClientState::default())
            .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
        fs::write(&state_file, default_state)?;
        set_permissions(&state_file, 0o600)?;
    }
    Ok(state_file)
}

fn set_permissions(path: &Path, perms: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(perms); // Owner-only; the file holds the session token
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}
