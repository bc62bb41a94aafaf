//! # election-storage
//!
//! why: provide durable persistence for an election using standard rust fs apis
//! relations: used by election-host to persist state after every committed mutation
//! what: Storage trait, FileStorage implementation, InMemoryStorage for testing

use election_core::{ElectionEvent, ElectionSnapshot};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// trait for durable storage of election state
///
/// this abstraction allows the same host code to work with:
/// - real filesystem (native)
/// - in-memory (testing, ephemeral elections)
pub trait Storage {
    /// persist the full election state, replacing any previous snapshot
    fn save_snapshot(&mut self, snapshot: &ElectionSnapshot) -> io::Result<()>;

    /// load the persisted snapshot, `None` if nothing was ever saved
    fn load_snapshot(&self) -> io::Result<Option<ElectionSnapshot>>;

    /// append emitted events to the journal
    fn append_events(&mut self, events: &[ElectionEvent]) -> io::Result<()>;

    /// load the whole event journal, oldest first
    fn load_events(&self) -> io::Result<Vec<ElectionEvent>>;

    /// drop every journal entry after the first `keep`
    fn truncate_events(&mut self, keep: usize) -> io::Result<()>;

    /// clear all persisted state
    fn clear(&mut self) -> io::Result<()>;
}

// -- file storage implementation --

/// on-disk format version of election.json
const FORMAT_VERSION: u32 = 1;

/// file-based storage implementation using std::fs
///
/// stores election state in a directory with:
/// - election.json: versioned snapshot
/// - events.jsonl: one emitted event per line, append-only
pub struct FileStorage {
    /// directory path for storing state files
    dir: PathBuf,
}

impl FileStorage {
    /// create a new filestorage at the given directory
    /// creates the directory if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join("election.json")
    }

    fn events_path(&self) -> PathBuf {
        self.dir.join("events.jsonl")
    }

    /// atomic write: write to temp file, sync, then rename over the target
    fn write_json<T: Serialize + ?Sized>(&self, target: &Path, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let temp_path = target.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, target)?;

        debug!(path = %target.display(), bytes = json.len(), "state written");
        Ok(())
    }

    /// serialize events as newline-terminated json lines
    fn encode_lines(events: &[ElectionEvent]) -> io::Result<String> {
        let mut lines = String::new();
        for event in events {
            let line = serde_json::to_string(event)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            lines.push_str(&line);
            lines.push('\n');
        }
        Ok(lines)
    }

    /// read and decode a json file, `None` if it does not exist
    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> io::Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// versioned wrapper around the snapshot as written to election.json
#[derive(Serialize, Deserialize)]
struct StoredElection {
    version: u32,
    election: ElectionSnapshot,
}

impl Storage for FileStorage {
    fn save_snapshot(&mut self, snapshot: &ElectionSnapshot) -> io::Result<()> {
        let stored = StoredElection {
            version: FORMAT_VERSION,
            election: snapshot.clone(),
        };
        self.write_json(&self.snapshot_path(), &stored)
    }

    fn load_snapshot(&self) -> io::Result<Option<ElectionSnapshot>> {
        let stored: Option<StoredElection> = self.read_json(&self.snapshot_path())?;
        match stored {
            Some(stored) if stored.version != FORMAT_VERSION => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported election format version {}", stored.version),
            )),
            Some(stored) => Ok(Some(stored.election)),
            None => Ok(None),
        }
    }

    fn append_events(&mut self, events: &[ElectionEvent]) -> io::Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let lines = Self::encode_lines(events)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.events_path())?;
        file.write_all(lines.as_bytes())?;
        file.sync_all()?;

        debug!(count = events.len(), "events appended");
        Ok(())
    }

    fn load_events(&self) -> io::Result<Vec<ElectionEvent>> {
        let path = self.events_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for (index, line) in BufReader::new(File::open(&path)?).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("journal line {}: {e}", index + 1),
                )
            })?;
            events.push(event);
        }
        Ok(events)
    }

    fn truncate_events(&mut self, keep: usize) -> io::Result<()> {
        let mut events = self.load_events()?;
        if events.len() <= keep {
            return Ok(());
        }
        events.truncate(keep);

        // rewritten through a temp file so a crash keeps either the old or the new journal
        let path = self.events_path();
        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(Self::encode_lines(&events)?.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        debug!(keep, "journal truncated");
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        remove_if_present(&self.snapshot_path())?;
        remove_if_present(&self.events_path())
    }
}

/// remove a file, treating an already-missing file as success
fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

// -- in-memory storage implementation --

/// in-memory storage for testing
///
/// stores all state in memory, no persistence across restarts
#[derive(Default)]
pub struct InMemoryStorage {
    snapshot: Option<ElectionSnapshot>,
    events: Vec<ElectionEvent>,
}

impl InMemoryStorage {
    /// create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn save_snapshot(&mut self, snapshot: &ElectionSnapshot) -> io::Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load_snapshot(&self) -> io::Result<Option<ElectionSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn append_events(&mut self, events: &[ElectionEvent]) -> io::Result<()> {
        self.events.extend(events.iter().cloned());
        Ok(())
    }

    fn load_events(&self) -> io::Result<Vec<ElectionEvent>> {
        Ok(self.events.clone())
    }

    fn truncate_events(&mut self, keep: usize) -> io::Result<()> {
        self.events.truncate(keep);
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.snapshot = None;
        self.events.clear();
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn save_snapshot(&mut self, snapshot: &ElectionSnapshot) -> io::Result<()> {
        (**self).save_snapshot(snapshot)
    }

    fn load_snapshot(&self) -> io::Result<Option<ElectionSnapshot>> {
        (**self).load_snapshot()
    }

    fn append_events(&mut self, events: &[ElectionEvent]) -> io::Result<()> {
        (**self).append_events(events)
    }

    fn load_events(&self) -> io::Result<Vec<ElectionEvent>> {
        (**self).load_events()
    }

    fn truncate_events(&mut self, keep: usize) -> io::Result<()> {
        (**self).truncate_events(keep)
    }

    fn clear(&mut self) -> io::Result<()> {
        (**self).clear()
    }
}
