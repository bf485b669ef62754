//! Timestamped on-disk model store.
//!
//! Saves live under `<root>/<model_id>/<stamp>/`, where `<stamp>` is the
//! minute the save was made, formatted `YYYY-MM-DD@HH:MM`. A second save in
//! the same minute gets a `_2` suffix, a third `_3`, and so on, so no save is
//! ever overwritten.
//!
//! ```text
//! DataStore/SavedModels/Forecasters/
//! └── sales-daily/
//!     ├── 2024-03-01@09:15/
//!     ├── 2024-03-01@09:15_2/
//!     └── 2024-03-02@17:40/
//! ```

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Timelike};

use crate::error::{Result, TrainError};

/// Format of the minute part of a save directory name.
pub const STAMP_FORMAT: &str = "%Y-%m-%d@%H:%M";

/// Marker directory that identifies the project root for
/// [`ModelStore::discover`].
pub const DATA_STORE_DIR: &str = "DataStore";

/// Identifier of one save: the minute it was made plus a same-minute
/// sequence number starting at 1.
///
/// Stamps order chronologically by `(at, seq)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaveStamp {
    at: NaiveDateTime,
    seq: u32,
}

impl SaveStamp {
    /// First stamp for the minute containing `at`.
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            at: truncate_to_minute(at),
            seq: 1,
        }
    }

    /// The stamp's minute.
    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    /// Same-minute sequence number, 1 for the first save of a minute.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// The stamp claimed by the next save within the same minute.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            at: self.at,
            seq: self.seq + 1,
        }
    }

    /// Parse a save directory name.
    ///
    /// Only the canonical form produced by [`Display`](fmt::Display) is
    /// accepted: `YYYY-MM-DD@HH:MM` or `YYYY-MM-DD@HH:MM_<n>` with `n >= 2`.
    pub fn parse(name: &str) -> Option<Self> {
        let (minute, seq) = match name.split_once('_') {
            Some((minute, seq)) => {
                if seq.starts_with('0') || seq.starts_with('+') {
                    return None;
                }
                let seq: u32 = seq.parse().ok()?;
                if seq < 2 {
                    return None;
                }
                (minute, seq)
            }
            None => (name, 1),
        };

        let at = parse_minute(minute).ok()?;
        (at.format(STAMP_FORMAT).to_string() == minute).then_some(Self { at, seq })
    }
}

impl fmt::Display for SaveStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.at.format(STAMP_FORMAT))?;
        if self.seq > 1 {
            write!(f, "_{}", self.seq)?;
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD@HH:MM` minute.
pub fn parse_minute(s: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, STAMP_FORMAT)
}

fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// One save directory in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    /// Parsed directory name.
    pub stamp: SaveStamp,
    /// Absolute or store-relative path of the save directory.
    pub path: PathBuf,
}

impl SaveEntry {
    /// Directory name of the save.
    pub fn name(&self) -> String {
        self.stamp.to_string()
    }
}

/// Which save to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveSelection {
    /// The most recent save.
    #[default]
    Latest,
    /// The save made in the given minute.
    At(NaiveDateTime),
    /// The save with exactly this directory name.
    Named(String),
}

/// A directory of timestamped saves for one model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    root: PathBuf,
    model_id: String,
}

impl ModelStore {
    /// Create a store rooted at `root` for `model_id`.
    ///
    /// Nothing is created on disk until the first save.
    pub fn new(root: impl Into<PathBuf>, model_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            model_id: model_id.into(),
        }
    }

    /// Locate the store by walking up from `start_dir` to the first
    /// directory containing a `DataStore` directory, then using
    /// `DataStore/SavedModels/Forecasters` beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::ProjectRootNotFound`] if no ancestor of
    /// `start_dir` contains `DataStore`.
    pub fn discover(start_dir: impl AsRef<Path>, model_id: impl Into<String>) -> Result<Self> {
        let start_dir = start_dir.as_ref();
        for dir in start_dir.ancestors() {
            let candidate = dir.join(DATA_STORE_DIR);
            if candidate.is_dir() {
                let root = candidate.join("SavedModels").join("Forecasters");
                tracing::debug!(root = %root.display(), "discovered model store");
                return Ok(Self::new(root, model_id));
            }
        }
        Err(TrainError::ProjectRootNotFound(start_dir.to_path_buf()))
    }

    /// Root directory holding all model identifiers.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The model identifier.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Directory holding the saves of this model.
    pub fn model_dir(&self) -> PathBuf {
        self.root.join(&self.model_id)
    }

    /// Claim a fresh save directory for a save made at `now`.
    ///
    /// Existing directories are never reused; a taken stamp is retried with
    /// the next sequence number.
    pub fn create_run_dir(&self, now: NaiveDateTime) -> Result<SaveEntry> {
        let model_dir = self.model_dir();
        fs::create_dir_all(&model_dir)?;

        let mut stamp = SaveStamp::new(now);
        loop {
            let path = model_dir.join(stamp.to_string());
            match fs::create_dir(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "created save directory");
                    return Ok(SaveEntry { stamp, path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp = stamp.next(),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Claim a save directory for `now` and fill it with `write`.
    ///
    /// If `write` fails the directory is removed again, so an interrupted
    /// save never shows up in [`list_saves`](Self::list_saves) and cannot
    /// shadow an older complete save.
    pub fn write_run_dir<F>(&self, now: NaiveDateTime, write: F) -> Result<SaveEntry>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let entry = self.create_run_dir(now)?;
        if let Err(e) = write(&entry.path) {
            if let Err(cleanup) = fs::remove_dir_all(&entry.path) {
                tracing::warn!(
                    path = %entry.path.display(),
                    error = %cleanup,
                    "failed to remove incomplete save directory"
                );
            }
            return Err(e);
        }
        Ok(entry)
    }

    /// All saves of this model, oldest first.
    ///
    /// A missing model directory is an empty store. Regular files next to
    /// the save directories are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::MalformedSave`] for a subdirectory whose name
    /// is not a save stamp.
    pub fn list_saves(&self) -> Result<Vec<SaveEntry>> {
        let model_dir = self.model_dir();
        let entries = match fs::read_dir(&model_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut saves = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let stamp = name
                .to_str()
                .and_then(SaveStamp::parse)
                .ok_or_else(|| TrainError::MalformedSave {
                    name: name.to_string_lossy().into_owned(),
                    dir: model_dir.clone(),
                })?;
            saves.push(SaveEntry {
                stamp,
                path: entry.path(),
            });
        }

        saves.sort_by_key(|s| s.stamp);
        Ok(saves)
    }

    /// The most recent save.
    pub fn latest(&self) -> Result<SaveEntry> {
        self.list_saves()?
            .pop()
            .ok_or_else(|| TrainError::NoSavedModel(self.model_dir()))
    }

    /// The save made in the minute containing `at`.
    ///
    /// # Errors
    ///
    /// [`TrainError::SaveNotFound`] if there is none and
    /// [`TrainError::AmbiguousSave`] if several saves share that minute.
    pub fn at(&self, at: NaiveDateTime) -> Result<SaveEntry> {
        let minute = truncate_to_minute(at);
        let mut matches: Vec<SaveEntry> = self
            .list_saves()?
            .into_iter()
            .filter(|s| s.stamp.at() == minute)
            .collect();

        let requested = minute.format(STAMP_FORMAT).to_string();
        match matches.len() {
            0 => Err(TrainError::SaveNotFound {
                name: requested,
                dir: self.model_dir(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(TrainError::AmbiguousSave {
                stamp: requested,
                candidates: matches.iter().map(SaveEntry::name).collect(),
            }),
        }
    }

    /// The save with directory name `name`.
    pub fn named(&self, name: &str) -> Result<SaveEntry> {
        self.list_saves()?
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| TrainError::SaveNotFound {
                name: name.to_string(),
                dir: self.model_dir(),
            })
    }

    /// Resolve a [`SaveSelection`] to a save.
    pub fn resolve(&self, selection: &SaveSelection) -> Result<SaveEntry> {
        match selection {
            SaveSelection::Latest => self.latest(),
            SaveSelection::At(at) => self.at(*at),
            SaveSelection::Named(name) => self.named(name),
        }
    }
}
