//! File helpers for the artefacts written next to saved weights.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, TrainError};

/// Write `data` to `path` as pretty-printed JSON.
pub fn save_json<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, data).map_err(|e| {
        TrainError::SerializationError(format!("Failed to serialize {}: {}", path.display(), e))
    })?;
    writer.flush()?;
    Ok(())
}

/// Read JSON from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| {
        TrainError::SerializationError(format!("Failed to deserialize {}: {}", path.display(), e))
    })
}

/// Write `text` to `path`.
pub fn save_text(text: &str, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::TrainingHistory;

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = TrainingHistory::new();
        history.record_epoch(0.5, Some(0.25));
        history.stopped_early = true;
        save_json(&history, &path).unwrap();

        let loaded: TrainingHistory = load_json(&path).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_load_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_json::<TrainingHistory>(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(TrainError::IoError(_))));

        let garbled = dir.path().join("bad.json");
        save_text("{ not json", &garbled).unwrap();
        assert!(matches!(
            load_json::<TrainingHistory>(&garbled),
            Err(TrainError::SerializationError(_))
        ));
    }
}
