// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! JSON mapping store with atomic writes and automatic backups
//!
//! Every save writes through a temp-file-then-rename so the mapping is never
//! half-written, and creates a timestamped backup of the previous file in a
//! `backups/` directory beside it first.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use atomic_write_file::AtomicWriteFile;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{MappingStore, StoreError};
use crate::core::types::{Action, KeyCombination};

/// On-disk document. The action is stored as a plain string so an entry
/// written by a different version drops out individually during load
/// instead of failing the whole document.
#[derive(Debug, Default, Deserialize, Serialize)]
struct MappingDocument {
    bindings: Vec<PersistedBinding>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PersistedBinding {
    action: String,
    combination: KeyCombination,
}

/// File-backed [`MappingStore`].
#[derive(Debug)]
pub struct FileMappingStore {
    mapping_path: PathBuf,
    backup_dir: PathBuf,
}

impl FileMappingStore {
    /// Creates a store for the given mapping file, creating the parent and
    /// backup directories as needed. The mapping file itself may not exist
    /// yet; that is the normal first-run state.
    pub fn new(mapping_path: PathBuf) -> Result<Self, StoreError> {
        let parent = mapping_path
            .parent()
            .ok_or_else(|| {
                StoreError::DirNotWritable(PathBuf::from("mapping path has no parent directory"))
            })?
            .to_path_buf();

        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|_| StoreError::DirNotWritable(parent.clone()))?;
        }

        // Backups live next to the mapping file
        // e.g. ~/.config/global-hotkey-manager/hotkeys.json → .../backups/
        let backup_dir = parent.join("backups");
        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| StoreError::DirNotWritable(backup_dir.clone()))?;
        }

        Ok(Self {
            mapping_path,
            backup_dir,
        })
    }

    pub fn mapping_path(&self) -> &PathBuf {
        &self.mapping_path
    }

    fn create_timestamped_backup(&self) -> Result<PathBuf, StoreError> {
        let content = fs::read_to_string(&self.mapping_path)?;

        // Timestamp in YYYY-MM-DD_HHMMSS format
        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");

        let original_name = self
            .mapping_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::BackupFailed("mapping path has no file name".to_string()))?;

        let backup_path = self.backup_dir.join(format!("{}.{}", original_name, timestamp));
        fs::write(&backup_path, &content)
            .map_err(|e| StoreError::BackupFailed(e.to_string()))?;

        debug!(backup = %backup_path.display(), "mapping backup created");
        Ok(backup_path)
    }
}

impl MappingStore for FileMappingStore {
    fn load(&self) -> Result<Option<Vec<(Action, KeyCombination)>>, StoreError> {
        let content = match fs::read_to_string(&self.mapping_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let document: MappingDocument = match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(e) => {
                warn!(
                    path = %self.mapping_path.display(),
                    error = %e,
                    "mapping file corrupt; treating as absent"
                );
                return Ok(None);
            }
        };

        let mut entries = Vec::with_capacity(document.bindings.len());
        for binding in document.bindings {
            match Action::from_name(&binding.action) {
                Some(action) => entries.push((action, binding.combination)),
                // Schema shrink: written by a version that knew more actions
                None => warn!(action = %binding.action, "unknown action in mapping file; dropped"),
            }
        }

        Ok(Some(entries))
    }

    fn save(&self, entries: &[(Action, KeyCombination)]) -> Result<(), StoreError> {
        if self.mapping_path.exists() {
            self.create_timestamped_backup()?;
        }

        let document = MappingDocument {
            bindings: entries
                .iter()
                .map(|&(action, combination)| PersistedBinding {
                    action: action.name().to_string(),
                    combination,
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StoreError::WriteFailed(format!("Failed to serialise mapping: {}", e)))?;

        let mut file = AtomicWriteFile::options()
            .open(&self.mapping_path)
            .map_err(|e| {
                StoreError::WriteFailed(format!("Failed to open for atomic write: {}", e))
            })?;

        file.write_all(json.as_bytes())
            .map_err(|e| StoreError::WriteFailed(format!("Failed to write content: {}", e)))?;

        file.commit()
            .map_err(|e| StoreError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::merge::merge_with_defaults;
    use crate::core::types::{Key, Modifiers};
    use tempfile::TempDir;

    /// Helper: store rooted in a fresh temp directory.
    fn test_store() -> (TempDir, FileMappingStore) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hotkeys.json");
        let store = FileMappingStore::new(path).unwrap();
        (temp_dir, store)
    }

    fn sample_mapping() -> Vec<(Action, KeyCombination)> {
        vec![
            (
                Action::PlayPause,
                KeyCombination::new(Modifiers::ALT | Modifiers::WIN, Key::Space),
            ),
            (Action::Stop, KeyCombination::unbound()),
            (
                Action::NextTrack,
                KeyCombination::new(Modifiers::CONTROL | Modifiers::SHIFT, Key::F9),
            ),
        ]
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let (_temp_dir, store) = test_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (_temp_dir, store) = test_store();
        let mapping = sample_mapping();

        store.save(&mapping).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, mapping);
    }

    #[test]
    fn test_load_corrupt_file_is_none() {
        let (_temp_dir, store) = test_store();
        fs::write(store.mapping_path(), "{ not valid json").unwrap();

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_unknown_actions_are_dropped_individually() {
        let (_temp_dir, store) = test_store();
        let json = r#"{
            "bindings": [
                { "action": "PlayPause", "combination": { "key": "Space", "modifiers": 9 } },
                { "action": "WarpTen", "combination": { "key": "W", "modifiers": 9 } }
            ]
        }"#;
        fs::write(store.mapping_path(), json).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, Action::PlayPause);
        assert_eq!(
            loaded[0].1,
            KeyCombination::new(Modifiers::ALT | Modifiers::WIN, Key::Space)
        );
    }

    #[test]
    fn test_save_creates_backup_of_previous_mapping() {
        let (temp_dir, store) = test_store();

        store.save(&sample_mapping()).unwrap();
        store.save(&[]).unwrap();

        let backup_dir = temp_dir.path().join("backups");
        let backups: Vec<_> = fs::read_dir(&backup_dir).unwrap().collect();
        assert_eq!(backups.len(), 1, "second save should back up the first");

        // Backup holds the pre-overwrite content
        let backup_path = backups[0].as_ref().unwrap().path();
        let content = fs::read_to_string(backup_path).unwrap();
        assert!(content.contains("PlayPause"));
    }

    #[test]
    fn test_first_save_creates_no_backup() {
        let (temp_dir, store) = test_store();
        store.save(&sample_mapping()).unwrap();

        let backups: Vec<_> = fs::read_dir(temp_dir.path().join("backups")).unwrap().collect();
        assert!(backups.is_empty());
    }

    #[test]
    fn test_round_trip_through_merge_reproduces_bindings() {
        // Save → load → merge against the same action set must reproduce
        // the original mapping exactly.
        let (_temp_dir, store) = test_store();
        let mapping = merge_with_defaults(&[]);

        store.save(&mapping).unwrap();
        let loaded = store.load().unwrap().unwrap();
        let merged = merge_with_defaults(&loaded);

        assert_eq!(merged, mapping);
    }
}
