//! Key-value file store
//!
//! One file per key under the data directory. JSON keys hold whole
//! collections that are rewritten on every mutation; plain keys hold a bare
//! string. Last write wins.

use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::storage::error::StorageResult;

/// Keys persisted by the clinic store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Appointments,
    Payments,
    DailyReports,
    Patients,
    Language,
    UserRole,
    TimelineViewMode,
    TimelineSelectedProviders,
}

impl StorageKey {
    pub fn all() -> &'static [StorageKey] {
        &[
            StorageKey::Appointments,
            StorageKey::Payments,
            StorageKey::DailyReports,
            StorageKey::Patients,
            StorageKey::Language,
            StorageKey::UserRole,
            StorageKey::TimelineViewMode,
            StorageKey::TimelineSelectedProviders,
        ]
    }

    /// Key name as used by the browser calendar
    pub fn name(&self) -> &'static str {
        match self {
            StorageKey::Appointments => "calendar-appointments",
            StorageKey::Payments => "calendar-payments",
            StorageKey::DailyReports => "calendar-daily-reports",
            StorageKey::Patients => "calendar-patients",
            StorageKey::Language => "calendar-language",
            StorageKey::UserRole => "user-role",
            StorageKey::TimelineViewMode => "timeline-view-mode",
            StorageKey::TimelineSelectedProviders => "timeline-selected-providers",
        }
    }

    /// Plain keys store the raw string, not JSON
    pub fn is_plain(&self) -> bool {
        matches!(
            self,
            StorageKey::Language | StorageKey::UserRole | StorageKey::TimelineViewMode
        )
    }

    pub fn file_name(&self) -> String {
        if self.is_plain() {
            format!("{}.txt", self.name())
        } else {
            format!("{}.json", self.name())
        }
    }
}

/// File-backed replacement for browser local storage
#[derive(Debug, Clone)]
pub struct KeyValueStore {
    dir: PathBuf,
}

impl KeyValueStore {
    /// Open (and create) the store directory
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        self.path(key).exists()
    }

    /// Read the raw contents of a key
    pub fn get_raw(&self, key: StorageKey) -> StorageResult<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(content))
    }

    /// Staging file for a key; renamed over the real file once fully written
    fn tmp_path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.tmp", key.file_name()))
    }

    /// Write the raw contents of a key.
    ///
    /// The value goes to a staging file first and is renamed into place, so
    /// readers see either the old or the new contents, never a partial file.
    pub fn set_raw(&self, key: StorageKey, value: &str) -> StorageResult<()> {
        let tmp = self.tmp_path(key);
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, self.path(key))?;
        Ok(())
    }

    /// Read and decode a JSON key; a missing or blank file reads as `None`
    pub fn get_json<T: DeserializeOwned>(&self, key: StorageKey) -> StorageResult<Option<T>> {
        match self.get_raw(key)? {
            Some(content) if !content.trim().is_empty() => {
                let value = serde_json::from_str(&content)?;
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    /// Serialize a value and overwrite the key
    pub fn set_json<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(value)?;
        self.set_raw(key, &content)
    }

    pub fn remove(&self, key: StorageKey) -> StorageResult<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_file_names() {
        assert_eq!(
            StorageKey::Appointments.file_name(),
            "calendar-appointments.json"
        );
        assert_eq!(StorageKey::Language.file_name(), "calendar-language.txt");
        assert!(!StorageKey::TimelineSelectedProviders.is_plain());
    }

    #[test]
    fn test_raw_and_json_round_trip() {
        let dir = tempdir().unwrap();
        let kv = KeyValueStore::open(dir.path()).unwrap();

        assert_eq!(kv.get_raw(StorageKey::Language).unwrap(), None);
        kv.set_raw(StorageKey::Language, "kh").unwrap();
        assert_eq!(
            kv.get_raw(StorageKey::Language).unwrap().as_deref(),
            Some("kh")
        );

        kv.set_json(StorageKey::TimelineSelectedProviders, &vec![1u32, 3])
            .unwrap();
        let providers: Option<Vec<u32>> =
            kv.get_json(StorageKey::TimelineSelectedProviders).unwrap();
        assert_eq!(providers, Some(vec![1, 3]));

        kv.remove(StorageKey::TimelineSelectedProviders).unwrap();
        assert!(!kv.contains(StorageKey::TimelineSelectedProviders));
    }

    #[test]
    fn test_writes_replace_whole_file() {
        let dir = tempdir().unwrap();
        let kv = KeyValueStore::open(dir.path()).unwrap();
        kv.set_json(StorageKey::Appointments, &vec![1u32, 2, 3]).unwrap();

        // An interrupted write leaves only the staging file behind
        let staging = dir.path().join("calendar-appointments.json.tmp");
        std::fs::write(&staging, "[1, 2").unwrap();

        let stored: Option<Vec<u32>> = kv.get_json(StorageKey::Appointments).unwrap();
        assert_eq!(stored, Some(vec![1, 2, 3]));

        kv.set_json(StorageKey::Appointments, &vec![4u32]).unwrap();
        assert!(!staging.exists());
        let stored: Option<Vec<u32>> = kv.get_json(StorageKey::Appointments).unwrap();
        assert_eq!(stored, Some(vec![4]));
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        let dir = tempdir().unwrap();
        let kv = KeyValueStore::open(dir.path()).unwrap();
        kv.set_raw(StorageKey::Payments, "{not json").unwrap();

        let result: StorageResult<Option<Vec<u32>>> = kv.get_json(StorageKey::Payments);
        assert!(result.is_err());
    }
}
