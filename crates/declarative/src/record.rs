//! Durable record of what has been applied
//!
//! The framework remembers, per resource, the attributes it last applied.
//! Hooks need them to undo their own work later (e.g. removing exactly the
//! members a resource added, and nothing else).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// Record
// ============================================================================

/// State of a single managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Resource type, e.g. "user_role"
    pub resource_type: String,

    /// Resource id within its type
    pub id: String,

    /// Attributes as last applied (or last attempted, when `applied` is false)
    pub attributes: serde_json::Value,

    /// Whether `attributes` are known to be in place remotely
    #[serde(default)]
    pub applied: bool,

    /// Last successful apply
    #[serde(default)]
    pub last_applied: Option<DateTime<Utc>>,

    /// Error from the last failed attempt
    #[serde(default)]
    pub last_error: Option<String>,
}

impl Record {
    /// Create an applied record
    pub fn applied(resource_type: &str, id: &str, attributes: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
            attributes,
            applied: true,
            last_applied: Some(Utc::now()),
            last_error: None,
        }
    }

    /// Key of this record in the state file
    pub fn key(&self) -> String {
        record_key(&self.resource_type, &self.id)
    }

    /// Decode attributes into a typed structure
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.attributes.clone())
            .with_context(|| format!("Invalid recorded attributes for {}", self.key()))
    }
}

/// Build the state key for a resource
pub fn record_key(resource_type: &str, id: &str) -> String {
    format!("{resource_type}.{id}")
}

// ============================================================================
// StateFile
// ============================================================================

/// All records, persisted as JSON
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateFile {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Records keyed by `type.id`
    #[serde(default)]
    pub records: BTreeMap<String, Record>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            records: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl StateFile {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, using empty state", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            anyhow::bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!("Loaded {} records from {}", state.records.len(), path.display());
        Ok(state)
    }

    /// Save state to disk
    ///
    /// Writes a sibling temp file and renames it into place.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.last_updated = Utc::now();
        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move state file into place: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Look up a record
    pub fn get(&self, resource_type: &str, id: &str) -> Option<&Record> {
        self.records.get(&record_key(resource_type, id))
    }

    /// Records of one resource type
    pub fn of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Record> {
        self.records
            .values()
            .filter(move |r| r.resource_type == resource_type)
    }

    /// Record a successful apply
    pub fn mark_applied(&mut self, resource_type: &str, id: &str, attributes: serde_json::Value) {
        let record = Record::applied(resource_type, id, attributes);
        self.records.insert(record.key(), record);
    }

    /// Record a failed attempt
    ///
    /// An existing record keeps its attributes (they still describe what was
    /// last put in place) and is flagged as not applied so the next run starts
    /// the whole cycle again. Without an existing record nothing is stored.
    pub fn mark_failed(&mut self, resource_type: &str, id: &str, error: &str) {
        if let Some(record) = self.records.get_mut(&record_key(resource_type, id)) {
            record.applied = false;
            record.last_error = Some(error.to_string());
        }
    }

    /// Drop a record, returning it if present
    pub fn forget(&mut self, resource_type: &str, id: &str) -> Option<Record> {
        self.records.remove(&record_key(resource_type, id))
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
