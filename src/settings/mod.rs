//! Settings store: typed groups and entries, INI persistence, validation,
//! and request dispatch.

pub mod entry;
pub mod group;
mod ini;

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

pub use entry::{EntryFlags, EntryHandle, SettingsEntry, SettingsType, SettingsValue};
pub use group::{GroupHandle, SettingsGroup, Validator};

/// Settings subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings directory or file could not be read or written.
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No store is registered under the requested id.
    #[error("unknown settings store: {0}")]
    UnknownStore(String),

    /// No group exists with the requested id.
    #[error("unknown settings group: {0}")]
    UnknownGroup(String),
}

/// One typed settings entry as carried on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEntry {
    /// Entry id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Description.
    pub description: String,
    /// Current value, textually encoded (bool/i32/.../string tag + text).
    pub value: WireValue,
    /// Whether the entry is read-only.
    pub read_only: bool,
}

/// Tagged settings value for wire transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum WireValue {
    /// Boolean.
    Bool(bool),
    /// Signed 32-bit integer.
    I32(i32),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// UTF-8 string.
    String(String),
}

impl From<&SettingsValue> for WireValue {
    fn from(v: &SettingsValue) -> Self {
        match v {
            SettingsValue::Bool(b) => Self::Bool(*b),
            SettingsValue::I32(v) => Self::I32(*v),
            SettingsValue::U32(v) => Self::U32(*v),
            SettingsValue::I64(v) => Self::I64(*v),
            SettingsValue::U64(v) => Self::U64(*v),
            SettingsValue::F32(v) => Self::F32(*v),
            SettingsValue::F64(v) => Self::F64(*v),
            SettingsValue::String(v) => Self::String(v.clone()),
        }
    }
}

impl From<WireValue> for SettingsValue {
    fn from(v: WireValue) -> Self {
        match v {
            WireValue::Bool(b) => Self::Bool(b),
            WireValue::I32(v) => Self::I32(v),
            WireValue::U32(v) => Self::U32(v),
            WireValue::I64(v) => Self::I64(v),
            WireValue::U64(v) => Self::U64(v),
            WireValue::F32(v) => Self::F32(v),
            WireValue::F64(v) => Self::F64(v),
            WireValue::String(v) => Self::String(v),
        }
    }
}

/// A group as carried on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireGroup {
    /// Group id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Entries, in declaration order.
    pub entries: Vec<WireEntry>,
}

/// `Settings.Request` as defined on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SettingsRequest {
    /// Fetch one group, or every group if `group_id` is empty.
    GetGroupList {
        /// Target group id, or empty for all groups.
        group_id: String,
    },
    /// Stage and (if accepted) commit a group's entries.
    SetGroup {
        /// The group, with entries carrying the desired new values.
        group: WireGroup,
    },
}

/// `Settings.Response` as defined on the control wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SettingsResponse {
    /// One or more groups, reflecting export filtering.
    GroupList(Vec<WireGroup>),
    /// A validator rejection or dispatch error.
    Error(String),
}

/// `{id; entries_path; groups: ordered list}`, registered globally by id.
pub struct SettingsStore {
    id: String,
    entries_path: PathBuf,
    groups: Vec<SettingsGroup>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("id", &self.id)
            .field("entries_path", &self.entries_path)
            .field("groups", &self.groups.len())
            .finish()
    }
}

impl SettingsStore {
    /// Create a store whose file lives at `{user-config-dir}/melo/{id}`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let entries_path = settings_dir().join(&id);
        Self { id, entries_path, groups: Vec::new() }
    }

    /// Create a store with an explicit file path (tests, non-default
    /// install layouts).
    #[must_use]
    pub fn with_path(id: impl Into<String>, entries_path: PathBuf) -> Self {
        Self { id: id.into(), entries_path, groups: Vec::new() }
    }

    /// Store id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registered groups, in declaration order.
    #[must_use]
    pub fn groups(&self) -> &[SettingsGroup] {
        &self.groups
    }

    /// Register a group (construction-time only).
    pub fn add_group(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        validator: Option<Validator>,
    ) -> GroupHandle {
        let handle = GroupHandle(self.groups.len());
        self.groups.push(SettingsGroup::new(id, name, description, validator));
        handle
    }

    fn group_mut(&mut self, handle: GroupHandle) -> &mut SettingsGroup {
        &mut self.groups[handle.0]
    }

    /// Register a `bool` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_bool(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: bool,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group)
            .add_entry(id, name, description, SettingsValue::Bool(default), depends_on, flags)
    }

    /// Register an `i32` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_i32(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: i32,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group)
            .add_entry(id, name, description, SettingsValue::I32(default), depends_on, flags)
    }

    /// Register a `u32` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_u32(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: u32,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group)
            .add_entry(id, name, description, SettingsValue::U32(default), depends_on, flags)
    }

    /// Register an `i64` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_i64(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: i64,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group)
            .add_entry(id, name, description, SettingsValue::I64(default), depends_on, flags)
    }

    /// Register a `u64` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_u64(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: u64,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group)
            .add_entry(id, name, description, SettingsValue::U64(default), depends_on, flags)
    }

    /// Register an `f32` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_f32(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: f32,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group)
            .add_entry(id, name, description, SettingsValue::F32(default), depends_on, flags)
    }

    /// Register an `f64` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_f64(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: f64,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group)
            .add_entry(id, name, description, SettingsValue::F64(default), depends_on, flags)
    }

    /// Register a `string` entry in `group`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_string(
        &mut self,
        group: GroupHandle,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        self.group_mut(group).add_entry(
            id,
            name,
            description,
            SettingsValue::String(default.into()),
            depends_on,
            flags,
        )
    }

    /// Load the store's file, applying parsed values onto the registered
    /// groups/entries (unknowns skipped, numeric parse failures fall back
    /// to default), then immediately rewrite the file to canonicalize it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or if the
    /// canonicalizing rewrite fails. A missing file is not an error: the
    /// store simply keeps its defaults and a rewrite creates the file.
    pub fn load(&mut self) -> Result<(), SettingsError> {
        let text = match fs::read_to_string(&self.entries_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let parsed = ini::parse(&text);
        ini::apply(&mut self.groups, &parsed);
        self.save()
    }

    /// Write all groups/entries to the store's file in declaration order,
    /// mode 0700 on the containing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.entries_path.parent() {
            fs::create_dir_all(parent)?;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
        }
        let text = ini::serialize(&self.groups);
        fs::write(&self.entries_path, text)?;
        Ok(())
    }

    fn group_by_id(&self, id: &str) -> Option<&SettingsGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn group_by_id_mut(&mut self, id: &str) -> Option<&mut SettingsGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    fn wire_group(group: &SettingsGroup) -> WireGroup {
        WireGroup {
            id: group.id.clone(),
            name: group.name.clone(),
            entries: group
                .entries()
                .iter()
                .filter(|e| !e.flags().no_export)
                .map(|e| WireEntry {
                    id: e.id().to_string(),
                    display_name: e.display_name().to_string(),
                    description: e.description().to_string(),
                    value: if e.flags().password {
                        WireValue::String(String::new())
                    } else {
                        WireValue::from(e.current_value())
                    },
                    read_only: e.flags().read_only,
                })
                .collect(),
        }
    }

    /// Handle a `Settings.Request`, returning the response to deliver.
    ///
    /// `GetGroupList` filters `NoExport` entries and blanks `Password`
    /// string values. `SetGroup` stages each incoming entry, runs the
    /// group's validator, and on rejection rolls back without persisting.
    pub fn handle_request(&mut self, request: &SettingsRequest) -> SettingsResponse {
        match request {
            SettingsRequest::GetGroupList { group_id } => {
                if group_id.is_empty() {
                    SettingsResponse::GroupList(self.groups.iter().map(Self::wire_group).collect())
                } else {
                    match self.group_by_id(group_id) {
                        Some(group) => SettingsResponse::GroupList(vec![Self::wire_group(group)]),
                        None => SettingsResponse::Error(format!("unknown group {group_id}")),
                    }
                }
            }
            SettingsRequest::SetGroup { group: incoming } => {
                let Some(group) = self.group_by_id_mut(&incoming.id) else {
                    return SettingsResponse::Error(format!("unknown group {}", incoming.id));
                };
                for entry in &incoming.entries {
                    if let Err(message) = group.stage(&entry.id, entry.value.clone().into()) {
                        // Staging failure rolls back the same as a
                        // validator rejection: no partial commits.
                        for e in &mut group.entries {
                            e.pending_value = e.current_value.clone();
                        }
                        return SettingsResponse::Error(message);
                    }
                }
                match group.commit_or_rollback() {
                    Ok(()) => {
                        if let Err(e) = self.save() {
                            return SettingsResponse::Error(e.to_string());
                        }
                        SettingsResponse::GroupList(vec![Self::wire_group(
                            self.group_by_id(&incoming.id).expect("group just mutated"),
                        )])
                    }
                    Err(message) => SettingsResponse::Error(message),
                }
            }
        }
    }
}

fn settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("melo")
}

/// Process-wide table of settings stores, keyed by id.
#[derive(Clone, Default)]
pub struct SettingsRegistry {
    stores: Arc<Mutex<HashMap<String, Arc<Mutex<SettingsStore>>>>>,
}

impl SettingsRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store, replacing any previous registration under the
    /// same id.
    pub fn register(&self, store: SettingsStore) {
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        stores.insert(store.id().to_string(), Arc::new(Mutex::new(store)));
    }

    /// Look up a store by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Mutex<SettingsStore>>> {
        self.stores.lock().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }
}
