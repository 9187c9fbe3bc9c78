//! Typed settings entries.

/// A typed settings value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsValue {
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

impl SettingsValue {
    /// The entry type tag for this value, used for type-checking incoming
    /// `SetGroup` assignments.
    #[must_use]
    pub fn type_tag(&self) -> SettingsType {
        match self {
            Self::Bool(_) => SettingsType::Bool,
            Self::I32(_) => SettingsType::I32,
            Self::U32(_) => SettingsType::U32,
            Self::I64(_) => SettingsType::I64,
            Self::U64(_) => SettingsType::U64,
            Self::F32(_) => SettingsType::F32,
            Self::F64(_) => SettingsType::F64,
            Self::String(_) => SettingsType::String,
        }
    }

    /// Render as the on-disk/wire textual form.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::I32(v) => v.to_string(),
            Self::U32(v) => v.to_string(),
            Self::I64(v) => v.to_string(),
            Self::U64(v) => v.to_string(),
            Self::F32(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::String(v) => v.clone(),
        }
    }

    /// Parse `text` as this value's type. Falls back to `default` on parse
    /// failure, matching the settings-store load contract.
    #[must_use]
    pub fn parse_or_default(tag: SettingsType, text: &str, default: &SettingsValue) -> Self {
        match tag {
            SettingsType::Bool => text.parse().map(Self::Bool),
            SettingsType::I32 => text.parse().map(Self::I32),
            SettingsType::U32 => text.parse().map(Self::U32),
            SettingsType::I64 => text.parse().map(Self::I64),
            SettingsType::U64 => text.parse().map(Self::U64),
            SettingsType::F32 => text.parse().map(Self::F32),
            SettingsType::F64 => text.parse().map(Self::F64),
            SettingsType::String => return Self::String(text.to_string()),
        }
        .unwrap_or_else(|_| default.clone())
    }
}

/// The type tag of a settings entry, independent of its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsType {
    /// See [`SettingsValue::Bool`].
    Bool,
    /// See [`SettingsValue::I32`].
    I32,
    /// See [`SettingsValue::U32`].
    U32,
    /// See [`SettingsValue::I64`].
    I64,
    /// See [`SettingsValue::U64`].
    U64,
    /// See [`SettingsValue::F32`].
    F32,
    /// See [`SettingsValue::F64`].
    F64,
    /// See [`SettingsValue::String`].
    String,
}

/// Entry behavior flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EntryFlags {
    /// Rejected by `SetGroup` type-checking before it reaches the validator.
    pub read_only: bool,
    /// String value is blanked to `""` on `GetGroupList` responses.
    pub password: bool,
    /// Omitted entirely from `GetGroupList` responses.
    pub no_export: bool,
}

/// A handle identifying a registered entry within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle(pub(crate) usize);

/// One typed, validated, persistable setting.
#[derive(Debug, Clone)]
pub struct SettingsEntry {
    pub(crate) id: String,
    pub(crate) display_name: String,
    pub(crate) description: String,
    pub(crate) current_value: SettingsValue,
    pub(crate) pending_value: SettingsValue,
    pub(crate) default_value: SettingsValue,
    pub(crate) depends_on: Option<EntryHandle>,
    pub(crate) flags: EntryFlags,
}

impl SettingsEntry {
    pub(crate) fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        default_value: SettingsValue,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: description.into(),
            current_value: default_value.clone(),
            pending_value: default_value.clone(),
            default_value,
            depends_on,
            flags,
        }
    }

    /// Entry id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The committed value.
    #[must_use]
    pub fn current_value(&self) -> &SettingsValue {
        &self.current_value
    }

    /// The type tag (fixed for the entry's lifetime).
    #[must_use]
    pub fn type_tag(&self) -> SettingsType {
        self.default_value.type_tag()
    }

    /// Behavior flags.
    #[must_use]
    pub fn flags(&self) -> EntryFlags {
        self.flags
    }
}
