//! Settings groups: an ordered set of entries plus an optional validator.

use super::entry::{EntryFlags, EntryHandle, SettingsEntry, SettingsValue};

/// A group's validator inspects the entries' `pending_value`s (and may
/// mutate them via the group's setters) before a `SetGroup` transaction
/// commits. Returning `Err` rejects the transaction with the given message.
pub type Validator = Box<dyn Fn(&mut SettingsGroup) -> Result<(), String> + Send + Sync>;

/// A handle identifying a registered group within its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(pub(crate) usize);

/// An ordered collection of [`SettingsEntry`] values sharing one validator.
pub struct SettingsGroup {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) entries: Vec<SettingsEntry>,
    pub(crate) validator: Option<Validator>,
}

impl std::fmt::Debug for SettingsGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsGroup")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl SettingsGroup {
    pub(crate) fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        validator: Option<Validator>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            entries: Vec::new(),
            validator,
        }
    }

    /// Group id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declaration-ordered entries.
    #[must_use]
    pub fn entries(&self) -> &[SettingsEntry] {
        &self.entries
    }

    /// Register a new entry, prepended internally but tracked in
    /// declaration order for serialization (matching the spec's
    /// "entries prepended to an internal list; a separate tail pointer
    /// preserves declaration order" shape — a `Vec` gives both for free).
    pub(crate) fn add_entry(
        &mut self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        default_value: SettingsValue,
        depends_on: Option<EntryHandle>,
        flags: EntryFlags,
    ) -> EntryHandle {
        let handle = EntryHandle(self.entries.len());
        self.entries
            .push(SettingsEntry::new(id, display_name, description, default_value, depends_on, flags));
        handle
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut SettingsEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Find an entry by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&SettingsEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Set an entry's `pending_value` by handle, type-checked against the
    /// entry's fixed type. Used by validators that need to mutate siblings.
    ///
    /// # Errors
    ///
    /// Returns an error if `handle` is out of range or the value's type tag
    /// does not match the entry's.
    pub fn set_pending(&mut self, handle: EntryHandle, value: SettingsValue) -> Result<(), String> {
        let entry = self
            .entries
            .get_mut(handle.0)
            .ok_or_else(|| "unknown entry handle".to_string())?;
        if entry.type_tag() != value.type_tag() {
            return Err(format!("type mismatch setting entry {}", entry.id));
        }
        entry.pending_value = value;
        Ok(())
    }

    /// Stage an incoming `(id, value)` assignment, returning `Err` on
    /// unknown id, read-only entry, or type mismatch.
    pub(crate) fn stage(&mut self, id: &str, value: SettingsValue) -> Result<(), String> {
        let entry = self.find_mut(id).ok_or_else(|| format!("unknown entry {id}"))?;
        if entry.flags.read_only {
            return Err(format!("entry {id} is read-only"));
        }
        if entry.type_tag() != value.type_tag() {
            return Err(format!("type mismatch for entry {id}"));
        }
        entry.pending_value = value;
        Ok(())
    }

    /// Run the validator, if any, against staged `pending_value`s.
    fn run_validator(&mut self) -> Result<(), String> {
        if let Some(validator) = self.validator.take() {
            let result = validator(self);
            self.validator = Some(validator);
            result
        } else {
            Ok(())
        }
    }

    /// Commit staged pending values into current, or roll back on
    /// validator rejection. Returns the validator's error message on
    /// rejection.
    pub(crate) fn commit_or_rollback(&mut self) -> Result<(), String> {
        match self.run_validator() {
            Ok(()) => {
                for entry in &mut self.entries {
                    entry.current_value = entry.pending_value.clone();
                }
                Ok(())
            }
            Err(message) => {
                for entry in &mut self.entries {
                    entry.pending_value = entry.current_value.clone();
                }
                Err(message)
            }
        }
    }
}
