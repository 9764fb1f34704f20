//! Database configuration.

/// How the database file is shared with other processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Hold an exclusive lock for the lifetime of the handle.
    ///
    /// A second opener fails with `DatabaseLocked`.
    #[default]
    Exclusive,
    /// Tolerate one cooperating process on the same file.
    ///
    /// Writes take the lock only while appending, and every operation
    /// first replays records the other process appended.
    Shared,
}

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the database if it doesn't exist.
    pub create_if_missing: bool,

    /// How the file is shared with other processes.
    pub open_mode: OpenMode,

    /// Whether to fsync after every write (safer but slower).
    pub sync_on_write: bool,

    /// Format version to use for new databases.
    pub format_version: (u16, u16),

    /// Directory name, next to the database file, for default backups.
    pub backup_dir_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            open_mode: OpenMode::Exclusive,
            sync_on_write: false,
            format_version: (1, 0),
            backup_dir_name: "backups".to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database if missing.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the open mode.
    #[must_use]
    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    /// Sets whether to fsync after every write.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the backup directory name.
    #[must_use]
    pub fn backup_dir_name(mut self, name: impl Into<String>) -> Self {
        self.backup_dir_name = name.into();
        self
    }
}
