//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Settings file location
pub mod config {
    /// Directory under the XDG config dir
    pub const APP_DIR: &str = "layout-labels";

    /// Settings file name
    pub const FILENAME: &str = "settings.json";
}

/// Published label snapshot location
pub mod paths {
    /// Directory under XDG_RUNTIME_DIR (or the cache dir as fallback)
    pub const RUNTIME_SUBDIR: &str = "layout-labels";

    /// Snapshot file name
    pub const STATUS_FILE: &str = "sources.json";
}

/// GNOME input-source settings
pub mod gsettings {
    /// Binary used to read and monitor settings
    pub const BINARY: &str = "gsettings";

    /// Schema holding the configured input sources
    pub const SCHEMA: &str = "org.gnome.desktop.input-sources";

    /// Key holding the `a(ss)` list of `(type, id)` pairs
    pub const SOURCES_KEY: &str = "sources";
}

/// Input source type strings as reported by the host
pub mod kinds {
    /// Plain keyboard layouts
    pub const XKB: &str = "xkb";

    /// IBus input methods
    pub const IBUS: &str = "ibus";
}
