//! Desktop-side collaborators: the settings file and GNOME input sources

pub mod gsettings;
mod labels_file;
mod watch;

pub use gsettings::GsettingsSources;
pub use labels_file::LabelsFile;
