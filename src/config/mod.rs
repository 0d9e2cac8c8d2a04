//! Configuration management for layout-labels
//!
//! A single JSON settings file holds the desired labels (written by the
//! editor, read by the daemon) and the daemon's tuning knobs.

pub mod settings;

pub use settings::{LabelEdit, Settings};
