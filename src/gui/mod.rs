//! Preferences window implemented with egui/eframe

mod components;
mod constants;
mod prefs;

pub use prefs::run_prefs;
