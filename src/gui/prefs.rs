use std::path::PathBuf;

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{error, info, warn};

use super::components::label_editor::{self, LabelRow};
use super::constants::*;
use crate::commands::configured_keyboard_ids;
use crate::config::{LabelEdit, Settings};

struct StatusMessage {
    text: String,
    color: egui::Color32,
}

struct PrefsApp {
    settings_path: PathBuf,
    settings: Settings,
    rows: Vec<LabelRow>,
    status_message: Option<StatusMessage>,
    /// Settings file exists but did not parse; saving would clobber it
    load_failed: bool,
}

impl PrefsApp {
    fn new(_cc: &CreationContext<'_>, settings_path: PathBuf) -> Self {
        info!(path = %settings_path.display(), "Initializing preferences window");
        let ids = configured_keyboard_ids().unwrap_or_else(|err| {
            warn!(error = ?err, "Failed to read configured keyboard layouts");
            Vec::new()
        });
        Self::load(settings_path, ids)
    }

    fn load(settings_path: PathBuf, ids: Vec<String>) -> Self {
        let mut status_message = None;
        let mut load_failed = false;

        let settings = Settings::load_from(&settings_path).unwrap_or_else(|err| {
            error!(error = ?err, "Failed to load settings, editing disabled");
            status_message = Some(StatusMessage {
                text: format!("Failed to load settings, fix the file and reopen: {err:#}"),
                color: STATUS_ERROR,
            });
            load_failed = true;
            Settings::default()
        });

        let rows = ids
            .into_iter()
            .map(|id| {
                let current = settings.label_for(&id).map(str::to_string);
                LabelRow::new(id, current.as_deref())
            })
            .collect();

        Self {
            settings_path,
            settings,
            rows,
            status_message,
            load_failed,
        }
    }

    fn save_row(&mut self, idx: usize) {
        if self.load_failed {
            warn!("Settings file did not load, not saving");
            return;
        }
        let Some(row) = self.rows.get(idx) else {
            return;
        };

        let edit = self.settings.set_label(&row.id, &row.text);
        if edit == LabelEdit::Unchanged {
            return;
        }

        self.status_message = Some(match self.settings.save_to(&self.settings_path) {
            Ok(()) => {
                info!(id = %row.id, edit = ?edit, "Saved label");
                StatusMessage {
                    text: format!("Saved label for {}", row.id),
                    color: STATUS_OK,
                }
            }
            Err(err) => {
                error!(error = ?err, "Failed to save settings");
                StatusMessage {
                    text: format!("Failed to save: {err}"),
                    color: STATUS_ERROR,
                }
            }
        });
    }
}

impl eframe::App for PrefsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut edited = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(PADDING);
            ui.heading("Layout Labels");
            ui.add_space(SECTION_SPACING);

            edited = ui
                .add_enabled_ui(!self.load_failed, |ui| label_editor::ui(ui, &mut self.rows))
                .inner;

            if let Some(message) = &self.status_message {
                ui.add_space(SECTION_SPACING);
                ui.colored_label(message.color, &message.text);
            }
        });

        if let Some(idx) = edited {
            self.save_row(idx);
        }
    }
}

pub fn run_prefs(settings_path: PathBuf) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("Layout Labels"),
        ..Default::default()
    };

    eframe::run_native(
        "Layout Labels",
        options,
        Box::new(|cc| Ok(Box::new(PrefsApp::new(cc, settings_path)))),
    )
    .map_err(|err| anyhow!("Failed to launch preferences window: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_unparsable_settings_are_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let broken = r#"{ "labels": { "us": "EN", "#;
        fs::write(&path, broken).unwrap();

        let mut app = PrefsApp::load(path.clone(), vec!["us".to_string(), "de".to_string()]);
        assert!(app.load_failed);
        assert!(app.status_message.is_some());

        app.rows[1].text = "DE".to_string();
        app.save_row(1);

        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn test_edit_saves_and_keeps_other_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.set_label("us", "EN");
        settings.save_to(&path).unwrap();

        let mut app = PrefsApp::load(path.clone(), vec!["us".to_string(), "de".to_string()]);
        assert!(!app.load_failed);
        assert_eq!(app.rows[0].text, "EN");

        app.rows[1].text = " DE ".to_string();
        app.save_row(1);

        let saved = Settings::load_from(&path).unwrap();
        assert_eq!(saved.label_for("us"), Some("EN"));
        assert_eq!(saved.label_for("de"), Some("DE"));
    }
}
