//! Label editor component: one text field per keyboard layout

use eframe::egui;

use super::super::constants::{ENTRY_WIDTH, ITEM_SPACING};

/// Editable row for one layout identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRow {
    pub id: String,
    pub text: String,
}

impl LabelRow {
    pub fn new(id: impl Into<String>, current_label: Option<&str>) -> Self {
        Self {
            id: id.into(),
            text: current_label.unwrap_or_default().to_string(),
        }
    }

    /// What the layout will be shown as with the text as typed
    pub fn shown_as(&self) -> &str {
        let trimmed = self.text.trim();
        if trimmed.is_empty() { &self.id } else { trimmed }
    }
}

/// Renders the label rows and returns the index of the row edited this frame
pub fn ui(ui: &mut egui::Ui, rows: &mut [LabelRow]) -> Option<usize> {
    let mut edited = None;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Custom Labels").heading().strong());
        ui.label(
            egui::RichText::new("Set custom labels for your keyboard layouts. Leave empty to use the default label.")
                .small()
                .italics(),
        );
        ui.add_space(ITEM_SPACING);

        if rows.is_empty() {
            ui.label(egui::RichText::new("No XKB layouts found").strong());
            ui.label(
                egui::RichText::new("Add keyboard layouts in Settings to configure custom labels.")
                    .small()
                    .weak(),
            );
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (idx, row) in rows.iter_mut().enumerate() {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(&row.id).strong());
                        ui.label(egui::RichText::new(format!("Shown as: {}", row.shown_as())).small().weak());
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let entry = egui::TextEdit::singleline(&mut row.text)
                            .hint_text(row.id.as_str())
                            .desired_width(ENTRY_WIDTH);
                        if ui.add(entry).changed() {
                            edited = Some(idx);
                        }
                    });
                });
                ui.add_space(ITEM_SPACING / 2.0);
            }
        });
    });

    edited
}
