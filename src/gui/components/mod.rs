pub mod label_editor;
