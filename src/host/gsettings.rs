//! GNOME input sources read through the `gsettings` tool
//!
//! The configured sources come from `org.gnome.desktop.input-sources sources`
//! (an `a(ss)` list of `(type, id)` pairs). Labels are published as a JSON
//! snapshot so status bars can display them.

use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use super::watch::watch_command;
use crate::constants::{gsettings, paths};
use crate::sync::{InputSource, LayoutProvider, SourceKind, Subscription, SyncEvent};

/// Snapshot location (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_status_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(paths::RUNTIME_SUBDIR).join(paths::STATUS_FILE));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(paths::RUNTIME_SUBDIR).join(paths::STATUS_FILE))
}

/// `(type, id)` pairs currently configured in GNOME settings
pub fn read_configured_sources() -> Result<Vec<(String, String)>> {
    let output = Command::new(gsettings::BINARY)
        .args(["get", gsettings::SCHEMA, gsettings::SOURCES_KEY])
        .output()
        .context(format!("Failed to run '{}'", gsettings::BINARY))?;

    if !output.status.success() {
        bail!(
            "{} get {} {} failed: {}",
            gsettings::BINARY,
            gsettings::SCHEMA,
            gsettings::SOURCES_KEY,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let text = String::from_utf8(output.stdout).context("gsettings output is not UTF-8")?;
    parse_source_list(&text)
}

/// Parse GVariant text such as `[('xkb', 'us'), ('xkb', 'de+neo')]`
pub fn parse_source_list(text: &str) -> Result<Vec<(String, String)>> {
    let text = text.trim();
    let text = text.strip_prefix("@a(ss)").map(str::trim_start).unwrap_or(text);

    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| anyhow!("Expected a list of input sources, got: {text}"))?;

    let strings = quoted_strings(inner)?;
    if strings.len() % 2 != 0 {
        bail!("Unbalanced (type, id) pairs in input source list: {text}");
    }

    Ok(strings
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Every single- or double-quoted string in `text`, unescaped
fn quoted_strings(text: &str) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            continue;
        }
        let quote = c;
        let mut value = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => value.push(c),
            }
        }
        if !closed {
            bail!("Unterminated string in input source list");
        }
        strings.push(value);
    }

    Ok(strings)
}

/// Label the host shows when no override applies
///
/// xkb layouts use the layout part of `layout+variant`; anything else shows
/// its id.
pub fn default_label(kind: SourceKind, id: &str) -> String {
    match kind {
        SourceKind::Xkb => id.split('+').next().unwrap_or(id).to_string(),
        SourceKind::Ibus | SourceKind::Other => id.to_string(),
    }
}

pub fn build_sources(pairs: &[(String, String)]) -> Vec<InputSource> {
    pairs
        .iter()
        .map(|(source_type, id)| {
            let kind = SourceKind::from_type(source_type);
            InputSource::new(id.clone(), kind, default_label(kind, id))
        })
        .collect()
}

/// Read a snapshot written by a running daemon
pub fn read_status(path: &Path) -> Result<Vec<InputSource>> {
    let contents = fs::read(path)
        .context(format!("Failed to read label snapshot {}", path.display()))?;
    serde_json::from_slice(&contents).context("Failed to parse label snapshot")
}

fn write_status(path: &Path, sources: &[InputSource]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .context(format!("Failed to create status directory: {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(sources).context("Failed to serialize label snapshot")?;

    // Readers never see a half-written file
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context(format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).context(format!("Failed to move snapshot into {}", path.display()))?;
    Ok(())
}

/// Live input sources as configured in GNOME settings
#[derive(Debug)]
pub struct GsettingsSources {
    sources: Vec<InputSource>,
    status_path: PathBuf,
}

impl GsettingsSources {
    /// None when the input source settings cannot be read at all
    pub fn connect(status_path: PathBuf) -> Option<Self> {
        match read_configured_sources() {
            Ok(pairs) => {
                let sources = build_sources(&pairs);
                info!(count = sources.len(), status = %status_path.display(), "Connected to GNOME input sources");
                Some(Self { sources, status_path })
            }
            Err(e) => {
                warn!(error = ?e, "GNOME input sources are not available");
                None
            }
        }
    }
}

impl LayoutProvider for GsettingsSources {
    fn layouts_mut(&mut self) -> Option<&mut [InputSource]> {
        Some(&mut self.sources)
    }

    fn reload(&mut self) -> Result<()> {
        let pairs = read_configured_sources()?;
        self.sources = build_sources(&pairs);
        debug!(count = self.sources.len(), "Rebuilt input sources");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        write_status(&self.status_path, &self.sources)
    }

    fn subscribe(&mut self, events: Sender<SyncEvent>) -> Result<Subscription> {
        watch_command(
            "input-sources",
            gsettings::BINARY,
            &["monitor", gsettings::SCHEMA, gsettings::SOURCES_KEY],
            SyncEvent::LayoutSetChanged,
            events,
        )
    }
}
