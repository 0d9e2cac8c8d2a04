//! Background watchers that turn host changes into SyncEvents
//!
//! Watchers never touch labels themselves; they only enqueue events for the
//! main loop.

use anyhow::{Context, Result};
use notify::{EventKind, RecursiveMode, Watcher};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, error, info, warn};

use crate::sync::{Subscription, SyncEvent};

/// Watch `path` and send `event` whenever it is written, created or removed
///
/// The parent directory is watched rather than the file itself so editors
/// that save by renaming a temp file over it are still seen. The watch is
/// registered before this returns.
pub fn watch_file(
    name: &'static str,
    path: PathBuf,
    event: SyncEvent,
    sender: Sender<SyncEvent>,
) -> Result<Subscription> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .context(format!("No file name in {}", path.display()))?;
    fs::create_dir_all(&dir).context(format!("Failed to create directory: {}", dir.display()))?;

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let fs_event = match res {
            Ok(fs_event) => fs_event,
            Err(e) => {
                error!(watcher = name, error = %e, "File watch error");
                return;
            }
        };
        let relevant = matches!(
            fs_event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        );
        if !relevant || !fs_event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
            return;
        }
        debug!(watcher = name, kind = ?fs_event.kind, "File changed");
        // Fails only once the main loop is gone
        let _ = sender.send(event);
    })
    .context(format!("Failed to create file watcher for {name}"))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .context(format!("Failed to watch {}", dir.display()))?;
    info!(watcher = name, path = %path.display(), "File watcher started");

    Ok(Subscription::new(name, move || {
        if let Err(e) = watcher.unwatch(&dir) {
            debug!(watcher = name, error = %e, "Watch already gone");
        }
    }))
}

/// Run `program args...` and send `event` for every line it prints
///
/// Used with `gsettings monitor`, which prints one line per change. The
/// child is killed when the subscription is released.
pub fn watch_command(
    name: &'static str,
    program: &str,
    args: &[&str],
    event: SyncEvent,
    sender: Sender<SyncEvent>,
) -> Result<Subscription> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context(format!("Failed to spawn '{program}' for {name}"))?;

    let stdout = child
        .stdout
        .take()
        .context(format!("No stdout from '{program}'"))?;

    let spawned = thread::Builder::new()
        .name(format!("watch-{name}"))
        .spawn(move || {
            info!(watcher = name, "Command watcher started");
            for line in BufReader::new(stdout).lines() {
                match line {
                    Ok(line) => {
                        debug!(watcher = name, line = %line, "Change reported");
                        if sender.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(watcher = name, error = %e, "Failed to read watcher output");
                        break;
                    }
                }
            }
            debug!(watcher = name, "Command watcher stopped");
        });

    if let Err(e) = spawned {
        let _ = child.kill();
        let _ = child.wait();
        return Err(e).context("Failed to spawn command watcher thread");
    }

    Ok(Subscription::new(name, move || {
        if let Err(e) = child.kill() {
            warn!(watcher = name, error = %e, "Failed to stop watcher process");
        }
        let _ = child.wait();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_watch_file_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let (tx, rx) = mpsc::channel();

        let subscription = watch_file(
            "test",
            path.clone(),
            SyncEvent::MappingChanged,
            tx,
        )
        .unwrap();

        std::fs::write(&path, "{}").unwrap();
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, SyncEvent::MappingChanged);

        subscription.cancel();
    }

    #[test]
    fn test_watch_file_quiet_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{}").unwrap();
        let (tx, rx) = mpsc::channel();

        let _subscription = watch_file(
            "test",
            path,
            SyncEvent::MappingChanged,
            tx,
        )
        .unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_watch_file_same_length_edit_with_restored_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"labels":{"us":"EN"}}"#).unwrap();
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();
        let (tx, rx) = mpsc::channel();

        let _subscription = watch_file("test", path.clone(), SyncEvent::MappingChanged, tx).unwrap();

        // Same length, old mtime put back the way `cp -p` does
        fs::write(&path, r#"{"labels":{"us":"FR"}}"#).unwrap();
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), SyncEvent::MappingChanged);
    }

    #[test]
    fn test_watch_file_ignores_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let (tx, rx) = mpsc::channel();

        let _subscription = watch_file("test", path, SyncEvent::MappingChanged, tx).unwrap();
        fs::write(dir.path().join("other.json"), "{}").unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_watch_file_stops_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let (tx, rx) = mpsc::channel();

        let subscription = watch_file("test", path.clone(), SyncEvent::MappingChanged, tx).unwrap();
        subscription.cancel();
        fs::write(&path, "{}").unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_watch_file_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout-labels").join("settings.json");
        let (tx, rx) = mpsc::channel();

        let _subscription = watch_file("test", path.clone(), SyncEvent::MappingChanged, tx).unwrap();
        fs::write(&path, "{}").unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), SyncEvent::MappingChanged);
    }

    #[cfg(unix)]
    #[test]
    fn test_watch_command_line_per_event() {
        let (tx, rx) = mpsc::channel();

        let _subscription = watch_command(
            "test",
            "printf",
            &["a\\nb\\n"],
            SyncEvent::LayoutSetChanged,
            tx,
        )
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), SyncEvent::LayoutSetChanged);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), SyncEvent::LayoutSetChanged);
    }

    #[test]
    fn test_watch_command_missing_program() {
        let (tx, _rx) = mpsc::channel();
        let result = watch_command(
            "test",
            "layout-labels-no-such-binary",
            &[],
            SyncEvent::LayoutSetChanged,
            tx,
        );
        assert!(result.is_err());
    }
}
