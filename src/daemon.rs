//! Synchronization daemon: one session, events handled in arrival order

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{info, warn};

use crate::config::Settings;
use crate::host::gsettings::default_status_path;
use crate::host::{GsettingsSources, LabelsFile};
use crate::sync::{LayoutProvider, LifecycleController, MappingStore, SyncEvent};

/// Queue `Shutdown` on the first signal; return the second one
///
/// A second signal means the graceful restore is stuck or unwanted.
#[cfg_attr(not(unix), allow(dead_code))]
fn forward_signals(signals: impl IntoIterator<Item = i32>, sender: &Sender<SyncEvent>) -> Option<i32> {
    let mut requested = false;
    for signal in signals {
        if requested {
            return Some(signal);
        }
        info!(signal, "Received termination signal, restoring labels");
        requested = true;
        let _ = sender.send(SyncEvent::Shutdown);
    }
    None
}

/// Forward SIGINT/SIGTERM into the event queue as `Shutdown`
#[cfg(unix)]
fn spawn_signal_listener(sender: Sender<SyncEvent>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = forward_signals(signals.forever(), &sender) {
                warn!(signal, "Second termination signal, exiting without restoring labels");
                std::process::exit(128 + signal);
            }
        })
        .context("Failed to spawn signal listener thread")?;
    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_listener(_sender: Sender<SyncEvent>) -> Result<()> {
    warn!("Signal handling unavailable on this platform, labels are restored only on clean exit");
    Ok(())
}

/// Drain `events` until the session ends
///
/// Returns after a `Shutdown` event or when every sender is gone.
pub fn event_loop<S: MappingStore, P: LayoutProvider>(
    controller: &mut LifecycleController<S, P>,
    events: &Receiver<SyncEvent>,
) {
    while controller.is_active() {
        match events.recv() {
            Ok(event) => controller.handle(event),
            Err(_) => {
                warn!("Event sources closed, stopping");
                controller.deactivate();
            }
        }
    }
}

pub fn run(settings_path: PathBuf) -> Result<()> {
    let settings = Settings::load_from(&settings_path)?;
    let status_path = match &settings.daemon.status_file {
        Some(path) => path.clone(),
        None => default_status_path()?,
    };
    info!(
        settings = %settings_path.display(),
        status = %status_path.display(),
        labels = settings.labels.len(),
        "Starting layout label daemon"
    );

    let (tx, rx) = mpsc::channel();
    spawn_signal_listener(tx.clone())?;

    let store = LabelsFile::new(settings_path);
    let mut controller = LifecycleController::new(store, tx);

    controller
        .activate(GsettingsSources::connect(status_path))
        .context("Failed to activate layout labels")?;
    if let Some(originals) = controller.originals() {
        info!(tracked = originals.len(), "Layout label session running");
    }

    event_loop(&mut controller, &rx);
    info!("Layout label daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{DesiredMapping, InputSource, Subscription};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct StaticStore(DesiredMapping);

    impl MappingStore for StaticStore {
        fn read(&self) -> Result<DesiredMapping> {
            Ok(self.0.clone())
        }

        fn subscribe(&mut self, _events: Sender<SyncEvent>) -> Result<Subscription> {
            Ok(Subscription::new("static", || {}))
        }
    }

    struct SharedLayouts(Rc<RefCell<Vec<InputSource>>>, Vec<InputSource>);

    impl LayoutProvider for SharedLayouts {
        fn layouts_mut(&mut self) -> Option<&mut [InputSource]> {
            self.1 = self.0.borrow().clone();
            Some(&mut self.1)
        }

        fn flush(&mut self) -> Result<()> {
            *self.0.borrow_mut() = self.1.clone();
            Ok(())
        }

        fn subscribe(&mut self, _events: Sender<SyncEvent>) -> Result<Subscription> {
            Ok(Subscription::new("shared", || {}))
        }
    }

    #[test]
    fn test_event_loop_stops_on_shutdown_and_restores() {
        let live = Rc::new(RefCell::new(vec![InputSource::keyboard("us", "en")]));
        let (tx, rx) = mpsc::channel();
        let store = StaticStore([("us", "EN")].into_iter().collect());
        let mut controller = LifecycleController::new(store, tx.clone());
        controller
            .activate(Some(SharedLayouts(live.clone(), Vec::new())))
            .unwrap();
        assert_eq!(live.borrow()[0].label(), Some("EN"));

        tx.send(SyncEvent::MappingChanged).unwrap();
        tx.send(SyncEvent::Shutdown).unwrap();
        event_loop(&mut controller, &rx);

        assert!(!controller.is_active());
        assert_eq!(live.borrow()[0].label(), Some("en"));
    }

    #[test]
    fn test_first_signal_queues_shutdown_second_forces_exit() {
        let (tx, rx) = mpsc::channel();

        assert_eq!(forward_signals([15, 2, 15], &tx), Some(2));
        assert_eq!(rx.try_recv(), Ok(SyncEvent::Shutdown));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_single_signal_only_queues_shutdown() {
        let (tx, rx) = mpsc::channel();

        assert_eq!(forward_signals([15], &tx), None);
        assert_eq!(rx.try_recv(), Ok(SyncEvent::Shutdown));
    }

    #[test]
    fn test_event_loop_stops_when_senders_gone() {
        let live = Rc::new(RefCell::new(vec![InputSource::keyboard("us", "en")]));
        let (tx, rx) = mpsc::channel();
        let store = StaticStore([("us", "EN")].into_iter().collect());
        let mut controller = LifecycleController::new(store, tx);
        controller
            .activate(Some(SharedLayouts(live.clone(), Vec::new())))
            .unwrap();

        // The controller keeps its own sender alive
        let (closed_tx, closed_rx) = mpsc::channel::<SyncEvent>();
        drop(closed_tx);
        event_loop(&mut controller, &closed_rx);
        drop(rx);

        assert!(!controller.is_active());
        assert_eq!(live.borrow()[0].label(), Some("en"));
    }
}
