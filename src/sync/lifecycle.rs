//! Session lifecycle: activation, event handling and full restoration

use anyhow::{Result, bail};
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use super::override_store::OverrideStore;
use super::source::{LayoutProvider, MappingStore, Subscription, SyncEvent};
use super::synchronizer::LabelSynchronizer;

/// Everything that exists only while Active
struct Session<P> {
    provider: P,
    synchronizer: LabelSynchronizer,
    subscriptions: Vec<Subscription>,
}

/// Drives a LabelSynchronizer from the mapping store, the layout provider
/// and activation/deactivation.
///
/// Inactive until `activate` succeeds; every activation starts a fresh
/// session with an empty OverrideStore. Dropping the controller deactivates it.
pub struct LifecycleController<S: MappingStore, P: LayoutProvider> {
    store: S,
    events: Sender<SyncEvent>,
    session: Option<Session<P>>,
}

impl<S: MappingStore, P: LayoutProvider> LifecycleController<S, P> {
    /// `events` is handed to both collaborators when a session subscribes
    pub fn new(store: S, events: Sender<SyncEvent>) -> Self {
        Self {
            store,
            events,
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Originals captured in the current session, None while Inactive
    pub fn originals(&self) -> Option<&OverrideStore> {
        self.session.as_ref().map(|session| session.synchronizer.originals())
    }

    /// Start a session against `provider`
    ///
    /// A missing provider is reported as an error and leaves the controller
    /// Inactive. Calling this while Active does nothing.
    pub fn activate(&mut self, provider: Option<P>) -> Result<()> {
        if self.is_active() {
            debug!("Already active, ignoring activation");
            return Ok(());
        }

        let Some(mut provider) = provider else {
            bail!("Live layout provider is not available");
        };

        // Guards acquired so far are released on every early return
        let mut subscriptions = Vec::with_capacity(2);
        subscriptions.push(self.store.subscribe(self.events.clone())?);
        subscriptions.push(provider.subscribe(self.events.clone())?);

        self.session = Some(Session {
            provider,
            synchronizer: LabelSynchronizer::new(),
            subscriptions,
        });
        info!("Layout label session activated");

        self.reconcile();
        Ok(())
    }

    /// Process one event; called strictly in arrival order
    pub fn handle(&mut self, event: SyncEvent) {
        if !self.is_active() {
            debug!(event = ?event, "Inactive, ignoring event");
            return;
        }

        match event {
            SyncEvent::MappingChanged => {
                debug!("Desired labels changed");
                self.reconcile();
            }
            SyncEvent::LayoutSetChanged => {
                debug!("Input sources changed");
                if let Some(session) = self.session.as_mut() {
                    // Handles that were not rebuilt may still carry overrides;
                    // keep the old originals rather than capture those.
                    if let Err(e) = session.provider.reload() {
                        warn!(error = ?e, "Failed to reload input sources, keeping current labels");
                        return;
                    }
                    session.synchronizer.reset();
                }
                self.reconcile();
            }
            SyncEvent::Shutdown => self.deactivate(),
        }
    }

    /// End the session, restoring every live label captured in it
    ///
    /// Layouts that disappeared are skipped. Safe to call while Inactive.
    pub fn deactivate(&mut self) {
        let Some(mut session) = self.session.take() else {
            debug!("Already inactive, ignoring deactivation");
            return;
        };

        match session.provider.layouts_mut() {
            Some(layouts) => {
                let restored = session.synchronizer.restore_all(layouts);
                info!(restored, "Restored original layout labels");
            }
            None => warn!("No live input sources to restore"),
        }
        if let Err(e) = session.provider.flush() {
            warn!(error = ?e, "Failed to publish restored labels");
        }

        for subscription in session.subscriptions.drain(..) {
            subscription.cancel();
        }
        info!("Layout label session deactivated");
    }

    fn reconcile(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let desired = match self.store.read() {
            Ok(desired) => desired,
            Err(e) => {
                warn!(error = ?e, "Failed to read desired labels, skipping pass");
                return;
            }
        };

        if desired.is_empty() {
            debug!("No custom labels configured");
        }

        let Some(layouts) = session.provider.layouts_mut() else {
            debug!("No live input sources yet");
            return;
        };

        let summary = session.synchronizer.reconcile(&desired, layouts);
        info!(
            desired = desired.len(),
            applied = summary.applied,
            restored = summary.restored,
            skipped = summary.skipped,
            "Synchronized layout labels"
        );

        if let Err(e) = session.provider.flush() {
            warn!(error = ?e, "Failed to publish layout labels");
        }
    }
}

impl<S: MappingStore, P: LayoutProvider> Drop for LifecycleController<S, P> {
    fn drop(&mut self) {
        self.deactivate();
    }
}
