//! Label synchronization core
//!
//! - **override_store**: originals captured per session
//! - **synchronizer**: one reconcile pass / restore sweep over live layouts
//! - **lifecycle**: activation, event handling and deactivation
//! - **source**: live layout handles and the collaborator traits

mod lifecycle;
mod override_store;
mod source;
mod synchronizer;

pub use lifecycle::LifecycleController;
pub use source::{DesiredMapping, InputSource, LayoutProvider, MappingStore, SourceKind, Subscription, SyncEvent};
