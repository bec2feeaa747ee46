#![forbid(unsafe_code)]

//! Reflow public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use reflow_reorder as reorder;
    pub use reflow_store as store;
    pub use reflow_sync as sync;

    pub use reflow_reorder::{
        ContainerConfig, ContainerKey, Controller, DropEvent, Layout, Mode, Notice, Outcome,
        RecordId, UiDelegate,
    };
    pub use reflow_store::{Computed, Path, Store, Subscription};
    #[cfg(feature = "http")]
    pub use reflow_sync::HttpSyncClient;
    pub use reflow_sync::{Ack, SyncClient, SyncError, Update};
}
