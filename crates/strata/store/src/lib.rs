#![deny(unsafe_code)]
//! # strata-store
//!
//! Layered graph state for a client that edits locally and syncs with a
//! remote. `main` holds what the remote confirmed; named overlays stacked
//! on top hold local edits until they are pushed.
//!
//! ## Key types
//!
//! - [`State`], [`GraphState`]: every named graph with its errors, vars and
//!   pending uploads
//! - [`Stack`]: ordered graph names, `main` first; reads fold top-down
//! - [`Action`], [`reduce`]: the closed set of state changes
//! - [`Store`], [`InMemoryStore`]: the dispatcher, with an injectable
//!   [`ErrorHandler`] for rejected actions
//! - [`GraphHandle`]: reads and writes bound to one stack
//! - [`RemoteApi`]: the server, used by [`push`] and [`pull`]
//! - [`AtomStore`]: durable key/value atoms

pub mod action;
pub mod config;
pub mod error;
pub mod handle;
pub mod persistence;
pub mod reconcile;
pub mod reducer;
pub mod remote;
pub mod select;
pub mod stack;
pub mod state;
pub mod store;

pub use action::Action;
pub use config::{PersistenceConfig, StoreConfig, SyncConfig};
pub use error::{RemoteError, Result, StoreError};
pub use handle::GraphHandle;
pub use persistence::{AtomStore, Atoms, InMemoryAtomStore};
pub use reconcile::{
    create_success_and_error_graphs, pull, pull_update, push, upload_files, PushReport, PushSplit,
    UploadOutcome,
};
pub use reducer::reduce;
pub use remote::{RemoteApi, UploadRequest, UploadTicket};
pub use select::{
    fold_stack, select_edge_from_stack, select_files_from_stack, select_metadata_from_stack,
    select_node_from_stack, select_path_from_stack, select_reverse_edge_from_stack,
    select_rights_from_stack, select_var_from_stack, StackReader,
};
pub use stack::Stack;
pub use state::{GraphState, State, UploadState, UploadStatus, MAIN};
pub use store::{log_error_handler, ErrorHandler, InMemoryStore, Store, ViewSelector};
