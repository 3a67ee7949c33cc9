//! Muster - source watching, fleet fan-out and source packaging
//!
//! The library has two halves:
//!
//! - **Reconciliation events**: a [`SourceWatcher`] turns file changes under a
//!   directory into coalesced [`Event`]s, and an [`EventMultiplexer`] expands
//!   each of them into one event per service of a [`ManagedSet`].
//! - **Source packaging**: [`Archiver`] writes a filtered tar stream of a
//!   source tree, [`unarchive`] restores it, and [`SourcePackager`] optionally
//!   runs the [`Vendor`] step first.

pub mod archive;
pub mod config;
pub mod error;
pub mod event;
pub mod mux;
pub mod package;
pub mod utils;
pub mod vendor;
pub mod watcher;

pub use archive::{archive, unarchive, ArchiveSummary, Archiver, InclusionRules};
pub use config::Config;
pub use error::{MusterError, Result};
pub use event::{Event, EventKind, EventStream, Notifier, ServiceRef};
pub use mux::{EventMultiplexer, ManagedSet};
pub use package::{Package, SourcePackager};
pub use vendor::{Vendor, VendorConfig};
pub use watcher::SourceWatcher;
