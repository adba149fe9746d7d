//! Read-access layer over NWSRFS "FS5Files" binary forecasting databases.
//!
//! An FS5Files directory holds fixed-record binary files written directly
//! from the Fortran runtime's COMMON blocks: nothing in them is
//! self-describing. This crate decodes them into typed entities — segments,
//! operations, time series, stations, rating curves, carryover state —
//! without running the original system.
//!
//! The crate is organized as independent services composed by one session
//! object:
//! - Byte-order-aware record reads: [`stream`] module
//! - Logical-file roles and lazy opening: [`registry`] module
//! - Byte-order detection: [`endian`] module
//! - The five on-disk index formats: [`index`] module
//! - Type-tag-dispatched parametric records: [`param`] module
//! - Segment parameter-array decoding: [`segment`] module
//! - Carryover state decoding: [`carryover`] module
//! - Observed/future time-series assembly: [`timeseries`] module
//!
//! # Examples
//!
//! ```no_run
//! use fs5_core::session::{Fs5Options, Fs5Session};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let mut session = Fs5Session::open(Fs5Options::new("/data/fs5files"))?;
//! for id in session.segment_ids()? {
//!     if let Some(segment) = session.segment(&id)? {
//!         println!("{}: {} operations", segment.id, segment.operations.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Sessions are single-threaded by contract: all state lives behind
//! `&mut self`, there is no internal locking, and a session must not be
//! shared across threads without external synchronization.

#[macro_use]
extern crate static_assertions;

// Crate-wide error type
pub mod error;

// Internal collection type aliases (not re-exported)
mod collections;

// Byte-order-aware record and window decoding
pub mod stream;

// Logical file roles and the lazy-open registry
pub mod registry;

// Byte-order detection
pub mod endian;

// The five on-disk index formats
pub mod index;

// Parametric record decoding
pub mod param;

// Segment and operation decoding
pub mod segment;

// Carryover state decoding
pub mod carryover;

// Time-series assembly
pub mod timeseries;

// Time-series identity and data-type-unit memo tables
pub mod cache;

// Per-session anomaly counters
pub mod diagnostics;

// The composition root
pub mod session;

pub use error::{Fs5Error, Result};
pub use session::{Fs5Options, Fs5Session};
pub use stream::ByteOrder;
