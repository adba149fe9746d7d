//! Builders for the five on-disk index formats.
//!
//! Each builder reads its dedicated file start-to-end once and produces an
//! in-memory ordered lookup table. End-of-file while enumerating entries
//! means "enumeration complete" — a file truncated mid-record terminates
//! the builder cleanly with every prior entry retained. Builders run at
//! most once per session; the session memoizes the result.

mod error;
mod parametric;
mod processed;
mod rating;
mod segment_ptr;
mod station;

pub use error::{IndexError, Result};
pub use parametric::{
    ParametricIndex, ParametricIndexEntry, ParametricIndexHeader, ParametricTypeDir,
};
pub use processed::{ProcessedTsIndex, ProcessedTsPointer};
pub use rating::{RatingCurveIndex, RatingPointerHeader};
pub use segment_ptr::{SegmentPointerHeader, SegmentPointerIndex};
pub use station::{DataclassDir, PreprocessorStationIndex, StationIndexEntry, StationIndexHeader};
