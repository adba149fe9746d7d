//! The static table of logical file roles.
//!
//! An FS5Files directory is a fixed set of files, each with a declared
//! record length that never changes at runtime. A role resolves to its
//! physical filename and record length through this table; nothing else in
//! the crate hard-codes either.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One logical file role in an FS5Files directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileRole {
    /// Rating-curve pointer index
    RatingCurvePointers,
    /// Rating-curve definitions
    RatingCurves,
    /// Segment pointer index
    SegmentPointers,
    /// Per-segment status records
    SegmentStatus,
    /// Per-segment parameter arrays
    SegmentParameters,
    /// Forecast-group id list
    ForecastGroupList,
    /// Per-forecast-group status records
    ForecastGroupStatus,
    /// Carryover slots
    Carryover,
    /// Processed time-series index
    ProcessedIndex,
    /// Processed per-data-type parameter records
    ProcessedParameters,
    /// Processed time-series data, logical units 1-5
    ProcessedTs1,
    ProcessedTs2,
    ProcessedTs3,
    ProcessedTs4,
    ProcessedTs5,
    /// Preprocessor parametric index
    PreprocessorParametricIndex,
    /// Preprocessor parametric records, logical units 1-5
    PreprocessorParametric1,
    PreprocessorParametric2,
    PreprocessorParametric3,
    PreprocessorParametric4,
    PreprocessorParametric5,
    /// Preprocessor station index
    PreprocessorIndex,
    /// Preprocessor river/reservoir/stream observations
    PreprocessorRrs,
    /// Preprocessor daily observations, logical units 1-5
    PreprocessorDaily1,
    PreprocessorDaily2,
    PreprocessorDaily3,
    PreprocessorDaily4,
    PreprocessorDaily5,
    /// User parameter record
    UserParameters,
}

/// Every role, in table order.
pub const ALL_ROLES: [FileRole; 29] = [
    FileRole::RatingCurvePointers,
    FileRole::RatingCurves,
    FileRole::SegmentPointers,
    FileRole::SegmentStatus,
    FileRole::SegmentParameters,
    FileRole::ForecastGroupList,
    FileRole::ForecastGroupStatus,
    FileRole::Carryover,
    FileRole::ProcessedIndex,
    FileRole::ProcessedParameters,
    FileRole::ProcessedTs1,
    FileRole::ProcessedTs2,
    FileRole::ProcessedTs3,
    FileRole::ProcessedTs4,
    FileRole::ProcessedTs5,
    FileRole::PreprocessorParametricIndex,
    FileRole::PreprocessorParametric1,
    FileRole::PreprocessorParametric2,
    FileRole::PreprocessorParametric3,
    FileRole::PreprocessorParametric4,
    FileRole::PreprocessorParametric5,
    FileRole::PreprocessorIndex,
    FileRole::PreprocessorRrs,
    FileRole::PreprocessorDaily1,
    FileRole::PreprocessorDaily2,
    FileRole::PreprocessorDaily3,
    FileRole::PreprocessorDaily4,
    FileRole::PreprocessorDaily5,
    FileRole::UserParameters,
];

const_assert_eq!(ALL_ROLES.len(), 29);

impl FileRole {
    /// The physical filename for this role inside the database directory.
    pub fn filename(self) -> &'static str {
        match self {
            FileRole::RatingCurvePointers => "FCRCPTR",
            FileRole::RatingCurves => "FCRATING",
            FileRole::SegmentPointers => "FCSEGPTR",
            FileRole::SegmentStatus => "FCSEGSTS",
            FileRole::SegmentParameters => "FCPARAM",
            FileRole::ForecastGroupList => "FCFGLIST",
            FileRole::ForecastGroupStatus => "FCFGSTAT",
            FileRole::Carryover => "FCCARRY",
            FileRole::ProcessedIndex => "PRDINDEX",
            FileRole::ProcessedParameters => "PRDPARM",
            FileRole::ProcessedTs1 => "PRDTS1",
            FileRole::ProcessedTs2 => "PRDTS2",
            FileRole::ProcessedTs3 => "PRDTS3",
            FileRole::ProcessedTs4 => "PRDTS4",
            FileRole::ProcessedTs5 => "PRDTS5",
            FileRole::PreprocessorParametricIndex => "PPPINDEX",
            FileRole::PreprocessorParametric1 => "PPPPARM1",
            FileRole::PreprocessorParametric2 => "PPPPARM2",
            FileRole::PreprocessorParametric3 => "PPPPARM3",
            FileRole::PreprocessorParametric4 => "PPPPARM4",
            FileRole::PreprocessorParametric5 => "PPPPARM5",
            FileRole::PreprocessorIndex => "PDBINDEX",
            FileRole::PreprocessorRrs => "PDBRRS",
            FileRole::PreprocessorDaily1 => "PDBDLY1",
            FileRole::PreprocessorDaily2 => "PDBDLY2",
            FileRole::PreprocessorDaily3 => "PDBDLY3",
            FileRole::PreprocessorDaily4 => "PDBDLY4",
            FileRole::PreprocessorDaily5 => "PDBDLY5",
            FileRole::UserParameters => "USERPARM",
        }
    }

    /// The fixed record byte length declared for this role.
    pub fn record_len(self) -> u32 {
        match self {
            FileRole::RatingCurvePointers => 12,
            FileRole::RatingCurves => 1200,
            FileRole::SegmentPointers => 12,
            FileRole::SegmentStatus => 260,
            FileRole::SegmentParameters => 400,
            FileRole::ForecastGroupList => 8,
            FileRole::ForecastGroupStatus => 80,
            FileRole::Carryover => 400,
            FileRole::ProcessedIndex => 16,
            FileRole::ProcessedParameters => 72,
            FileRole::ProcessedTs1
            | FileRole::ProcessedTs2
            | FileRole::ProcessedTs3
            | FileRole::ProcessedTs4
            | FileRole::ProcessedTs5 => 64,
            FileRole::PreprocessorParametricIndex => 16,
            FileRole::PreprocessorParametric1
            | FileRole::PreprocessorParametric2
            | FileRole::PreprocessorParametric3
            | FileRole::PreprocessorParametric4
            | FileRole::PreprocessorParametric5 => 64,
            FileRole::PreprocessorIndex => 64,
            FileRole::PreprocessorRrs => 64,
            FileRole::PreprocessorDaily1
            | FileRole::PreprocessorDaily2
            | FileRole::PreprocessorDaily3
            | FileRole::PreprocessorDaily4
            | FileRole::PreprocessorDaily5 => 64,
            FileRole::UserParameters => 240,
        }
    }

    /// The processed time-series file for a logical unit number 1-5.
    pub fn processed_ts(unit: i32) -> Option<FileRole> {
        match unit {
            1 => Some(FileRole::ProcessedTs1),
            2 => Some(FileRole::ProcessedTs2),
            3 => Some(FileRole::ProcessedTs3),
            4 => Some(FileRole::ProcessedTs4),
            5 => Some(FileRole::ProcessedTs5),
            _ => None,
        }
    }

    /// The preprocessor parametric file for a logical unit number 1-5.
    pub fn preprocessor_parametric(unit: i32) -> Option<FileRole> {
        match unit {
            1 => Some(FileRole::PreprocessorParametric1),
            2 => Some(FileRole::PreprocessorParametric2),
            3 => Some(FileRole::PreprocessorParametric3),
            4 => Some(FileRole::PreprocessorParametric4),
            5 => Some(FileRole::PreprocessorParametric5),
            _ => None,
        }
    }

    /// The preprocessor daily-observation file for a logical unit number 1-5.
    pub fn preprocessor_daily(unit: i32) -> Option<FileRole> {
        match unit {
            1 => Some(FileRole::PreprocessorDaily1),
            2 => Some(FileRole::PreprocessorDaily2),
            3 => Some(FileRole::PreprocessorDaily3),
            4 => Some(FileRole::PreprocessorDaily4),
            5 => Some(FileRole::PreprocessorDaily5),
            _ => None,
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filename())
    }
}
