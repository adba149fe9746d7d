//! The fixed operation-number table.
//!
//! Operation numbers index a closed 54-entry name table. The table order is
//! part of the format: number 1 is SAC-SMA, number 54 is SWB-NILE, and a
//! number outside the table marks a damaged parameter array.
//!
//! A handful of operations store their parameter sub-arrays in layouts the
//! general token scan cannot read; [`PoLayout`] names each scanning rule and
//! [`po_layout`] maps operation numbers onto them.

use serde::{Deserialize, Serialize};

/// Operation type names indexed by operation number minus one.
pub const OPERATION_NAMES: [&str; 54] = [
    "SAC-SMA",  //  1
    "UNIT-HG",  //  2
    "REDO-UHG", //  3
    "CLEAR-TS", //  4
    "SAC-PLOT", //  5
    "MEAN-Q",   //  6
    "LAG/K",    //  7
    "CHANGE-T", //  8
    "MUSKROUT", //  9
    "ADD/SUB",  // 10
    "LAY-COEF", // 11
    "INSQPLOT", // 12
    "TATUM",    // 13
    "ADJUST-Q", // 14
    "WEIGH-TS", // 15
    "STAT-QME", // 16
    "WY-PLOT",  // 17
    "PLOT-TS",  // 18
    "SNOW-17",  // 19
    "CHANGE-Q", // 20
    "DWOPER",   // 21
    "SS-SAC",   // 22
    "STAGE-Q",  // 23
    "API-CONT", // 24
    "PLOT-TUL", // 25
    "SINGRSVR", // 26
    "LIST-FTW", // 27
    "CHANNLOS", // 28
    "API-MKC",  // 29
    "MERGE-TS", // 30
    "SNOW-43",  // 31
    "FFG",      // 32
    "API-CIN",  // 33
    "API-SLC",  // 34
    "API-HAR",  // 35
    "XIN-SMA",  // 36
    "LIST-MSP", // 37
    "BASEFLOW", // 38
    "LOOKUP",   // 39
    "WATERBAL", // 40
    "API-HAR2", // 41
    "RSNWELEV", // 42
    "API-HFD",  // 43
    "SARROUTE", // 44
    "DELTA-TS", // 45
    "NOMSNG",   // 46
    "PEAKFLOW", // 47
    "MULT/DIV", // 48
    "BEGASSIM", // 49
    "ASSIM",    // 50
    "SSARRESV", // 51
    "SUMPOINT", // 52
    "LOOKUP3",  // 53
    "SWB-NILE", // 54
];

const_assert_eq!(OPERATION_NAMES.len(), 54);

/// The type name for an operation number, `None` outside the table.
pub fn operation_name(op_number: i32) -> Option<&'static str> {
    if (1..=OPERATION_NAMES.len() as i32).contains(&op_number) {
        Some(OPERATION_NAMES[(op_number - 1) as usize])
    } else {
        None
    }
}

/// How an operation's parameter sub-array is scanned for identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoLayout {
    /// The general left-to-right token scan over the whole sub-array
    General,
    /// Word 0 is a scalar control word that can alias ASCII; the scan
    /// starts at word 1
    SkipLeadingWord,
    /// Words 0-1 carry a rating-curve id; the scan resumes at word 2
    RatingCurveFirst,
    /// The sub-array embeds no identifiers at all
    NoIdentifiers,
}

/// The scanning rule for an operation number.
pub fn po_layout(op_number: i32) -> PoLayout {
    match op_number {
        // MEAN-Q, LAG/K, CHANGE-T, ADD/SUB
        6 | 7 | 8 | 10 => PoLayout::SkipLeadingWord,
        // STAGE-Q, PLOT-TUL
        23 | 25 => PoLayout::RatingCurveFirst,
        // MERGE-TS, FFG
        30 | 32 => PoLayout::NoIdentifiers,
        _ => PoLayout::General,
    }
}
