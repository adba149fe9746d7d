//! The NTWK network-summary shape.

use crate::error::DecodeError;
use crate::stream::ByteWindow;
use fs5_common::JulianDay;
use serde::{Deserialize, Serialize};

/// Networks the preprocessor keeps station counts for.
const NETWORK_SLOTS: usize = 25;

/// NTWK: per-network station counts and the last network run date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub last_run_day: JulianDay,
    pub last_run_hour: i32,
    pub station_counts: [i32; NETWORK_SLOTS],
}

pub(super) fn decode_ntwk(window: &mut ByteWindow) -> Result<Network, DecodeError> {
    let last_run_day = JulianDay(window.read_i32()?);
    let last_run_hour = window.read_i32()?;

    let mut station_counts = [0i32; NETWORK_SLOTS];
    for slot in &mut station_counts {
        *slot = window.read_i32()?;
    }

    Ok(Network {
        last_run_day,
        last_run_hour,
        station_counts,
    })
}
