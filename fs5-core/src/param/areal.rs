//! Areal parameter shapes: basin boundaries and the mean areal
//! precipitation/temperature definitions built on top of them.

use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::stream::ByteWindow;
use fs5_common::Ident;
use serde::{Deserialize, Serialize};

/// Widest point/station count a sane record declares.
const MAX_AREAL_COUNT: i32 = 2000;

/// A station contributing to an areal average, with its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationWeight {
    pub station_id: Ident,
    pub weight: f32,
}

/// BASN: a basin boundary definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basin {
    pub description: String,
    pub centroid_lat: f32,
    pub centroid_lon: f32,
    pub area_km2: f32,
    pub computed_area_km2: f32,
    pub used_for_map: bool,
    pub used_for_mat: bool,
    /// Boundary vertices as (lat, lon) pairs
    pub boundary: Vec<(f32, f32)>,
}

fn checked_count(value: i32, what: &'static str) -> Result<usize, DecodeError> {
    if (0..=MAX_AREAL_COUNT).contains(&value) {
        Ok(value as usize)
    } else {
        Err(DecodeError::Truncated { what })
    }
}

pub(super) fn decode_basn(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<Basin, DecodeError> {
    let description = window.read_string(20)?;
    let centroid_lat = diag.clamp_f32(window.read_f32()?, -90.0, 90.0);
    let centroid_lon = diag.clamp_f32(window.read_f32()?, -180.0, 180.0);
    let area_km2 = diag.clamp_f32(window.read_f32()?, 0.0, 5.0e6);
    let computed_area_km2 = diag.clamp_f32(window.read_f32()?, 0.0, 5.0e6);
    let used_for_map = window.read_i32()? != 0;
    let used_for_mat = window.read_i32()? != 0;

    let n_points = checked_count(window.read_i32()?, "basin boundary")?;
    if window.remaining() < n_points * 8 {
        return Err(DecodeError::Truncated {
            what: "basin boundary",
        });
    }

    let mut boundary = Vec::with_capacity(n_points);
    for _ in 0..n_points {
        let lat = diag.clamp_f32(window.read_f32()?, -90.0, 90.0);
        let lon = diag.clamp_f32(window.read_f32()?, -180.0, 180.0);
        boundary.push((lat, lon));
    }

    Ok(Basin {
        description,
        centroid_lat,
        centroid_lon,
        area_km2,
        computed_area_km2,
        used_for_map,
        used_for_mat,
        boundary,
    })
}

fn decode_station_weights(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
    what: &'static str,
) -> Result<Vec<StationWeight>, DecodeError> {
    let n_stations = checked_count(window.read_i32()?, what)?;
    if window.remaining() < n_stations * 12 {
        return Err(DecodeError::Truncated { what });
    }

    let mut weights = Vec::with_capacity(n_stations);
    for _ in 0..n_stations {
        let id_bytes = window.read_raw(8)?;
        let weight = diag.clamp_f32(window.read_f32()?, 0.0, 1.0);
        let Some(station_id) = Ident::from_field(&id_bytes) else {
            diag.malformed_index_entries += 1;
            continue;
        };
        weights.push(StationWeight { station_id, weight });
    }
    Ok(weights)
}

/// MAP: a mean areal precipitation definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArealPrecip {
    pub description: String,
    pub basin_id: Option<Ident>,
    pub time_dist_source: i32,
    /// Hourly time-distribution weights
    pub time_dist_weights: [f32; 24],
    pub station_weights: Vec<StationWeight>,
}

pub(super) fn decode_map(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<ArealPrecip, DecodeError> {
    let description = window.read_string(20)?;
    let basin_bytes = window.read_raw(8)?;
    let basin_id = Ident::from_field(&basin_bytes);
    let time_dist_source = window.read_i32()?;

    let mut time_dist_weights = [0.0f32; 24];
    for slot in &mut time_dist_weights {
        *slot = diag.clamp_f32(window.read_f32()?, 0.0, 1.0);
    }
    let station_weights = decode_station_weights(window, diag, "MAP station weights")?;

    Ok(ArealPrecip {
        description,
        basin_id,
        time_dist_source,
        time_dist_weights,
        station_weights,
    })
}

/// MAT: a mean areal temperature definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArealTemp {
    pub basin_id: Option<Ident>,
    pub centroid_x: f32,
    pub centroid_y: f32,
    pub station_weights: Vec<StationWeight>,
}

pub(super) fn decode_mat(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<ArealTemp, DecodeError> {
    let basin_bytes = window.read_raw(8)?;
    let basin_id = Ident::from_field(&basin_bytes);
    let centroid_x = window.read_f32()?;
    let centroid_y = window.read_f32()?;
    let station_weights = decode_station_weights(window, diag, "MAT station weights")?;

    Ok(ArealTemp {
        basin_id,
        centroid_x,
        centroid_y,
        station_weights,
    })
}
