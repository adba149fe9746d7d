//! Station parameter shapes: general, precipitation, evaporation,
//! temperature.
//!
//! Field values are bounds-checked as they decode; a value outside its
//! known valid range clamps to the missing-value sentinel and the decode
//! continues.

use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::stream::ByteWindow;
use fs5_common::{JulianDay, TypeTag};
use serde::{Deserialize, Serialize};

/// GENL: general station information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationGeneral {
    pub description: String,
    pub latitude: f32,
    pub longitude: f32,
    pub elevation_m: f32,
    /// Parameter groups defined for this station
    pub data_groups: Vec<TypeTag>,
    pub complete: bool,
}

pub(super) fn decode_genl(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<StationGeneral, DecodeError> {
    let description = window.read_string(20)?;
    let latitude = diag.clamp_f32(window.read_f32()?, -90.0, 90.0);
    let longitude = diag.clamp_f32(window.read_f32()?, -180.0, 180.0);
    let elevation_m = diag.clamp_f32(window.read_f32()?, -500.0, 9000.0);

    let n_groups = window.read_i32()?;
    let n_groups = if (0..=20).contains(&n_groups) {
        n_groups as usize
    } else {
        diag.clamped_values += 1;
        0
    };

    let mut data_groups = Vec::with_capacity(n_groups);
    for _ in 0..n_groups {
        let bytes = window.read_raw(4)?;
        if let Some(tag) = TypeTag::from_field(&bytes) {
            data_groups.push(tag);
        }
    }
    let complete = window.read_i32()? != 0;

    Ok(StationGeneral {
        description,
        latitude,
        longitude,
        elevation_m,
        data_groups,
        complete,
    })
}

/// PCPN: precipitation station parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    pub processing_flag: i32,
    pub weight: f32,
    pub network_indicator: i32,
    pub n_timers: i32,
    /// Manually-digitized-radar grid box covering the station
    pub mdr_box: i32,
    pub monthly_characteristics: [f32; 12],
}

pub(super) fn decode_pcpn(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<Precipitation, DecodeError> {
    let processing_flag = window.read_i32()?;
    let weight = diag.clamp_f32(window.read_f32()?, 0.0, 1.0);
    let network_indicator = window.read_i32()?;
    let n_timers = window.read_i32()?;
    let mdr_box = window.read_i32()?;

    let mut monthly_characteristics = [0.0f32; 12];
    for slot in &mut monthly_characteristics {
        *slot = diag.clamp_f32(window.read_f32()?, 0.0, 1000.0);
    }

    Ok(Precipitation {
        processing_flag,
        weight,
        network_indicator,
        n_timers,
        mdr_box,
        monthly_characteristics,
    })
}

/// PE: potential-evaporation station parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaporation {
    pub anemometer_height_m: f32,
    pub p_factor: f32,
    pub correction_flag: i32,
    pub last_used_day: JulianDay,
    pub monthly_coefficients: [f32; 12],
    pub coefficient_sum: f32,
}

pub(super) fn decode_pe(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<Evaporation, DecodeError> {
    let anemometer_height_m = diag.clamp_f32(window.read_f32()?, 0.0, 100.0);
    let p_factor = diag.clamp_f32(window.read_f32()?, 0.0, 10.0);
    let correction_flag = window.read_i32()?;
    let last_used_day = JulianDay(window.read_i32()?);

    let mut monthly_coefficients = [0.0f32; 12];
    for slot in &mut monthly_coefficients {
        *slot = diag.clamp_f32(window.read_f32()?, -10.0, 10.0);
    }
    let coefficient_sum = window.read_f32()?;

    Ok(Evaporation {
        anemometer_height_m,
        p_factor,
        correction_flag,
        last_used_day,
        monthly_coefficients,
        coefficient_sum,
    })
}

/// TEMP: temperature station parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub max_correction: f32,
    pub min_correction: f32,
    pub elevation_weight: f32,
    pub network_indicator: i32,
    pub ridge_elevations_m: [f32; 3],
    pub forecast_maxmin_flag: i32,
}

pub(super) fn decode_temp(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<Temperature, DecodeError> {
    let max_correction = diag.clamp_f32(window.read_f32()?, -50.0, 50.0);
    let min_correction = diag.clamp_f32(window.read_f32()?, -50.0, 50.0);
    let elevation_weight = diag.clamp_f32(window.read_f32()?, 0.0, 1.0);
    let network_indicator = window.read_i32()?;

    let mut ridge_elevations_m = [0.0f32; 3];
    for slot in &mut ridge_elevations_m {
        *slot = diag.clamp_f32(window.read_f32()?, -500.0, 9000.0);
    }
    let forecast_maxmin_flag = window.read_i32()?;

    Ok(Temperature {
        max_correction,
        min_correction,
        elevation_weight,
        network_indicator,
        ridge_elevations_m,
        forecast_maxmin_flag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MISSING_F32;
    use crate::param::{ParametricRecord, decode_record, test_prefix};
    use crate::stream::ByteOrder;
    use fs5_common::Ident;

    fn decode(bytes: Vec<u8>, id: &str, tag: &str) -> (Option<ParametricRecord>, Diagnostics) {
        let mut window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let record = decode_record(
            &mut window,
            &Ident::new(id).unwrap(),
            &TypeTag::new(tag).unwrap(),
            &mut diag,
        )
        .unwrap();
        (record, diag)
    }

    #[test]
    fn test_genl_decode() {
        let mut bytes = test_prefix(0, "DEADWOOD", "GENL");
        bytes.extend_from_slice(b"DEADWOOD RESERVOIR  ");
        for v in [44.25f32, -115.5, 1650.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(b"PCPN");
        bytes.extend_from_slice(b"TEMP");
        bytes.extend_from_slice(&1i32.to_be_bytes());

        let (record, diag) = decode(bytes, "DEADWOOD", "GENL");
        let ParametricRecord::StationGeneral(genl) = record.unwrap() else {
            panic!("wrong shape");
        };
        assert_eq!(genl.description, "DEADWOOD RESERVOIR");
        assert_eq!(genl.latitude, 44.25);
        assert_eq!(genl.longitude, -115.5);
        assert_eq!(genl.data_groups.len(), 2);
        assert!(genl.complete);
        assert!(diag.is_clean());
    }

    #[test]
    fn test_genl_out_of_range_latitude_clamps() {
        let mut bytes = test_prefix(0, "BAD", "GENL");
        bytes.extend_from_slice(&[b' '; 20]);
        for v in [400.0f32, -115.5, 1650.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());

        let (record, diag) = decode(bytes, "BAD", "GENL");
        let ParametricRecord::StationGeneral(genl) = record.unwrap() else {
            panic!("wrong shape");
        };
        assert_eq!(genl.latitude, MISSING_F32);
        assert_eq!(genl.longitude, -115.5);
        assert_eq!(diag.clamped_values, 1);
    }

    #[test]
    fn test_pcpn_decode() {
        let mut bytes = test_prefix(0, "BILLINGS", "PCPN");
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(&0.75f32.to_be_bytes());
        for v in [2i32, 0, 117] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        for month in 0..12 {
            bytes.extend_from_slice(&(month as f32 * 0.5).to_be_bytes());
        }

        let (record, diag) = decode(bytes, "BILLINGS", "PCPN");
        let ParametricRecord::Precipitation(pcpn) = record.unwrap() else {
            panic!("wrong shape");
        };
        assert_eq!(pcpn.weight, 0.75);
        assert_eq!(pcpn.mdr_box, 117);
        assert_eq!(pcpn.monthly_characteristics[3], 1.5);
        assert!(diag.is_clean());
    }

    #[test]
    fn test_temp_decode() {
        let mut bytes = test_prefix(0, "CODY", "TEMP");
        for v in [1.5f32, -0.5, 0.8] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&3i32.to_be_bytes());
        for v in [2100.0f32, 2400.0, 1900.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&1i32.to_be_bytes());

        let (record, _) = decode(bytes, "CODY", "TEMP");
        let ParametricRecord::Temperature(temp) = record.unwrap() else {
            panic!("wrong shape");
        };
        assert_eq!(temp.max_correction, 1.5);
        assert_eq!(temp.ridge_elevations_m[1], 2400.0);
        assert_eq!(temp.forecast_maxmin_flag, 1);
    }

    #[test]
    fn test_pe_decode() {
        let mut bytes = test_prefix(0, "LANDER", "PE");
        bytes.extend_from_slice(&2.0f32.to_be_bytes());
        bytes.extend_from_slice(&1.2f32.to_be_bytes());
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(&36500i32.to_be_bytes());
        for _ in 0..12 {
            bytes.extend_from_slice(&0.9f32.to_be_bytes());
        }
        bytes.extend_from_slice(&10.8f32.to_be_bytes());

        let (record, _) = decode(bytes, "LANDER", "PE");
        let ParametricRecord::Evaporation(pe) = record.unwrap() else {
            panic!("wrong shape");
        };
        assert_eq!(pe.anemometer_height_m, 2.0);
        assert_eq!(pe.last_used_day, JulianDay(36500));
        assert_eq!(pe.coefficient_sum, 10.8);
    }
}
