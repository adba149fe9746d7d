//! The USER general-parameters shape.
//!
//! USER records branch on an embedded array-version number: version 2 and
//! later append the grid-reference fields, version 1 records end after the
//! units flag.

use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::stream::ByteWindow;
use serde::{Deserialize, Serialize};

/// The trailing grid fields present from array version 2 on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGridExtras {
    pub center_lat: f32,
    pub center_lon: f32,
    pub mdr_rows: i32,
    pub mdr_cols: i32,
}

/// USER: installation-wide user parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserParameters {
    pub array_version: i32,
    pub user_name: String,
    pub begin_month: i32,
    pub end_month: i32,
    pub units_flag: i32,
    /// Present only when `array_version >= 2`
    pub grid: Option<UserGridExtras>,
}

pub(super) fn decode_user(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<UserParameters, DecodeError> {
    let array_version = window.read_i32()?;
    let user_name = window.read_string(8)?;
    let begin_month = diag.clamp_i32(window.read_i32()?, 1, 12);
    let end_month = diag.clamp_i32(window.read_i32()?, 1, 12);
    let units_flag = window.read_i32()?;

    let grid = if array_version >= 2 {
        Some(UserGridExtras {
            center_lat: diag.clamp_f32(window.read_f32()?, -90.0, 90.0),
            center_lon: diag.clamp_f32(window.read_f32()?, -180.0, 180.0),
            mdr_rows: window.read_i32()?,
            mdr_cols: window.read_i32()?,
        })
    } else {
        None
    };

    Ok(UserParameters {
        array_version,
        user_name,
        begin_month,
        end_month,
        units_flag,
        grid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{ParametricRecord, decode_record, test_prefix};
    use crate::stream::ByteOrder;
    use fs5_common::{Ident, TypeTag};

    fn user_fixture(version: i32) -> Vec<u8> {
        let mut bytes = test_prefix(0, "MBRFC", "USER");
        bytes.extend_from_slice(&version.to_be_bytes());
        bytes.extend_from_slice(b"MBRFC   ");
        for v in [10i32, 9, 1] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        if version >= 2 {
            bytes.extend_from_slice(&42.0f32.to_be_bytes());
            bytes.extend_from_slice(&(-96.5f32).to_be_bytes());
            bytes.extend_from_slice(&40i32.to_be_bytes());
            bytes.extend_from_slice(&60i32.to_be_bytes());
        }
        bytes
    }

    fn decode(bytes: Vec<u8>) -> UserParameters {
        let mut window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let record = decode_record(
            &mut window,
            &Ident::new("MBRFC").unwrap(),
            &TypeTag::new("USER").unwrap(),
            &mut diag,
        )
        .unwrap()
        .unwrap();
        match record {
            ParametricRecord::UserParameters(user) => user,
            _ => panic!("wrong shape"),
        }
    }

    #[test]
    fn test_version_one_omits_grid_fields() {
        let user = decode(user_fixture(1));
        assert_eq!(user.array_version, 1);
        assert_eq!(user.user_name, "MBRFC");
        assert_eq!(user.begin_month, 10);
        assert!(user.grid.is_none());
    }

    #[test]
    fn test_version_two_includes_grid_fields() {
        let user = decode(user_fixture(2));
        let grid = user.grid.unwrap();
        assert_eq!(grid.center_lat, 42.0);
        assert_eq!(grid.center_lon, -96.5);
        assert_eq!(grid.mdr_rows, 40);
        assert_eq!(grid.mdr_cols, 60);
    }
}
