//! Type-tag-dispatched decoding of parametric records.
//!
//! Every parametric record opens with the same prefix — a word count, the
//! 8-character identifier, and the 4-character type tag — and the tag alone
//! decides the shape of everything after it. Dispatch is a closed enum:
//! each decodable tag has a decode function, and the tags the format
//! defines but this layer cannot decode yet are an explicit
//! [`ParametricRecord::NotImplemented`] variant, never a silent fallthrough.
//!
//! The identifier and tag read back from the record must equal the pair
//! used to locate it; a mismatch means the index pointed at a stale or
//! foreign record and the decode answers "not found" rather than failing.

mod areal;
mod network;
mod rrs;
mod station;
mod user;

pub use areal::{ArealPrecip, ArealTemp, Basin, StationWeight};
pub use network::Network;
pub use rrs::{RrsAlphaOrder, RrsDataTypeEntry, RrsMissingEntry, RrsStation, rrs_sub_record_bytes};
pub use station::{Evaporation, Precipitation, StationGeneral, Temperature};
pub use user::{UserGridExtras, UserParameters};

use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::stream::ByteWindow;
use fs5_common::{Ident, TypeTag};
use serde::{Deserialize, Serialize};

/// The parameter types the format defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// Station general information
    Genl,
    /// Precipitation station
    Pcpn,
    /// Potential-evaporation station
    Pe,
    /// River/reservoir/stream station
    Rrs,
    /// Temperature station
    Temp,
    /// Basin boundary
    Basn,
    /// Areal mean precipitation
    Map,
    /// Areal mean temperature
    Mat,
    /// Station network
    Ntwk,
    /// Alphabetic RRS order index
    Orrs,
    /// User parameters
    User,
    /// Defined by the format but not decodable by this layer
    Mape,
    Maps,
    Mapx,
    Stbn,
    Urrs,
}

impl ParamType {
    /// Maps a type tag to its parameter type; `None` for tags the format
    /// does not define at all.
    pub fn from_tag(tag: &TypeTag) -> Option<Self> {
        match tag.as_str() {
            "GENL" => Some(ParamType::Genl),
            "PCPN" => Some(ParamType::Pcpn),
            "PE" => Some(ParamType::Pe),
            "RRS" => Some(ParamType::Rrs),
            "TEMP" => Some(ParamType::Temp),
            "BASN" => Some(ParamType::Basn),
            "MAP" => Some(ParamType::Map),
            "MAT" => Some(ParamType::Mat),
            "NTWK" => Some(ParamType::Ntwk),
            "ORRS" => Some(ParamType::Orrs),
            "USER" => Some(ParamType::User),
            "MAPE" => Some(ParamType::Mape),
            "MAPS" => Some(ParamType::Maps),
            "MAPX" => Some(ParamType::Mapx),
            "STBN" => Some(ParamType::Stbn),
            "URRS" => Some(ParamType::Urrs),
            _ => None,
        }
    }

    pub fn tag_str(self) -> &'static str {
        match self {
            ParamType::Genl => "GENL",
            ParamType::Pcpn => "PCPN",
            ParamType::Pe => "PE",
            ParamType::Rrs => "RRS",
            ParamType::Temp => "TEMP",
            ParamType::Basn => "BASN",
            ParamType::Map => "MAP",
            ParamType::Mat => "MAT",
            ParamType::Ntwk => "NTWK",
            ParamType::Orrs => "ORRS",
            ParamType::User => "USER",
            ParamType::Mape => "MAPE",
            ParamType::Maps => "MAPS",
            ParamType::Mapx => "MAPX",
            ParamType::Stbn => "STBN",
            ParamType::Urrs => "URRS",
        }
    }

    /// True when this layer can decode the type's field layout.
    pub fn decodable(self) -> bool {
        !matches!(
            self,
            ParamType::Mape | ParamType::Maps | ParamType::Mapx | ParamType::Stbn | ParamType::Urrs
        )
    }
}

/// A decoded parametric record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParametricRecord {
    StationGeneral(StationGeneral),
    Precipitation(Precipitation),
    Evaporation(Evaporation),
    RrsStation(RrsStation),
    Temperature(Temperature),
    Basin(Basin),
    ArealPrecip(ArealPrecip),
    ArealTemp(ArealTemp),
    Network(Network),
    RrsAlphaOrder(RrsAlphaOrder),
    UserParameters(UserParameters),
    /// The tag is defined by the format but its layout is not decodable
    /// by this layer
    NotImplemented { type_tag: TypeTag },
}

/// Identity common to every parametric record: the prefix fields plus
/// where the record was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametricEntity {
    pub id: Ident,
    pub type_tag: TypeTag,
    pub logical_unit: i32,
    pub record_number: u32,
    pub record: ParametricRecord,
}

/// Decodes one parametric record out of its byte window.
///
/// The window must start at the record's leading word-count word. Returns
/// `Ok(None)` when the embedded identifier or type tag differs from the
/// requested pair — "not found", by contract — and for tags the format
/// does not define.
pub fn decode_record(
    window: &mut ByteWindow,
    id: &Ident,
    type_tag: &TypeTag,
    diag: &mut Diagnostics,
) -> Result<Option<ParametricRecord>, DecodeError> {
    let _nwords = window.read_i32()?;
    let embedded_id = window.read_raw(8)?;
    let embedded_tag = window.read_raw(4)?;

    let matches = Ident::from_field(&embedded_id).as_ref() == Some(id)
        && TypeTag::from_field(&embedded_tag).as_ref() == Some(type_tag);
    if !matches {
        return Ok(None);
    }

    let Some(param_type) = ParamType::from_tag(type_tag) else {
        return Ok(None);
    };

    let record = match param_type {
        ParamType::Genl => ParametricRecord::StationGeneral(station::decode_genl(window, diag)?),
        ParamType::Pcpn => ParametricRecord::Precipitation(station::decode_pcpn(window, diag)?),
        ParamType::Pe => ParametricRecord::Evaporation(station::decode_pe(window, diag)?),
        ParamType::Rrs => ParametricRecord::RrsStation(rrs::decode_rrs(window, diag)?),
        ParamType::Temp => ParametricRecord::Temperature(station::decode_temp(window, diag)?),
        ParamType::Basn => ParametricRecord::Basin(areal::decode_basn(window, diag)?),
        ParamType::Map => ParametricRecord::ArealPrecip(areal::decode_map(window, diag)?),
        ParamType::Mat => ParametricRecord::ArealTemp(areal::decode_mat(window, diag)?),
        ParamType::Ntwk => ParametricRecord::Network(network::decode_ntwk(window)?),
        ParamType::Orrs => ParametricRecord::RrsAlphaOrder(rrs::decode_orrs(window, diag)?),
        ParamType::User => ParametricRecord::UserParameters(user::decode_user(window, diag)?),
        ParamType::Mape
        | ParamType::Maps
        | ParamType::Mapx
        | ParamType::Stbn
        | ParamType::Urrs => ParametricRecord::NotImplemented {
            type_tag: type_tag.clone(),
        },
    };

    Ok(Some(record))
}

/// Writes the common record prefix; shared by the crate's test fixtures.
#[cfg(test)]
pub(crate) fn test_prefix(nwords: i32, id: &str, tag: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&nwords.to_be_bytes());
    bytes.extend_from_slice(&Ident::new(id).unwrap().to_field());
    bytes.extend_from_slice(&TypeTag::new(tag).unwrap().to_field());
    bytes
}
