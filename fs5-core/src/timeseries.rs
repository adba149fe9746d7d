//! Assembly of logical time series from processed-database records.
//!
//! A processed time series is stored as a header followed by one flat value
//! array. The header's two pointers split the array into an observed half
//! and an optional future half: `iptreg` points at the first regular
//! (observed) value and `iptfut` at the first future value, both 1-based
//! within the record's value region; `iptfut == 0` means no future half
//! exists. Date ranges derive from the starting Julian hour and the data
//! interval, and are always normalized to UTC when converted to calendar
//! time.

use crate::error::DecodeError;
use crate::stream::ByteWindow;
use chrono::{DateTime, Utc};
use fs5_common::{DataType, Ident, JulianHour};
use serde::{Deserialize, Serialize};

/// Words in the fixed portion of a time-series header.
pub const TS_HEADER_MIN_WORDS: i32 = 9;

/// Widest value array a sane record declares. Guards the full-record read
/// against allocating from a damaged count.
const MAX_TS_VALUES: i32 = 2_000_000;

/// The decoded header of one processed time-series record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsHeader {
    /// Total words in the header, including any site-specific extension
    pub header_words: i32,
    pub interval_hours: i32,
    pub n_values: i32,
    /// 1-based index of the first future value; 0 when none exist
    pub iptfut: i32,
    /// 1-based index of the first regular value
    pub iptreg: i32,
    pub julbeg: JulianHour,
    pub tsid: Option<Ident>,
    pub data_type: Option<DataType>,
}

impl TsHeader {
    /// Decodes the header fields at the start of a record window.
    pub fn decode(window: &mut ByteWindow) -> Result<TsHeader, DecodeError> {
        let header_words = window.read_i32()?;
        let interval_hours = window.read_i32()?;
        let n_values = window.read_i32()?;
        let iptfut = window.read_i32()?;
        let iptreg = window.read_i32()?;
        let julbeg = JulianHour(window.read_i32()?);
        let id_bytes = window.read_raw(8)?;
        let type_bytes = window.read_raw(4)?;

        if header_words < TS_HEADER_MIN_WORDS
            || interval_hours <= 0
            || !(0..=MAX_TS_VALUES).contains(&n_values)
        {
            return Err(DecodeError::Truncated {
                what: "time-series header",
            });
        }

        Ok(TsHeader {
            header_words,
            interval_hours,
            n_values,
            iptfut,
            iptreg,
            julbeg,
            tsid: Ident::from_field(&id_bytes),
            data_type: fs5_common::TypeTag::from_field(&type_bytes)
                .map(|t| DataType::new_unchecked(t.as_str())),
        })
    }

    /// Total bytes a full read of this record occupies: header plus values.
    pub fn total_bytes(&self) -> usize {
        (self.header_words + self.n_values) as usize * 4
    }

    /// Values belonging to the observed half.
    pub fn observed_count(&self) -> usize {
        if self.iptfut == 0 {
            self.n_values.max(0) as usize
        } else {
            (self.iptfut - self.iptreg).clamp(0, self.n_values) as usize
        }
    }

    /// The observed range, and the future range when a future half exists.
    pub fn ranges(&self) -> (TsRange, Option<TsRange>) {
        let interval = self.interval_hours;

        if self.iptfut == 0 {
            let observed = TsRange {
                start: self.julbeg,
                end: self.julbeg + self.n_values * interval,
            };
            return (observed, None);
        }

        let observed_end = self.julbeg + (self.iptfut - self.iptreg - 1) * interval;
        let observed = TsRange {
            start: self.julbeg,
            end: observed_end,
        };

        let n_future = self.n_values as usize - self.observed_count();
        let future_start = observed_end + interval;
        let future = TsRange {
            start: future_start,
            end: future_start + (n_future.saturating_sub(1) as i32) * interval,
        };
        (observed, Some(future))
    }
}

/// An interval-stepped Julian-hour range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsRange {
    pub start: JulianHour,
    pub end: JulianHour,
}

impl TsRange {
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        self.start.to_datetime()
    }

    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        self.end.to_datetime()
    }
}

/// One half of a time series: its range and values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsArray {
    pub range: TsRange,
    pub values: Vec<f32>,
}

/// A logical time series reconstructed from one processed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub id: Ident,
    pub data_type: DataType,
    pub interval_hours: i32,
    pub observed: TsArray,
    pub future: Option<TsArray>,
    /// Derived identifier: `id.type.interval`
    pub identifier: String,
}

impl TimeSeries {
    pub fn total_value_count(&self) -> usize {
        self.observed.values.len() + self.future.as_ref().map_or(0, |f| f.values.len())
    }
}

/// The derived identifier string for an `{id, data type, interval}` triple.
pub fn derived_identifier(id: &Ident, data_type: &DataType, interval_hours: i32) -> String {
    format!("{id}.{data_type}.{interval_hours}")
}

/// Builds the two independent series halves out of a header and its flat
/// value array. A header-only caller passes an empty array and gets empty
/// halves with the ranges still computed.
pub fn assemble(
    header: &TsHeader,
    id: Ident,
    data_type: DataType,
    mut values: Vec<f32>,
) -> TimeSeries {
    let (observed_range, future_range) = header.ranges();

    let n_observed = header.observed_count().min(values.len());
    let future_values = values.split_off(n_observed);

    let future = future_range
        .filter(|_| !future_values.is_empty())
        .map(|range| TsArray {
            range,
            values: future_values,
        });

    let identifier = derived_identifier(&id, &data_type, header.interval_hours);
    TimeSeries {
        id,
        data_type,
        interval_hours: header.interval_hours,
        observed: TsArray {
            range: observed_range,
            values,
        },
        future,
        identifier,
    }
}

/// Reads the value array that follows a header inside one record window.
pub fn read_values(window: &mut ByteWindow, header: &TsHeader) -> Result<Vec<f32>, DecodeError> {
    // Skip whatever remains of the header extension before the values.
    let value_start = header.header_words as usize * 4;
    if value_start < window.position() {
        return Err(DecodeError::Truncated {
            what: "time-series header extension",
        });
    }
    window.skip(value_start - window.position())?;

    let mut values = Vec::with_capacity(header.n_values as usize);
    for _ in 0..header.n_values {
        values.push(window.read_f32()?);
    }
    Ok(values)
}
