//! The database session: one FS5Files directory, opened for reading.
//!
//! A session owns the file registry, the lazily-built indexes, and the two
//! identity memos; entities handed back to callers are independent value
//! objects with no pointers into the session. Everything runs on the
//! calling thread with blocking I/O — a session is not safe to share
//! across threads without external synchronization, by contract.

use crate::cache::{TsCacheEntry, TsIdentityCache, TsKey, UnitCache};
use crate::carryover::{self, CarryoverHeader, CarryoverSlot};
use crate::diagnostics::Diagnostics;
use crate::endian;
use crate::error::{DecodeError, Fs5Error, Result};
use crate::index::{
    ParametricIndex, PreprocessorStationIndex, ProcessedTsIndex, RatingCurveIndex,
    SegmentPointerIndex, StationIndexEntry,
};
use crate::param::{self, ParametricEntity};
use crate::registry::{FileRegistry, FileRole};
use crate::segment::{Segment, SegmentStatus, decode_param_array};
use crate::stream::{ByteOrder, ByteWindow, StreamError};
use crate::timeseries::{self, TimeSeries, TsHeader};
use fs5_common::{DataType, Ident, JulianDay, TypeTag};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Intervals probed, in order, when a MAPX series yields no data at its
/// table-declared interval. The first interval that yields data wins.
pub const MAPX_PROBE_INTERVALS: [i32; 6] = [1, 3, 6, 12, 18, 24];

/// Most points a rating curve record can carry.
const MAX_RATING_POINTS: i32 = 146;

/// Session configuration: the resolved database directory plus optional
/// overrides.
#[derive(Debug, Clone)]
pub struct Fs5Options {
    dir: PathBuf,
    byte_order: Option<ByteOrder>,
}

impl Fs5Options {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Fs5Options {
            dir: dir.into(),
            byte_order: None,
        }
    }

    /// Forces a byte order, bypassing the probe.
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }
}

/// A forecast group: an ordered collection of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastGroup {
    pub id: Ident,
    pub description: String,
    pub n_segments: i32,
    pub created_day: JulianDay,
    pub created_hour: i32,
}

/// A stage/discharge rating curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCurve {
    pub id: Ident,
    pub description: String,
    pub stages: Vec<f32>,
    pub discharges: Vec<f32>,
}

/// One open FS5Files database.
pub struct Fs5Session {
    registry: FileRegistry,
    order: ByteOrder,
    diag: Diagnostics,

    rating_index: Option<RatingCurveIndex>,
    segment_index: Option<SegmentPointerIndex>,
    parametric_index: Option<ParametricIndex>,
    processed_index: Option<ProcessedTsIndex>,
    station_index: Option<PreprocessorStationIndex>,

    ts_cache: TsIdentityCache,
    unit_cache: UnitCache,
}

impl Fs5Session {
    /// Opens a session over a database directory, probing the byte order
    /// unless the options force one.
    pub fn open(options: Fs5Options) -> Result<Self> {
        let mut registry = FileRegistry::new(&options.dir);
        let order = match options.byte_order {
            Some(order) => order,
            None => endian::probe(&mut registry)?,
        };
        debug!(dir = %options.dir.display(), ?order, "session opened");

        Ok(Fs5Session {
            registry,
            order,
            diag: Diagnostics::default(),
            rating_index: None,
            segment_index: None,
            parametric_index: None,
            processed_index: None,
            station_index: None,
            ts_cache: TsIdentityCache::default(),
            unit_cache: UnitCache::default(),
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Anomaly counters accumulated so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    // ── Index access (built once, memoized) ──────────────────────────

    fn rating_index(&mut self) -> Result<&RatingCurveIndex> {
        if self.rating_index.is_none() {
            let order = self.order;
            let logical = self
                .registry
                .open_or_rewind(FileRole::RatingCurvePointers, false)?;
            let mut stream = logical.stream(order);
            let index = RatingCurveIndex::build(&mut stream, &mut self.diag)?;
            self.rating_index = Some(index);
        }
        Ok(self.rating_index.as_ref().expect("built above"))
    }

    fn segment_index(&mut self) -> Result<&SegmentPointerIndex> {
        if self.segment_index.is_none() {
            let order = self.order;
            let logical = self
                .registry
                .open_or_rewind(FileRole::SegmentPointers, false)?;
            let mut stream = logical.stream(order);
            let index = SegmentPointerIndex::build(&mut stream, &mut self.diag)?;
            self.segment_index = Some(index);
        }
        Ok(self.segment_index.as_ref().expect("built above"))
    }

    fn parametric_index(&mut self) -> Result<&ParametricIndex> {
        if self.parametric_index.is_none() {
            let order = self.order;
            let logical = self
                .registry
                .open_or_rewind(FileRole::PreprocessorParametricIndex, false)?;
            let mut stream = logical.stream(order);
            let index = ParametricIndex::build(&mut stream, &mut self.diag)?;
            self.parametric_index = Some(index);
        }
        Ok(self.parametric_index.as_ref().expect("built above"))
    }

    fn processed_index(&mut self) -> Result<&ProcessedTsIndex> {
        if self.processed_index.is_none() {
            let order = self.order;
            let logical = self.registry.open_or_rewind(FileRole::ProcessedIndex, false)?;
            let mut stream = logical.stream(order);
            let index = ProcessedTsIndex::build(&mut stream, &mut self.diag)?;
            self.processed_index = Some(index);
        }
        Ok(self.processed_index.as_ref().expect("built above"))
    }

    fn station_index(&mut self) -> Result<&PreprocessorStationIndex> {
        if self.station_index.is_none() {
            let order = self.order;
            let logical = self
                .registry
                .open_or_rewind(FileRole::PreprocessorIndex, false)?;
            let mut stream = logical.stream(order);
            let index = PreprocessorStationIndex::build(&mut stream, &mut self.diag)?;
            self.station_index = Some(index);
        }
        Ok(self.station_index.as_ref().expect("built above"))
    }

    // ── Rating curves ────────────────────────────────────────────────

    pub fn rating_curve_ids(&mut self) -> Result<Vec<Ident>> {
        Ok(self.rating_index()?.ids().cloned().collect())
    }

    pub fn rating_curve(&mut self, id: &Ident) -> Result<Option<RatingCurve>> {
        let Some(record) = self.rating_index()?.get(id) else {
            return Ok(None);
        };

        let order = self.order;
        let logical = self.registry.open_or_rewind(FileRole::RatingCurves, false)?;
        let mut stream = logical.stream(order);
        let mut window = match stream.record_window(record, FileRole::RatingCurves.record_len()) {
            Ok(window) => window,
            Err(StreamError::EndOfFile { .. }) => {
                self.diag.malformed_index_entries += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match decode_rating_curve(&mut window, id, &mut self.diag) {
            Ok(curve) => Ok(curve),
            Err(e) => {
                warn!(id = %id, error = %e, "rating curve decode failed");
                self.diag.malformed_index_entries += 1;
                Ok(None)
            }
        }
    }

    // ── Forecast groups ──────────────────────────────────────────────

    /// Every forecast group id, in list order.
    pub fn forecast_group_ids(&mut self) -> Result<Vec<Ident>> {
        let order = self.order;
        let logical = self
            .registry
            .open_or_rewind(FileRole::ForecastGroupList, false)?;
        let mut stream = logical.stream(order);

        let mut ids = Vec::new();
        loop {
            let bytes = match stream.read_bytes(8) {
                Ok(bytes) => bytes,
                Err(StreamError::EndOfFile { .. }) => break,
                Err(e) => return Err(e.into()),
            };
            if let Some(id) = Ident::from_field(&bytes) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// The status record of one forecast group.
    pub fn forecast_group(&mut self, id: &Ident) -> Result<Option<ForecastGroup>> {
        let order = self.order;
        let logical = self
            .registry
            .open_or_rewind(FileRole::ForecastGroupStatus, false)?;
        let mut stream = logical.stream(order);

        loop {
            let bytes = match stream.read_bytes(FileRole::ForecastGroupStatus.record_len() as usize)
            {
                Ok(bytes) => bytes,
                Err(StreamError::EndOfFile { .. }) => break,
                Err(e) => return Err(e.into()),
            };
            let mut window = ByteWindow::new_owned(bytes, order);

            let id_bytes = window.read_raw(8)?;
            let Some(group_id) = Ident::from_field(&id_bytes) else {
                continue;
            };
            if &group_id != id {
                continue;
            }

            let description = window.read_string(20)?;
            let n_segments = window.read_i32()?;
            let created_day = JulianDay(window.read_i32()?);
            let created_hour = window.read_i32()?;
            return Ok(Some(ForecastGroup {
                id: group_id,
                description,
                n_segments,
                created_day,
                created_hour,
            }));
        }
        Ok(None)
    }

    /// Ids of the segments belonging to a forecast group, by scanning the
    /// segment status file.
    pub fn forecast_group_segments(&mut self, group: &Ident) -> Result<Vec<Ident>> {
        let order = self.order;
        let logical = self.registry.open_or_rewind(FileRole::SegmentStatus, false)?;
        let mut stream = logical.stream(order);

        let mut ids = Vec::new();
        loop {
            let bytes = match stream.read_bytes(FileRole::SegmentStatus.record_len() as usize) {
                Ok(bytes) => bytes,
                Err(StreamError::EndOfFile { .. }) => break,
                Err(e) => return Err(e.into()),
            };
            let mut window = ByteWindow::new_owned(bytes, order);
            match SegmentStatus::decode(&mut window, None) {
                Ok(Some(status)) if status.forecast_group.as_ref() == Some(group) => {
                    ids.push(status.id);
                }
                Ok(_) => {}
                Err(_) => {
                    // One damaged status record must not end the scan.
                    self.diag.aborted_segments += 1;
                }
            }
        }
        Ok(ids)
    }

    // ── Segments ─────────────────────────────────────────────────────

    pub fn segment_ids(&mut self) -> Result<Vec<Ident>> {
        Ok(self.segment_index()?.ids().cloned().collect())
    }

    /// The status record of one segment, without decoding its operations.
    pub fn segment_status(&mut self, id: &Ident) -> Result<Option<SegmentStatus>> {
        let Some(record) = self.segment_index()?.get(id) else {
            return Ok(None);
        };

        let order = self.order;
        let logical = self.registry.open_or_rewind(FileRole::SegmentStatus, false)?;
        let mut stream = logical.stream(order);
        let mut window = match stream.record_window(record, FileRole::SegmentStatus.record_len()) {
            Ok(window) => window,
            Err(StreamError::EndOfFile { .. }) => {
                self.diag.malformed_index_entries += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match SegmentStatus::decode(&mut window, Some(id)) {
            Ok(status) => Ok(status),
            Err(e) => {
                warn!(id = %id, error = %e, "segment status decode failed");
                self.diag.aborted_segments += 1;
                Ok(None)
            }
        }
    }

    /// Fully decodes one segment: operations, descriptors, and the time
    /// series they bind.
    pub fn segment(&mut self, id: &Ident) -> Result<Option<Segment>> {
        let Some(status) = self.segment_status(id)? else {
            return Ok(None);
        };

        let order = self.order;
        let byte_count = status.param_words() * 4;
        let logical = self
            .registry
            .open_or_rewind(FileRole::SegmentParameters, false)?;
        let mut stream = logical.stream(order);
        let window = match stream.virtual_window(
            status.param_record,
            FileRole::SegmentParameters.record_len(),
            byte_count,
        ) {
            Ok(window) => window,
            Err(StreamError::EndOfFile { .. }) => {
                warn!(id = %id, "parameter array shorter than its declared counts");
                self.diag.aborted_segments += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let arrays = match decode_param_array(&window, &status, &mut self.diag) {
            Ok(arrays) => arrays,
            Err(e) => {
                warn!(id = %id, error = %e, "segment decode aborted");
                self.diag.aborted_segments += 1;
                return Ok(None);
            }
        };

        let mut segment = Segment::from_status(&status, arrays);
        self.resolve_bindings(&mut segment)?;
        Ok(Some(segment))
    }

    /// Resolves each external descriptor to its processed series and
    /// attaches the instances to every operation naming the same
    /// `{id, data type}` pair.
    fn resolve_bindings(&mut self, segment: &mut Segment) -> Result<()> {
        let entries = segment.ts_entries.clone();
        for entry in entries {
            if entry.is_internal() {
                continue;
            }

            let series =
                self.series_with_mapx_probe(&entry.tsid, &entry.data_type, entry.interval_hours)?;
            let Some(series) = series else {
                self.diag.skipped_time_series += 1;
                continue;
            };

            for op in &mut segment.operations {
                if op.binds(&entry.tsid, &entry.data_type) {
                    op.time_series.push(series.clone());
                }
            }
        }
        Ok(())
    }

    /// The declared-interval lookup, with the MAPX fallback: when a MAPX
    /// series yields nothing at its declared interval, probe the fixed
    /// interval ladder in order and adopt the first that yields data.
    fn series_with_mapx_probe(
        &mut self,
        id: &Ident,
        data_type: &DataType,
        interval_hours: i32,
    ) -> Result<Option<TimeSeries>> {
        if let Some(series) = self.time_series(id, data_type, interval_hours)? {
            return Ok(Some(series));
        }
        if !data_type.is_mapx() {
            return Ok(None);
        }
        for probe_interval in MAPX_PROBE_INTERVALS {
            if probe_interval == interval_hours {
                continue;
            }
            if let Some(series) = self.time_series(id, data_type, probe_interval)? {
                debug!(id = %id, declared = interval_hours, adopted = probe_interval,
                    "MAPX interval probe succeeded");
                return Ok(Some(series));
            }
        }
        Ok(None)
    }

    // ── Time series ──────────────────────────────────────────────────

    /// Reads one logical time series, memoized per
    /// `{id, data type, interval}`.
    pub fn time_series(
        &mut self,
        id: &Ident,
        data_type: &DataType,
        interval_hours: i32,
    ) -> Result<Option<TimeSeries>> {
        let key = TsKey {
            id: id.clone(),
            data_type: data_type.clone(),
            interval_hours,
        };

        match self.ts_cache.get(&key) {
            Some(TsCacheEntry::Loaded(series)) => return Ok(Some((**series).clone())),
            Some(TsCacheEntry::Absent) => return Ok(None),
            Some(TsCacheEntry::Exists) | None => {}
        }

        let loaded = self.load_time_series(id, data_type, interval_hours, false)?;
        match loaded {
            Some(series) => {
                self.ts_cache
                    .insert(key, TsCacheEntry::Loaded(Box::new(series.clone())));
                Ok(Some(series))
            }
            None => {
                self.ts_cache.insert(key, TsCacheEntry::Absent);
                Ok(None)
            }
        }
    }

    /// Header-only existence check, memoized with the same keys as full
    /// reads.
    pub fn time_series_exists(
        &mut self,
        id: &Ident,
        data_type: &DataType,
        interval_hours: i32,
    ) -> Result<bool> {
        let key = TsKey {
            id: id.clone(),
            data_type: data_type.clone(),
            interval_hours,
        };

        if let Some(entry) = self.ts_cache.get(&key) {
            return Ok(!matches!(entry, TsCacheEntry::Absent));
        }

        let found = self
            .load_time_series(id, data_type, interval_hours, true)?
            .is_some();
        self.ts_cache.insert(
            key,
            if found {
                TsCacheEntry::Exists
            } else {
                TsCacheEntry::Absent
            },
        );
        Ok(found)
    }

    /// Every `{tsid, data type}` pair the processed index lists, in file
    /// order.
    pub fn time_series_ids(&mut self) -> Result<Vec<(Ident, DataType)>> {
        Ok(self
            .processed_index()?
            .entries()
            .iter()
            .map(|e| (e.tsid.clone(), e.data_type.clone()))
            .collect())
    }

    /// The shared read path. `header_only` stops after computing ranges.
    ///
    /// In header-only mode the returned series carries empty value arrays;
    /// callers use it purely as an existence answer and it is never cached
    /// as `Loaded`.
    fn load_time_series(
        &mut self,
        id: &Ident,
        data_type: &DataType,
        interval_hours: i32,
        header_only: bool,
    ) -> Result<Option<TimeSeries>> {
        let Some(record) = self.processed_index()?.get(id, data_type) else {
            return Ok(None);
        };
        let Some(unit) = self.unit_for(data_type)? else {
            warn!(data_type = %data_type, "no logical unit for data type");
            return Ok(None);
        };
        let Some(role) = FileRole::processed_ts(unit) else {
            warn!(unit, "logical unit outside 1-5");
            return Ok(None);
        };

        let order = self.order;
        let record_len = role.record_len();
        let logical = self.registry.open_or_rewind(role, false)?;
        let mut stream = logical.stream(order);

        // One record is always enough for the fixed header fields.
        let mut window = match stream.virtual_window(record, record_len, record_len as usize) {
            Ok(window) => window,
            Err(StreamError::EndOfFile { .. }) => {
                self.diag.skipped_time_series += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let header = match TsHeader::decode(&mut window) {
            Ok(header) => header,
            Err(e) => {
                warn!(id = %id, error = %e, "time-series header decode failed");
                self.diag.skipped_time_series += 1;
                return Ok(None);
            }
        };

        // Identifier, type, and interval read back from the header must
        // match the request; anything else is "not found".
        let matches = header.tsid.as_ref() == Some(id)
            && header.data_type.as_ref() == Some(data_type)
            && header.interval_hours == interval_hours;
        if !matches {
            return Ok(None);
        }

        if header_only {
            return Ok(Some(timeseries::assemble(
                &header,
                id.clone(),
                data_type.clone(),
                Vec::new(),
            )));
        }

        let total = header.total_bytes();
        let mut window = match stream.virtual_window(record, record_len, total) {
            Ok(window) => window,
            Err(StreamError::EndOfFile { .. }) => {
                warn!(id = %id, "time-series record shorter than its header declares");
                self.diag.skipped_time_series += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        // Re-skip the fixed header fields in the full window.
        let header = match TsHeader::decode(&mut window) {
            Ok(header) => header,
            Err(e) => return Err(Fs5Error::Decode(e)),
        };
        let values = match timeseries::read_values(&mut window, &header) {
            Ok(values) => values,
            Err(e) => {
                warn!(id = %id, error = %e, "time-series value read failed");
                self.diag.skipped_time_series += 1;
                return Ok(None);
            }
        };

        Ok(Some(timeseries::assemble(
            &header,
            id.clone(),
            data_type.clone(),
            values,
        )))
    }

    /// The logical unit storing a data type, built from the processed
    /// parameter file on first miss and memoized.
    fn unit_for(&mut self, data_type: &DataType) -> Result<Option<i32>> {
        if !self.unit_cache.is_built() {
            let order = self.order;
            let logical = self
                .registry
                .open_or_rewind(FileRole::ProcessedParameters, false)?;
            let mut stream = logical.stream(order);

            let mut pairs = Vec::new();
            loop {
                let bytes =
                    match stream.read_bytes(FileRole::ProcessedParameters.record_len() as usize) {
                        Ok(bytes) => bytes,
                        Err(StreamError::EndOfFile { .. }) => break,
                        Err(e) => return Err(e.into()),
                    };
                let mut window = ByteWindow::new_owned(bytes, order);
                let type_bytes = window.read_raw(4)?;
                let unit = window.read_i32()?;
                let Some(tag) = TypeTag::from_field(&type_bytes) else {
                    continue;
                };
                pairs.push((DataType::new_unchecked(tag.as_str()), unit));
            }
            self.unit_cache.populate(pairs);
        }
        Ok(self.unit_cache.unit_for(data_type))
    }

    // ── Carryover ────────────────────────────────────────────────────

    /// Decodes a segment's carryover: the first slot, or every slot the
    /// file holds.
    pub fn carryover(&mut self, segment_id: &Ident, all_slots: bool) -> Result<Vec<CarryoverSlot>> {
        let Some(status) = self.segment_status(segment_id)? else {
            return Ok(Vec::new());
        };
        if status.nc <= 0 {
            return Ok(Vec::new());
        }

        let order = self.order;
        let record_len = FileRole::Carryover.record_len();
        let logical = self.registry.open_or_rewind(FileRole::Carryover, false)?;
        let mut stream = logical.stream(order);

        let mut header_window = stream.record_window(1, record_len)?;
        let header = match CarryoverHeader::decode(&mut header_window) {
            Ok(header) => header,
            Err(e) => return Err(Fs5Error::Decode(e)),
        };

        let n_slots = if all_slots { header.n_slots } else { header.n_slots.min(1) };
        let stride = header.slot_stride(record_len);
        let slice_bytes = (status.nc.max(0) as usize) * 4;

        let mut slots = Vec::new();
        for slot in 0..n_slots {
            let offset = slot as u64 * stride + status.carryover_word_offset.max(0) as u64 * 4;
            stream.seek_byte(offset)?;
            let bytes = match stream.read_bytes(slice_bytes) {
                Ok(bytes) => bytes,
                Err(StreamError::EndOfFile { .. }) => break,
                Err(e) => return Err(e.into()),
            };
            let mut window = ByteWindow::new_owned(bytes, order);

            match carryover::decode_slot(&mut window, segment_id, slot, &mut self.diag) {
                Ok(Some(decoded)) => slots.push(decoded),
                Ok(None) => {}
                Err(e) => {
                    warn!(segment = %segment_id, slot, error = %e, "carryover slot decode failed");
                    self.diag.skipped_carryover_slots += 1;
                }
            }
        }
        Ok(slots)
    }

    // ── Parametric records ───────────────────────────────────────────

    /// Reads one parametric record by `{id, type tag}`.
    pub fn parametric(&mut self, id: &Ident, type_tag: &TypeTag) -> Result<Option<ParametricEntity>> {
        let (record, unit) = {
            let index = self.parametric_index()?;
            let Some(entry) = index.get(id, type_tag) else {
                return Ok(None);
            };
            let Some(dir) = index.type_dir(type_tag) else {
                return Ok(None);
            };
            (entry.record, dir.logical_unit)
        };
        let Some(role) = FileRole::preprocessor_parametric(unit) else {
            warn!(unit, "parametric logical unit outside 1-5");
            return Ok(None);
        };

        let order = self.order;
        let record_len = role.record_len();
        let logical = self.registry.open_or_rewind(role, false)?;
        let mut stream = logical.stream(order);

        // The leading word sizes the whole record.
        let mut head = match stream.virtual_window(record, record_len, 4) {
            Ok(window) => window,
            Err(StreamError::EndOfFile { .. }) => {
                self.diag.malformed_index_entries += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let nwords = head.read_i32().map_err(DecodeError::Stream)?;
        if !(4..=100_000).contains(&nwords) {
            self.diag.malformed_index_entries += 1;
            return Ok(None);
        }

        let mut window = match stream.virtual_window(record, record_len, nwords as usize * 4) {
            Ok(window) => window,
            Err(StreamError::EndOfFile { .. }) => {
                self.diag.malformed_index_entries += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match param::decode_record(&mut window, id, type_tag, &mut self.diag) {
            Ok(Some(decoded)) => Ok(Some(ParametricEntity {
                id: id.clone(),
                type_tag: type_tag.clone(),
                logical_unit: unit,
                record_number: record,
                record: decoded,
            })),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(id = %id, tag = %type_tag, error = %e, "parametric decode failed");
                self.diag.malformed_index_entries += 1;
                Ok(None)
            }
        }
    }

    /// Every id the parametric index lists under a type tag.
    pub fn parametric_ids(&mut self, type_tag: &TypeTag) -> Result<Vec<Ident>> {
        Ok(self
            .parametric_index()?
            .ids_of_type(type_tag)
            .cloned()
            .collect())
    }

    // ── Preprocessor stations ────────────────────────────────────────

    /// The station index entry for one station id.
    pub fn station_entry(&mut self, station_id: &Ident) -> Result<Option<StationIndexEntry>> {
        Ok(self.station_index()?.get(station_id).cloned())
    }

    /// Every station id in the preprocessor index.
    pub fn station_ids(&mut self) -> Result<Vec<Ident>> {
        Ok(self
            .station_index()?
            .entries()
            .iter()
            .map(|e| e.station_id.clone())
            .collect())
    }
}

fn decode_rating_curve(
    window: &mut ByteWindow,
    id: &Ident,
    diag: &mut Diagnostics,
) -> std::result::Result<Option<RatingCurve>, DecodeError> {
    let id_bytes = window.read_raw(8)?;
    if Ident::from_field(&id_bytes).as_ref() != Some(id) {
        return Ok(None);
    }

    let description = window.read_string(20)?;
    let n_points = window.read_i32()?;
    let n_points = if (0..=MAX_RATING_POINTS).contains(&n_points) {
        n_points as usize
    } else {
        diag.clamped_values += 1;
        0
    };

    let mut stages = Vec::with_capacity(n_points);
    for _ in 0..n_points {
        stages.push(window.read_f32()?);
    }
    let mut discharges = Vec::with_capacity(n_points);
    for _ in 0..n_points {
        discharges.push(window.read_f32()?);
    }

    Ok(Some(RatingCurve {
        id: id.clone(),
        description,
        stages,
        discharges,
    }))
}
