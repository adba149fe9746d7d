//! Identity and existence memo tables.
//!
//! Two memos sit in front of the time-series read path: one maps an
//! `{id, data type, interval}` key to what the last lookup learned about it
//! (absent, exists, or the fully decoded series), the other maps a data
//! type to the logical unit number that stores it. Both are memoization
//! pure and simple — once populated for a key, the underlying scan is never
//! repeated within the session. There is no expiry.

use crate::collections::HashMap;
use crate::timeseries::TimeSeries;
use fs5_common::{DataType, Ident};
use serde::{Deserialize, Serialize};

/// The key identifying one logical time series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TsKey {
    pub id: Ident,
    pub data_type: DataType,
    pub interval_hours: i32,
}

/// What a prior lookup learned about a key.
#[derive(Debug, Clone, PartialEq)]
pub enum TsCacheEntry {
    /// The database holds nothing for this key
    Absent,
    /// A header-only check found the series; the values were not read
    Exists,
    /// The series was fully decoded
    Loaded(Box<TimeSeries>),
}

/// Memo over time-series identity lookups.
#[derive(Debug, Default)]
pub struct TsIdentityCache {
    entries: HashMap<TsKey, TsCacheEntry>,
}

impl TsIdentityCache {
    pub fn get(&self, key: &TsKey) -> Option<&TsCacheEntry> {
        self.entries.get(key)
    }

    /// Records a lookup result. A `Loaded` entry is never downgraded to
    /// `Exists` by a later header-only check.
    pub fn insert(&mut self, key: TsKey, entry: TsCacheEntry) {
        match (self.entries.get(&key), &entry) {
            (Some(TsCacheEntry::Loaded(_)), TsCacheEntry::Exists) => {}
            _ => {
                self.entries.insert(key, entry);
            }
        }
    }

    /// True when a lookup for this key already ran, whatever it found.
    pub fn knows(&self, key: &TsKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memo mapping data types to processed-database logical units.
///
/// Built in one pass over the processed parameter file on first miss;
/// `None` until then.
#[derive(Debug, Default)]
pub struct UnitCache {
    map: Option<HashMap<DataType, i32>>,
}

impl UnitCache {
    pub fn is_built(&self) -> bool {
        self.map.is_some()
    }

    pub fn populate(&mut self, pairs: impl IntoIterator<Item = (DataType, i32)>) {
        self.map = Some(pairs.into_iter().collect());
    }

    /// The logical unit for a data type; `None` when the map is unbuilt or
    /// the type is not in it.
    pub fn unit_for(&self, data_type: &DataType) -> Option<i32> {
        self.map.as_ref()?.get(data_type).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(interval: i32) -> TsKey {
        TsKey {
            id: Ident::new("FTPK").unwrap(),
            data_type: DataType::new("QIN").unwrap(),
            interval_hours: interval,
        }
    }

    #[test]
    fn test_memoizes_absence_and_existence() {
        let mut cache = TsIdentityCache::default();
        assert!(!cache.knows(&key(6)));

        cache.insert(key(6), TsCacheEntry::Exists);
        cache.insert(key(24), TsCacheEntry::Absent);

        assert!(cache.knows(&key(6)));
        assert_eq!(cache.get(&key(6)), Some(&TsCacheEntry::Exists));
        assert_eq!(cache.get(&key(24)), Some(&TsCacheEntry::Absent));
        assert!(!cache.knows(&key(12)));
    }

    #[test]
    fn test_loaded_is_not_downgraded() {
        let mut cache = TsIdentityCache::default();
        let ts = TimeSeries {
            id: Ident::new("FTPK").unwrap(),
            data_type: DataType::new("QIN").unwrap(),
            interval_hours: 6,
            observed: crate::timeseries::TsArray {
                range: crate::timeseries::TsRange {
                    start: fs5_common::JulianHour(0),
                    end: fs5_common::JulianHour(6),
                },
                values: vec![1.0],
            },
            future: None,
            identifier: "FTPK.QIN.6".to_string(),
        };

        cache.insert(key(6), TsCacheEntry::Loaded(Box::new(ts)));
        cache.insert(key(6), TsCacheEntry::Exists);

        assert!(matches!(cache.get(&key(6)), Some(TsCacheEntry::Loaded(_))));
    }

    #[test]
    fn test_unit_cache_builds_once() {
        let mut cache = UnitCache::default();
        assert!(!cache.is_built());
        assert_eq!(cache.unit_for(&DataType::new("QIN").unwrap()), None);

        cache.populate([
            (DataType::new("QIN").unwrap(), 2),
            (DataType::new("MAP").unwrap(), 1),
        ]);
        assert!(cache.is_built());
        assert_eq!(cache.unit_for(&DataType::new("QIN").unwrap()), Some(2));
        assert_eq!(cache.unit_for(&DataType::new("SQIN").unwrap()), None);
    }
}
