//! Shared value types for the FS5Files database layer.
//!
//! This crate provides the small domain types that every other crate in the
//! workspace consumes:
//! - Fixed-width, blank-padded ASCII identifiers: [`Ident`] (8 characters)
//!   and [`TypeTag`] (4 characters)
//! - The Julian-hour-since-1900 time representation: [`JulianHour`]
//! - The processed/preprocessor data-type code table: [`DataType`]

pub mod datatype;
pub mod ident;
pub mod time;

pub use datatype::DataType;
pub use ident::{Ident, TypeTag};
pub use time::{JulianDay, JulianHour};
