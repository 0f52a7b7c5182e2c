//! Segment-level scan implementations

pub mod dictionary_scan;
pub mod sorted_scan;
pub mod value_scan;
