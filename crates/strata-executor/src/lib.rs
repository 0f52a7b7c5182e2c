//! Strata Executor - Table-scan operators and the scan orchestrator

pub mod scan;
pub mod table_scan;

pub use scan::dictionary_scan::{scan_dictionary_between, scan_dictionary_binary};
pub use scan::sorted_scan::scan_sorted_segment;
pub use scan::value_scan::{scan_segment_between, scan_segment_binary, scan_segment_nulls};
pub use table_scan::TableScan;
