use serde::{Deserialize, Serialize};

use super::repo::{Scan, ScanItem};

/// Successful ingestion outcome as returned to the caller: the scan row
/// plus every item the detector produced for it.
#[derive(Debug, Clone, Serialize)]
pub struct ScanWithItems {
    pub scan: Scan,
    pub items: Vec<ScanItem>,
}

#[derive(Debug, Deserialize)]
pub struct RenameScanRequest {
    pub food_name: String,
}

/// One day's listing: every scan with its items plus the day's calorie sum.
#[derive(Debug, Clone, Serialize)]
pub struct DayScansResponse {
    pub date: time::Date,
    pub total_calories: f64,
    pub scans: Vec<ScanWithItems>,
}

/// Window for the calorie log; both bounds optional, dates as YYYY-MM-DD.
#[derive(Debug, Deserialize)]
pub struct CalorieLogQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
