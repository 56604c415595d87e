//! Records persisted by the store and shared across the collection pipeline.
//!
//! These types are exchanged between:
//! - Institution collectors (producers)
//! - The store (persistence)
//! - The collect / consolidate commands (consumers)
//!
//! DESIGN NOTES:
//! - Identifiers are store-assigned, monotonically increasing integers.
//! - Institutions are addressed by siglum everywhere outside the store.
//!

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------
// Institution
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Institution {
    pub id: u64,

    /// Short upper-case code (e.g. "ALMG", "SENADO")
    pub siglum: String,

    pub name: String,
}

// ------------------------------------------------------------
// Legislature
// ------------------------------------------------------------
//
// A temporal window during which a set of legislators serve.
// Always belongs to exactly one institution.
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Legislature {
    pub id: u64,
    pub institution_id: u64,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
}

impl Legislature {
    /// Whether `day` falls inside this legislature (end date exclusive).
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.date_start <= day && day < self.date_end
    }
}

// ------------------------------------------------------------
// Legislator
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Legislator {
    pub id: u64,
    pub institution_id: u64,

    /// Identifier used by the institution's own data source
    pub original_id: String,

    pub name: String,
    pub party: Option<String>,
    pub details: Option<LegislatorDetails>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LegislatorDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub site: Option<String>,
}

// ------------------------------------------------------------
// Collection run
// ------------------------------------------------------------
//
// One execution of data collection for an institution.
//
// LIFECYCLE:
// - Opened by a collector at the start of `update_data`
// - Committed by the same collector once every expense is stored
// - Read back (never mutated) by the collect command
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CollectionRun {
    pub id: u64,
    pub institution: String,
    pub legislature_id: u64,
    pub date: DateTime<Utc>,
    pub committed: bool,
}

// ------------------------------------------------------------
// Expense
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Expense {
    pub id: u64,
    pub collection_run_id: u64,
    pub legislator_id: u64,
    pub date: NaiveDate,

    /// Expense category as published by the institution
    pub nature: String,

    pub supplier: Option<String>,

    /// Amount in BRL
    pub value: f64,
}

// ------------------------------------------------------------
// Consolidation
// ------------------------------------------------------------
//
// Aggregated view of one committed collection run. At most one
// consolidation is kept per institution.
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Consolidation {
    pub institution: String,
    pub collection_run_id: u64,
    pub generated_at: DateTime<Utc>,
    pub legislators: Vec<LegislatorTotal>,
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LegislatorTotal {
    pub legislator_id: u64,
    pub name: String,
    pub expenses: usize,
    pub total: f64,
}

// ------------------------------------------------------------
// Feed records
// ------------------------------------------------------------
//
// Normalized records as published by a data source feed.
// Decoded from JSON by the collectors.
//
#[derive(Debug, Deserialize, Clone)]
pub struct LegislatorRecord {
    pub original_id: String,
    pub name: String,
    #[serde(default)]
    pub party: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExpenseRecord {
    pub legislator_original_id: String,

    /// Used when the legislator is not known yet
    pub legislator_name: String,

    pub date: NaiveDate,
    pub nature: String,
    #[serde(default)]
    pub supplier: Option<String>,
    pub value: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LegislatorDetailsRecord {
    pub original_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
}

impl From<LegislatorDetailsRecord> for LegislatorDetails {
    fn from(r: LegislatorDetailsRecord) -> Self {
        Self {
            email: r.email,
            phone: r.phone,
            site: r.site,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legislature_end_is_exclusive() {
        let leg = Legislature {
            id: 1,
            institution_id: 1,
            date_start: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2027, 2, 1).unwrap(),
        };
        assert!(leg.contains(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
        assert!(leg.contains(NaiveDate::from_ymd_opt(2027, 1, 31).unwrap()));
        assert!(!leg.contains(NaiveDate::from_ymd_opt(2027, 2, 1).unwrap()));
    }

    #[test]
    fn expense_record_optional_supplier() {
        let r: ExpenseRecord = serde_json::from_value(json!({
            "legislator_original_id": "42",
            "legislator_name": "Fulano",
            "date": "2024-03-05",
            "nature": "Combustível",
            "value": 120.5
        }))
        .unwrap();
        assert_eq!(r.supplier, None);
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }
}
