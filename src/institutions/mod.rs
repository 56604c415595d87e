//! Institution collector registry and factory
//!
//! This module provides:
//! - The enumerated set of supported institution codes
//! - Per-institution metadata (siglum, name, legislative calendar)
//! - A factory function resolving a collector by code
//!
//! Institution-specific behaviour lives in the dedicated collector
//! modules. The rest of the application interacts exclusively through
//! the `Collector` trait.

pub mod collector;
mod common;

mod algo;
mod almg;
mod cdep;
mod cmbh;
mod cmsp;
mod senado;

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::CommandError;
use collector::{Collector, CollectorContext};

pub use algo::Algo;
pub use almg::Almg;
pub use cdep::CamaraDosDeputados;
pub use cmbh::Cmbh;
pub use cmsp::Cmsp;
pub use senado::Senado;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstitutionCode {
    Almg,
    Algo,
    Senado,
    Cmbh,
    Cmsp,
    Cdep,
}

impl InstitutionCode {
    pub const ALL: [InstitutionCode; 6] = [
        InstitutionCode::Almg,
        InstitutionCode::Algo,
        InstitutionCode::Senado,
        InstitutionCode::Cmbh,
        InstitutionCode::Cmsp,
        InstitutionCode::Cdep,
    ];

    /// Command-line code, lower case.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionCode::Almg => "almg",
            InstitutionCode::Algo => "algo",
            InstitutionCode::Senado => "senado",
            InstitutionCode::Cmbh => "cmbh",
            InstitutionCode::Cmsp => "cmsp",
            InstitutionCode::Cdep => "cdep",
        }
    }

    pub fn siglum(&self) -> &'static str {
        match self {
            InstitutionCode::Almg => "ALMG",
            InstitutionCode::Algo => "ALGO",
            InstitutionCode::Senado => "SENADO",
            InstitutionCode::Cmbh => "CMBH",
            InstitutionCode::Cmsp => "CMSP",
            InstitutionCode::Cdep => "CDEP",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InstitutionCode::Almg => "Assembleia Legislativa do Estado de Minas Gerais",
            InstitutionCode::Algo => "Assembleia Legislativa do Estado de Goiás",
            InstitutionCode::Senado => "Senado Federal",
            InstitutionCode::Cmbh => "Câmara Municipal de Belo Horizonte",
            InstitutionCode::Cmsp => "Câmara Municipal de São Paulo",
            InstitutionCode::Cdep => "Câmara dos Deputados",
        }
    }

    pub fn calendar(&self) -> Calendar {
        match self {
            InstitutionCode::Cmbh | InstitutionCode::Cmsp => Calendar::Municipal,
            _ => Calendar::StateFederal,
        }
    }
}

impl fmt::Display for InstitutionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstitutionCode {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        InstitutionCode::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| CommandError::UnknownInstitution(s.to_string()))
    }
}

/// Legislative calendar of an institution.
///
/// Both calendars use four-year terms:
/// - State assemblies and federal houses start Feb 1 of 2023, 2027, ...
/// - Municipal councils start Jan 1 of 2025, 2029, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    StateFederal,
    Municipal,
}

impl Calendar {
    /// Start (inclusive) and end (exclusive) of the term containing `day`.
    pub fn term_containing(&self, day: NaiveDate) -> (NaiveDate, NaiveDate) {
        let (anchor, month) = match self {
            Calendar::StateFederal => (3, 2),
            Calendar::Municipal => (1, 1),
        };

        let mut year = day.year() - (day.year() - anchor).rem_euclid(4);
        if day < first_of(year, month) {
            year -= 4;
        }
        (first_of(year, month), first_of(year + 4, month))
    }
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Returns the collector responsible for `code`.
///
/// This function acts as the **central factory / registry** for all
/// supported institutions. Each call builds a fresh collector scoped
/// to one command invocation.
pub fn get_collector(code: InstitutionCode, ctx: CollectorContext) -> Box<dyn Collector> {
    match code {
        InstitutionCode::Almg => Box::new(Almg::new(ctx)),
        InstitutionCode::Algo => Box::new(Algo::new(ctx)),
        InstitutionCode::Senado => Box::new(Senado::new(ctx)),
        InstitutionCode::Cmbh => Box::new(Cmbh::new(ctx)),
        InstitutionCode::Cmsp => Box::new(Cmsp::new(ctx)),
        InstitutionCode::Cdep => Box::new(CamaraDosDeputados::new(ctx)),
    }
}
