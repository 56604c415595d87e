use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CollectError;
use crate::source::DataSource;
use crate::store::Store;

use super::InstitutionCode;

/// The update operations a collector may offer.
///
/// Listed in dispatch order: a collector's capabilities are always
/// invoked legislators → data → legislators data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    UpdateLegislators,
    UpdateData,
    UpdateLegislatorsData,
}

impl Capability {
    pub const ORDER: [Capability; 3] = [
        Capability::UpdateLegislators,
        Capability::UpdateData,
        Capability::UpdateLegislatorsData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::UpdateLegislators => "update_legislators",
            Capability::UpdateData => "update_data",
            Capability::UpdateLegislatorsData => "update_legislators_data",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a collector needs from the outside world.
///
/// Built once per command invocation and shared by every collector
/// created during it.
#[derive(Clone)]
pub struct CollectorContext {
    pub store: Arc<dyn Store>,
    pub source: Arc<dyn DataSource>,
}

/// Syncs the legislator roster of an institution.
#[async_trait]
pub trait UpdateLegislators: Send {
    async fn update_legislators(&mut self) -> Result<(), CollectError>;
}

/// Syncs per-legislator details (contact information).
#[async_trait]
pub trait UpdateLegislatorsData: Send {
    async fn update_legislators_data(&mut self) -> Result<(), CollectError>;
}

/// Collector is the abstraction between the collect command and a
/// single institution.
///
/// Every collector syncs expense data (`update_data`). The two optional
/// capabilities are exposed through accessors: a collector that does
/// not support one keeps the default `None`, so the orchestrator can
/// never call it.
///
/// LIFECYCLE:
/// - Created by the registry for one command invocation
/// - Dropped once its institution has been collected
///
#[async_trait]
pub trait Collector: Send {
    fn code(&self) -> InstitutionCode;

    /// Syncs the institution's expense data.
    ///
    /// Opens exactly one collection run and commits it when every
    /// record has been stored.
    async fn update_data(&mut self) -> Result<(), CollectError>;

    fn as_update_legislators(&mut self) -> Option<&mut dyn UpdateLegislators> {
        None
    }

    fn as_update_legislators_data(&mut self) -> Option<&mut dyn UpdateLegislatorsData> {
        None
    }

    /// Declared capabilities, in dispatch order.
    fn capabilities(&mut self) -> Vec<Capability> {
        let mut caps = Vec::with_capacity(3);
        if self.as_update_legislators().is_some() {
            caps.push(Capability::UpdateLegislators);
        }
        caps.push(Capability::UpdateData);
        if self.as_update_legislators_data().is_some() {
            caps.push(Capability::UpdateLegislatorsData);
        }
        caps
    }
}
