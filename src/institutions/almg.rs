use async_trait::async_trait;

use crate::error::CollectError;

use super::{
    collector::{Collector, CollectorContext, UpdateLegislators, UpdateLegislatorsData},
    common::InstitutionBase,
    InstitutionCode,
};

/// Assembleia Legislativa de Minas Gerais
///
/// The only institution publishing all three feeds:
/// - legislators: full roster with party
/// - expenses: indemnity expenses per deputy
/// - legislator_details: contact data, synced after expenses so deputies
///   first seen in the expense feed also get their details
pub struct Almg {
    base: InstitutionBase,
}

impl Almg {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            base: InstitutionBase::new(InstitutionCode::Almg, ctx),
        }
    }
}

#[async_trait]
impl Collector for Almg {
    fn code(&self) -> InstitutionCode {
        self.base.code()
    }

    async fn update_data(&mut self) -> Result<(), CollectError> {
        self.base.sync_expenses().await
    }

    fn as_update_legislators(&mut self) -> Option<&mut dyn UpdateLegislators> {
        Some(self)
    }

    fn as_update_legislators_data(&mut self) -> Option<&mut dyn UpdateLegislatorsData> {
        Some(self)
    }
}

#[async_trait]
impl UpdateLegislators for Almg {
    async fn update_legislators(&mut self) -> Result<(), CollectError> {
        self.base.sync_legislators().await
    }
}

#[async_trait]
impl UpdateLegislatorsData for Almg {
    async fn update_legislators_data(&mut self) -> Result<(), CollectError> {
        self.base.sync_legislator_details().await
    }
}
