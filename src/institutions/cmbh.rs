use async_trait::async_trait;

use crate::error::CollectError;

use super::{
    collector::{Collector, CollectorContext, UpdateLegislators},
    common::InstitutionBase,
    InstitutionCode,
};

/// Câmara Municipal de Belo Horizonte
///
/// Municipal calendar (terms start Jan 1). Roster and expenses.
pub struct Cmbh {
    base: InstitutionBase,
}

impl Cmbh {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            base: InstitutionBase::new(InstitutionCode::Cmbh, ctx),
        }
    }
}

#[async_trait]
impl Collector for Cmbh {
    fn code(&self) -> InstitutionCode {
        self.base.code()
    }

    async fn update_data(&mut self) -> Result<(), CollectError> {
        self.base.sync_expenses().await
    }

    fn as_update_legislators(&mut self) -> Option<&mut dyn UpdateLegislators> {
        Some(self)
    }
}

#[async_trait]
impl UpdateLegislators for Cmbh {
    async fn update_legislators(&mut self) -> Result<(), CollectError> {
        self.base.sync_legislators().await
    }
}
