use async_trait::async_trait;

use crate::error::CollectError;

use super::{
    collector::{Collector, CollectorContext, UpdateLegislators},
    common::InstitutionBase,
    InstitutionCode,
};

/// Assembleia Legislativa de Goiás
///
/// Publishes a roster and expenses; no per-deputy details.
pub struct Algo {
    base: InstitutionBase,
}

impl Algo {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            base: InstitutionBase::new(InstitutionCode::Algo, ctx),
        }
    }
}

#[async_trait]
impl Collector for Algo {
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
impl UpdateLegislators for Algo {
    async fn update_legislators(&mut self) -> Result<(), CollectError> {
        self.base.sync_legislators().await
    }
}
