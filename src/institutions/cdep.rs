use async_trait::async_trait;

use crate::error::CollectError;

use super::{
    collector::{Collector, CollectorContext},
    common::InstitutionBase,
    InstitutionCode,
};

/// Câmara dos Deputados
pub struct CamaraDosDeputados {
    base: InstitutionBase,
}

impl CamaraDosDeputados {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            base: InstitutionBase::new(InstitutionCode::Cdep, ctx),
        }
    }
}

#[async_trait]
impl Collector for CamaraDosDeputados {
    fn code(&self) -> InstitutionCode {
        self.base.code()
    }

    async fn update_data(&mut self) -> Result<(), CollectError> {
        self.base.sync_expenses().await
    }
}
