use async_trait::async_trait;

use crate::error::CollectError;

use super::{
    collector::{Collector, CollectorContext},
    common::InstitutionBase,
    InstitutionCode,
};

/// Câmara Municipal de São Paulo
///
/// Only the expense feed is published.
pub struct Cmsp {
    base: InstitutionBase,
}

impl Cmsp {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            base: InstitutionBase::new(InstitutionCode::Cmsp, ctx),
        }
    }
}

#[async_trait]
impl Collector for Cmsp {
    fn code(&self) -> InstitutionCode {
        self.base.code()
    }

    async fn update_data(&mut self) -> Result<(), CollectError> {
        self.base.sync_expenses().await
    }
}
