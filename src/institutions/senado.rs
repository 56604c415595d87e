use async_trait::async_trait;

use crate::error::CollectError;

use super::{
    collector::{Collector, CollectorContext},
    common::InstitutionBase,
    InstitutionCode,
};

/// Senado Federal
///
/// Senators and their expenses come from the same feed; senators
/// are created on the fly from expense records.
pub struct Senado {
    base: InstitutionBase,
}

impl Senado {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            base: InstitutionBase::new(InstitutionCode::Senado, ctx),
        }
    }
}

#[async_trait]
impl Collector for Senado {
    fn code(&self) -> InstitutionCode {
        self.base.code()
    }

    async fn update_data(&mut self) -> Result<(), CollectError> {
        self.base.sync_expenses().await
    }
}
