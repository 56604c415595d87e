use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::info;

use crate::{
    error::CommandError,
    institutions::InstitutionCode,
    metrics::METRICS,
    schema::{Consolidation, LegislatorTotal},
    store::Store,
    util,
};

use super::{Command, CommandTable};

/// `consolidate <code>`
///
/// Aggregates the latest committed collection run of an institution
/// into per-legislator totals, replacing its previous consolidation.
pub struct ConsolidateCommand {
    store: Arc<dyn Store>,
}

impl ConsolidateCommand {
    pub const NAME: &'static str = "consolidate";

    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn consolidate(&self, code: InstitutionCode) -> Result<Consolidation, CommandError> {
        let siglum = code.siglum();
        let run = self
            .store
            .latest_committed_run(siglum)?
            .ok_or_else(|| CommandError::NothingToConsolidate(code.to_string()))?;

        let mut per_legislator: BTreeMap<u64, (usize, f64)> = BTreeMap::new();
        for expense in self.store.expenses_for_run(run.id)? {
            let entry = per_legislator.entry(expense.legislator_id).or_default();
            entry.0 += 1;
            entry.1 += expense.value;
        }

        let mut legislators = Vec::with_capacity(per_legislator.len());
        for (legislator_id, (expenses, total)) in per_legislator {
            legislators.push(LegislatorTotal {
                legislator_id,
                name: self.store.legislator(legislator_id)?.name,
                expenses,
                total: util::round_cents(total),
            });
        }
        // Biggest spenders first; name breaks ties.
        legislators.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.name.cmp(&b.name))
        });

        let total = util::round_cents(legislators.iter().map(|l| l.total).sum());
        let consolidation = Consolidation {
            institution: siglum.to_string(),
            collection_run_id: run.id,
            generated_at: Utc::now(),
            legislators,
            total,
        };

        self.store.save_consolidation(consolidation.clone())?;
        METRICS.consolidations.fetch_add(1, Ordering::Relaxed);
        info!(
            "{}: consolidated run {} ({} legislators, R$ {:.2})",
            siglum,
            run.id,
            consolidation.legislators.len(),
            consolidation.total
        );
        Ok(consolidation)
    }
}

#[async_trait]
impl Command for ConsolidateCommand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, _table: &CommandTable, args: &[String]) -> Result<(), CommandError> {
        let [code] = args else {
            return Err(CommandError::Usage(
                "consolidate <institution>".to_string(),
            ));
        };
        self.consolidate(code.parse()?).map(|_| ())
    }
}
