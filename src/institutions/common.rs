use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::Ordering;

use crate::{
    error::CollectError,
    metrics::METRICS,
    schema::{
        ExpenseRecord, Institution, LegislatorDetailsRecord, LegislatorRecord, Legislature,
    },
    source::Feed,
    util,
};

use super::{collector::CollectorContext, InstitutionCode};

/// State and behaviour shared by every institution collector.
///
/// Concrete collectors own one `InstitutionBase` and forward their
/// capabilities to it. The institution and its current legislature
/// are resolved lazily and cached for the collector's lifetime.
pub struct InstitutionBase {
    code: InstitutionCode,
    ctx: CollectorContext,
    institution: Option<Institution>,
    legislature: Option<Legislature>,
}

impl InstitutionBase {
    pub fn new(code: InstitutionCode, ctx: CollectorContext) -> Self {
        Self {
            code,
            ctx,
            institution: None,
            legislature: None,
        }
    }

    pub fn code(&self) -> InstitutionCode {
        self.code
    }

    pub fn institution(&mut self) -> Result<Institution, CollectError> {
        if let Some(institution) = &self.institution {
            return Ok(institution.clone());
        }
        let institution = self
            .ctx
            .store
            .institution(self.code.siglum(), self.code.name())?;
        self.institution = Some(institution.clone());
        Ok(institution)
    }

    /// The legislature in office today, created from the institution's
    /// calendar when the store has none.
    pub fn legislature(&mut self) -> Result<Legislature, CollectError> {
        if let Some(legislature) = &self.legislature {
            return Ok(legislature.clone());
        }

        let institution = self.institution()?;
        let today = util::today();
        let current = self
            .ctx
            .store
            .legislatures(institution.id)?
            .into_iter()
            .filter(|l| l.contains(today))
            .max_by_key(|l| l.date_start);

        let legislature = match current {
            Some(l) => l,
            None => {
                let (start, end) = self.code.calendar().term_containing(today);
                info!(
                    "{}: creating legislature {} .. {}",
                    self.code.siglum(),
                    start,
                    end
                );
                self.ctx
                    .store
                    .create_legislature(institution.id, start, end)?
            }
        };

        self.legislature = Some(legislature.clone());
        Ok(legislature)
    }

    async fn fetch<T: DeserializeOwned>(&self, feed: Feed) -> Result<Vec<T>, CollectError> {
        let raw = self.ctx.source.fetch(self.code.siglum(), feed).await?;
        debug!("{}: {} {} records", self.code.siglum(), raw.len(), feed);
        raw.into_iter().map(|v| decode(feed, v)).collect()
    }

    pub async fn sync_legislators(&mut self) -> Result<(), CollectError> {
        let institution = self.institution()?;
        let mut records: Vec<LegislatorRecord> = self.fetch(Feed::Legislators).await?;

        for record in &mut records {
            record.name = util::normalize_name(&record.name);
        }
        self.ctx.store.upsert_legislators(institution.id, &records)?;
        Ok(())
    }

    /// Opens a collection run, stores every expense and commits the run.
    ///
    /// A failure leaves the run uncommitted.
    pub async fn sync_expenses(&mut self) -> Result<(), CollectError> {
        let institution = self.institution()?;
        let legislature = self.legislature()?;
        let mut records: Vec<ExpenseRecord> = self.fetch(Feed::Expenses).await?;

        for record in &mut records {
            record.legislator_name = util::normalize_name(&record.legislator_name);
        }

        let store = &self.ctx.store;
        let run = store.create_collection_run(&institution.siglum, legislature.id)?;
        let stored = store.add_expenses(run.id, institution.id, &records)?;
        METRICS
            .expenses_stored
            .fetch_add(stored.len(), Ordering::Relaxed);

        store.commit_collection_run(run.id)?;
        info!(
            "{}: collection run {} committed with {} expenses",
            institution.siglum,
            run.id,
            stored.len()
        );
        Ok(())
    }

    pub async fn sync_legislator_details(&mut self) -> Result<(), CollectError> {
        let institution = self.institution()?;
        let records: Vec<LegislatorDetailsRecord> = self.fetch(Feed::LegislatorDetails).await?;

        let known: HashMap<String, u64> = self
            .ctx
            .store
            .legislators(institution.id)?
            .into_iter()
            .map(|l| (l.original_id, l.id))
            .collect();

        let mut updates = Vec::with_capacity(records.len());
        for record in records {
            let Some(&id) = known.get(&record.original_id) else {
                warn!(
                    "{}: details for unknown legislator {} skipped",
                    institution.siglum, record.original_id
                );
                continue;
            };
            updates.push((id, record.into()));
        }

        if !updates.is_empty() {
            self.ctx.store.update_legislators_details(updates)?;
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(feed: Feed, value: Value) -> Result<T, CollectError> {
    serde_json::from_value(value).map_err(|source| CollectError::Decode {
        feed: feed.to_string(),
        source,
    })
}
