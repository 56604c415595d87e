//! Persistence layer for collected records.
//!
//! Collectors and commands interact exclusively through the `Store`
//! trait. `JsonStore` is the only backend: it keeps every record in
//! memory and, when opened on a file, rewrites that file after each
//! mutation. Collectors go through the bulk operations so a whole feed
//! costs one rewrite rather than one per record.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::schema::{
    CollectionRun, Consolidation, Expense, ExpenseRecord, Institution, Legislator,
    LegislatorDetails, LegislatorRecord, Legislature,
};

pub trait Store: Send + Sync {
    /// Returns the institution with `siglum`, creating it if needed.
    fn institution(&self, siglum: &str, name: &str) -> Result<Institution, StoreError>;

    fn legislatures(&self, institution_id: u64) -> Result<Vec<Legislature>, StoreError>;

    fn create_legislature(
        &self,
        institution_id: u64,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Legislature, StoreError>;

    /// Inserts or updates a legislator keyed by `original_id`.
    fn upsert_legislator(
        &self,
        institution_id: u64,
        record: &LegislatorRecord,
    ) -> Result<Legislator, StoreError>;

    /// Upserts every record in one write, returning the legislators in
    /// record order.
    fn upsert_legislators(
        &self,
        institution_id: u64,
        records: &[LegislatorRecord],
    ) -> Result<Vec<Legislator>, StoreError>;

    fn find_legislator(
        &self,
        institution_id: u64,
        original_id: &str,
    ) -> Result<Option<Legislator>, StoreError>;

    fn legislators(&self, institution_id: u64) -> Result<Vec<Legislator>, StoreError>;

    fn update_legislator_details(
        &self,
        legislator_id: u64,
        details: LegislatorDetails,
    ) -> Result<(), StoreError>;

    /// Replaces the details of several legislators in one write. Nothing is
    /// stored when any id is unknown.
    fn update_legislators_details(
        &self,
        updates: Vec<(u64, LegislatorDetails)>,
    ) -> Result<(), StoreError>;

    fn create_collection_run(
        &self,
        institution: &str,
        legislature_id: u64,
    ) -> Result<CollectionRun, StoreError>;

    fn add_expense(
        &self,
        collection_run_id: u64,
        legislator_id: u64,
        record: &ExpenseRecord,
    ) -> Result<Expense, StoreError>;

    /// Adds every record to an open run in one write. Legislators of the
    /// institution not known yet are created from the record's name.
    fn add_expenses(
        &self,
        collection_run_id: u64,
        institution_id: u64,
        records: &[ExpenseRecord],
    ) -> Result<Vec<Expense>, StoreError>;

    fn commit_collection_run(&self, collection_run_id: u64) -> Result<(), StoreError>;

    /// Highest collection run id handed out so far (0 when none).
    fn last_collection_run_id(&self) -> Result<u64, StoreError>;

    /// Runs of `institution` with an id greater than `after_id`, oldest first.
    fn collection_runs(
        &self,
        institution: &str,
        after_id: u64,
    ) -> Result<Vec<CollectionRun>, StoreError>;

    fn latest_committed_run(&self, institution: &str) -> Result<Option<CollectionRun>, StoreError>;

    fn expenses_for_run(&self, collection_run_id: u64) -> Result<Vec<Expense>, StoreError>;

    fn legislator(&self, legislator_id: u64) -> Result<Legislator, StoreError>;

    /// Stores `consolidation`, replacing the institution's previous one.
    fn save_consolidation(&self, consolidation: Consolidation) -> Result<(), StoreError>;

    fn consolidation(&self, institution: &str) -> Result<Option<Consolidation>, StoreError>;
}

// ------------------------------------------------------------
// On-disk state
// ------------------------------------------------------------
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreState {
    next_id: u64,
    institutions: Vec<Institution>,
    legislatures: Vec<Legislature>,
    legislators: Vec<Legislator>,
    collection_runs: Vec<CollectionRun>,
    expenses: Vec<Expense>,
    consolidations: Vec<Consolidation>,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn run_mut(&mut self, id: u64) -> Result<&mut CollectionRun, StoreError> {
        self.collection_runs
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::UnknownRun(id))
    }

    fn open_run(&mut self, id: u64) -> Result<(), StoreError> {
        if self.run_mut(id)?.committed {
            return Err(StoreError::RunCommitted(id));
        }
        Ok(())
    }

    fn upsert_legislator(&mut self, institution_id: u64, record: &LegislatorRecord) -> Legislator {
        if let Some(existing) = self
            .legislators
            .iter_mut()
            .find(|l| l.institution_id == institution_id && l.original_id == record.original_id)
        {
            existing.name = record.name.clone();
            if record.party.is_some() {
                existing.party = record.party.clone();
            }
            return existing.clone();
        }

        let legislator = Legislator {
            id: self.next_id(),
            institution_id,
            original_id: record.original_id.clone(),
            name: record.name.clone(),
            party: record.party.clone(),
            details: None,
        };
        self.legislators.push(legislator.clone());
        legislator
    }

    fn push_expense(
        &mut self,
        collection_run_id: u64,
        legislator_id: u64,
        record: &ExpenseRecord,
    ) -> Expense {
        let expense = Expense {
            id: self.next_id(),
            collection_run_id,
            legislator_id,
            date: record.date,
            nature: record.nature.clone(),
            supplier: record.supplier.clone(),
            value: record.value,
        };
        self.expenses.push(expense.clone());
        expense
    }
}

/// JSON-file backed store.
///
/// A mutation is applied to a copy of the state, the copy is written to
/// disk, and only then does it replace the in-memory state. A failed
/// write leaves memory and file agreeing on the previous state.
pub struct JsonStore {
    state: Mutex<StoreState>,
    path: Option<PathBuf>,
    writes: AtomicUsize,
}

impl JsonStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            path: None,
            writes: AtomicUsize::new(0),
        }
    }

    /// Opens the store file at `path`. A missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        debug!("store opened at {}", path.display());
        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
            writes: AtomicUsize::new(0),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Number of times the store file has been rewritten since opening.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Runs `f` on the locked state and persists the result.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.lock()?;
        self.apply(&mut state, f)
    }

    /// Without a file there is no copy to throw away, so `f` must not
    /// leave `state` half-changed when it fails.
    fn apply<T>(
        &self,
        state: &mut StoreState,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if self.path.is_none() {
            return f(state);
        }

        let mut next = state.clone();
        let out = f(&mut next)?;
        self.flush(&next)?;
        *state = next;
        Ok(out)
    }

    fn flush(&self, state: &StoreState) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Store for JsonStore {
    fn institution(&self, siglum: &str, name: &str) -> Result<Institution, StoreError> {
        let mut state = self.lock()?;
        if let Some(found) = state.institutions.iter().find(|i| i.siglum == siglum) {
            return Ok(found.clone());
        }

        self.apply(&mut state, |s| {
            let institution = Institution {
                id: s.next_id(),
                siglum: siglum.to_string(),
                name: name.to_string(),
            };
            s.institutions.push(institution.clone());
            Ok(institution)
        })
    }

    fn legislatures(&self, institution_id: u64) -> Result<Vec<Legislature>, StoreError> {
        Ok(self
            .lock()?
            .legislatures
            .iter()
            .filter(|l| l.institution_id == institution_id)
            .cloned()
            .collect())
    }

    fn create_legislature(
        &self,
        institution_id: u64,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Legislature, StoreError> {
        self.mutate(|s| {
            if !s.institutions.iter().any(|i| i.id == institution_id) {
                return Err(StoreError::UnknownInstitution(institution_id.to_string()));
            }
            let legislature = Legislature {
                id: s.next_id(),
                institution_id,
                date_start,
                date_end,
            };
            s.legislatures.push(legislature.clone());
            Ok(legislature)
        })
    }

    fn upsert_legislator(
        &self,
        institution_id: u64,
        record: &LegislatorRecord,
    ) -> Result<Legislator, StoreError> {
        self.mutate(|s| Ok(s.upsert_legislator(institution_id, record)))
    }

    fn upsert_legislators(
        &self,
        institution_id: u64,
        records: &[LegislatorRecord],
    ) -> Result<Vec<Legislator>, StoreError> {
        self.mutate(|s| {
            Ok(records
                .iter()
                .map(|r| s.upsert_legislator(institution_id, r))
                .collect())
        })
    }

    fn find_legislator(
        &self,
        institution_id: u64,
        original_id: &str,
    ) -> Result<Option<Legislator>, StoreError> {
        Ok(self
            .lock()?
            .legislators
            .iter()
            .find(|l| l.institution_id == institution_id && l.original_id == original_id)
            .cloned())
    }

    fn legislators(&self, institution_id: u64) -> Result<Vec<Legislator>, StoreError> {
        Ok(self
            .lock()?
            .legislators
            .iter()
            .filter(|l| l.institution_id == institution_id)
            .cloned()
            .collect())
    }

    fn update_legislator_details(
        &self,
        legislator_id: u64,
        details: LegislatorDetails,
    ) -> Result<(), StoreError> {
        self.update_legislators_details(vec![(legislator_id, details)])
    }

    fn update_legislators_details(
        &self,
        updates: Vec<(u64, LegislatorDetails)>,
    ) -> Result<(), StoreError> {
        self.mutate(|s| {
            if let Some((missing, _)) = updates
                .iter()
                .find(|(id, _)| !s.legislators.iter().any(|l| l.id == *id))
            {
                return Err(StoreError::UnknownLegislator(*missing));
            }
            for (id, details) in updates {
                if let Some(legislator) = s.legislators.iter_mut().find(|l| l.id == id) {
                    legislator.details = Some(details);
                }
            }
            Ok(())
        })
    }

    fn create_collection_run(
        &self,
        institution: &str,
        legislature_id: u64,
    ) -> Result<CollectionRun, StoreError> {
        self.mutate(|s| {
            let run = CollectionRun {
                id: s.next_id(),
                institution: institution.to_string(),
                legislature_id,
                date: Utc::now(),
                committed: false,
            };
            s.collection_runs.push(run.clone());
            Ok(run)
        })
    }

    fn add_expense(
        &self,
        collection_run_id: u64,
        legislator_id: u64,
        record: &ExpenseRecord,
    ) -> Result<Expense, StoreError> {
        self.mutate(|s| {
            s.open_run(collection_run_id)?;
            Ok(s.push_expense(collection_run_id, legislator_id, record))
        })
    }

    fn add_expenses(
        &self,
        collection_run_id: u64,
        institution_id: u64,
        records: &[ExpenseRecord],
    ) -> Result<Vec<Expense>, StoreError> {
        self.mutate(|s| {
            s.open_run(collection_run_id)?;

            let mut ids: HashMap<String, u64> = s
                .legislators
                .iter()
                .filter(|l| l.institution_id == institution_id)
                .map(|l| (l.original_id.clone(), l.id))
                .collect();

            let mut expenses = Vec::with_capacity(records.len());
            for record in records {
                let legislator_id = match ids.get(&record.legislator_original_id) {
                    Some(id) => *id,
                    None => {
                        let legislator = s.upsert_legislator(
                            institution_id,
                            &LegislatorRecord {
                                original_id: record.legislator_original_id.clone(),
                                name: record.legislator_name.clone(),
                                party: None,
                            },
                        );
                        ids.insert(legislator.original_id, legislator.id);
                        legislator.id
                    }
                };
                expenses.push(s.push_expense(collection_run_id, legislator_id, record));
            }
            Ok(expenses)
        })
    }

    fn commit_collection_run(&self, collection_run_id: u64) -> Result<(), StoreError> {
        self.mutate(|s| {
            s.run_mut(collection_run_id)?.committed = true;
            Ok(())
        })
    }

    fn last_collection_run_id(&self) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .collection_runs
            .iter()
            .map(|r| r.id)
            .max()
            .unwrap_or(0))
    }

    fn collection_runs(
        &self,
        institution: &str,
        after_id: u64,
    ) -> Result<Vec<CollectionRun>, StoreError> {
        let mut runs: Vec<_> = self
            .lock()?
            .collection_runs
            .iter()
            .filter(|r| r.institution == institution && r.id > after_id)
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.id);
        Ok(runs)
    }

    fn latest_committed_run(&self, institution: &str) -> Result<Option<CollectionRun>, StoreError> {
        Ok(self
            .lock()?
            .collection_runs
            .iter()
            .filter(|r| r.institution == institution && r.committed)
            .max_by_key(|r| r.id)
            .cloned())
    }

    fn expenses_for_run(&self, collection_run_id: u64) -> Result<Vec<Expense>, StoreError> {
        Ok(self
            .lock()?
            .expenses
            .iter()
            .filter(|e| e.collection_run_id == collection_run_id)
            .cloned()
            .collect())
    }

    fn legislator(&self, legislator_id: u64) -> Result<Legislator, StoreError> {
        self.lock()?
            .legislators
            .iter()
            .find(|l| l.id == legislator_id)
            .cloned()
            .ok_or(StoreError::UnknownLegislator(legislator_id))
    }

    fn save_consolidation(&self, consolidation: Consolidation) -> Result<(), StoreError> {
        self.mutate(|s| {
            s.consolidations
                .retain(|c| c.institution != consolidation.institution);
            s.consolidations.push(consolidation);
            Ok(())
        })
    }

    fn consolidation(&self, institution: &str) -> Result<Option<Consolidation>, StoreError> {
        Ok(self
            .lock()?
            .consolidations
            .iter()
            .find(|c| c.institution == institution)
            .cloned())
    }
}
