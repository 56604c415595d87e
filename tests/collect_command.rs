// tests/collect_command.rs
//
// Orchestration tests for `collect`: capability dispatch per institution,
// consolidation ordering, run tracking and failure propagation.
//
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Value};

use montanha::commands::{
    CollectCommand, CollectorFactory, Command, CommandTable, ConsolidateCommand, Registry,
};
use montanha::error::{CollectError, CommandError};
use montanha::institutions::collector::{
    Capability, Collector, CollectorContext, UpdateLegislators, UpdateLegislatorsData,
};
use montanha::institutions::InstitutionCode;
use montanha::source::{Feed, StaticSource};
use montanha::store::{JsonStore, Store};
use montanha::util;

type Log = Arc<Mutex<Vec<String>>>;

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

// ------------------------------------------------------------
// Recording collector
// ------------------------------------------------------------
//
// Wraps a real collector, logs every capability call, and exposes
// exactly the capabilities the wrapped collector declares.
//
struct Recording {
    inner: Box<dyn Collector>,
    log: Log,
}

impl Recording {
    fn record(&self, what: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.{}", self.inner.code(), what));
    }
}

#[async_trait]
impl Collector for Recording {
    fn code(&self) -> InstitutionCode {
        self.inner.code()
    }

    async fn update_data(&mut self) -> Result<(), CollectError> {
        self.record("update_data");
        self.inner.update_data().await
    }

    fn as_update_legislators(&mut self) -> Option<&mut dyn UpdateLegislators> {
        if self.inner.as_update_legislators().is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_update_legislators_data(&mut self) -> Option<&mut dyn UpdateLegislatorsData> {
        if self.inner.as_update_legislators_data().is_some() {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl UpdateLegislators for Recording {
    async fn update_legislators(&mut self) -> Result<(), CollectError> {
        self.record("update_legislators");
        match self.inner.as_update_legislators() {
            Some(c) => c.update_legislators().await,
            None => unreachable!("only reachable through a declared capability"),
        }
    }
}

#[async_trait]
impl UpdateLegislatorsData for Recording {
    async fn update_legislators_data(&mut self) -> Result<(), CollectError> {
        self.record("update_legislators_data");
        match self.inner.as_update_legislators_data() {
            Some(c) => c.update_legislators_data().await,
            None => unreachable!("only reachable through a declared capability"),
        }
    }
}

struct RecordingFactory {
    log: Log,
}

impl CollectorFactory for RecordingFactory {
    fn build(&self, code: InstitutionCode, ctx: CollectorContext) -> Box<dyn Collector> {
        self.log.lock().unwrap().push(format!("build {code}"));
        Box::new(Recording {
            inner: Registry.build(code, ctx),
            log: self.log.clone(),
        })
    }
}

/// Stands in for `consolidate`, recording its arguments.
struct RecordingConsolidate {
    log: Log,
}

#[async_trait]
impl Command for RecordingConsolidate {
    fn name(&self) -> &'static str {
        ConsolidateCommand::NAME
    }

    async fn handle(&self, _table: &CommandTable, args: &[String]) -> Result<(), CommandError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("consolidate {}", args.join(" ")));
        Ok(())
    }
}

// ------------------------------------------------------------
// Fixtures
// ------------------------------------------------------------
fn feeds() -> StaticSource {
    let mut source = StaticSource::new();
    for code in InstitutionCode::ALL {
        let siglum = code.siglum();
        source = source
            .with_feed(
                siglum,
                Feed::Legislators,
                vec![json!({ "original_id": "1", "name": "Maria Souza", "party": "PSB" })],
            )
            .with_feed(
                siglum,
                Feed::Expenses,
                vec![
                    expense("1", "Maria Souza", 150.25),
                    expense("2", "João  Pereira", 80.0),
                ],
            )
            .with_feed(
                siglum,
                Feed::LegislatorDetails,
                vec![json!({ "original_id": "1", "email": "maria@example.org" })],
            );
    }
    source
}

fn expense(original_id: &str, name: &str, value: f64) -> Value {
    json!({
        "legislator_original_id": original_id,
        "legislator_name": name,
        "date": "2026-09-01",
        "nature": "Combustíveis e lubrificantes",
        "supplier": "Posto Central",
        "value": value
    })
}

struct Harness {
    store: Arc<JsonStore>,
    log: Log,
    table: CommandTable,
    collect: Arc<CollectCommand>,
}

fn harness_with(source: StaticSource, real_consolidate: bool) -> Harness {
    let store = Arc::new(JsonStore::in_memory());
    let log: Log = Arc::default();
    let ctx = CollectorContext {
        store: store.clone(),
        source: Arc::new(source),
    };
    let collect = Arc::new(CollectCommand::with_factory(
        ctx,
        Arc::new(RecordingFactory { log: log.clone() }),
    ));

    let mut table = CommandTable::new();
    table.register(collect.clone());
    if real_consolidate {
        table.register(Arc::new(ConsolidateCommand::new(store.clone())));
    } else {
        table.register(Arc::new(RecordingConsolidate { log: log.clone() }));
    }

    Harness {
        store,
        log,
        table,
        collect,
    }
}

fn harness() -> Harness {
    harness_with(feeds(), false)
}

/// Institution with one legislature spanning four years from today.
fn create_institution(store: &JsonStore, code: InstitutionCode) {
    let institution = store.institution(code.siglum(), code.siglum()).unwrap();
    let date_start = util::today();
    let date_end = date_start + Duration::days(365 * 4);
    store
        .create_legislature(institution.id, date_start, date_end)
        .unwrap();
}

fn args(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

async fn collect_single(code: InstitutionCode) -> (Harness, Vec<String>) {
    let h = harness();
    create_institution(&h.store, code);

    h.table
        .call(CollectCommand::NAME, &args(&[code.as_str()]))
        .await
        .unwrap();

    let log = entries(&h.log);
    (h, log)
}

fn expected_log(code: &str, calls: &[&str]) -> Vec<String> {
    let mut out = vec![format!("build {code}")];
    out.extend(calls.iter().map(|c| format!("{code}.{c}")));
    out.push(format!("consolidate {code}"));
    out
}

// ------------------------------------------------------------
// Per-institution dispatch
// ------------------------------------------------------------
#[tokio::test]
async fn collect_without_institution() {
    let h = harness();
    let err = h.table.call(CollectCommand::NAME, &[]).await.unwrap_err();
    assert!(matches!(err, CommandError::Usage(_)));
    assert!(err.is_usage());
    assert!(entries(&h.log).is_empty(), "nothing may be built or consolidated");
}

#[tokio::test]
async fn collect_almg() {
    let (h, log) = collect_single(InstitutionCode::Almg).await;
    assert_eq!(
        log,
        expected_log(
            "almg",
            &["update_legislators", "update_data", "update_legislators_data"]
        )
    );

    let inst = h.store.institution("ALMG", "").unwrap();
    let maria = h.store.find_legislator(inst.id, "1").unwrap().unwrap();
    assert_eq!(maria.party.as_deref(), Some("PSB"));
    assert_eq!(
        maria.details.and_then(|d| d.email).as_deref(),
        Some("maria@example.org")
    );
}

#[tokio::test]
async fn collect_algo() {
    let (_, log) = collect_single(InstitutionCode::Algo).await;
    assert_eq!(log, expected_log("algo", &["update_legislators", "update_data"]));
}

#[tokio::test]
async fn collect_senado() {
    let (_, log) = collect_single(InstitutionCode::Senado).await;
    assert_eq!(log, expected_log("senado", &["update_data"]));
    assert!(!log.iter().any(|l| l.ends_with("update_legislators")));
}

#[tokio::test]
async fn collect_cmbh() {
    let (_, log) = collect_single(InstitutionCode::Cmbh).await;
    assert_eq!(log, expected_log("cmbh", &["update_legislators", "update_data"]));
}

#[tokio::test]
async fn collect_cmsp() {
    let (_, log) = collect_single(InstitutionCode::Cmsp).await;
    assert_eq!(log, expected_log("cmsp", &["update_data"]));
}

#[tokio::test]
async fn collect_cdep() {
    let (_, log) = collect_single(InstitutionCode::Cdep).await;
    assert_eq!(log, expected_log("cdep", &["update_data"]));
}

// ------------------------------------------------------------
// Runs, reports and ordering
// ------------------------------------------------------------
#[tokio::test]
async fn report_lists_the_run_opened_by_update_data() {
    let h = harness();
    create_institution(&h.store, InstitutionCode::Senado);

    let reports = h
        .collect
        .collect(&h.table, &args(&["senado"]))
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.institution, InstitutionCode::Senado);
    assert_eq!(report.capabilities, vec![Capability::UpdateData]);
    assert_eq!(report.runs.len(), 1);
    assert!(report.runs[0].committed);
    assert_eq!(report.expenses, 2);

    // The fixture legislature is the one in office today.
    let inst = h.store.institution("SENADO", "").unwrap();
    let legislatures = h.store.legislatures(inst.id).unwrap();
    assert_eq!(legislatures.len(), 1);
    assert_eq!(report.runs[0].legislature_id, legislatures[0].id);
}

#[tokio::test]
async fn earlier_runs_are_not_reported_again() {
    let h = harness();
    h.collect.collect(&h.table, &args(&["cmsp"])).await.unwrap();
    let second = h.collect.collect(&h.table, &args(&["cmsp"])).await.unwrap();

    assert_eq!(second[0].runs.len(), 1);
    assert_eq!(h.store.collection_runs("CMSP", 0).unwrap().len(), 2);
}

#[tokio::test]
async fn consolidates_each_institution_after_its_collection() {
    let h = harness();
    h.table
        .call(CollectCommand::NAME, &args(&["cdep", "ALGO"]))
        .await
        .unwrap();

    let mut expected = expected_log("cdep", &["update_data"]);
    expected.extend(expected_log("algo", &["update_legislators", "update_data"]));
    assert_eq!(entries(&h.log), expected);
}

#[tokio::test]
async fn unknown_institution_builds_nothing() {
    let h = harness();
    let err = h
        .table
        .call(CollectCommand::NAME, &args(&["almg", "alerj"]))
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::UnknownInstitution(ref c) if c == "alerj"));
    assert!(entries(&h.log).is_empty());
}

#[tokio::test]
async fn failing_collection_is_not_consolidated() {
    // No feeds at all for SENADO: update_data fails.
    let source = StaticSource::new().with_feed("CMSP", Feed::Expenses, vec![]);
    let h = harness_with(source, false);

    let err = h
        .table
        .call(CollectCommand::NAME, &args(&["cmsp", "senado", "cdep"]))
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::Collect { ref institution, .. } if institution == "senado"));
    assert_eq!(
        entries(&h.log),
        vec![
            "build cmsp",
            "cmsp.update_data",
            "consolidate cmsp",
            "build senado",
            "senado.update_data",
        ]
    );
}

#[tokio::test]
async fn undecodable_record_fails_the_capability() {
    let source = StaticSource::new().with_feed(
        "CDEP",
        Feed::Expenses,
        vec![json!({ "legislator_original_id": "1" })],
    );
    let h = harness_with(source, false);

    let err = h
        .table
        .call(CollectCommand::NAME, &args(&["cdep"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CommandError::Collect {
            source: CollectError::Decode { .. },
            ..
        }
    ));
    assert!(!entries(&h.log).contains(&"consolidate cdep".to_string()));
}

// ------------------------------------------------------------
// Zero runs
// ------------------------------------------------------------
struct Idle;

#[async_trait]
impl Collector for Idle {
    fn code(&self) -> InstitutionCode {
        InstitutionCode::Cmsp
    }

    async fn update_data(&mut self) -> Result<(), CollectError> {
        Ok(())
    }
}

struct IdleFactory;

impl CollectorFactory for IdleFactory {
    fn build(&self, _code: InstitutionCode, _ctx: CollectorContext) -> Box<dyn Collector> {
        Box::new(Idle)
    }
}

#[tokio::test]
async fn no_runs_still_consolidates() {
    let store = Arc::new(JsonStore::in_memory());
    let log: Log = Arc::default();
    let collect = Arc::new(CollectCommand::with_factory(
        CollectorContext {
            store: store.clone(),
            source: Arc::new(StaticSource::new()),
        },
        Arc::new(IdleFactory),
    ));
    let mut table = CommandTable::new();
    table
        .register(collect.clone())
        .register(Arc::new(RecordingConsolidate { log: log.clone() }));

    let reports = collect.collect(&table, &args(&["cmsp"])).await.unwrap();
    assert!(reports[0].runs.is_empty());
    assert_eq!(reports[0].expenses, 0);
    assert_eq!(entries(&log), vec!["consolidate cmsp"]);
}

// ------------------------------------------------------------
// End to end with the real consolidate command
// ------------------------------------------------------------
#[tokio::test]
async fn collect_then_consolidate_end_to_end() {
    let h = harness_with(feeds(), true);
    h.table
        .call(CollectCommand::NAME, &args(&["senado", "cmbh"]))
        .await
        .unwrap();

    for siglum in ["SENADO", "CMBH"] {
        let consolidation = h.store.consolidation(siglum).unwrap().unwrap();
        assert_eq!(consolidation.total, 230.25);
        assert_eq!(consolidation.legislators.len(), 2);
        assert_eq!(consolidation.legislators[0].name, "Maria Souza");
        assert_eq!(consolidation.legislators[1].name, "João Pereira");
    }
    assert!(h.store.consolidation("ALMG").unwrap().is_none());
}
