use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::{
    collector::runner::dispatch,
    error::{CollectError, CommandError},
    institutions::{
        collector::{Capability, Collector, CollectorContext},
        get_collector, InstitutionCode,
    },
    metrics::METRICS,
    schema::CollectionRun,
};

use super::{Command, CommandTable};

/// Builds the collector for an institution code.
///
/// `Registry` is the production factory; tests substitute their own.
pub trait CollectorFactory: Send + Sync {
    fn build(&self, code: InstitutionCode, ctx: CollectorContext) -> Box<dyn Collector>;
}

/// Resolves collectors through the static institution registry.
pub struct Registry;

impl CollectorFactory for Registry {
    fn build(&self, code: InstitutionCode, ctx: CollectorContext) -> Box<dyn Collector> {
        get_collector(code, ctx)
    }
}

/// Outcome of collecting one institution.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectReport {
    pub institution: InstitutionCode,

    /// Capabilities invoked, in invocation order
    pub capabilities: Vec<Capability>,

    /// Collection runs opened while collecting this institution
    pub runs: Vec<CollectionRun>,

    /// Expenses stored across `runs`
    pub expenses: usize,
}

/// `collect <code> [<code> ...]`
///
/// For each institution, in argument order:
/// 1. build its collector
/// 2. run the collector's capabilities
/// 3. read back the collection runs it opened
/// 4. call `consolidate <code>`
///
/// CONTRACT:
/// - No codes → usage error, nothing is built
/// - Every code is validated before the first institution is collected
/// - Any failure aborts the command; institutions after the failing one
///   are neither collected nor consolidated
///
pub struct CollectCommand {
    ctx: CollectorContext,
    factory: Arc<dyn CollectorFactory>,
}

impl CollectCommand {
    pub const NAME: &'static str = "collect";

    pub fn new(ctx: CollectorContext) -> Self {
        Self::with_factory(ctx, Arc::new(Registry))
    }

    pub fn with_factory(ctx: CollectorContext, factory: Arc<dyn CollectorFactory>) -> Self {
        Self { ctx, factory }
    }

    pub fn parse_codes(args: &[String]) -> Result<Vec<InstitutionCode>, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(
                "collect <institution> [<institution> ...]; expected one of: almg, algo, senado, cmbh, cmsp, cdep"
                    .to_string(),
            ));
        }
        args.iter().map(|a| a.parse()).collect()
    }

    /// Collection runs of `code` opened after run id `after_id`.
    pub fn collection_runs(
        &self,
        code: InstitutionCode,
        after_id: u64,
    ) -> Result<Vec<CollectionRun>, CommandError> {
        Ok(self.ctx.store.collection_runs(code.siglum(), after_id)?)
    }

    pub async fn collect(
        &self,
        table: &CommandTable,
        args: &[String],
    ) -> Result<Vec<CollectReport>, CommandError> {
        let codes = Self::parse_codes(args)?;
        let mut reports = Vec::with_capacity(codes.len());

        for code in codes {
            let report = self.collect_one(code).await?;
            table
                .call(super::ConsolidateCommand::NAME, &[code.to_string()])
                .await?;
            reports.push(report);
        }

        Ok(reports)
    }

    async fn collect_one(&self, code: InstitutionCode) -> Result<CollectReport, CommandError> {
        let failed = |source: CollectError| CommandError::Collect {
            institution: code.to_string(),
            source,
        };

        let watermark = self.ctx.store.last_collection_run_id()?;

        info!("collecting {} ({})", code.siglum(), code.name());
        let mut collector = self.factory.build(code, self.ctx.clone());
        METRICS.collectors_started.fetch_add(1, Ordering::Relaxed);

        let capabilities = dispatch(&mut *collector).await.map_err(failed)?;
        drop(collector);

        let runs = self.collection_runs(code, watermark)?;
        let mut expenses = 0;
        for run in &runs {
            let stored = self.ctx.store.expenses_for_run(run.id)?.len();
            info!(
                "{}: run {} at {} ({}) with {} expenses",
                code.siglum(),
                run.id,
                run.date.format("%Y-%m-%d %H:%M:%S"),
                if run.committed { "committed" } else { "uncommitted" },
                stored
            );
            expenses += stored;
            METRICS.runs_seen.fetch_add(1, Ordering::Relaxed);
        }

        Ok(CollectReport {
            institution: code,
            capabilities,
            runs,
            expenses,
        })
    }
}

#[async_trait]
impl Command for CollectCommand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, table: &CommandTable, args: &[String]) -> Result<(), CommandError> {
        let reports = self.collect(table, args).await?;
        info!(
            "collected {} institution(s): {}",
            reports.len(),
            reports
                .iter()
                .map(|r| r.institution.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        info!("{}", METRICS.summary());
        Ok(())
    }
}
