/// Collector module
///
/// This module groups the logic driving a single institution collector
/// through its update operations.
///
/// The collector layer is the orchestration layer between:
/// - Institution collectors (ALMG, Senado, CMBH, …)
/// - The collect command (reporting, consolidation)
///
/// Design notes:
/// - Institution-specific logic MUST NOT live here
/// - All heavy logic belongs to collectors or the store
pub mod runner;
