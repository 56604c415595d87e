// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// - config:       Configuration loaded from JSON
// - error:        Typed errors per layer
// - schema:       Persisted records and feed records
// - util:         Small shared helpers
// - metrics:      Process-wide counters
// - source:       Institution data feeds (HTTP / static)
// - store:        Persistence of collected records
// - institutions: Collector trait, institution registry and collectors
// - collector:    Capability dispatch for one collector
// - commands:     Named commands (collect, consolidate) and their table
//
pub mod collector;
pub mod commands;
pub mod config;
pub mod error;
pub mod institutions;
pub mod metrics;
pub mod schema;
pub mod source;
pub mod store;
pub mod util;
