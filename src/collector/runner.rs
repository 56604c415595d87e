use std::sync::atomic::Ordering;

use log::info;

use crate::{
    error::CollectError,
    institutions::collector::{Capability, Collector},
    metrics::METRICS,
};

/// Runs every capability declared by `collector`.
///
/// ORDER:
/// - update_legislators (when supported)
/// - update_data
/// - update_legislators_data (when supported)
///
/// The first failing capability aborts the dispatch; its error is
/// returned unchanged and later capabilities are not called.
///
/// RETURNS:
/// - The capabilities invoked, in invocation order
///
pub async fn dispatch(collector: &mut dyn Collector) -> Result<Vec<Capability>, CollectError> {
    let code = collector.code();
    let mut invoked = Vec::with_capacity(3);

    for capability in Capability::ORDER {
        match capability {
            Capability::UpdateLegislators => {
                let Some(c) = collector.as_update_legislators() else {
                    continue;
                };
                info!("{code}: {capability}");
                c.update_legislators().await?;
            }

            Capability::UpdateData => {
                info!("{code}: {capability}");
                collector.update_data().await?;
            }

            Capability::UpdateLegislatorsData => {
                let Some(c) = collector.as_update_legislators_data() else {
                    continue;
                };
                info!("{code}: {capability}");
                c.update_legislators_data().await?;
            }
        }

        METRICS.capability_calls.fetch_add(1, Ordering::Relaxed);
        invoked.push(capability);
    }

    Ok(invoked)
}
