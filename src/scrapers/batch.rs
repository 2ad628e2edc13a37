use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ScraperError;
use crate::models::{BatchError, BatchOutcome, BusinessSummary};
use crate::rate_limit::{pause, DelayRange};
use crate::scrapers::traits::Enricher;

/// Enrich `businesses` one at a time, pausing for `delay` before each.
///
/// A failed enrichment leaves `None` in its slot and an entry in `errors`;
/// the rest of the batch still runs. Cancellation stops the batch early, so
/// `results` can be shorter than the input. A batch over `max_batch` is
/// rejected before any request is made.
pub async fn enrich_batch(
    enricher: &dyn Enricher,
    businesses: &[BusinessSummary],
    max_batch: usize,
    delay: DelayRange,
    cancel: &CancellationToken,
) -> Result<BatchOutcome, ScraperError> {
    if businesses.len() > max_batch {
        return Err(ScraperError::BatchTooLarge {
            len: businesses.len(),
            max: max_batch,
        });
    }

    let mut outcome = BatchOutcome::default();

    for business in businesses {
        if pause(delay, cancel).await.is_err() {
            warn!(
                "Batch cancelled after {} of {} businesses",
                outcome.results.len(),
                businesses.len()
            );
            break;
        }

        match enricher.enrich(business, cancel).await {
            Ok(enriched) => outcome.results.push(Some(enriched)),
            Err(e) => {
                warn!("Failed to enrich {}: {}", business.domain, e);
                outcome.results.push(None);
                outcome.errors.push(BatchError {
                    domain: business.domain.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Enriched {} of {} businesses ({} errors)",
        outcome.results.iter().filter(|r| r.is_some()).count(),
        businesses.len(),
        outcome.errors.len()
    );

    Ok(outcome)
}
