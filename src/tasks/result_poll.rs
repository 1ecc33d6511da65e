use tokio::sync::watch;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::flows::lookup::{ResultLookup, ReviewArrival};
use crate::services::notifier::Notifier;
use crate::store::SubmissionStore;

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The review landed while watching; the notification has been sent.
    Graded(ReviewArrival),
    /// The matched record vanished from the cache.
    NoMatch,
    Cancelled,
    /// Nothing to wait for: not searched, no match, or already graded.
    NotNeeded,
}

/// Silently refreshes the store every `period` while the looked-up record is
/// waiting for its review. Every cache replacement, including ones triggered
/// elsewhere, is fed through `ResultLookup::observe`.
pub async fn watch_until_graded(
    store: &SubmissionStore,
    lookup: &mut ResultLookup,
    notifier: &dyn Notifier,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> PollOutcome {
    if !lookup.needs_polling() {
        return PollOutcome::NotNeeded;
    }

    let mut snapshots = store.subscribe();

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        student_number = %lookup.query().student_number,
        grade = %lookup.query().grade,
        room = %lookup.query().room,
        period_ms = period.as_millis() as u64,
        "Watching for review"
    );

    loop {
        if *shutdown.borrow() {
            return PollOutcome::Cancelled;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::debug!("Result poll cancelled");
                    return PollOutcome::Cancelled;
                }
            }
            _ = ticker.tick() => {
                tokio::select! {
                    _ = store.refresh(true) => {}
                    _ = shutdown.changed() => return PollOutcome::Cancelled,
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return PollOutcome::Cancelled;
                }
                let records = snapshots.borrow_and_update().records.clone();
                if let Some(arrival) = lookup.observe(&records) {
                    notifier.notify(arrival.title(), &arrival.body());
                    tracing::info!(
                        student = %arrival.student_name,
                        total_score = arrival.review.total_score,
                        "Review arrived"
                    );
                    return PollOutcome::Graded(arrival);
                }
                if lookup.matched().is_none() {
                    tracing::info!("Looked-up submission no longer in the list");
                    return PollOutcome::NoMatch;
                }
            }
        }
    }
}
