use crate::models::QueueItem;

/// Pick the next item to process: the oldest (lowest id) row that is not
/// processed, not skipped, and still under the retry bound.
///
/// This is the only place the eligibility predicate lives; `db::queue`
/// fetches candidates and defers the decision here so the policy can be
/// exercised without storage attached.
pub fn pick(items: &[QueueItem], max_retries: i64) -> Option<&QueueItem> {
    items
        .iter()
        .filter(|item| !item.processed && !item.skipped && item.retry_count < max_retries)
        .min_by_key(|item| item.id)
}
