//! Flag rule: `polarity <= threshold` OR any keyword category matched.

use crate::datetime::cmp_recent_first;
use crate::table::ScopedArticleRecord;

pub const DEFAULT_POLARITY_THRESHOLD: f64 = -0.1;

/// Inclusive on the threshold; either condition alone is enough.
pub fn is_flagged(record: &ScopedArticleRecord, polarity_threshold: f64) -> bool {
    record.polarity <= polarity_threshold || !record.keyword_tags.is_empty()
}

/// Set `flagged` on every record; returns how many were flagged.
pub fn apply_flags(records: &mut [ScopedArticleRecord], polarity_threshold: f64) -> usize {
    let mut n = 0;
    for r in records.iter_mut() {
        r.flagged = is_flagged(r, polarity_threshold);
        n += usize::from(r.flagged);
    }
    n
}

/// Indices of flagged records across all scopes, most recent first,
/// unparseable dates last. Ties keep table order.
pub fn flagged_pool(records: &[ScopedArticleRecord]) -> Vec<usize> {
    let mut idx: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.flagged)
        .map(|(i, _)| i)
        .collect();
    idx.sort_by(|&a, &b| cmp_recent_first(records[a].published_at_dt, records[b].published_at_dt));
    idx
}
