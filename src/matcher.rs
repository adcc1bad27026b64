// Locating a subscription's series inside a fetched snapshot

use crate::models::{FetchedSeries, SeriesIdentity};

/// First series whose group and name both equal `identity` (case-sensitive), or `None`.
///
/// `None` means "skip this subscription for this cycle"; it is never replaced by an empty series.
pub fn find_series<'a>(
    identity: &SeriesIdentity,
    snapshot: &'a [FetchedSeries],
) -> Option<&'a FetchedSeries> {
    snapshot
        .iter()
        .find(|s| s.identity.group == identity.group && s.identity.name == identity.name)
}
