// Domain models: fetched series, subscriptions, hourly statistics

mod series;
mod statistics;
mod subscription;

pub use series::{FetchedSeries, RawSeries, Sample, SeriesIdentity};
pub use statistics::{HourBucket, StatisticMetadata, StatisticRecord};
pub use subscription::{DOMAIN, SeriesSubscription, StateClass};
