// Hourly downsampling: ordered samples -> one bucket per clock hour (sum, count, last).
// Pure logic; the coordinator turns buckets into statistic records.

use chrono::{DateTime, FixedOffset, TimeDelta, Timelike};

use crate::models::{HourBucket, Sample};

/// Start of the hour containing `ts`, in `ts`'s own offset (minutes, seconds and sub-seconds zeroed).
pub fn truncate_to_hour(ts: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let past_hour = TimeDelta::seconds(i64::from(ts.minute()) * 60 + i64::from(ts.second()))
        + TimeDelta::nanoseconds(i64::from(ts.nanosecond()));
    ts - past_hour
}

/// Groups consecutive samples that fall in the same hour.
///
/// Single pass, no sorting: a new bucket opens whenever a sample's hour differs from the
/// previous sample's bucket. Input is expected in chronological order; out-of-order or
/// interleaved input yields several buckets for the same hour.
pub fn aggregate_hourly(samples: &[Sample]) -> Vec<HourBucket> {
    let mut buckets: Vec<HourBucket> = Vec::new();
    for sample in samples {
        let hour_start = truncate_to_hour(sample.timestamp);
        let needs_new = buckets.last().is_none_or(|b| b.hour_start != hour_start);
        if needs_new {
            buckets.push(HourBucket {
                hour_start,
                sum: 0.0,
                count: 0,
                last_value: 0.0,
            });
        }
        if let Some(bucket) = buckets.last_mut() {
            bucket.sum += sample.value;
            bucket.count += 1;
            bucket.last_value = sample.value;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn truncate_keeps_offset() {
        let t = truncate_to_hour(ts("2024-03-10T14:37:12.345+05:30"));
        assert_eq!(t, ts("2024-03-10T14:00:00+05:30"));
        assert_eq!(t.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        assert!(aggregate_hourly(&[]).is_empty());
    }
}
