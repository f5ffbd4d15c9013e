use crate::errors::error::AppError;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// 时间来源（广播调度器注入，测试可替换）
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 秒级精度
pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(TimeDelta::seconds(1)).unwrap_or(ts)
}

/// 区块 timestamp（自 epoch 起的秒数）转 UTC 时间
pub fn unix_seconds_to_utc(secs: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Conversion(format!("时间戳 {} 超出范围", secs)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncation_drops_subsecond_part() {
        let ts = Utc.timestamp_opt(1_700_000_000, 987_000_000).unwrap();
        assert_eq!(
            truncate_to_seconds(ts),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap()
        );
    }

    #[test]
    fn block_timestamp_to_utc() {
        let ts = unix_seconds_to_utc(0x5bad55).unwrap();
        assert_eq!(ts.timestamp(), 6_008_149);
        assert!(unix_seconds_to_utc(i64::MAX).is_err());
    }
}
