use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::time::{date_to_record_name, format_clock};

/// Accumulated editor time for a single day. There is at most one per date in the store.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone)]
pub struct DailyUsageRecord {
    pub date: NaiveDate,
    #[serde(with = "duration_ser")]
    pub total: Duration,
}

impl DailyUsageRecord {
    pub fn new(date: NaiveDate, total: Duration) -> Self {
        Self { date, total }
    }

    /// Row as it appears in the store file.
    pub fn to_row(&self) -> String {
        format!("{},{}", date_to_record_name(self.date), format_clock(self.total))
    }
}

pub(crate) mod duration_ser {
    use chrono::Duration;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use crate::utils::time::{format_clock, parse_clock};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_clock(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_clock(&s).ok_or_else(|| D::Error::custom(format!("{s} is not a H:MM:SS duration")))
    }
}
