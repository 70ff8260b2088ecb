use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::Config;

/// Fixed daily trigger times in the exchange's local zone.
pub struct RunSchedule {
    pub times: Vec<NaiveTime>,
    pub tz: Tz,
}

impl RunSchedule {
    pub fn new(cfg: &Config) -> Self {
        Self {
            times: cfg.schedule.clone(),
            tz: cfg.market_tz,
        }
    }

    /// First trigger strictly after `now`. `None` only with an empty schedule.
    pub fn next_run(&self, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        let local_now = now.with_timezone(&self.tz);
        let today = local_now.date_naive();

        self.times
            .iter()
            .filter_map(|t| {
                let today_at = self.tz.from_local_datetime(&today.and_time(*t)).earliest()?;
                if today_at > local_now {
                    Some(today_at)
                } else {
                    let tomorrow = today + Duration::days(1);
                    self.tz.from_local_datetime(&tomorrow.and_time(*t)).earliest()
                }
            })
            .min()
    }

    /// Time left until the next trigger, zero if it is already due.
    pub fn wait_until_next(&self, now: DateTime<Utc>) -> Option<(DateTime<Tz>, std::time::Duration)> {
        let next = self.next_run(now)?;
        let wait = (next.with_timezone(&Utc) - now)
            .to_std()
            .unwrap_or_default();
        Some((next, wait))
    }

    pub fn describe(&self) -> String {
        self.times
            .iter()
            .map(|t| t.format("%H:%M").to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
