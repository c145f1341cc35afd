//! Daily backup scheduler
//!
//! Every configuration lists wall-clock times ("HH:MM" or "HH:MM:SS") at
//! which it is pruned and backed up. Jobs run one after another on the
//! scheduler thread; a failed job is logged and the loop carries on.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone};
use std::thread;

use crate::backup::prune_and_backup;
use crate::config::{AppConfig, BackupConfig};

/// Longest single sleep before the clock is checked again
const MAX_NAP: std::time::Duration = std::time::Duration::from_secs(60);

/// Parse a trigger time
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Trigger times of all configurations, sorted by time
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: Vec<(NaiveTime, usize)>,
}

impl Schedule {
    /// Build the schedule; indices refer to positions in `configs`
    pub fn from_configs(configs: &[BackupConfig]) -> Result<Self> {
        let mut entries = Vec::new();

        for (idx, config) in configs.iter().enumerate() {
            for value in &config.backup_times {
                match parse_time(value) {
                    Some(time) => entries.push((time, idx)),
                    None => bail!(
                        "Invalid backup time {:?} in config {:?} (expected HH:MM or HH:MM:SS)",
                        value,
                        config.name
                    ),
                }
            }
        }

        entries.sort();
        entries.dedup();

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest trigger strictly after `now`, with the configs due then
    pub fn next_after(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, Vec<usize>)> {
        let today = now.date();

        let (date, time) = match self.entries.iter().find(|(t, _)| *t > now.time()) {
            Some((t, _)) => (today, *t),
            None => {
                let (t, _) = self.entries.first()?;
                (today.succ_opt()?, *t)
            }
        };

        let due = self
            .entries
            .iter()
            .filter(|(t, _)| *t == time)
            .map(|(_, idx)| *idx)
            .collect();

        Some((date.and_time(time), due))
    }

    /// Next trigger after the last one fired, even if it is already past.
    ///
    /// Triggers more than a day behind `now` are not replayed; the search
    /// starts at most one day back.
    pub fn next_pending(
        &self,
        last_fired: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Option<(NaiveDateTime, Vec<usize>)> {
        let floor = now.checked_sub_signed(Duration::try_days(1)?)?;
        self.next_after(last_fired.max(floor))
    }
}

/// Wall-clock instant in `tz`; a time skipped by a DST jump resolves to
/// the first instant after the gap
pub fn resolve<Tz: TimeZone>(tz: &Tz, wall: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&wall).earliest().or_else(|| {
        let shifted = wall.checked_add_signed(Duration::try_hours(1)?)?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

/// Sleep until `at`, re-reading the clock after every nap
fn sleep_until(at: DateTime<Local>) {
    while let Ok(wait) = (at - Local::now()).to_std() {
        if wait.is_zero() {
            return;
        }
        thread::sleep(wait.min(MAX_NAP));
    }
}

/// Run startup backups, then back up on schedule until the process exits
pub fn run_scheduler(app: &AppConfig, configs: &[BackupConfig]) -> Result<()> {
    let schedule = Schedule::from_configs(configs)?;
    let mut last_fired = Local::now();

    for config in configs.iter().filter(|c| c.backup_at_startup) {
        prune_and_backup(app, config);
    }

    if schedule.is_empty() {
        tracing::warn!("No backup times configured, scheduler exiting");
        return Ok(());
    }

    tracing::info!("Starting scheduler");

    loop {
        let now = Local::now();
        let pending = schedule.next_pending(last_fired.naive_local(), now.naive_local());
        let Some((wall, due)) = pending else {
            return Ok(());
        };
        let Some(at) = resolve(&Local, wall) else {
            bail!("Cannot resolve backup time {} in the local time zone", wall);
        };

        if at > now {
            tracing::info!("Next backup at {}", at);
            sleep_until(at);
        } else {
            tracing::info!("Running backup due at {} late", at);
        }

        for idx in due {
            prune_and_backup(app, &configs[idx]);
        }

        last_fired = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn config(name: &str, times: &[&str]) -> BackupConfig {
        BackupConfig {
            name: name.into(),
            backup_times: times.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn parses_short_and_long_times() {
        assert_eq!(parse_time("02:30"), NaiveTime::from_hms_opt(2, 30, 0));
        assert_eq!(parse_time("23:59:30"), NaiveTime::from_hms_opt(23, 59, 30));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("noon"), None);
    }

    #[test]
    fn invalid_time_names_config() {
        let err = Schedule::from_configs(&[config("web", &["2am"])]).unwrap_err();
        assert!(err.to_string().contains("\"web\""));
    }

    #[test]
    fn next_trigger_later_today() {
        let schedule =
            Schedule::from_configs(&[config("a", &["14:00", "02:30"]), config("b", &["09:00"])])
                .unwrap();

        assert_eq!(schedule.next_after(at(1, 8, 0)), Some((at(1, 9, 0), vec![1])));
        assert_eq!(schedule.next_after(at(1, 9, 0)), Some((at(1, 14, 0), vec![0])));
    }

    #[test]
    fn next_trigger_wraps_to_tomorrow() {
        let schedule = Schedule::from_configs(&[config("a", &["02:30"])]).unwrap();
        assert_eq!(schedule.next_after(at(1, 23, 0)), Some((at(2, 2, 30), vec![0])));
    }

    #[test]
    fn shared_time_runs_every_config() {
        let schedule =
            Schedule::from_configs(&[config("a", &["03:00"]), config("b", &["03:00", "03:00"])])
                .unwrap();
        assert_eq!(schedule.next_after(at(1, 0, 0)), Some((at(1, 3, 0), vec![0, 1])));
    }

    #[test]
    fn trigger_passed_during_a_long_job_still_runs() {
        let schedule =
            Schedule::from_configs(&[config("a", &["02:00"]), config("b", &["02:05"])]).unwrap();

        // "a" fired at 02:00 and its backup ran until 02:10
        let next = schedule.next_pending(at(1, 2, 0), at(1, 2, 10));
        assert_eq!(next, Some((at(1, 2, 5), vec![1])));

        // once "b" has fired, the next trigger is tomorrow's 02:00
        let next = schedule.next_pending(at(1, 2, 5), at(1, 2, 40));
        assert_eq!(next, Some((at(2, 2, 0), vec![0])));
    }

    #[test]
    fn pending_triggers_are_not_replayed_beyond_a_day() {
        let schedule = Schedule::from_configs(&[config("a", &["02:00"])]).unwrap();
        let next = schedule.next_pending(at(1, 2, 0), at(5, 12, 0));
        assert_eq!(next, Some((at(5, 2, 0), vec![0])));
    }

    #[test]
    fn resolves_wall_time_in_zone() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let instant = resolve(&zone, at(1, 2, 30)).unwrap();
        assert_eq!(instant.naive_local(), at(1, 2, 30));
        assert_eq!(instant.naive_utc(), at(1, 0, 30));
    }

    #[test]
    fn sleep_until_past_instant_returns() {
        let started = std::time::Instant::now();
        sleep_until(Local::now() - Duration::try_minutes(5).unwrap());
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn empty_schedule_has_no_trigger() {
        let schedule = Schedule::from_configs(&[config("a", &[])]).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.next_after(at(1, 0, 0)), None);
    }

    #[test]
    fn scheduler_without_times_returns() {
        let app = AppConfig::new("/opt/sbs");
        assert!(run_scheduler(&app, &[config("a", &[])]).is_ok());
    }
}
