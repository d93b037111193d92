use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::clock::{Clock, FixedClock, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "attendanced")]
#[command(about = "Attendance snapshot service for the parent and student portals", long_about = None)]
pub struct Config {
    /// Workspace directory holding the snapshot store; can also be chosen later via workspace.select
    #[arg(long, env = "ATTENDANCED_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Pin "today" (YYYY-MM-DD) instead of reading the system clock
    #[arg(long, env = "ATTENDANCED_TODAY")]
    pub today: Option<NaiveDate>,

    /// How long a store read may wait on a locked database
    #[arg(long, env = "ATTENDANCED_STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn clock(&self) -> Box<dyn Clock> {
        match self.today {
            Some(date) => Box::new(FixedClock::new(date)),
            None => Box::new(SystemClock),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_date_and_timeout() {
        let cfg = Config::try_parse_from([
            "attendanced",
            "--today",
            "2026-03-10",
            "--store-timeout-ms",
            "250",
        ])
        .expect("parse args");
        assert_eq!(cfg.clock().current_month_name(), "March");
        assert_eq!(cfg.store_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Config::try_parse_from(["attendanced", "--today", "10/03/2026"]).is_err());
    }
}
