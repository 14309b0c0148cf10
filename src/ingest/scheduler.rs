// src/ingest/scheduler.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::refresh::RefreshJob;

/// Recurrence of a scheduled job. Names follow the usual cron schedule
/// names; `every:<secs>` gives an arbitrary period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cadence {
    Hourly,
    TwiceDaily,
    Daily,
    Every(Duration),
}

impl Cadence {
    pub fn period(&self) -> Duration {
        match self {
            Self::Hourly => Duration::from_secs(3_600),
            Self::TwiceDaily => Duration::from_secs(12 * 3_600),
            Self::Daily => Duration::from_secs(24 * 3_600),
            Self::Every(d) => *d,
        }
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "hourly" => Ok(Self::Hourly),
            "twicedaily" => Ok(Self::TwiceDaily),
            "daily" => Ok(Self::Daily),
            other => {
                let secs = other
                    .strip_prefix("every:")
                    .and_then(|n| n.trim().parse::<u64>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("unknown cadence {other:?}"))?;
                Ok(Self::Every(Duration::from_secs(secs)))
            }
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hourly => f.write_str("hourly"),
            Self::TwiceDaily => f.write_str("twicedaily"),
            Self::Daily => f.write_str("daily"),
            Self::Every(d) => write!(f, "every:{}", d.as_secs()),
        }
    }
}

impl TryFrom<String> for Cadence {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Cadence> for String {
    fn from(c: Cadence) -> Self {
        c.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Registered,
    AlreadyScheduled,
}

/// Registry of recurring jobs keyed by job identity.
///
/// A job id is either absent (unscheduled) or mapped to a live task
/// (scheduled). Registration checks the registry first, so running startup
/// twice never produces a second task for the same id.
#[derive(Default)]
pub struct Scheduler {
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a tokio runtime.
    pub fn ensure_scheduled(
        &self,
        job_id: &str,
        cadence: Cadence,
        job: RefreshJob,
    ) -> ScheduleOutcome {
        let mut jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        if jobs.get(job_id).is_some_and(|h| !h.is_finished()) {
            tracing::debug!(target: "feefo", job = job_id, "job already scheduled");
            return ScheduleOutcome::AlreadyScheduled;
        }

        let handle = spawn_recurring(job_id.to_string(), cadence, job);
        jobs.insert(job_id.to_string(), handle);
        tracing::info!(target: "feefo", job = job_id, cadence = %cadence, "job scheduled");
        ScheduleOutcome::Registered
    }

    pub fn is_scheduled(&self, job_id: &str) -> bool {
        let jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        jobs.get(job_id).is_some_and(|h| !h.is_finished())
    }

    pub fn job_count(&self) -> usize {
        let jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        jobs.values().filter(|h| !h.is_finished()).count()
    }

    /// Cancel a job. Returns whether it was registered.
    pub fn unschedule(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        match jobs.remove(job_id) {
            Some(h) => {
                h.abort();
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&self) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        for (_, h) in jobs.drain() {
            h.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// First tick fires immediately; a slow cycle skips missed ticks instead of
/// bursting. The loop awaits each cycle before ticking again, so one job
/// never overlaps itself.
fn spawn_recurring(job_id: String, cadence: Cadence, job: RefreshJob) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cadence.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let report = job.run_cycle().await;
            tracing::info!(
                target: "feefo",
                job = %job_id,
                summary = report.summary.label(),
                reviews = report.reviews.label(),
                "refresh cycle finished"
            );
        }
    })
}
