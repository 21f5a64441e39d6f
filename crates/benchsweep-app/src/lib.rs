//! Application layer for benchsweep.
//!
//! The app layer coordinates adapters and domain logic.
//! It does not parse CLI flags and it does not print to the terminal;
//! sweep progress is reported through [`SweepObserver`], and a
//! [`BenchSet`] writes its report to whatever writer the caller hands it.

mod bench_set;
mod discover;
mod record;
mod sweep;

pub use bench_set::{BenchSet, InstantTimer, ReportLine, SampleTimer, render_report};
pub use discover::DiscoverUseCase;
pub use record::{BenchArgs, BenchResult, RecordRequest, RecordUseCase};
pub use sweep::{NoopObserver, SweepObserver, SweepOutcome, SweepRequest, SweepUseCase};

use benchsweep_types::RunStamp;
use time::macros::format_description;

pub trait Clock {
    /// Wall-clock time as a [`RunStamp`], second resolution.
    fn now_run_stamp(&self) -> RunStamp;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_run_stamp(&self) -> RunStamp {
        (**self).now_run_stamp()
    }
}

/// Local time, falling back to UTC when the local offset cannot be determined.
#[derive(Debug, Default, Clone)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now_run_stamp(&self) -> RunStamp {
        let now = time::OffsetDateTime::now_local().unwrap_or_else(|err| {
            tracing::warn!(%err, "local UTC offset unavailable, stamping in UTC");
            time::OffsetDateTime::now_utc()
        });
        let stamp = format_run_stamp(now).unwrap_or_else(|err| {
            tracing::warn!(%err, "run stamp formatting failed, using field-wise stamp");
            plain_run_stamp(now)
        });
        RunStamp::new(stamp)
    }
}

/// A clock that always reads the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock(pub RunStamp);

impl Clock for FixedClock {
    fn now_run_stamp(&self) -> RunStamp {
        self.0.clone()
    }
}

pub fn format_run_stamp(at: time::OffsetDateTime) -> Result<String, time::error::Format> {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    at.format(&fmt)
}

fn plain_run_stamp(at: time::OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}
