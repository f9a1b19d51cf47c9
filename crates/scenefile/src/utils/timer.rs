use std::fmt::Display;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

pub struct TimedResult<T> {
    pub res: T,
    pub elapsed: Duration,
}

impl<T> Deref for TimedResult<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.res
    }
}

impl<T> DerefMut for TimedResult<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.res
    }
}

pub fn timed_scope<R, F: FnOnce() -> R>(f: F) -> TimedResult<R> {
    let begin = Instant::now();
    let res = f();
    TimedResult {
        res,
        elapsed: begin.elapsed(),
    }
}

/// Time spent in each phase of a load, in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTimings {
    phases: Vec<(&'static str, Duration)>,
}

impl PhaseTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` as phase `label`, logging and recording how long it took
    pub fn time<R, F: FnOnce() -> R>(&mut self, label: &'static str, f: F) -> R {
        let timed = timed_scope(f);
        log::log!(target: "scoped timer", log::Level::Debug, "{}: {}", label, format_elapsed(timed.elapsed));
        self.phases.push((label, timed.elapsed));
        timed.res
    }

    pub fn get(&self, label: &str) -> Option<Duration> {
        self.phases.iter().find(|(l, _)| *l == label).map(|(_, d)| *d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.phases.iter().copied()
    }

    pub fn total(&self) -> Duration {
        self.phases.iter().map(|(_, d)| *d).sum()
    }
}

impl Display for PhaseTimings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (label, elapsed)) in self.phases.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{label} {}", format_elapsed(*elapsed))?;
        }
        Ok(())
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed < Duration::from_millis(1) {
        let micro = elapsed.as_secs_f32() * 1000. * 1000.;
        format!("{micro:.1}µs")
    } else if elapsed < Duration::from_secs(1) {
        let milli = elapsed.as_secs_f32() * 1000.;
        format!("{milli:.3}ms")
    } else {
        let s = elapsed.as_secs_f32();
        format!("{s:.3}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format() {
        assert_eq!(format_elapsed(Duration::from_micros(12)), "12.0µs");
        assert_eq!(format_elapsed(Duration::from_millis(3)), "3.000ms");
        assert_eq!(format_elapsed(Duration::from_millis(2500)), "2.500s");
    }

    #[test]
    fn phases_are_recorded_in_order() {
        let mut timings = PhaseTimings::new();
        assert_eq!(timings.time("parse", || 1 + 1), 2);
        timings.time("build", || ());
        let labels: Vec<_> = timings.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["parse", "build"]);
        assert!(timings.get("parse").is_some());
        assert!(timings.get("validate").is_none());
        assert!(timings.total() >= timings.get("build").unwrap());
    }
}
