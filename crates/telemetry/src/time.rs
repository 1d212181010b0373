// Path: crates/telemetry/src/time.rs
use std::time::Instant;

/// RAII timer that records the elapsed wall-clock duration, in seconds, to an
/// arbitrary observer closure when dropped. Generalizes the teacher's
/// single-sink `Timer` so it can time a submit round-trip, a scan pass, or
/// any other scope without binding to one metrics trait.
pub struct Timer<F: FnMut(f64)> {
    observe: F,
    start: Instant,
}

impl<F: FnMut(f64)> Timer<F> {
    /// Start a timer that calls `observe` with the elapsed seconds on drop.
    pub fn new(observe: F) -> Self {
        Self {
            observe,
            start: Instant::now(),
        }
    }
}

impl<F: FnMut(f64)> Drop for Timer<F> {
    fn drop(&mut self) {
        (self.observe)(self.start.elapsed().as_secs_f64());
    }
}
