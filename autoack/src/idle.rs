use {
    crate::geometry::Point,
    chrono::{DateTime, Local},
    std::time::Duration,
};

#[derive(Debug, Clone, Copy)]
struct PointerState {
    position: Point,
    last_movement: DateTime<Local>,
}

/// Tells whether the pointer has stayed in place for long enough.
///
/// Movement is detected by comparing raw positions between queries, so the
/// tracker only learns about the pointer when it is asked.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    threshold: Duration,
    state: Option<PointerState>,
}

impl IdleTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Records `position` observed at `now` and reports whether the pointer
    /// has not moved for at least the threshold.
    ///
    /// The first observation and any observation with a changed position
    /// report `false`.
    pub fn is_idle(&mut self, now: DateTime<Local>, position: Point) -> bool {
        let Some(state) = &mut self.state else {
            self.state = Some(PointerState {
                position,
                last_movement: now,
            });
            return false;
        };
        if state.position != position {
            state.position = position;
            state.last_movement = now;
            return false;
        }
        // Negative when the wall clock went backwards; never idle in that case.
        (now - state.last_movement)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.threshold)
    }
}

#[cfg(test)]
pub(crate) fn at(seconds: f64) -> DateTime<Local> {
    use chrono::{TimeDelta, TimeZone};
    Local.timestamp_opt(1_700_000_000, 0).unwrap()
        + TimeDelta::milliseconds((seconds * 1000.0) as i64)
}

#[test]
fn first_observation_is_never_idle() {
    for (position, seconds) in [(Point::new(0, 0), 0.0), (Point::new(5, 9), 1000.0)] {
        let mut tracker = IdleTracker::new(Duration::ZERO);
        assert!(!tracker.is_idle(at(seconds), position));
    }
}

#[test]
fn becomes_idle_at_threshold() {
    let position = Point::new(10, 20);
    let mut tracker = IdleTracker::new(Duration::from_secs(4));
    assert!(!tracker.is_idle(at(0.0), position));
    assert!(!tracker.is_idle(at(1.0), position));
    assert!(!tracker.is_idle(at(3.999), position));
    assert!(tracker.is_idle(at(4.0), position));
    assert!(tracker.is_idle(at(60.0), position));
}

#[test]
fn any_movement_restarts_the_timer() {
    let mut tracker = IdleTracker::new(Duration::from_secs(4));
    assert!(!tracker.is_idle(at(0.0), Point::new(10, 20)));
    assert!(tracker.is_idle(at(5.0), Point::new(10, 20)));
    assert!(!tracker.is_idle(at(6.0), Point::new(11, 20)));
    assert!(!tracker.is_idle(at(9.0), Point::new(11, 20)));
    assert!(tracker.is_idle(at(10.0), Point::new(11, 20)));
}

#[test]
fn repeated_query_gives_same_answer() {
    let position = Point::new(3, 3);
    for seconds in [2.0, 4.0] {
        let mut tracker = IdleTracker::new(Duration::from_secs(4));
        tracker.is_idle(at(0.0), position);
        let first = tracker.is_idle(at(seconds), position);
        let second = tracker.is_idle(at(seconds), position);
        assert_eq!(first, second);
    }
}

#[test]
fn clock_going_backwards_is_not_idle() {
    let position = Point::new(1, 1);
    let mut tracker = IdleTracker::new(Duration::from_secs(4));
    tracker.is_idle(at(10.0), position);
    assert!(!tracker.is_idle(at(2.0), position));
}
