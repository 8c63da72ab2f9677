use {
    crate::{
        geometry::{Point, Rect},
        idle::IdleTracker,
    },
    chrono::{DateTime, Local},
    std::{fmt, time::Duration},
    tracing::debug,
};

/// Pointer access and synthetic input.
pub trait Input {
    fn pointer_position(&mut self) -> anyhow::Result<Point>;

    /// Moves the pointer to `at` and clicks the primary button.
    fn click(&mut self, at: Point) -> anyhow::Result<()>;
}

/// A click that was actually issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: String,
    pub point: Point,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for ClickEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Clicked {} at {}",
            self.timestamp.format("%H:%M:%S"),
            self.target,
            self.point
        )
    }
}

/// Turns a matched region into a click, provided the pointer is idle.
#[derive(Debug, Clone)]
pub struct ClickDispatcher {
    scale_factor: f64,
    idle: IdleTracker,
}

impl ClickDispatcher {
    pub fn new(scale_factor: f64, idle_threshold: Duration) -> Self {
        Self {
            scale_factor,
            idle: IdleTracker::new(idle_threshold),
        }
    }

    /// Position that will be clicked for `region`.
    pub fn click_point(&self, region: Rect) -> Point {
        region.center().scale(self.scale_factor)
    }

    pub fn dispatch(
        &mut self,
        input: &mut impl Input,
        target: &str,
        region: Rect,
        now: DateTime<Local>,
    ) -> anyhow::Result<Option<ClickEvent>> {
        let point = self.click_point(region);
        let pointer = input.pointer_position()?;
        if !self.idle.is_idle(now, pointer) {
            debug!(image = %target, %pointer, "pointer is not idle, skipping click");
            return Ok(None);
        }
        input.click(point)?;
        Ok(Some(ClickEvent {
            target: target.to_string(),
            point,
            timestamp: now,
        }))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use {super::Input, crate::geometry::Point};

    /// Input that reports a scripted pointer position and records clicks.
    ///
    /// Clicking does not move the reported pointer unless `follow_clicks` is set.
    #[derive(Debug, Default)]
    pub(crate) struct FakeInput {
        pub pointer: Point,
        pub follow_clicks: bool,
        pub clicks: Vec<Point>,
        pub fail_clicks: bool,
    }

    impl Input for FakeInput {
        fn pointer_position(&mut self) -> anyhow::Result<Point> {
            Ok(self.pointer)
        }

        fn click(&mut self, at: Point) -> anyhow::Result<()> {
            if self.fail_clicks {
                anyhow::bail!("input injection failed");
            }
            self.clicks.push(at);
            if self.follow_clicks {
                self.pointer = at;
            }
            Ok(())
        }
    }
}

#[test]
fn clicks_scaled_center_when_idle() {
    use crate::idle::at;

    let mut input = testing::FakeInput::default();
    let mut dispatcher = ClickDispatcher::new(0.5, Duration::from_secs(4));
    let region = Rect::from_xywh(100, 100, 20, 20);

    assert_eq!(
        dispatcher.dispatch(&mut input, "b.png", region, at(0.0)).unwrap(),
        None
    );
    assert!(input.clicks.is_empty());

    let event = dispatcher
        .dispatch(&mut input, "b.png", region, at(4.0))
        .unwrap()
        .expect("pointer should be idle");
    assert_eq!(event.point, Point::new(55, 55));
    assert_eq!(event.target, "b.png");
    assert_eq!(event.timestamp, at(4.0));
    assert_eq!(input.clicks, vec![Point::new(55, 55)]);
}

#[test]
fn moving_pointer_suppresses_click() {
    use crate::idle::at;

    let mut input = testing::FakeInput::default();
    let mut dispatcher = ClickDispatcher::new(0.5, Duration::from_secs(4));
    let region = Rect::from_xywh(0, 0, 10, 10);
    for second in 0..10 {
        input.pointer = Point::new(second, 0);
        let event = dispatcher
            .dispatch(&mut input, "a.png", region, at(f64::from(second) * 5.0))
            .unwrap();
        assert_eq!(event, None);
    }
    assert!(input.clicks.is_empty());
}

#[test]
fn click_resets_idle_when_pointer_follows() {
    use crate::idle::at;

    let mut input = testing::FakeInput {
        follow_clicks: true,
        ..Default::default()
    };
    let mut dispatcher = ClickDispatcher::new(1.0, Duration::from_secs(4));
    let region = Rect::from_xywh(40, 40, 20, 20);

    dispatcher.dispatch(&mut input, "a.png", region, at(0.0)).unwrap();
    assert!(dispatcher
        .dispatch(&mut input, "a.png", region, at(4.0))
        .unwrap()
        .is_some());
    assert_eq!(input.pointer, Point::new(50, 50));
    // The pointer jumped to the button, which counts as movement.
    assert!(dispatcher
        .dispatch(&mut input, "a.png", region, at(5.0))
        .unwrap()
        .is_none());
    assert!(dispatcher
        .dispatch(&mut input, "a.png", region, at(9.0))
        .unwrap()
        .is_some());
    assert_eq!(input.clicks.len(), 2);
}

#[test]
fn click_failure_is_an_error() {
    use crate::idle::at;

    let mut input = testing::FakeInput {
        fail_clicks: true,
        ..Default::default()
    };
    let mut dispatcher = ClickDispatcher::new(0.5, Duration::ZERO);
    let region = Rect::from_xywh(0, 0, 2, 2);
    dispatcher.dispatch(&mut input, "a.png", region, at(0.0)).unwrap();
    assert!(dispatcher
        .dispatch(&mut input, "a.png", region, at(0.0))
        .is_err());
}

#[test]
fn log_line_format() {
    use chrono::TimeZone;

    let event = ClickEvent {
        target: "image/run.png".into(),
        point: Point::new(55, 55),
        timestamp: Local.with_ymd_and_hms(2024, 5, 1, 9, 3, 7).unwrap(),
    };
    assert_eq!(event.to_string(), "[09:03:07] Clicked image/run.png at (55, 55)");
}
