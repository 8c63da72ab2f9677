use {
    crate::{
        config::Config,
        dispatch::{ClickDispatcher, ClickEvent, Input},
        scanner::{find_first_match, Locator},
    },
    chrono::{DateTime, Local},
    std::{io::Write, time::Duration},
    tracing::debug,
};

/// What happened during one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NoMatch,
    /// A target was found but the pointer was in use.
    Suppressed { target: String },
    Clicked(ClickEvent),
}

/// The scan, check, click loop.
pub struct Autoclicker<L, I> {
    config: Config,
    locator: L,
    input: I,
    dispatcher: ClickDispatcher,
}

impl<L: Locator, I: Input> Autoclicker<L, I> {
    pub fn new(config: Config, locator: L, input: I) -> Self {
        Self {
            dispatcher: ClickDispatcher::new(config.scale_factor, config.idle_threshold),
            config,
            locator,
            input,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Runs one scan. At most one click happens, and a found target ends the
    /// scan even if the click is suppressed.
    pub fn run_cycle(&mut self, now: DateTime<Local>) -> anyhow::Result<CycleOutcome> {
        let Some(found) =
            find_first_match(&mut self.locator, &self.config.targets, self.config.confidence)?
        else {
            return Ok(CycleOutcome::NoMatch);
        };
        let event = self
            .dispatcher
            .dispatch(&mut self.input, found.target, found.region, now)?;
        Ok(match event {
            Some(event) => CycleOutcome::Clicked(event),
            None => CycleOutcome::Suppressed {
                target: found.target.to_string(),
            },
        })
    }

    /// Scans forever, writing a line to `out` for every click and sleeping
    /// for the poll interval after each scan.
    ///
    /// Only returns if something fails.
    pub fn run(
        &mut self,
        clock: impl Fn() -> DateTime<Local>,
        mut sleep: impl FnMut(Duration),
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        loop {
            match self.run_cycle(clock())? {
                CycleOutcome::Clicked(event) => {
                    writeln!(out, "{event}")?;
                    out.flush()?;
                }
                CycleOutcome::Suppressed { target } => {
                    debug!(image = %target, "match ignored while pointer is active");
                }
                CycleOutcome::NoMatch => {}
            }
            sleep(self.config.poll_interval);
        }
    }
}

#[cfg(test)]
use crate::{
    dispatch::testing::FakeInput,
    geometry::{Point, Rect},
    idle::at,
    scanner::testing::FakeLocator,
};

#[cfg(test)]
fn two_targets() -> Config {
    Config::default()
        .with_targets(vec!["a.png".into(), "b.png".into()])
        .with_idle_threshold(Duration::from_secs(4))
        .with_scale_factor(0.5)
}

#[test]
fn second_target_clicked_when_idle() {
    let region = Rect::from_xywh(100, 100, 20, 20);
    let locator = FakeLocator::with(&[("b.png", region)]);
    let mut clicker = Autoclicker::new(two_targets(), locator, FakeInput::default());

    // Establishes the pointer baseline.
    assert_eq!(
        clicker.run_cycle(at(0.0)).unwrap(),
        CycleOutcome::Suppressed {
            target: "b.png".into()
        }
    );
    let outcome = clicker.run_cycle(at(5.0)).unwrap();
    let CycleOutcome::Clicked(event) = outcome else {
        panic!("expected a click, got {outcome:?}");
    };
    assert_eq!(event.target, "b.png");
    assert_eq!(event.point, Point::new(55, 55));
    assert_eq!(clicker.input().clicks, vec![Point::new(55, 55)]);
}

#[test]
fn busy_pointer_consumes_the_cycle() {
    let region = Rect::from_xywh(100, 100, 20, 20);
    let locator = FakeLocator::with(&[("b.png", region)]);
    let mut clicker = Autoclicker::new(two_targets(), locator, FakeInput::default());

    clicker.run_cycle(at(0.0)).unwrap();
    clicker.input.pointer = Point::new(300, 300);
    assert_eq!(
        clicker.run_cycle(at(5.0)).unwrap(),
        CycleOutcome::Suppressed {
            target: "b.png".into()
        }
    );
    assert!(clicker.input().clicks.is_empty());
    let queried: Vec<&str> = clicker
        .locator()
        .queries
        .iter()
        .map(|(target, _)| target.as_str())
        .collect();
    assert_eq!(queried, ["a.png", "b.png", "a.png", "b.png"]);
}

#[test]
fn no_match_does_not_touch_the_pointer() {
    let mut clicker = Autoclicker::new(two_targets(), FakeLocator::default(), FakeInput::default());
    for second in 0..10 {
        assert_eq!(
            clicker.run_cycle(at(f64::from(second))).unwrap(),
            CycleOutcome::NoMatch
        );
    }
    assert!(clicker.input().clicks.is_empty());
    assert_eq!(clicker.locator().cycles, 10);
}

#[test]
fn run_logs_clicks_and_sleeps_every_cycle() {
    use std::cell::Cell;

    let region = Rect::from_xywh(100, 100, 20, 20);
    let mut locator = FakeLocator::with(&[("b.png", region)]);
    locator.fail_on_cycle = Some(8);
    let input = FakeInput {
        follow_clicks: true,
        ..Default::default()
    };
    let mut clicker = Autoclicker::new(two_targets(), locator, input);

    let now = Cell::new(at(0.0));
    let sleeps = Cell::new(0);
    let mut out = Vec::new();
    let result = clicker.run(
        || now.get(),
        |duration| {
            assert_eq!(duration, Duration::from_secs(1));
            sleeps.set(sleeps.get() + 1);
            now.set(now.get() + chrono::TimeDelta::seconds(1));
        },
        &mut out,
    );

    assert!(result.is_err());
    assert_eq!(sleeps.get(), 7);
    // Idle at 4s; the click moves the pointer, so no second click follows.
    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!(
            "[{}] Clicked b.png at (55, 55)\n",
            at(4.0).format("%H:%M:%S")
        )
    );
    assert_eq!(clicker.input().clicks, vec![Point::new(55, 55)]);
}
