use {
    autoack::{Autoclicker, Config, Input, Locator, Point, Rect},
    chrono::{DateTime, Local, TimeDelta, TimeZone},
    std::{
        cell::{Cell, RefCell},
        time::Duration,
    },
};

/// Screen where the visible targets and the pointer can change between scans.
struct Desk {
    visible: Vec<(String, Rect)>,
    pointer: Point,
    queries: Vec<String>,
    clicks: Vec<Point>,
    scans: usize,
    stop_after: usize,
}

impl Desk {
    fn new(visible: &[(&str, Rect)], stop_after: usize) -> Self {
        Self {
            visible: visible
                .iter()
                .map(|(name, region)| (name.to_string(), *region))
                .collect(),
            pointer: Point::new(700, 400),
            queries: Vec::new(),
            clicks: Vec::new(),
            scans: 0,
            stop_after,
        }
    }
}

struct DeskLocator<'a>(&'a RefCell<Desk>);
struct DeskInput<'a>(&'a RefCell<Desk>);

impl Locator for DeskLocator<'_> {
    fn start_cycle(&mut self) {
        self.0.borrow_mut().scans += 1;
    }

    fn locate(&mut self, target: &str, _confidence: f32) -> anyhow::Result<Option<Rect>> {
        let mut desk = self.0.borrow_mut();
        if desk.scans > desk.stop_after {
            anyhow::bail!("display went away");
        }
        desk.queries.push(target.to_string());
        Ok(desk
            .visible
            .iter()
            .find(|(name, _)| name == target)
            .map(|(_, region)| *region))
    }
}

impl Input for DeskInput<'_> {
    fn pointer_position(&mut self) -> anyhow::Result<Point> {
        Ok(self.0.borrow().pointer)
    }

    fn click(&mut self, at: Point) -> anyhow::Result<()> {
        self.0.borrow_mut().clicks.push(at);
        Ok(())
    }
}

fn start() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 14, 15, 9, 26).unwrap()
}

fn config() -> Config {
    Config::default()
        .with_targets(vec!["a.png".into(), "b.png".into()])
        .with_scale_factor(0.5)
        .with_idle_threshold(Duration::from_secs(4))
        .with_confidence(0.85)
        .with_poll_interval(Duration::from_secs(1))
}

/// Runs the loop until the desk stops answering and returns the stdout text
/// together with the number of sleeps.
fn run(desk: &RefCell<Desk>, move_pointer: impl Fn(usize) -> Option<Point>) -> (String, usize) {
    let mut clicker = Autoclicker::new(config(), DeskLocator(desk), DeskInput(desk));
    let now = Cell::new(start());
    let sleeps = Cell::new(0);
    let mut out = Vec::new();
    let result = clicker.run(
        || now.get(),
        |duration| {
            sleeps.set(sleeps.get() + 1);
            now.set(now.get() + TimeDelta::from_std(duration).unwrap());
            if let Some(pointer) = move_pointer(sleeps.get()) {
                desk.borrow_mut().pointer = pointer;
            }
        },
        &mut out,
    );
    assert_eq!(result.unwrap_err().to_string(), "display went away");
    (String::from_utf8(out).unwrap(), sleeps.get())
}

#[test]
fn clicks_second_image_when_first_is_missing() {
    let region = Rect::from_xywh(100, 100, 20, 20);
    let desk = RefCell::new(Desk::new(&[("b.png", region)], 5));

    let (out, sleeps) = run(&desk, |_| None);

    // Baseline at 0s, idle from 4s on.
    assert_eq!(sleeps, 5);
    assert_eq!(
        out,
        "[15:09:30] Clicked b.png at (55, 55)\n",
        "only the fifth scan is both matched and idle"
    );
    let desk = desk.into_inner();
    assert_eq!(desk.clicks, vec![Point::new(55, 55)]);
    assert_eq!(desk.queries.len(), 2 * 5);
}

#[test]
fn active_pointer_prevents_clicks() {
    let region = Rect::from_xywh(100, 100, 20, 20);
    let desk = RefCell::new(Desk::new(&[("b.png", region)], 8));

    let (out, sleeps) = run(&desk, |sleep| Some(Point::new(sleep as i32, 0)));

    assert_eq!(sleeps, 8);
    assert_eq!(out, "");
    let desk = desk.into_inner();
    assert!(desk.clicks.is_empty());
    // "a.png" is asked once per scan, never retried within a scan.
    assert_eq!(
        desk.queries.iter().filter(|q| q.as_str() == "a.png").count(),
        8
    );
}

#[test]
fn nothing_on_screen_means_no_clicks() {
    let desk = RefCell::new(Desk::new(&[], 6));

    let (out, sleeps) = run(&desk, |_| None);

    assert_eq!(sleeps, 6);
    assert_eq!(out, "");
    assert!(desk.into_inner().clicks.is_empty());
}
