use {crate::geometry::Rect, tracing::trace};

/// Finds template images on the screen.
pub trait Locator {
    /// Called once before each scan. Implementations that capture the screen
    /// should drop the previous frame here.
    fn start_cycle(&mut self) {}

    /// Returns the region where `target` is visible with at least `confidence`,
    /// or `None` if it isn't on the screen.
    fn locate(&mut self, target: &str, confidence: f32) -> anyhow::Result<Option<Rect>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub target: &'a str,
    pub region: Rect,
}

/// Looks for the targets in order and returns the first one found.
///
/// Targets after the first match are not queried.
pub fn find_first_match<'a>(
    locator: &mut impl Locator,
    targets: &'a [String],
    confidence: f32,
) -> anyhow::Result<Option<Match<'a>>> {
    locator.start_cycle();
    for target in targets {
        if let Some(region) = locator.locate(target, confidence)? {
            return Ok(Some(Match { target, region }));
        }
        trace!(image = %target, "not found");
    }
    Ok(None)
}

#[cfg(test)]
pub(crate) mod testing {
    use {super::Locator, crate::geometry::Rect, std::collections::BTreeMap};

    /// Locator with a fixed screen content that records every query.
    #[derive(Debug, Default)]
    pub(crate) struct FakeLocator {
        pub visible: BTreeMap<String, Rect>,
        pub failing: Option<String>,
        /// Every query fails once this many scans have started.
        pub fail_on_cycle: Option<usize>,
        pub queries: Vec<(String, f32)>,
        pub cycles: usize,
    }

    impl FakeLocator {
        pub(crate) fn with(visible: &[(&str, Rect)]) -> Self {
            Self {
                visible: visible
                    .iter()
                    .map(|(target, region)| (target.to_string(), *region))
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl Locator for FakeLocator {
        fn start_cycle(&mut self) {
            self.cycles += 1;
        }

        fn locate(&mut self, target: &str, confidence: f32) -> anyhow::Result<Option<Rect>> {
            self.queries.push((target.to_string(), confidence));
            let failing = self.failing.as_deref() == Some(target)
                || self.fail_on_cycle == Some(self.cycles);
            if failing {
                anyhow::bail!("screen capture failed");
            }
            Ok(self.visible.get(target).copied())
        }
    }
}

#[cfg(test)]
fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn stops_at_first_match() {
    let region = Rect::from_xywh(1, 2, 3, 4);
    let targets = targets(&["a.png", "b.png", "c.png", "d.png"]);
    for (index, name) in ["a.png", "b.png", "c.png"].into_iter().enumerate() {
        let mut locator = testing::FakeLocator::with(&[(name, region), ("d.png", region)]);
        let found = find_first_match(&mut locator, &targets, 0.85).unwrap();
        assert_eq!(
            found,
            Some(Match {
                target: name,
                region
            })
        );
        assert_eq!(locator.queries.len(), index + 1);
        assert_eq!(locator.cycles, 1);
    }
}

#[test]
fn earlier_targets_take_priority() {
    let first = Rect::from_xywh(0, 0, 10, 10);
    let second = Rect::from_xywh(50, 50, 10, 10);
    let targets = targets(&["run.png", "accept.png"]);
    let mut locator = testing::FakeLocator::with(&[("accept.png", second), ("run.png", first)]);
    let found = find_first_match(&mut locator, &targets, 0.85).unwrap().unwrap();
    assert_eq!(found.target, "run.png");
    assert_eq!(found.region, first);
}

#[test]
fn no_match_queries_everything_once() {
    let targets = targets(&["a.png", "b.png"]);
    let mut locator = testing::FakeLocator::default();
    assert_eq!(find_first_match(&mut locator, &targets, 0.5).unwrap(), None);
    assert_eq!(
        locator.queries,
        vec![("a.png".to_string(), 0.5), ("b.png".to_string(), 0.5)]
    );
}

#[test]
fn locator_failure_stops_the_scan() {
    let targets = targets(&["a.png", "b.png"]);
    let mut locator = testing::FakeLocator::with(&[("b.png", Rect::default())]);
    locator.failing = Some("a.png".into());
    assert!(find_first_match(&mut locator, &targets, 0.85).is_err());
    assert_eq!(locator.queries.len(), 1);
}
