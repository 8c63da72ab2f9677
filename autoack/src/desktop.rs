//! Glue between the click loop and the real desktop.

use {
    crate::{
        dispatch::Input,
        geometry::{Point, Rect},
        scanner::Locator,
    },
    anyhow::Context as _,
    autoack_desktop::{matcher, Context, GrayImage, Template},
    std::collections::BTreeMap,
    tracing::debug,
};

impl Input for Context {
    fn pointer_position(&mut self) -> anyhow::Result<Point> {
        Ok(Context::pointer_position(self)?.into())
    }

    fn click(&mut self, at: Point) -> anyhow::Result<()> {
        self.click_at(at.x, at.y)
    }
}

/// Matches preloaded templates against one screen capture per scan.
pub struct ScreenLocator {
    context: Context,
    templates: BTreeMap<String, Template>,
    frame: Option<GrayImage>,
}

impl ScreenLocator {
    /// Loads every target image up front, so a missing file fails at startup.
    pub fn new(context: Context, targets: &[String]) -> anyhow::Result<Self> {
        let mut templates = BTreeMap::new();
        for target in targets {
            let template = Template::load(target)?;
            debug!(
                image = %target,
                width = template.image().width(),
                height = template.image().height(),
                "loaded template"
            );
            templates.insert(target.clone(), template);
        }
        Ok(Self {
            context,
            templates,
            frame: None,
        })
    }
}

impl Locator for ScreenLocator {
    fn start_cycle(&mut self) {
        self.frame = None;
    }

    fn locate(&mut self, target: &str, confidence: f32) -> anyhow::Result<Option<Rect>> {
        let template = self
            .templates
            .get(target)
            .with_context(|| format!("template {target:?} was not loaded"))?;
        if self.frame.is_none() {
            self.frame = Some(self.context.capture_primary_monitor_gray()?);
        }
        let frame = self.frame.as_ref().context("no screen frame")?;
        let Some(found) = matcher::locate(frame, template.image(), confidence) else {
            return Ok(None);
        };
        debug!(image = %target, score = found.score, x = found.x, y = found.y, "template found");
        Ok(Some(Rect::from_xywh(
            i32::try_from(found.x)?,
            i32::try_from(found.y)?,
            i32::try_from(found.width)?,
            i32::try_from(found.height)?,
        )))
    }
}
