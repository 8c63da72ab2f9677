//! Desktop side of autoack: grabbing the screen, finding templates on it,
//! reading the pointer and injecting clicks.

pub mod matcher;
mod template;

pub use {
    crate::{matcher::Found, template::Template},
    image::GrayImage,
};

use {
    anyhow::Context as _,
    enigo::{Button, Coordinate, Direction, Enigo, Mouse},
    image::RgbaImage,
    std::sync::{Arc, Mutex},
    tracing::debug,
};

struct ContextData {
    enigo: Mutex<Enigo>,
}

#[derive(Clone)]
pub struct Context(Arc<ContextData>);

impl Context {
    #[allow(clippy::new_without_default)]
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self(Arc::new(ContextData {
            enigo: Mutex::new(
                Enigo::new(&enigo::Settings::default())
                    .context("failed to connect to the input system")?,
            ),
        })))
    }

    fn enigo(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Enigo>> {
        self.0
            .enigo
            .lock()
            .map_err(|_| anyhow::anyhow!("input handle is poisoned"))
    }

    /// Current absolute pointer position.
    pub fn pointer_position(&self) -> anyhow::Result<(i32, i32)> {
        let position = self
            .enigo()?
            .location()
            .context("failed to query pointer position")?;
        Ok(position)
    }

    /// Moves the pointer to an absolute position and clicks the primary button there.
    pub fn click_at(&self, x: i32, y: i32) -> anyhow::Result<()> {
        let mut enigo = self.enigo()?;
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .with_context(|| format!("failed to move pointer to ({x}, {y})"))?;
        enigo
            .button(Button::Left, Direction::Click)
            .with_context(|| format!("failed to click at ({x}, {y})"))?;
        Ok(())
    }

    /// Captures the primary monitor, or the first one if none is marked primary.
    fn capture_primary_monitor(&self) -> anyhow::Result<RgbaImage> {
        let monitors = xcap::Monitor::all().context("failed to list monitors")?;
        let mut primary = None;
        for monitor in &monitors {
            if monitor.is_primary()? {
                primary = Some(monitor);
                break;
            }
        }
        let monitor = primary
            .or_else(|| monitors.first())
            .context("no monitors found")?;
        let image = monitor.capture_image().context("failed to capture screen")?;
        debug!(width = image.width(), height = image.height(), "captured screen");
        Ok(image)
    }

    /// Captures the primary monitor, or the first one if none is marked
    /// primary, converted for template matching.
    pub fn capture_primary_monitor_gray(&self) -> anyhow::Result<GrayImage> {
        Ok(image::imageops::grayscale(&self.capture_primary_monitor()?))
    }
}
