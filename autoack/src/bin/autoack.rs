use {
    anyhow::Context as _,
    autoack::{config::seconds, desktop::ScreenLocator, Autoclicker, Config},
    clap::Parser,
    itertools::Itertools,
    std::{io, path::PathBuf, thread},
    tracing::info,
    tracing_subscriber::{filter::LevelFilter, EnvFilter},
};

/// Clicks recurring prompt buttons once the mouse has been left alone.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file. Command line options take precedence over it.
    #[clap(long)]
    config: Option<PathBuf>,
    /// Button image to look for. Repeat to add more; earlier images win.
    #[clap(long = "target", value_name = "IMAGE")]
    targets: Vec<String>,
    /// Multiplier applied to matched coordinates before clicking.
    #[clap(long)]
    scale_factor: Option<f64>,
    /// Seconds the pointer must stay still before clicking.
    #[clap(long, value_name = "SECS")]
    idle_threshold: Option<f64>,
    /// Minimum match score, from 0 to 1.
    #[clap(long)]
    confidence: Option<f32>,
    /// Seconds between screen scans.
    #[clap(long, value_name = "SECS")]
    poll_interval: Option<f64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if !self.targets.is_empty() {
            config = config.with_targets(self.targets);
        }
        if let Some(scale_factor) = self.scale_factor {
            config = config.with_scale_factor(scale_factor);
        }
        if let Some(secs) = self.idle_threshold {
            config = config.with_idle_threshold(seconds("--idle-threshold", secs)?);
        }
        if let Some(confidence) = self.confidence {
            config = config.with_confidence(confidence);
        }
        if let Some(secs) = self.poll_interval {
            config = config.with_poll_interval(seconds("--poll-interval", secs)?);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .init();

    let config = Args::parse().into_config()?;
    let context = autoack_desktop::Context::new()?;
    let locator = ScreenLocator::new(context.clone(), &config.targets)
        .context("failed to load target images")?;
    info!(
        targets = %config.targets.iter().join(", "),
        scale_factor = config.scale_factor,
        idle_threshold = ?config.idle_threshold,
        confidence = config.confidence,
        poll_interval = ?config.poll_interval,
        "watching for prompts"
    );

    let mut clicker = Autoclicker::new(config, locator, context);
    clicker.run(chrono::Local::now, thread::sleep, &mut io::stdout().lock())
}
