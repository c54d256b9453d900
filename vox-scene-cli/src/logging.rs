//! Logging to stderr.

use anyhow::Context as _;

/// A [`clap::Args`] struct for options controlling log output to stderr.
#[derive(Clone, Debug, clap::Args)]
#[expect(clippy::module_name_repetitions)]
pub(crate) struct LoggingArgs {
    /// Additional logging to stderr.
    #[arg(long = "verbose", short = 'v')]
    pub(crate) verbose: bool,

    /// No logging at all, not even warnings about problems in the file.
    #[arg(long = "quiet", short = 'q', conflicts_with = "verbose")]
    pub(crate) quiet: bool,
}

impl LoggingArgs {
    pub(crate) fn level(&self) -> log::LevelFilter {
        use log::LevelFilter::{Info, Off, Trace};

        match *self {
            Self { quiet: true, .. } => Off,
            Self { verbose: true, .. } => Trace,
            _ => Info,
        }
    }
}

/// Install a [`log`] global logger based on user-provided `options`.
pub(crate) fn install(options: &LoggingArgs) -> Result<(), anyhow::Error> {
    use log::LevelFilter::Off;

    simplelog::WriteLogger::init(
        options.level(),
        simplelog::ConfigBuilder::new()
            .set_target_level(Off)
            .set_location_level(Off)
            .set_time_level(Off)
            .build(),
        std::io::stderr(),
    )
    .context("failed to initialize logging")
}
