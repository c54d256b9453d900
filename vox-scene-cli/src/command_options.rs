//! Command line option parsing.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use vox_scene::{AxisConvention, MaterializeOptions};

use crate::logging::LoggingArgs;

#[derive(Clone, Debug, Parser)]
#[command(name = "vox-inspect", author, about, version)]
pub(crate) struct InspectArgs {
    /// Which axis of the output coordinate system points up.
    ///
    /// Overrides the value in the --config file. The default is y-up.
    #[arg(long = "axis", value_name = "AXIS")]
    pub(crate) axis: Option<AxisArg>,

    /// JSON file containing options for placing the models of the scene.
    ///
    /// Keys that are absent take their default values; for example:
    /// {"max_depth": 64, "fallback_to_models": false}
    #[arg(long = "config", value_name = "FILE", verbatim_doc_comment)]
    pub(crate) config: Option<PathBuf>,

    /// How to print the summary of the file.
    #[arg(long = "format", value_name = "FORMAT", default_value = "text")]
    pub(crate) format: OutputFormat,

    #[command(flatten)]
    pub(crate) logging: LoggingArgs,

    /// The .vox file to inspect.
    #[arg(value_name = "FILE")]
    pub(crate) input_file: PathBuf,
}

impl InspectArgs {
    /// Constructs the [`MaterializeOptions`] from the config file, if any, and the
    /// command-line overrides.
    pub(crate) fn materialize_options(&self) -> Result<MaterializeOptions, anyhow::Error> {
        let mut options = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open config file {}", path.display()))?;
                let options: MaterializeOptions =
                    serde_json::from_reader(BufReader::new(file)).with_context(|| {
                        format!("failed to parse config file {}", path.display())
                    })?;
                log::trace!("loaded options from {}: {options:?}", path.display());
                options
            }
            None => MaterializeOptions::default(),
        };
        if let Some(axis) = self.axis {
            log::trace!("--axis {} overrides config", <&str>::from(axis));
            options = options.with_axis_convention(axis.into());
        }
        Ok(options)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum AxisArg {
    #[value(help = "Keep the file's axes")]
    ZUp,
    #[value(help = "Exchange the file's Y and Z axes")]
    YUp,
}

impl From<AxisArg> for AxisConvention {
    fn from(value: AxisArg) -> Self {
        match value {
            AxisArg::ZUp => AxisConvention::ZUp,
            AxisArg::YUp => AxisConvention::YUp,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    #[value(help = "Human-readable lines")]
    Text,
    #[value(help = "A JSON object")]
    Json,
}
