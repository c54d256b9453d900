//! `vox-inspect`: decodes a MagicaVoxel `.vox` file, places its models, and prints a summary.
//!
//! Problems in the scene graph are logged as warnings to stderr; the summary goes to stdout.

// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]

use std::io::Write as _;

use clap::Parser as _;

use vox_scene::file::Fileish as _;
use vox_scene::{DecodeOptions, load_from_file, materialize};

mod command_options;
mod logging;
mod summary;

use command_options::InspectArgs;
use summary::{Summary, SummarySink};

fn main() -> Result<(), anyhow::Error> {
    let args = InspectArgs::parse();
    logging::install(&args.logging)?;
    let options = args.materialize_options()?;

    let scene = load_from_file(&args.input_file, &DecodeOptions::default())?;
    let mut sink = SummarySink::default();
    materialize(&scene, &options, &mut sink);

    let summary = Summary::new(args.input_file.document_name(), &scene, sink.volumes);
    let mut out = std::io::stdout().lock();
    summary.write(args.format, &mut out)?;
    out.flush()?;
    Ok(())
}
