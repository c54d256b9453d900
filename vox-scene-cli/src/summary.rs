//! Description of a decoded and materialized scene, for printing.

use std::io;

use serde::Serialize;

use vox_scene::{Volume, VolumeSink, VoxScene};

use crate::command_options::OutputFormat;

/// Everything `vox-inspect` reports about one file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) name: String,
    pub(crate) version: u32,
    pub(crate) custom_palette: bool,
    pub(crate) models: usize,
    pub(crate) nodes: usize,
    pub(crate) materials: usize,
    pub(crate) layers: usize,
    pub(crate) cameras: usize,
    pub(crate) palette_notes: Vec<String>,
    pub(crate) volumes: Vec<VolumeSummary>,
}

/// One materialized [`Volume`], without its grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct VolumeSummary {
    pub(crate) name: String,
    pub(crate) model_index: usize,
    pub(crate) size: [u32; 3],
    pub(crate) filled_cells: usize,
    pub(crate) translation: [i64; 3],
    /// Columns.
    pub(crate) orientation: [[f64; 3]; 3],
}

impl Summary {
    pub(crate) fn new(name: String, scene: &VoxScene, volumes: Vec<VolumeSummary>) -> Self {
        Self {
            name,
            version: scene.version(),
            custom_palette: scene.has_custom_palette(),
            models: scene.model_count(),
            nodes: scene.nodes().len(),
            materials: scene.materials().len(),
            layers: scene.layers().len(),
            cameras: scene.cameras().len(),
            palette_notes: scene
                .notes()
                .iter()
                .flat_map(|note| note.names.iter().cloned())
                .collect(),
            volumes,
        }
    }

    pub(crate) fn write(&self, format: OutputFormat, out: &mut dyn io::Write) -> io::Result<()> {
        match format {
            OutputFormat::Text => self.write_text(out),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                writeln!(out)
            }
        }
    }

    fn write_text(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let Self {
            name,
            version,
            custom_palette,
            models,
            nodes,
            materials,
            layers,
            cameras,
            palette_notes,
            volumes,
        } = self;
        writeln!(
            out,
            "{name}: .vox version {version}, {models} models, {nodes} scene nodes, \
            {materials} materials, {layers} layers, {cameras} cameras, {palette} palette",
            palette = if *custom_palette { "custom" } else { "default" },
        )?;
        if !palette_notes.is_empty() {
            writeln!(out, "palette notes: {}", palette_notes.join(", "))?;
        }
        for (i, volume) in volumes.iter().enumerate() {
            let VolumeSummary {
                name,
                model_index,
                size: [x, y, z],
                filled_cells,
                translation: [tx, ty, tz],
                orientation: _,
            } = volume;
            writeln!(
                out,
                "volume {i} {name:?}: model {model_index}, {x}×{y}×{z} cells, \
                {filled_cells} filled, at [{tx}, {ty}, {tz}]"
            )?;
        }
        Ok(())
    }
}

/// [`VolumeSink`] which keeps only a [`VolumeSummary`] of each volume.
#[derive(Debug, Default)]
pub(crate) struct SummarySink {
    pub(crate) volumes: Vec<VolumeSummary>,
}

impl VolumeSink for SummarySink {
    fn add_volume(&mut self, volume: Volume) {
        self.volumes.push(VolumeSummary {
            name: volume.name,
            model_index: volume.model_index,
            size: volume.grid.size().to_array(),
            filled_cells: volume.grid.filled().count(),
            translation: volume.translation.to_array(),
            orientation: volume.orientation.map(|column| column.to_array()),
        });
    }
}
