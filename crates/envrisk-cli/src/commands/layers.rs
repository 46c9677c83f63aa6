//! Layers command implementation

use crate::cli::Cli;
use crate::errors;
use crate::loader::{build_store, load_config, Manifest};
use crate::output::OutputWriter;
use crate::output_types::{LayerInfo, LayersOutput};
use anyhow::Result;
use tabled::Tabled;

pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;
    let manifest = Manifest::load(&cli.config)?;
    if manifest.layers.is_empty() {
        return Err(errors::no_layers(&cli.config).into());
    }

    let store = build_store(&config, &manifest)?;

    let layers: Vec<LayerInfo> = store
        .layers()
        .map(|layer| {
            let report = layer.report();
            LayerInfo {
                id: layer.id().to_string(),
                title: layer.meta().title.clone(),
                source_crs: layer.source_crs().epsg,
                records: layer.len(),
                discarded: report.discarded,
                defective: report.defective,
                skipped_features: report.skipped_features,
                overlaps: report.overlaps.clone(),
            }
        })
        .collect();

    if output.is_json() {
        return output.result(LayersOutput { planar_crs: config.planar_crs.value, layers });
    }

    output.section(format!("Layers (planar frame EPSG:{})", config.planar_crs.value));

    #[derive(Tabled)]
    struct LayerRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Source CRS")]
        crs: String,
        #[tabled(rename = "Records")]
        records: usize,
        #[tabled(rename = "Discarded")]
        discarded: usize,
        #[tabled(rename = "Defective")]
        defective: usize,
        #[tabled(rename = "Overlaps")]
        overlaps: usize,
    }

    for layer in layers.iter().filter(|layer| !layer.overlaps.is_empty()) {
        output.warning(format!(
            "Layer '{}' has {} overlapping record pair(s); the first record in load order wins",
            layer.id,
            layer.overlaps.len()
        ));
    }

    output.table(
        layers
            .into_iter()
            .map(|layer| LayerRow {
                id: layer.id,
                title: layer.title,
                crs: format!("EPSG:{}", layer.source_crs),
                records: layer.records,
                discarded: layer.discarded,
                defective: layer.defective,
                overlaps: layer.overlaps.len(),
            })
            .collect(),
    );
    Ok(())
}
