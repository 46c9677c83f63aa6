//! Query command implementation

use crate::cli::{Cli, QueryArgs};
use crate::errors;
use crate::loader::{build_store, load_config, Manifest};
use crate::output::OutputWriter;
use crate::output_types::QueryOutput;
use anyhow::{Context, Result};
use envrisk_core::models::Classification;
use envrisk_engine::{HazardReport, ImageStatus, RiskEngine, SectionReport};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn execute(cli: &Cli, args: &QueryArgs, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;
    let manifest = Manifest::load(&cli.config)?;
    if manifest.layers.is_empty() {
        return Err(errors::no_layers(&cli.config).into());
    }

    let mut plan = manifest.plan()?;
    let store = build_store(&config, &manifest)?;
    plan.check_layers(&store).map_err(|e| errors::section_layer_not_loaded(&e, &cli.config))?;

    if let Some(name) = &args.section {
        let available: Vec<String> = plan.sections.iter().map(|s| s.name.clone()).collect();
        plan = plan.only(name).map_err(|_| errors::section_not_found(name, &available))?;
    }

    let store = Arc::new(store);
    let engine = RiskEngine::from_config(store, &config);

    let report = engine.report(&plan, args.lat, args.lon, args.radius_km).map_err(|e| {
        if e.is_bad_input() {
            anyhow::Error::from(errors::bad_query(&e))
        } else {
            anyhow::Error::from(e)
        }
    })?;

    let image_files = match &args.images {
        Some(dir) => write_images(&report, dir)?,
        None => Vec::new(),
    };

    if output.is_json() {
        return output.result(QueryOutput { report, image_files });
    }

    print_report(&report, output);
    if let Some(dir) = &args.images {
        output.success(format!("Wrote {} image(s) to {}", image_files.len(), dir.display()));
    }
    Ok(())
}

/// One `<section>.jpg` per section that produced an image
fn write_images(report: &HazardReport, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create image directory {}", dir.display()))?;

    let mut written = Vec::new();
    for section in &report.sections {
        if let Some(bytes) = &section.image.image_bytes {
            let path = dir.join(format!("{}.jpg", section.name));
            fs::write(&path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);
        }
    }
    Ok(written)
}

fn print_report(report: &HazardReport, output: &OutputWriter) {
    output.info(format!(
        "Hazard report for ({:.5}, {:.5}), neighborhood radius {} km",
        report.lat, report.lon, report.radius_km
    ));

    for section in &report.sections {
        print_section(section, output);
    }
}

fn print_section(section: &SectionReport, output: &OutputWriter) {
    let membership = &section.membership;
    output.section(&section.name);
    output.kv("Layer", &section.layer);
    output.kv("Matched", if membership.matched { "yes" } else { "no" });

    if let Some(classification) = &membership.classification {
        output.kv("Classification", describe(classification));
    }
    if let Some(label) = &membership.label {
        output.kv("Label", label);
    }
    if let Some(key) = &membership.match_key {
        output.kv("Match key", key);
    }
    if let Some(intensity) = membership.intensity {
        output.kv("Intensity", intensity);
    }

    let image = &section.image;
    let status = match image.status {
        ImageStatus::Rendered => format!("rendered, {} record(s)", image.record_count),
        ImageStatus::Empty => "no records nearby".to_string(),
        ImageStatus::Failed => "rendering failed".to_string(),
    };
    output.kv("Neighborhood", status);
    if image.status == ImageStatus::Failed {
        output.warning(format!("No neighborhood image for section '{}'", section.name));
    }
}

fn describe(classification: &Classification) -> String {
    match classification {
        Classification::Code(code) => code.to_string(),
        Classification::Numeric(value) => value.to_string(),
        Classification::Attributes(attributes) => format!("{} attribute(s)", attributes.len()),
        Classification::Unclassified => "unclassified".to_string(),
    }
}
