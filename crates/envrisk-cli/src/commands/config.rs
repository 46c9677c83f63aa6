//! Config command implementation

use crate::cli::Cli;
use crate::loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use tabled::Tabled;

pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;

    let mut values: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry {
            key,
            value,
            source: format!("{:?}", source),
        })
        .collect();
    values.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(ConfigOutput { values });
    }

    output.section("Effective Configuration");

    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    output.table(
        values
            .into_iter()
            .map(|entry| ConfigRow { key: entry.key, value: entry.value, source: entry.source })
            .collect(),
    );
    Ok(())
}
