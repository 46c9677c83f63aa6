use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// envrisk - Environmental hazard lookup for a point
#[derive(Parser, Debug)]
#[command(name = "envrisk")]
#[command(about = "Environmental hazard lookup over polygon layers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration and layer manifest (TOML)
    #[arg(long, global = true, value_name = "FILE", default_value = "envrisk.toml")]
    pub config: PathBuf,

    /// Planar CRS EPSG code used for distances and rendering
    #[arg(long, global = true, value_name = "EPSG")]
    pub planar_crs: Option<u32>,

    /// Geometry validity mode (strict or lenient)
    #[arg(long, global = true, value_name = "MODE")]
    pub validity: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report hazard membership and neighborhood maps for a point
    Query(QueryArgs),

    /// List loaded layers with load statistics
    Layers,

    /// Show the effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Neighborhood radius in kilometres
    #[arg(long)]
    pub radius_km: Option<f64>,

    /// Only evaluate the named report section
    #[arg(long, value_name = "NAME")]
    pub section: Option<String>,

    /// Write neighborhood images as JPEG files into this directory
    #[arg(long, value_name = "DIR")]
    pub images: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_with_negative_longitude() {
        let cli = Cli::try_parse_from([
            "envrisk", "--json", "query", "--lat", "40.4", "--lon", "-3.7", "--radius-km", "25",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("envrisk.toml"));
        match cli.command {
            Commands::Query(args) => {
                assert_eq!(args.lon, -3.7);
                assert_eq!(args.radius_km, Some(25.0));
                assert!(args.section.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["envrisk", "layers", "--config", "hazards.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("hazards.toml"));
        assert!(matches!(cli.command, Commands::Layers));
    }
}
