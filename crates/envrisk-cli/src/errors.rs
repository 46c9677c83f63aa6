use console::style;
use std::fmt;
use std::path::Path;

/// User-facing error with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    /// Print the message, context, numbered suggestions and help hint to stderr
    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());
        eprint!("{}", self.details());
        if let Some(help) = &self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help).cyan().bold());
        }
    }

    /// Context and suggestions as plain text
    pub fn details(&self) -> String {
        let mut text = String::new();
        if let Some(context) = &self.context {
            text.push_str(context);
            text.push_str("\n\n");
        }
        if !self.suggestions.is_empty() {
            text.push_str("To fix this:\n");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                text.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
            text.push('\n');
        }
        text
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Manifest file missing
pub fn manifest_not_found(path: &Path) -> CliError {
    CliError::new("Layer manifest not found")
        .with_context(format!(
            "The configuration file naming the hazard layers does not exist.\n\nPath: {}",
            path.display()
        ))
        .with_suggestion("Pass the manifest explicitly: envrisk --config hazards.toml query ...")
        .with_suggestion(
            "Or create envrisk.toml with one [[layers]] entry per dataset:\n  [[layers]]\n  id = \"desert_mainland\"\n  path = \"data/desertification.geojson\"\n  preset = \"desertification\"",
        )
        .with_help("Run: envrisk --help")
}

/// Manifest lists no layers
pub fn no_layers(path: &Path) -> CliError {
    CliError::new("No layers configured")
        .with_context(format!("The manifest at {} has no [[layers]] entries.", path.display()))
        .with_suggestion("Add a [[layers]] entry with id, path and preset")
        .with_help("Run: envrisk layers --help")
}

/// Dataset file named by a layer is missing
pub fn layer_source_not_found(layer: &str, path: &Path) -> CliError {
    CliError::new(format!("Dataset for layer '{}' not found", layer))
        .with_context(format!("Path: {}", path.display()))
        .with_suggestion("Check the layer's path in the manifest")
        .with_suggestion("Relative paths are resolved against the manifest's directory")
}

/// Unknown --section name
pub fn section_not_found(name: &str, available: &[String]) -> CliError {
    CliError::new(format!("Unknown report section '{}'", name))
        .with_context(format!("Available sections: {}", available.join(", ")))
        .with_suggestion("Pick one of the sections above, or omit --section to run them all")
        .with_help("Run: envrisk query --help")
}

/// A `[[sections]]` entry names a layer with no `[[layers]]` entry
pub fn section_layer_not_loaded(reason: impl fmt::Display, manifest: &Path) -> CliError {
    CliError::new("Report section refers to an unknown layer")
        .with_context(format!("{}\n\nManifest: {}", reason, manifest.display()))
        .with_suggestion("Check the layer ids listed under [[sections]] for typos")
        .with_suggestion("Every id in a section must match the id of a [[layers]] entry")
        .with_help("Run: envrisk layers")
}

/// Coordinates or radius rejected before any geometry work
pub fn bad_query(reason: impl fmt::Display) -> CliError {
    CliError::new("Invalid query")
        .with_context(reason.to_string())
        .with_suggestion("Latitude must be within [-90, 90] and longitude within [-180, 180]")
        .with_suggestion("The radius must be a non-negative number of kilometres")
        .with_help("Run: envrisk query --help")
}
