use console::style;
use overlapcheck_core::OverlapError;
use std::fmt;

/// Error with remediation hints, printed by `main`
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new() }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
        }
    }

    /// Turn an application error into a CLI error, adding hints for the
    /// failures users can fix themselves
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = err.to_string();
        let root = err.chain().find_map(|cause| cause.downcast_ref::<OverlapError>());

        let mut cli_error = match root {
            Some(overlap) if overlap.to_string() != message => {
                CliError::new(message).with_context(overlap.to_string())
            }
            _ => CliError::new(message),
        };

        match root {
            Some(OverlapError::CrsMissing { side }) => {
                cli_error = cli_error
                    .with_suggestion(format!(
                        "Add a .prj file or a \"crs\" member to the {} dataset",
                        side
                    ))
                    .with_suggestion("Check the CRS with 'overlapcheck inspect <FILE>'");
            }
            Some(OverlapError::CrsNotProjected { .. }) => {
                cli_error = cli_error.with_suggestion(
                    "Reproject the dataset to a projected CRS in metres (e.g. a UTM zone)",
                );
            }
            Some(OverlapError::CrsMismatch { .. }) => {
                cli_error = cli_error
                    .with_suggestion("Pass '--crs-policy reproject' to transform the right dataset")
                    .with_suggestion(
                        "Pass '--crs-policy override' only if the right coordinates are already in the left CRS",
                    );
            }
            Some(OverlapError::CrsUnresolved { .. }) => {
                if cfg!(not(feature = "reproject")) {
                    cli_error = cli_error
                        .with_suggestion("Rebuild with '--features reproject' to look the code up with PROJ");
                }
                cli_error = cli_error
                    .with_suggestion("Ship the dataset with a .prj file whose UNIT names the axis unit");
            }
            Some(OverlapError::Reprojection { .. }) => {
                cli_error = if cfg!(feature = "reproject") {
                    cli_error.with_suggestion(
                        "Make sure both datasets carry an EPSG code known to PROJ (see 'overlapcheck inspect')",
                    )
                } else {
                    cli_error.with_suggestion("Rebuild with '--features reproject' to enable PROJ support")
                };
            }
            Some(OverlapError::UnsupportedFormat { .. }) => {
                cli_error = cli_error.with_suggestion("Convert the dataset to GeoJSON or Shapefile");
            }
            Some(OverlapError::RowOutOfRange { len, .. }) => {
                cli_error = cli_error.with_suggestion(format!(
                    "Choose a row between 0 and {} (see 'overlapcheck check')",
                    len.saturating_sub(1)
                ));
            }
            _ => {}
        }

        cli_error
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
