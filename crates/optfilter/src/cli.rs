//! Command line interface.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::page::Page;
use crate::app::report::{FilterReport, ReportFormat};
use crate::infra::config::Config;
use crate::ui::app::UiApp;

const DEMO_PAGE: &str = include_str!("../assets/demo.html");

#[derive(Debug, Parser)]
#[command(
    name = "optfilter",
    author,
    version,
    about = "Live filtering for multi-select lists declared in markup",
    long_about = None
)]
pub struct Cli {
    /// Configuration file to use instead of the user and workspace layers.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Class that marks an input as a filter.
    #[arg(long, global = true, value_name = "CLASS")]
    marker_class: Option<String>,
    /// Attribute on a filter input naming the id of its list.
    #[arg(long, global = true, value_name = "ATTR")]
    target_attribute: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the filter bindings of a page and report unresolved targets
    Check {
        file: PathBuf,
        /// Fail when any target is unresolved
        #[arg(long)]
        strict: bool,
    },
    /// Type text into filter inputs and print the result
    Filter {
        file: PathBuf,
        /// Binding key (input id, list id, or #N) and the text to type
        #[arg(long = "set", value_name = "KEY=TEXT")]
        assignments: Vec<String>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Plain)]
        format: ReportFormat,
        /// Include hidden options in plain output
        #[arg(long)]
        all: bool,
    },
    /// Filter a page interactively
    Tui { file: PathBuf },
    /// Print a demo page with genre and band pickers
    Demo,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse arguments from the process and run the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &mut out)
}

/// Run a parsed command, writing its output to `out`.
pub fn execute<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match &cli.command {
        Commands::Demo => {
            out.write_all(DEMO_PAGE.as_bytes())?;
            Ok(())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "optfilter", out);
            Ok(())
        }
        Commands::Check { file, strict } => {
            let config = resolve_config(&cli)?;
            check(&config, file, *strict, out)
        }
        Commands::Filter {
            file,
            assignments,
            format,
            all,
        } => {
            let config = resolve_config(&cli)?;
            filter(&config, file, assignments, *format, *all, out)
        }
        Commands::Tui { file } => {
            let config = resolve_config(&cli)?;
            UiApp::new(config, file.clone()).run()
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            Config::load_from(path)?
        }
        None => Config::load()?,
    };
    if let Some(marker_class) = &cli.marker_class {
        config.discovery.set_marker_class(marker_class.clone());
    }
    if let Some(target_attribute) = &cli.target_attribute {
        config.discovery.set_target_attribute(target_attribute.clone());
    }
    Ok(config)
}

fn check<W: Write>(config: &Config, file: &Path, strict: bool, out: &mut W) -> Result<()> {
    let page = Page::load(file, config.discovery.clone())?;

    for (index, binding) in page.bindings().iter().enumerate() {
        writeln!(
            out,
            "bound       {} -> {} ({} options)",
            binding.key(),
            binding.target,
            page.outcome(index).total()
        )?;
    }
    for unresolved in page.unresolved() {
        let key = unresolved
            .input_id
            .clone()
            .unwrap_or_else(|| format!("#{}", unresolved.ordinal));
        writeln!(out, "unresolved  {} -> {}", key, unresolved.target_label())?;
    }
    writeln!(
        out,
        "{} bound, {} unresolved",
        page.bindings().len(),
        page.unresolved().len()
    )?;

    if strict && !page.unresolved().is_empty() {
        bail!(
            "{} filter target(s) not found in {}",
            page.unresolved().len(),
            file.display()
        );
    }
    Ok(())
}

fn filter<W: Write>(
    config: &Config,
    file: &Path,
    assignments: &[String],
    format: ReportFormat,
    all: bool,
    out: &mut W,
) -> Result<()> {
    let mut page = Page::load(file, config.discovery.clone())?;

    for assignment in assignments {
        let outcome = page
            .apply_assignment(assignment)
            .with_context(|| format!("failed to apply --set {assignment}"))?;
        tracing::info!(
            assignment = %assignment,
            shown = outcome.shown,
            hidden = outcome.hidden,
            "filter applied"
        );
    }

    tracing::debug!(format = format.as_str(), "rendering report");
    match format {
        ReportFormat::Plain => {
            let report = FilterReport::from_page(&page);
            out.write_all(report.to_plain(all || config.display.show_hidden()).as_bytes())?;
        }
        ReportFormat::Json => {
            let report = FilterReport::from_page(&page);
            writeln!(out, "{}", report.to_json().context("failed to serialize report")?)?;
        }
        ReportFormat::Html => {
            writeln!(out, "{}", page.render())?;
        }
    }
    Ok(())
}
