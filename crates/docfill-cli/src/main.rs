//! docfill CLI - fill a document template from a spreadsheet

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use docfill::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "docfill")]
#[command(
    author,
    version,
    about = "Fill a document template's bookmarks and charts from a spreadsheet"
)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the template and write the result
    Convert {
        /// Spreadsheet with named ranges and charts (xlsx)
        spreadsheet: PathBuf,

        /// Template document with bookmarks (docx)
        template: PathBuf,

        /// Output document (default: the spreadsheet path with .docx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Widest a table may be laid out, in centimetres
        #[arg(long, value_name = "CM")]
        max_table_width: Option<f64>,
    },

    /// Print what would be placed into the template, as JSON
    Inspect {
        /// Spreadsheet with named ranges and charts (xlsx)
        spreadsheet: PathBuf,

        /// Template document with bookmarks (docx)
        template: PathBuf,
    },

    /// List a template's bookmarks and chart titles
    Bookmarks {
        /// Template document (docx)
        template: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Convert {
            spreadsheet,
            template,
            output,
            max_table_width,
        } => convert_command(&spreadsheet, &template, output.as_deref(), max_table_width),
        Commands::Inspect {
            spreadsheet,
            template,
        } => inspect(&spreadsheet, &template),
        Commands::Bookmarks { template } => list_bookmarks(&template),
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

fn convert_command(
    spreadsheet: &Path,
    template: &Path,
    output: Option<&Path>,
    max_table_width: Option<f64>,
) -> Result<()> {
    let mut options = ConvertOptions::default();
    if let Some(cm) = max_table_width {
        options = options.with_max_table_width(cm);
    }

    let bytes = convert_with_options(&read(spreadsheet)?, &read(template)?, &options)
        .with_context(|| {
            format!(
                "Failed to fill '{}' from '{}'",
                template.display(),
                spreadsheet.display()
            )
        })?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| docfill::default_output_path(spreadsheet));
    std::fs::write(&output, bytes)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    eprintln!("Wrote '{}'", output.display());
    Ok(())
}

fn inspect(spreadsheet: &Path, template: &Path) -> Result<()> {
    let request = docfill::extract(&read(spreadsheet)?, &read(template)?, &ConvertOptions::default())
        .context("Failed to read the spreadsheet")?;
    let json = serde_json::to_string_pretty(&request).context("Failed to serialize")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("Failed to write to stdout")?;
    Ok(())
}

fn list_bookmarks(template: &Path) -> Result<()> {
    let doc = TemplateDocument::from_bytes(&read(template)?)
        .with_context(|| format!("Failed to open '{}'", template.display()))?;

    println!("Bookmarks:");
    for name in doc.bookmark_names() {
        println!("  {name}");
    }
    let titles = doc.chart_titles();
    if !titles.is_empty() {
        println!("Charts:");
        for title in titles {
            println!("  {title}");
        }
    }
    Ok(())
}
