use clap::{Args, Parser, Subcommand};
use plastic_config::{OutputFormat, Overrides};
use plastic_spool::PrinterRef;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plastic", bin_name = "plastic", version, disable_help_subcommand = true)]
#[command(about = "Render templates to PDF and send them to a printer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format for results and errors (json or log)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub format: Option<OutputFormat>,

    /// Directory of templates [default: ./templates, relative to the current directory]
    #[arg(short, long, global = true, value_name = "DIR", help_heading = "Options")]
    pub template_path: Option<PathBuf>,

    /// Document name reported to the print spooler
    #[arg(long, global = true, value_name = "NAME", help_heading = "Options")]
    pub docname: Option<String>,

    /// Log more to stderr (repeat for more detail; RUST_LOG takes precedence)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, help_heading = "Options")]
    pub verbose: u8,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            template_path: self.template_path.clone(),
            format: self.format,
            docname: self.docname.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the printers known to the print spooler
    #[command(visible_alias = "ps")]
    Printers,

    /// Render a template with data and print it, or save the PDF
    #[command(visible_alias = "p")]
    Print(PrintArgs),

    /// Show this help
    #[command(visible_alias = "h")]
    Help,
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Name of the template directory
    pub template: String,

    /// Record data: a JSON object, a JSON array of objects, or CSV rows
    pub data: String,

    /// Printer index (as listed by `printers`) or name
    #[arg(short, long)]
    pub printer: Option<PrinterRef>,

    /// Save the PDF to this file instead of printing it
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Format of the data argument (json or csv)
    #[arg(short, long, default_value = "json")]
    pub input: String,
}
