use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::parsers::parse_assignment;

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: RecordCommand,
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Adds a record from a JSON/YAML file (`-` reads stdin as JSON) and/or
    /// `--set category=label` pairs.
    Add {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long = "set", value_name = "CATEGORY=LABEL", value_parser = parse_assignment)]
        perspectives: Vec<(String, String)>,
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    Update {
        paper_id: String,
        #[arg(long = "set", value_name = "CATEGORY=LABEL", value_parser = parse_assignment)]
        perspectives: Vec<(String, String)>,
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
        #[arg(long = "unset", value_name = "KEY")]
        unset: Vec<String>,
    },
    Show {
        paper_id: String,
    },
    List,
}
