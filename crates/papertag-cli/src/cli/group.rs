use clap::{Args, Subcommand};

use super::parsers::parse_min_one_usize;

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long = "tags", value_delimiter = ',', required = true)]
        tags: Vec<String>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    Related {
        label: String,
    },
    Suggest {
        #[arg(long, value_parser = parse_min_one_usize)]
        min_cooccurrence: Option<usize>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Writes the suggestion at `index` (as listed by `group suggest`) into
    /// the group document.
    Accept {
        index: usize,
        #[arg(long)]
        name: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_min_one_usize)]
        min_cooccurrence: Option<usize>,
    },
}
