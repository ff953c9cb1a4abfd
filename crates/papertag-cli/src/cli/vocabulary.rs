use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct VocabularyArgs {
    #[command(subcommand)]
    pub command: VocabularyCommand,
}

#[derive(Debug, Subcommand)]
pub enum VocabularyCommand {
    /// Canonical labels for one category, or the whole vocabulary.
    List {
        #[arg(long)]
        category: Option<String>,
    },
    AddLabel {
        category: String,
        label: String,
        #[arg(long = "alias", value_name = "ALIAS")]
        aliases: Vec<String>,
    },
    Normalize {
        category: String,
        #[arg(allow_hyphen_values = true)]
        label: String,
    },
    Validate {
        category: String,
        #[arg(allow_hyphen_values = true)]
        label: String,
    },
    /// Keys that resolve to two canonical labels in the loaded vocabulary.
    Collisions,
}
