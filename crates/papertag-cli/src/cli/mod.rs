use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod catalog;
mod group;
mod parsers;
mod record;
mod trace;
mod vocabulary;


pub use catalog::{CatalogArgs, CatalogCommand};
pub use group::{GroupArgs, GroupCommand};
pub use record::{RecordArgs, RecordCommand};
pub use trace::{TraceArgs, TraceCommand};
pub use vocabulary::{VocabularyArgs, VocabularyCommand};

#[derive(Debug, Parser)]
#[command(name = "papertag")]
#[command(about = "Multi-perspective tagging for a research paper catalog", version)]
pub struct Cli {
    #[arg(long, default_value = ".papertag")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Init,
    Vocabulary(VocabularyArgs),
    Group(GroupArgs),
    Record(RecordArgs),
    Catalog(CatalogArgs),
    Trace(TraceArgs),
}
