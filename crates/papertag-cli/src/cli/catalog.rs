use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    Summary,
    Stats {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        category: Option<String>,
    },
    Verify {
        /// Exit non-zero when the stored summary has drifted.
        #[arg(long, default_value_t = false)]
        enforce: bool,
    },
    RebuildSummary,
    /// Re-runs normalization over stored records. Dry run unless `--apply`.
    Renormalize {
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
}
