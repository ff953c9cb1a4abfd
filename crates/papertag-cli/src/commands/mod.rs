use std::path::Path;

use anyhow::{Context, Result};
use papertag_core::Papertag;

use crate::cli::Commands;

mod handlers;
mod support;
mod validation;


use self::handlers::{
    handle_catalog, handle_group, handle_record, handle_trace, handle_vocabulary,
};
use self::support::print_json;
use self::validation::validate_command_preflight;

pub(crate) fn run_from_root(root: &Path, command: Commands) -> Result<()> {
    validate_command_preflight(&command)?;
    let app = Papertag::open(root)
        .with_context(|| format!("failed to open papertag root {}", root.display()))?;
    run_validated(&app, command)
}

fn run_validated(app: &Papertag, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            let report = app.initialize()?;
            print_json(&report)?;
        }
        Commands::Vocabulary(args) => handle_vocabulary(app, args.command)?,
        Commands::Group(args) => handle_group(app, args.command)?,
        Commands::Record(args) => handle_record(app, args.command)?,
        Commands::Catalog(args) => handle_catalog(app, args.command)?,
        Commands::Trace(args) => handle_trace(app, args.command)?,
    }
    Ok(())
}
