use anyhow::Result;

use crate::cli::{Commands, GroupCommand, RecordCommand, VocabularyCommand};

pub(super) fn validate_command_preflight(command: &Commands) -> Result<()> {
    match command {
        Commands::Record(args) => validate_record_command(&args.command),
        Commands::Group(args) => validate_group_command(&args.command),
        Commands::Vocabulary(args) => validate_vocabulary_command(&args.command),
        _ => Ok(()),
    }
}

fn validate_record_command(command: &RecordCommand) -> Result<()> {
    match command {
        RecordCommand::Add {
            file,
            perspectives,
            fields,
        } => {
            if file.is_none() && perspectives.is_empty() && fields.is_empty() {
                anyhow::bail!(
                    "record add needs a source: use --file <path> and/or --set CATEGORY=LABEL"
                );
            }
            Ok(())
        }
        RecordCommand::Update {
            perspectives,
            fields,
            unset,
            ..
        } => {
            if perspectives.is_empty() && fields.is_empty() && unset.is_empty() {
                anyhow::bail!("record update needs at least one of --set, --field, --unset");
            }
            if let Some(key) = unset
                .iter()
                .find(|key| fields.iter().any(|(field, _)| field == *key))
            {
                anyhow::bail!("field '{key}' is both set and unset");
            }
            Ok(())
        }
        RecordCommand::Show { .. } | RecordCommand::List => Ok(()),
    }
}

fn validate_group_command(command: &GroupCommand) -> Result<()> {
    match command {
        GroupCommand::Create { name, .. } | GroupCommand::Accept { name, .. }
            if name.trim().is_empty() =>
        {
            anyhow::bail!("group name must not be empty")
        }
        GroupCommand::Suggest { limit: 0, .. } => {
            anyhow::bail!("--limit must be >= 1")
        }
        _ => Ok(()),
    }
}

fn validate_vocabulary_command(command: &VocabularyCommand) -> Result<()> {
    match command {
        VocabularyCommand::AddLabel { label, .. } if label.trim().is_empty() => {
            anyhow::bail!("canonical label must not be empty")
        }
        _ => Ok(()),
    }
}
