use anyhow::{Context, Result};
use papertag_core::{GroupUpsert, Papertag};
use serde_json::json;

use crate::cli::{CatalogCommand, GroupCommand, RecordCommand, TraceCommand, VocabularyCommand};

use super::print_json;
use super::support::{build_record_draft, build_record_patch, read_record_draft};

pub(super) fn handle_vocabulary(app: &Papertag, command: VocabularyCommand) -> Result<()> {
    match command {
        VocabularyCommand::List { category } => match category {
            Some(category) => {
                if !app.categories()?.contains(&category) {
                    anyhow::bail!("unknown category: {category}");
                }
                let labels = app.canonical_labels(&category)?;
                print_json(&json!({ "category": category, "canonical_tags": labels }))?;
            }
            None => print_json(&app.vocabulary()?)?,
        },
        VocabularyCommand::AddLabel {
            category,
            label,
            aliases,
        } => {
            let change = app.add_canonical_label(&category, &label, &aliases)?;
            print_json(&change)?;
        }
        VocabularyCommand::Normalize { category, label } => {
            let resolution = app.resolve_label(&label, &category);
            print_json(&json!({
                "input": label,
                "category": category,
                "normalized": resolution.label,
                "kind": resolution.kind,
            }))?;
        }
        VocabularyCommand::Validate { category, label } => {
            print_json(&app.validate_label(&label, &category))?;
        }
        VocabularyCommand::Collisions => print_json(&app.alias_collisions())?,
    }
    Ok(())
}

pub(super) fn handle_group(app: &Papertag, command: GroupCommand) -> Result<()> {
    match command {
        GroupCommand::List => print_json(&app.groups()?)?,
        GroupCommand::Create {
            name,
            category,
            tags,
            display_name,
            description,
        } => {
            let display_name = display_name.unwrap_or_else(|| name.clone());
            let group = app.create_or_update_group(GroupUpsert {
                name: name.clone(),
                category,
                labels: tags,
                display_name,
                description,
            })?;
            print_json(&json!({ "name": name, "group": group }))?;
        }
        GroupCommand::Related { label } => {
            let group = app.tag_group(&label)?;
            let related = app.related_tags(&label)?;
            print_json(&json!({ "label": label, "group": group, "related": related }))?;
        }
        GroupCommand::Suggest {
            min_cooccurrence,
            limit,
        } => {
            let suggestions = app.suggest_groups(min_cooccurrence, Some(limit))?;
            print_json(&suggestions)?;
        }
        GroupCommand::Accept {
            index,
            name,
            display_name,
            description,
            min_cooccurrence,
        } => {
            let suggestions = app.suggest_groups(min_cooccurrence, None)?;
            let suggestion = suggestions.get(index).with_context(|| {
                format!(
                    "no suggestion at index {index} ({} available)",
                    suggestions.len()
                )
            })?;
            let group = app.accept_suggestion(
                suggestion,
                &name,
                display_name.as_deref(),
                description.as_deref(),
            )?;
            print_json(&json!({ "name": name, "group": group }))?;
        }
    }
    Ok(())
}

pub(super) fn handle_record(app: &Papertag, command: RecordCommand) -> Result<()> {
    match command {
        RecordCommand::Add {
            file,
            perspectives,
            fields,
        } => {
            let base = file.as_deref().map(read_record_draft).transpose()?;
            let draft = build_record_draft(base, perspectives, fields);
            let outcome = app.add_record(draft)?;
            print_json(&outcome)?;
        }
        RecordCommand::Update {
            paper_id,
            perspectives,
            fields,
            unset,
        } => {
            let patch = build_record_patch(perspectives, fields, unset);
            let record = app.update_record(&paper_id, patch)?;
            print_json(&record)?;
        }
        RecordCommand::Show { paper_id } => print_json(&app.record(&paper_id)?)?,
        RecordCommand::List => print_json(&app.records()?)?,
    }
    Ok(())
}

pub(super) fn handle_catalog(app: &Papertag, command: CatalogCommand) -> Result<()> {
    match command {
        CatalogCommand::Summary => print_json(&app.summary()?)?,
        CatalogCommand::Stats { limit, category } => match category {
            Some(category) => {
                let top = app.top_labels(&category, limit)?;
                print_json(&json!({ "category": category, "top_labels": top }))?;
            }
            None => print_json(&app.catalog_stats(limit)?)?,
        },
        CatalogCommand::Verify { enforce } => {
            let report = app.verify_summary()?;
            print_json(&report)?;
            if enforce && !report.consistent {
                anyhow::bail!(
                    "catalog summary drifted: {}",
                    report.drifted_categories.join(", ")
                );
            }
        }
        CatalogCommand::RebuildSummary => print_json(&app.rebuild_summary()?)?,
        CatalogCommand::Renormalize { apply } => {
            print_json(&app.renormalize_records(apply)?)?;
        }
    }
    Ok(())
}

pub(super) fn handle_trace(app: &Papertag, command: TraceCommand) -> Result<()> {
    match command {
        TraceCommand::Requests {
            limit,
            operation,
            status,
        } => {
            let logs =
                app.list_request_logs_filtered(limit, operation.as_deref(), status.as_deref())?;
            print_json(&logs)?;
        }
    }
    Ok(())
}
