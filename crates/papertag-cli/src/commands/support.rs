use std::io::{Read, Write};
use std::path::Path;
use std::{fs, io};

use anyhow::{Context, Result};
use papertag_core::DraftFormat;
use papertag_core::catalog::parse_record_draft;
use papertag_core::models::{Perspectives, RecordDraft, RecordPatch};
use serde_json::{Map, Value};

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// `-` reads stdin as JSON; otherwise the extension picks JSON or YAML.
pub(super) fn read_record_draft(path: &Path) -> Result<RecordDraft> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(parse_record_draft(&buffer, DraftFormat::Json)?);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read record file {}", path.display()))?;
    parse_record_draft(&raw, DraftFormat::from_path(path))
        .with_context(|| format!("failed to parse record file {}", path.display()))
}

/// `--set`/`--field` pairs layered over an optional file draft; later pairs win.
pub(super) fn build_record_draft(
    base: Option<RecordDraft>,
    perspectives: Vec<(String, String)>,
    fields: Vec<(String, String)>,
) -> RecordDraft {
    let mut draft = base.unwrap_or_default();
    draft.perspectives.extend(perspectives);
    for (key, value) in fields {
        draft.fields.insert(key, Value::String(value));
    }
    draft
}

pub(super) fn build_record_patch(
    perspectives: Vec<(String, String)>,
    fields: Vec<(String, String)>,
    unset: Vec<String>,
) -> RecordPatch {
    let perspectives =
        (!perspectives.is_empty()).then(|| perspectives.into_iter().collect::<Perspectives>());
    let mut patch_fields = Map::new();
    for (key, value) in fields {
        patch_fields.insert(key, Value::String(value));
    }
    for key in unset {
        patch_fields.insert(key, Value::Null);
    }
    RecordPatch {
        perspectives,
        fields: patch_fields,
    }
}
