use std::fmt::Write as _;

use serde_json::Value;

use super::generator::GeneratedArtifact;
use super::schema::{FieldKind, FieldSpec};

/// Markdown view of an artifact, laid out by its schema.
pub fn markdown(artifact: &GeneratedArtifact) -> String {
    let schema = artifact.kind.schema();
    let mut out = format!("# {}\n", artifact.kind.title());
    write_fields(&mut out, schema.fields, &artifact.value, 2);
    out
}

fn write_fields(out: &mut String, fields: &[FieldSpec], value: &Value, depth: usize) {
    let hashes = "#".repeat(depth);
    for field in fields {
        let Some(entry) = value.get(field.name) else {
            continue;
        };
        let _ = writeln!(out, "\n{hashes} {}\n", field.title);
        match field.kind {
            FieldKind::Number => {
                let _ = writeln!(out, "{}", format_number(entry));
            }
            FieldKind::Text { .. } => {
                let _ = writeln!(out, "{}", entry.as_str().unwrap_or_default());
            }
            FieldKind::TextList { .. } => {
                for item in entry.as_array().into_iter().flatten() {
                    let _ = writeln!(out, "- {}", item.as_str().unwrap_or_default());
                }
            }
            FieldKind::Object(children) => write_fields(out, children, entry, depth + 1),
        }
    }
}

fn format_number(value: &Value) -> String {
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{n:.1}"),
        Some(n) => n.to_string(),
        None => value.to_string(),
    }
}
