//! Console rendering of query matches.

use std::io::{self, Write};

use serde_json::Value;
use tutorsearch_core::types::{Metadata, QueryMatch};

const MISSING: &str = "N/A";
const SEPARATOR_WIDTH: usize = 20;

pub fn render<W: Write>(out: &mut W, query: &str, matches: &[QueryMatch], snippet_chars: usize) -> io::Result<()> {
    writeln!(out, "\n--- Search Results for Query: '{query}' ---")?;
    if matches.is_empty() {
        writeln!(out, "No matches found.")?;
        return Ok(());
    }
    for (rank, m) in matches.iter().enumerate() {
        writeln!(out, "{}. Score: {}", rank + 1, format_score(m.score))?;
        writeln!(out, "   ID: {}", if m.id.is_empty() { MISSING } else { m.id.as_str() })?;
        writeln!(out, "   Exercise ID: {}", field(&m.metadata, "exercise_id"))?;
        writeln!(out, "   Chunk Type: {}", field(&m.metadata, "chunk_type"))?;
        writeln!(out, "   Topic: {}", field(&m.metadata, "topic"))?;
        writeln!(out, "   Grade: {}", field(&m.metadata, "grade"))?;
        writeln!(out, "   Text Snippet: {}", snippet(&m.metadata, snippet_chars))?;
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    }
    Ok(())
}

/// Four decimals (half away from zero), trailing zeros dropped, at least one
/// fractional digit.
pub fn format_score(score: f64) -> String {
    let rounded = (score * 10_000.0).round() / 10_000.0;
    if rounded.fract() == 0.0 { format!("{rounded:.1}") } else { rounded.to_string() }
}

fn field(metadata: &Metadata, key: &str) -> String {
    match metadata.get(key) {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(value) => plain(value),
    }
}

/// Cut on char boundaries; `...` marks every snippet, even short ones.
fn snippet(metadata: &Metadata, max_chars: usize) -> String {
    let text = match metadata.get("text") {
        None | Some(Value::Null) => return MISSING.to_string(),
        Some(value) => plain(value),
    };
    if text.is_empty() {
        return MISSING.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
