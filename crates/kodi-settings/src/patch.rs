//! Line-oriented text patching for config files the engine does not own.
//!
//! Other subsystems write to the same files, so patches are surgical: the
//! single line belonging to a key is rewritten in place and everything else
//! is left byte-for-byte untouched. All transforms are idempotent; applying
//! the same patch twice yields the same content as applying it once.

use crate::catalog::WriteStyle;
use crate::error::PatchError;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// One file edit derived from one changed setting. Constructed, executed,
/// discarded; never persisted.
#[derive(Debug, Clone)]
pub struct PatchInstruction {
    /// File-side key (`PlainKv`) or XML element name (XML styles). The
    /// element name may carry trailing boundary syntax such as `>` or
    /// `[[:space:]]`, which is stripped before matching. Not a regex.
    pub pattern: String,
    /// The value already rendered to its file-side form.
    pub rendered_value: String,
    pub style: WriteStyle,
}

/// What a patch did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The matching line was rewritten in place.
    Rewritten,
    /// No line matched; a fresh `key=value` line was appended.
    Appended,
    /// No line matched and the format legitimately omits the key;
    /// the file was left untouched.
    NoMatch,
}

/// Apply a patch to a target file.
///
/// A zero-match XML patch is a successful no-op, but gets logged as a
/// potential drift signal.
pub fn apply_patch(path: &Path, instr: &PatchInstruction) -> Result<PatchOutcome, PatchError> {
    let content = fs::read_to_string(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let (patched, outcome) = patch_content(&content, instr);

    // A zero-match transform must not rewrite the file, not even to
    // normalize line endings.
    if outcome != PatchOutcome::NoMatch && patched != content {
        fs::write(path, patched).map_err(|source| PatchError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    match outcome {
        PatchOutcome::NoMatch => warn!(
            "no line matching '{}' in {}, possible drift",
            instr.pattern,
            path.display()
        ),
        _ => debug!(
            "patched '{}' in {} ({:?})",
            instr.pattern,
            path.display(),
            outcome
        ),
    }

    Ok(outcome)
}

/// Pure content transform behind [`apply_patch`].
pub fn patch_content(content: &str, instr: &PatchInstruction) -> (String, PatchOutcome) {
    match instr.style {
        WriteStyle::PlainKv => plain_kv(content, &instr.pattern, &instr.rendered_value),
        WriteStyle::XmlTag => xml_tag(content, &instr.pattern, &instr.rendered_value, false),
        WriteStyle::XmlTagWithDefaultAttr => {
            xml_tag(content, &instr.pattern, &instr.rendered_value, true)
        }
    }
}

/// Rewrite the first active `key=` line in place, or append one if the key
/// is absent. Any further active duplicates are commented out so exactly
/// one active line per key remains.
fn plain_kv(content: &str, key: &str, value: &str) -> (String, PatchOutcome) {
    let prefix = format!("{}=", key);
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let mut outcome = PatchOutcome::NoMatch;

    for line in lines.iter_mut() {
        if !line.starts_with(&prefix) {
            continue;
        }
        if outcome == PatchOutcome::NoMatch {
            *line = format!("{}={}", key, value);
            outcome = PatchOutcome::Rewritten;
        } else {
            line.insert(0, '#');
        }
    }

    if outcome == PatchOutcome::NoMatch {
        lines.push(format!("{}={}", key, value));
        outcome = PatchOutcome::Appended;
    }

    (rejoin(lines), outcome)
}

/// Replace the whole line carrying the pattern's element with
/// `<name>value</name>`, preserving leading indentation.
///
/// Matching is on the element name at a tag boundary, so both the bare
/// (`<webserver>`) and attributed (`<webserver default="true">`) forms of
/// a tag are rewritten, while longer names (`<webserverport>`) are not.
fn xml_tag(content: &str, pattern: &str, value: &str, default_attr: bool) -> (String, PatchOutcome) {
    let name = element_name(pattern);
    let open = if default_attr {
        format!("<{} default=\"true\">", name)
    } else {
        format!("<{}>", name)
    };

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let mut outcome = PatchOutcome::NoMatch;

    for line in lines.iter_mut() {
        let trimmed = line.trim_start();
        let Some(tag) = trimmed.strip_prefix('<') else {
            continue;
        };
        if !tag_matches(tag, name) {
            continue;
        }
        let indent = &line[..line.len() - trimmed.len()];
        *line = format!("{}{}{}</{}>", indent, open, value, name);
        outcome = PatchOutcome::Rewritten;
        break;
    }

    (rejoin(lines), outcome)
}

fn rejoin(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// True if `tag` (the line content after `<`) names the element: the name
/// followed by `>` (bare form) or whitespace (attributed form).
fn tag_matches(tag: &str, name: &str) -> bool {
    match tag.strip_prefix(name) {
        Some(rest) => {
            rest.starts_with('>') || rest.chars().next().is_some_and(char::is_whitespace)
        }
        None => false,
    }
}

/// Element name: the pattern with trailing boundary syntax (`>`,
/// whitespace, or a bracket class such as `[[:space:]]`) stripped.
fn element_name(pattern: &str) -> &str {
    let end = pattern
        .find(|c: char| c == '>' || c == '[' || c.is_whitespace())
        .unwrap_or(pattern.len());
    &pattern[..end]
}
