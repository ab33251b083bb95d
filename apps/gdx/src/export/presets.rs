//! Loading export targets from `export_presets.cfg`.
//!
//! Godot stores export presets in an INI-like file, one `[preset.N]`
//! section per preset plus a `[preset.N.options]` section of
//! platform-specific settings:
//!
//! ```text
//! [preset.0]
//!
//! name="Linux/X11"
//! platform="Linux/X11"
//! runnable=true
//! export_path="build/linux/game.x86_64"
//!
//! [preset.0.options]
//!
//! custom_template/debug=""
//! ```
//!
//! Only `name`, `platform` and `export_path` are read. Targets come back in
//! the order their sections appear in the file, which is the order they are
//! exported in.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use super::target::{ExportTarget, normalize};
use crate::errors::GdxError;

/// File name of the export configuration inside a project.
pub const PRESETS_FILE: &str = "export_presets.cfg";

/// Reads and validates the export targets of a Godot project.
///
/// # Errors
///
/// Returns `GdxError::Config` if the file is missing, unreadable, malformed,
/// or describes an invalid preset.
pub fn load_presets(project_dir: &Path) -> Result<Vec<ExportTarget>, GdxError> {
    let path = project_dir.join(PRESETS_FILE);
    let text = std::fs::read_to_string(&path).map_err(|e| {
        GdxError::config_error(format!("cannot read {}: {e}", path.display()))
    })?;
    let origin = path.display().to_string();
    let targets = parse_presets(&text, &origin)?;
    ensure_outside_project_root(&targets, project_dir, &origin)?;
    Ok(targets)
}

/// Parses export targets out of `export_presets.cfg` contents.
///
/// `origin` names the source in error messages.
///
/// # Errors
///
/// Returns `GdxError::Config` on syntax errors (with the line number), on
/// presets missing a required key, and on invalid export paths.
pub fn parse_presets(text: &str, origin: &str) -> Result<Vec<ExportTarget>, GdxError> {
    let sections = parse_sections(text, origin)?;
    let mut targets = Vec::new();

    for section in sections.iter().filter(|s| is_preset_section(&s.name)) {
        let target = section.to_target(origin)?;
        validate_export_path(&target, origin, section.line)?;
        targets.push(target);
    }

    ensure_distinct_output_dirs(&targets, origin)?;
    Ok(targets)
}

/// A `[section]` and the keys defined under it.
#[derive(Debug)]
struct Section {
    name: String,
    line: usize,
    values: HashMap<String, String>,
}

impl Section {
    fn to_target(&self, origin: &str) -> Result<ExportTarget, GdxError> {
        let get = |key: &str| {
            self.values
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| {
                    GdxError::config_error(format!(
                        "{origin}:{}: [{}] has no '{key}'",
                        self.line, self.name
                    ))
                })
        };

        Ok(ExportTarget::new(
            get("name")?,
            PathBuf::from(get("export_path")?),
            get("platform")?,
        ))
    }
}

/// Returns `true` for `preset.<digits>`, the sections describing a preset.
fn is_preset_section(name: &str) -> bool {
    name.strip_prefix("preset.")
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Splits the file into sections, preserving their order.
fn parse_sections(text: &str, origin: &str) -> Result<Vec<Section>, GdxError> {
    let syntax_error =
        |line: usize, message: &str| GdxError::config_error(format!("{origin}:{line}: {message}"));

    let mut sections: Vec<Section> = Vec::new();
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    while let Some((line_no, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| syntax_error(line_no, "unterminated section header"))?
                .trim();
            if name.is_empty() {
                return Err(syntax_error(line_no, "empty section name"));
            }
            sections.push(Section {
                name: name.to_string(),
                line: line_no,
                values: HashMap::new(),
            });
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| syntax_error(line_no, "expected 'key=value'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(syntax_error(line_no, "missing key before '='"));
        }

        // Strings, arrays and dictionaries may continue over several lines.
        let mut value = value.trim().to_string();
        while is_incomplete(&value) {
            let (_, next) = lines
                .next()
                .ok_or_else(|| syntax_error(line_no, "unterminated value"))?;
            value.push('\n');
            value.push_str(next);
        }

        let value = parse_value(&value).map_err(|message| syntax_error(line_no, message))?;
        let section = sections
            .last_mut()
            .ok_or_else(|| syntax_error(line_no, "key outside of any section"))?;
        section.values.insert(key.to_string(), value);
    }

    Ok(sections)
}

/// Returns `true` while a string or bracket opened in `value` is still open.
fn is_incomplete(value: &str) -> bool {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in value.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth -= 1,
            _ => {}
        }
    }
    in_string || depth > 0
}

/// Decodes a value: quoted strings are unescaped, anything else is kept as written.
fn parse_value(value: &str) -> Result<String, &'static str> {
    let Some(body) = value.strip_prefix('"') else {
        return Ok(value.to_string());
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                return if chars.as_str().trim().is_empty() {
                    Ok(out)
                } else {
                    Err("unexpected text after closing quote")
                };
            }
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => return Err("unterminated string"),
            },
            _ => out.push(c),
        }
    }
    Err("unterminated string")
}

/// Rejects export paths whose output directory would be the project
/// directory or one of its parents, since packaging consumes the whole
/// directory. Relative paths are checked here; absolute ones need the
/// project location and are checked by [`ensure_outside_project_root`].
fn validate_export_path(target: &ExportTarget, origin: &str, line: usize) -> Result<(), GdxError> {
    if target.export_path.is_absolute() {
        return Ok(());
    }
    let output_dir = normalize(target.relative_output_dir());
    if output_dir
        .components()
        .any(|c| matches!(c, Component::Normal(_)))
    {
        return Ok(());
    }
    Err(GdxError::config_error(format!(
        "{origin}:{line}: preset '{}' export_path '{}' must name an output directory \
         below the project or beside it, e.g. build/linux/game.x86_64",
        target.name,
        target.export_path.display()
    )))
}

/// Resolves each output directory against the project and rejects any that
/// contains the project directory.
fn ensure_outside_project_root(
    targets: &[ExportTarget],
    project_dir: &Path,
    origin: &str,
) -> Result<(), GdxError> {
    let project = normalize(project_dir);
    for target in targets {
        let export_file = target.export_file(project_dir);
        let output_dir = export_file.parent().unwrap_or(&export_file);
        if project.starts_with(output_dir) {
            return Err(GdxError::config_error(format!(
                "{origin}: preset '{}' export_path '{}' resolves to {}, which contains the project",
                target.name,
                target.export_path.display(),
                output_dir.display()
            )));
        }
    }
    Ok(())
}

/// Packaging consumes everything in an output directory, so two presets
/// writing into the same one would swallow each other's files.
fn ensure_distinct_output_dirs(targets: &[ExportTarget], origin: &str) -> Result<(), GdxError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for target in targets {
        let dir = normalize(target.relative_output_dir());
        if let Some(other) = seen.insert(dir.clone(), &target.name) {
            return Err(GdxError::config_error(format!(
                "{origin}: presets '{other}' and '{}' share the output directory {}",
                target.name,
                dir.display()
            )));
        }
    }
    Ok(())
}
