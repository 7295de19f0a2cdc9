//! Template discovery and context loading shared by the commands.

use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};

use pmd::Value;
use thiserror::Error;
use walkdir::WalkDir;

/// File extension of templates found by walking a directory.
pub const TEMPLATE_EXTENSION: &str = "pmd";

/// A problem with the command's inputs, before any template is touched.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no such file or directory: {path}")]
    Missing { path: PathBuf },

    #[error("cannot read context file {path}: {source}")]
    ReadContext {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    InvalidContext {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("context must be a JSON object, found {kind}")]
    ContextNotObject { kind: &'static str },

    #[error("cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl InputError {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            InputError::Missing { .. } | InputError::ReadContext { .. } | InputError::Walk(_) => {
                exitcode::NOINPUT
            }
            InputError::InvalidContext { .. } | InputError::ContextNotObject { .. } => {
                exitcode::DATAERR
            }
        }
    }
}

/// A template to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInput {
    /// Path as given or found on disk.
    pub path: PathBuf,
    /// Path relative to the directory argument it was found under, or the
    /// file name for templates named directly. Used to lay out output files.
    pub relative: PathBuf,
}

/// Expand file and directory arguments into templates.
///
/// Directories are walked recursively for `*.pmd` files in file-name order.
/// Files named directly are taken whatever their extension.
pub fn collect_templates(paths: &[PathBuf]) -> Result<Vec<TemplateInput>, InputError> {
    let mut inputs = Vec::new();
    for root in paths {
        if root.is_dir() {
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry?;
                let path = entry.path();
                let is_template = entry.file_type().is_file()
                    && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION);
                if !is_template {
                    continue;
                }
                let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
                inputs.push(TemplateInput {
                    path: path.to_path_buf(),
                    relative,
                });
            }
        } else if root.is_file() {
            let relative = root
                .file_name()
                .map_or_else(|| root.clone(), PathBuf::from);
            inputs.push(TemplateInput {
                path: root.clone(),
                relative,
            });
        } else {
            return Err(InputError::Missing { path: root.clone() });
        }
    }
    log::debug!("found {} template(s)", inputs.len());
    Ok(inputs)
}

/// Build the render context from a JSON file or inline JSON, then apply
/// `--var` overrides on top.
///
/// Inline JSON wins when both sources are given, so an explicit
/// `--context-json` overrides a `PMD_CONTEXT` file from the environment. With
/// neither source the context is an empty object.
pub fn load_context(
    file: Option<&Path>,
    inline: Option<&str>,
    vars: &[(String, String)],
) -> Result<Value, InputError> {
    let mut context = match (file, inline) {
        (_, Some(json)) => parse_context(json, "--context-json")?,
        (Some(path), None) => {
            let json = read_to_string(path).map_err(|source| InputError::ReadContext {
                path: path.to_path_buf(),
                source,
            })?;
            parse_context(&json, &path.display().to_string())?
        }
        (None, None) => Value::Object(Default::default()),
    };

    let kind = context.kind();
    let Value::Object(entries) = &mut context else {
        return Err(InputError::ContextNotObject { kind });
    };
    for (name, raw) in vars {
        entries.insert(name.clone(), parse_var(raw));
    }
    Ok(context)
}

fn parse_context(json: &str, origin: &str) -> Result<Value, InputError> {
    Value::from_json(json).map_err(|source| InputError::InvalidContext {
        origin: origin.to_string(),
        source,
    })
}

/// A `--var` value: JSON when it parses, otherwise the raw string.
fn parse_var(raw: &str) -> Value {
    Value::from_json(raw).unwrap_or_else(|_| Value::from(raw))
}

/// Parse a name=value variable string.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid variable format '{s}': expected name=value"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("query=a=b"),
            Ok(("query".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_val("novalue").is_err());
    }

    #[test]
    fn vars_parse_as_json_or_fall_back_to_strings() {
        let vars = [
            ("n".to_string(), "3".to_string()),
            ("flag".to_string(), "true".to_string()),
            ("name".to_string(), "Ada".to_string()),
            ("list".to_string(), "[1,2]".to_string()),
        ];
        let context = load_context(None, None, &vars).unwrap();
        assert_eq!(context.get("n"), Some(&Value::Number(3.0)));
        assert_eq!(context.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(context.get("name"), Some(&Value::from("Ada")));
        assert_eq!(context.get("list").map(Value::kind), Some("array"));
    }

    #[test]
    fn vars_override_context_keys() {
        let vars = [("a".to_string(), "2".to_string())];
        let context = load_context(None, Some(r#"{"a": 1, "b": 1}"#), &vars).unwrap();
        assert_eq!(context.to_string(), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn inline_context_takes_precedence_over_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("context.json");
        fs::write(&file, r#"{"from": "file"}"#).unwrap();
        let context = load_context(Some(&file), Some(r#"{"from": "inline"}"#), &[]).unwrap();
        assert_eq!(context.get("from"), Some(&Value::from("inline")));
    }

    #[test]
    fn context_must_be_an_object() {
        let err = load_context(None, Some("[1]"), &[]).unwrap_err();
        assert!(matches!(err, InputError::ContextNotObject { kind: "array" }));
        assert_eq!(err.exit_code(), exitcode::DATAERR);
    }

    #[test]
    fn missing_context_file() {
        let dir = TempDir::new().unwrap();
        let err = load_context(Some(dir.path().join("nope.json").as_path()), None, &[]).unwrap_err();
        assert_eq!(err.exit_code(), exitcode::NOINPUT);
    }

    #[test]
    fn directories_are_walked_for_templates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.pmd"), "").unwrap();
        fs::write(dir.path().join("sub/a.pmd"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let inputs = collect_templates(&[dir.path().to_path_buf()]).unwrap();
        let relative: Vec<PathBuf> = inputs.into_iter().map(|i| i.relative).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("b.pmd"), PathBuf::from("sub/a.pmd")]
        );
    }

    #[test]
    fn missing_path_is_an_input_error() {
        let err = collect_templates(&[PathBuf::from("/definitely/not/here.pmd")]).unwrap_err();
        assert!(matches!(err, InputError::Missing { .. }));
    }
}
