//! Project scanning: turns the source and additional-file trees into raw
//! inputs, in a deterministic order.
use crate::config::{HostConfig, RevisionMode};
use lazy_static::lazy_static;
use regex::Regex;
use sgen_core::{RawInput, Signature};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

lazy_static! {
    /// `struct`, `enum` or `trait` at the start of a line, optionally `pub`
    static ref DECLARATION: Regex = Regex::new(
        r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?[ \t]+)?(?:struct|enum|trait)[ \t]+([A-Za-z_][A-Za-z0-9_]*)"
    ).unwrap();
}

/// Top-level `struct`, `enum` and `trait` names in one source file. Each
/// declaration's text is the matched line prefixed with its location, so
/// moving or editing the declaration changes its revision.
pub fn scan_declarations(location: &str, text: &str) -> Vec<RawInput> {
    DECLARATION
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            let line = text[..whole.start()].matches('\n').count() + 1;
            Some(RawInput::declaration(
                name,
                format!("{}:{}: {}", location, line, whole.as_str().trim()),
            ))
        })
        .collect()
}

/// Files under `root`, sorted by path. A missing root yields nothing.
pub fn walk_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// `path` relative to `root`, with `/` separators.
pub fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let name = path.to_string_lossy();
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

/// Revision token from modification time and size.
fn metadata_revision(path: &Path) -> std::io::Result<Signature> {
    let meta = std::fs::metadata(path)?;
    let modified = meta
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    Ok(Signature::from_token(format!("mtime:{}:{}", modified, meta.len())))
}

fn additional_file(root: &Path, path: PathBuf, mode: RevisionMode) -> std::io::Result<RawInput> {
    let name = relative_name(root, &path);
    match mode {
        RevisionMode::Content => {
            let bytes = std::fs::read(&path)?;
            let content = String::from_utf8_lossy(&bytes).into_owned();
            Ok(RawInput::additional_file(name, content).with_revision(Signature::of_bytes(&bytes)))
        }
        RevisionMode::Metadata => {
            let revision = metadata_revision(&path)?;
            Ok(RawInput::lazy_file(name, revision, move || std::fs::read_to_string(&path)))
        }
    }
}

/// All inputs of one run: declarations first, then additional files.
pub fn scan(config: &HostConfig) -> std::io::Result<Vec<RawInput>> {
    let mut inputs = Vec::new();

    for path in walk_files(&config.source_dir)? {
        if !has_extension(&path, &config.declaration_extensions) {
            continue;
        }
        let location = relative_name(&config.source_dir, &path);
        let bytes = std::fs::read(&path)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %location, "source is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        inputs.extend(scan_declarations(&location, &text));
    }
    let declarations = inputs.len();

    for path in walk_files(&config.additional_dir)? {
        inputs.push(additional_file(&config.additional_dir, path, config.revision)?);
    }

    tracing::debug!(
        declarations,
        additional_files = inputs.len() - declarations,
        "scanned project"
    );
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgen_core::InputKind;

    #[test]
    fn test_scan_declarations() {
        let text = r#"
pub struct FooCommand;
struct Helper {
    value: u32,
}
pub(crate) enum BarCommand { A }
    pub trait Runner {}
// struct Commented
fn not_a_type() {}
"#;
        let inputs = scan_declarations("lib.rs", text);
        let names: Vec<&str> = inputs.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["FooCommand", "Helper", "BarCommand", "Runner"]);
        assert!(inputs.iter().all(|i| i.kind() == InputKind::Declaration));
        assert_eq!(inputs[0].content().unwrap(), "lib.rs:2: pub struct FooCommand");
    }

    #[test]
    fn test_declaration_revision_tracks_location() {
        let a = scan_declarations("a.rs", "struct XCommand;\n");
        let b = scan_declarations("a.rs", "\nstruct XCommand;\n");
        let again = scan_declarations("a.rs", "struct XCommand;\n");
        assert_ne!(a[0].revision(), b[0].revision());
        assert_eq!(a[0].revision(), again[0].revision());
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(
            relative_name(Path::new("/p/additional"), Path::new("/p/additional/queries/GetUsers.sql")),
            "queries/GetUsers.sql"
        );
    }

    #[test]
    fn test_scan_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let extra = dir.path().join("additional");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::create_dir_all(&extra).unwrap();
        std::fs::write(src.join("b.rs"), "pub struct BCommand;\n").unwrap();
        std::fs::write(src.join("nested/a.rs"), "pub struct ACommand;\n").unwrap();
        std::fs::write(src.join("notes.md"), "struct Ignored\n").unwrap();
        std::fs::write(extra.join("list.txt"), "One\nTwo\n").unwrap();

        let config = HostConfig {
            source_dir: src,
            additional_dir: extra,
            ..HostConfig::default()
        };
        let inputs = scan(&config).unwrap();
        let names: Vec<&str> = inputs.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["BCommand", "ACommand", "list.txt"]);
        assert_eq!(inputs[2].content().unwrap(), "One\nTwo\n");
    }

    #[test]
    fn test_non_utf8_source_does_not_abort_scan() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("a.rs"), "pub struct ACommand;\n").unwrap();
        std::fs::write(src.join("bad.rs"), b"\xff\xfe\nstruct B\n").unwrap();

        let config = HostConfig {
            source_dir: src,
            additional_dir: dir.path().join("missing"),
            ..HostConfig::default()
        };
        let inputs = scan(&config).unwrap();
        let names: Vec<&str> = inputs.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["ACommand", "B"]);
    }

    #[test]
    fn test_metadata_mode_reads_lazily() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q.sql"), "SELECT 1").unwrap();
        let config = HostConfig {
            source_dir: dir.path().join("missing"),
            additional_dir: dir.path().to_path_buf(),
            revision: RevisionMode::Metadata,
            ..HostConfig::default()
        };
        let inputs = scan(&config).unwrap();
        assert_eq!(inputs.len(), 1);
        assert!(!inputs[0].content_loaded());
        assert!(inputs[0].revision().as_str().starts_with("mtime:"));
        assert_eq!(inputs[0].content().unwrap(), "SELECT 1");
        assert!(inputs[0].content_loaded());
    }
}
