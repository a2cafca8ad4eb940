//! Artifact enumeration
//!
//! Turns the configured `files` entries into the concrete list of files to
//! attach. Relative entries are resolved against the project directory and
//! directories expand to the `*.jar` files beneath them, sorted by file name
//! with the main jar ahead of its `-sources`, `-javadoc`, `-dev` and `-api`
//! companions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const ARTIFACT_EXTENSION: &str = "jar";

/// Stem suffixes of jars built alongside the main artifact
const SECONDARY_SUFFIXES: &[&str] = &["-sources", "-javadoc", "-dev", "-api"];

/// Resolve `entries` against `project_path`
///
/// Entries that do not exist are kept as given so that configuration
/// validation can report them. Repeated paths are collapsed, first
/// occurrence wins.
pub fn resolve_artifacts(project_path: &Path, entries: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for entry in entries {
        let path = if entry.is_absolute() {
            entry.clone()
        } else {
            project_path.join(entry)
        };

        let expanded = if path.is_dir() {
            jar_files_in(&path)
        } else {
            vec![path]
        };

        for file in expanded {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }

    files
}

fn jar_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_artifact(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable entry under {}: {}", dir.display(), e),
        }
    }

    // stable: name order is kept within each group
    files.sort_by_key(|file| is_secondary(file));

    if files.is_empty() {
        warn!("no .{} files found in {}", ARTIFACT_EXTENSION, dir.display());
    }

    files
}

fn is_artifact(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
}

fn is_secondary(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| {
            let stem = stem.to_ascii_lowercase();
            SECONDARY_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"jar").unwrap();
    }

    #[test]
    fn test_directory_expands_to_sorted_jars() {
        let temp_dir = TempDir::new().unwrap();
        let libs = temp_dir.path().join("build/libs");
        touch(&libs.join("mod-1.0.0.jar"));
        touch(&libs.join("mod-1.0.0-api.jar"));
        touch(&libs.join("addon-1.0.0.jar"));
        touch(&libs.join("notes.txt"));

        let files = resolve_artifacts(temp_dir.path(), &[PathBuf::from("build/libs")]);

        assert_eq!(
            files,
            vec![
                libs.join("addon-1.0.0.jar"),
                libs.join("mod-1.0.0.jar"),
                libs.join("mod-1.0.0-api.jar"),
            ]
        );
    }

    #[test]
    fn test_main_jar_precedes_sources_jar() {
        let temp_dir = TempDir::new().unwrap();
        let libs = temp_dir.path().join("build/libs");
        touch(&libs.join("mymod-1.0.0.jar"));
        touch(&libs.join("mymod-1.0.0-sources.jar"));
        touch(&libs.join("mymod-1.0.0-javadoc.jar"));
        touch(&libs.join("mymod-1.0.0-dev.jar"));

        let files = resolve_artifacts(temp_dir.path(), &[PathBuf::from("build/libs")]);

        assert_eq!(files[0], libs.join("mymod-1.0.0.jar"));
        assert_eq!(
            &files[1..],
            &[
                libs.join("mymod-1.0.0-dev.jar"),
                libs.join("mymod-1.0.0-javadoc.jar"),
                libs.join("mymod-1.0.0-sources.jar"),
            ]
        );
    }

    #[test]
    fn test_explicit_secondary_file_keeps_position() {
        let temp_dir = TempDir::new().unwrap();
        let libs = temp_dir.path().join("libs");
        touch(&libs.join("mod-sources.jar"));
        touch(&libs.join("mod.jar"));

        let files = resolve_artifacts(
            temp_dir.path(),
            &[PathBuf::from("libs/mod-sources.jar"), PathBuf::from("libs/mod.jar")],
        );

        assert_eq!(files, vec![libs.join("mod-sources.jar"), libs.join("mod.jar")]);
    }

    #[test]
    fn test_explicit_file_first_and_duplicates_collapsed() {
        let temp_dir = TempDir::new().unwrap();
        let libs = temp_dir.path().join("libs");
        touch(&libs.join("a.jar"));
        touch(&libs.join("b.jar"));

        let files = resolve_artifacts(
            temp_dir.path(),
            &[PathBuf::from("libs/b.jar"), PathBuf::from("libs")],
        );

        assert_eq!(files, vec![libs.join("b.jar"), libs.join("a.jar")]);
    }

    #[test]
    fn test_missing_entry_is_kept() {
        let temp_dir = TempDir::new().unwrap();

        let files = resolve_artifacts(temp_dir.path(), &[PathBuf::from("missing.jar")]);

        assert_eq!(files, vec![temp_dir.path().join("missing.jar")]);
    }

    #[test]
    fn test_is_artifact_ignores_case() {
        assert!(is_artifact(Path::new("MOD.JAR")));
        assert!(!is_artifact(Path::new("mod.zip")));
    }
}
