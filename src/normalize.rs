//! Unicode NFC normalization of extracted file trees.
//!
//! Archives produced on some platforms store decomposed (NFD) file names
//! while the labels CSV references composed (NFC) forms. The rename walk
//! visits deepest entries first so a parent rename never invalidates a child
//! path that is still pending.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;
use unicode_normalization::{is_nfc, UnicodeNormalization};
use walkdir::WalkDir;

/// NFC-normalize a string.
pub fn nfc(s: &str) -> String {
    s.nfc().collect()
}

/// Rename every entry under `root` whose file name is not NFC.
///
/// Returns the number of renames performed; a second run over the same tree
/// performs none.
pub fn normalize_tree(root: &Path) -> Result<usize> {
    let mut renamed = 0;

    for entry in WalkDir::new(root).contents_first(true) {
        let entry = entry.context("walking extracted tree")?;
        if entry.path() == root {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            warn!(path = %entry.path().display(), "file name is not valid UTF-8, leaving as is");
            continue;
        };
        if is_nfc(name) {
            continue;
        }
        let normalized = nfc(name);
        if normalized == name {
            continue;
        }
        let target = entry.path().with_file_name(&normalized);
        if target.exists() {
            warn!(
                path = %entry.path().display(),
                "an NFC-named twin already exists, leaving entry as is"
            );
            continue;
        }
        fs::rename(entry.path(), &target)
            .with_context(|| format!("renaming {}", entry.path().display()))?;
        renamed += 1;
    }

    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // "sèance" with the grave as a combining mark, i.e. NFD
    const NFD_DIR: &str = "se\u{300}ance";
    const NFD_FILE: &str = "u\u{308}ber.txt";

    fn all_names(root: &Path) -> Vec<String> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap().file_name().to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_nfc_composes() {
        assert_eq!(nfc("se\u{301}ance"), "s\u{e9}ance");
        // Already-composed input is untouched
        assert_eq!(nfc("s\u{e9}ance"), "s\u{e9}ance");
    }

    #[test]
    fn test_normalize_tree_renames_nested_entries() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join(NFD_DIR);
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join(NFD_FILE), b"x").unwrap();

        let renamed = normalize_tree(dir.path()).unwrap();
        assert_eq!(renamed, 2);

        for name in all_names(dir.path()) {
            assert!(is_nfc(&name), "{name:?} is not NFC");
        }
        assert!(dir.path().join("s\u{e8}ance").join("\u{fc}ber.txt").exists());
    }

    #[test]
    fn test_normalize_tree_is_idempotent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(NFD_FILE), b"x").unwrap();

        assert_eq!(normalize_tree(dir.path()).unwrap(), 1);
        assert_eq!(normalize_tree(dir.path()).unwrap(), 0);
    }

    #[test]
    fn test_normalize_tree_keeps_nfc_names() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plain.txt"), b"x").unwrap();
        fs::write(dir.path().join("\u{fc}ber.txt"), b"x").unwrap();

        assert_eq!(normalize_tree(dir.path()).unwrap(), 0);
        assert!(dir.path().join("plain.txt").exists());
        assert!(dir.path().join("\u{fc}ber.txt").exists());
    }

    #[test]
    fn test_normalize_tree_skips_when_twin_exists() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(NFD_FILE), b"decomposed").unwrap();
        fs::write(dir.path().join("\u{fc}ber.txt"), b"composed").unwrap();

        // The NFC twin must not be overwritten
        assert_eq!(normalize_tree(dir.path()).unwrap(), 0);
        assert_eq!(
            fs::read(dir.path().join("\u{fc}ber.txt")).unwrap(),
            b"composed"
        );
    }
}
