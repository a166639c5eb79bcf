use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;

use super::reader::{is_java_file, is_xml_file};

/// Enumerate candidate `.java` and `.xml` files under the analysis root.
///
/// `.git` and `.svn` trees are always skipped; configured exclude globs are
/// matched against the root-relative path. Results are sorted so pool
/// construction is deterministic.
pub fn scan_directory(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        if name == ".git" || name == ".svn" {
            return false;
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if rel.is_empty() {
            return true;
        }

        // Exclude patterns are directory globs; test the dir with a
        // trailing segment so "**/test/**" hits the "test" dir itself
        !config.should_exclude(&format!("{}/", rel))
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_java_file(path) || is_xml_file(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn scan_collects_java_and_xml_skipping_excluded_dirs() {
        let root = std::env::temp_dir().join(format!("spec-recon-scan-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);

        touch(&root.join("src/com/a/UserController.java"));
        touch(&root.join("src/resources/UserMapper.xml"));
        touch(&root.join("src/com/a/notes.txt"));
        touch(&root.join("target/classes/Generated.java"));
        touch(&root.join("src/test/java/UserControllerTest.java"));
        touch(&root.join(".git/objects/deadbeef.java"));

        let config = Config::default();
        let files = scan_directory(&root, &config);

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert!(names.contains(&"UserController.java".to_string()));
        assert!(names.contains(&"UserMapper.xml".to_string()));
        assert!(!names.contains(&"notes.txt".to_string()));
        assert!(!names.contains(&"Generated.java".to_string()));
        assert!(!names.contains(&"UserControllerTest.java".to_string()));
        assert!(!names.contains(&"deadbeef.java".to_string()));

        let _ = fs::remove_dir_all(&root);
    }
}
