//! Utility functions for identifiers and paths

use std::path::Path;

use crate::constants as C;

/// Remove characters that cannot appear in a note filename
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !C::ILLEGAL_IDENTIFIER_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Path shown relative to the vault root when it lies inside it
pub fn display_path(root: &Path, path: &Path) -> String {
    let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    path.strip_prefix(&root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(
            sanitize_identifier("2020 Smith (J. Exp: Hum/Perf?)"),
            "2020 Smith (J. Exp HumPerf)"
        );
        assert_eq!(sanitize_identifier(r#"a*b"c\d<e>f|g"#), "abcdefg");
        assert_eq!(sanitize_identifier("plain"), "plain");
    }

    #[test]
    fn test_display_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = dunce::canonicalize(temp_dir.path()).unwrap();
        let inside = root.join("papers").join("a.md");
        assert_eq!(display_path(temp_dir.path(), &inside), "papers/a.md");

        let outside = Path::new("/elsewhere/b.md");
        assert_eq!(display_path(temp_dir.path(), outside), "/elsewhere/b.md");
    }
}
