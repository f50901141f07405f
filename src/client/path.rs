//! Remote path decomposition for uploads.

/// A remote file path split into its directory chain and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    directories: Vec<String>,
    file_name: String,
}

impl RemotePath {
    /// Splits `path` on `/`. Absolute paths start their chain at `/`.
    /// Returns `None` for empty paths and paths naming a directory.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() || trimmed.ends_with('/') {
            return None;
        }

        let mut segments: Vec<&str> = trimmed
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();
        let file_name = segments.pop()?.to_string();

        let mut directories = Vec::with_capacity(segments.len() + 1);
        if trimmed.starts_with('/') {
            directories.push("/".to_string());
        }
        directories.extend(segments.into_iter().map(String::from));

        Some(Self {
            directories,
            file_name,
        })
    }

    /// Directories to enter, root first.
    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        let path = RemotePath::parse("a/b/c/report.csv").unwrap();
        assert_eq!(path.directories(), ["a", "b", "c"]);
        assert_eq!(path.file_name(), "report.csv");
    }

    #[test]
    fn test_absolute_path_starts_at_root() {
        let path = RemotePath::parse("/pub//./in/file.bin").unwrap();
        assert_eq!(path.directories(), ["/", "pub", "in"]);
        assert_eq!(path.file_name(), "file.bin");
    }

    #[test]
    fn test_bare_file_name() {
        let path = RemotePath::parse("file.txt").unwrap();
        assert!(path.directories().is_empty());
    }

    #[test]
    fn test_rejects_directories_and_empty() {
        assert_eq!(RemotePath::parse(""), None);
        assert_eq!(RemotePath::parse("a/b/"), None);
        assert_eq!(RemotePath::parse("/"), None);
    }
}
