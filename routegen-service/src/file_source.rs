//! Topology source backed by a JSON file.

use std::path::{Path, PathBuf};

use routegen_core::{FetchError, TopologySnapshot, TopologySource};

/// Reads a [`TopologySnapshot`] from disk on every fetch.
///
/// A missing or half-written file is reported as a fetch failure, which the
/// generator retries.
#[derive(Debug, Clone)]
pub struct FileTopologySource {
    path: PathBuf,
}

impl FileTopologySource {
    /// Create a source for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TopologySource for FileTopologySource {
    fn get(&self) -> Result<TopologySnapshot, FetchError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "generation": 7,
                "zone": {{ "environment": "prod", "region": "us-north-1" }},
                "routing_domain": "vespa.oath.cloud"
            }}"#
        )
        .unwrap();

        let snapshot = FileTopologySource::new(file.path()).get().unwrap();
        assert_eq!(snapshot.generation, 7);
        assert!(snapshot.deployments.is_empty());
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let missing = FileTopologySource::new("/nonexistent/topology.json");
        assert!(matches!(missing.get(), Err(FetchError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"zone\": ").unwrap();
        assert!(matches!(FileTopologySource::new(file.path()).get(), Err(FetchError::Json(_))));
    }
}
