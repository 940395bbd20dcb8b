//! Model graph loader
//!
//! Graph files are JSON documents of the form `{"models": [...]}`. A graph
//! with relations pointing at unregistered models is rejected at load time.

use std::fs;
use std::path::Path;

use super::errors::SchemaResult;
use super::model::ModelGraph;
use crate::observability::Logger;

/// Loads model graphs from disk
pub struct SchemaLoader;

impl SchemaLoader {
    /// Reads and validates a model graph file.
    pub fn load(path: &Path) -> SchemaResult<ModelGraph> {
        let content = fs::read_to_string(path)?;
        let graph = ModelGraph::from_json(&content)?;

        let path_str = path.display().to_string();
        let models = graph.len().to_string();
        Logger::info(
            "MODEL_GRAPH_LOADED",
            &[("models", models.as_str()), ("path", path_str.as_str())],
        );

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"models": [{{"name": "users", "table": "users"}}]}}"#
        )
        .unwrap();

        let graph = SchemaLoader::load(file.path()).unwrap();
        assert!(graph.model("users").is_some());
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = SchemaLoader::load(file.path()).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SchemaLoader::load(Path::new("/nonexistent/graph.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }
}
