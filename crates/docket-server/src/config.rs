use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use docket_pipeline::{EtagPolicy, ExecutorConfig};
use docket_store::{CollectionRef, UniqueIndex};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Upper bound on a single store call, in milliseconds.
    pub store_timeout_ms: u64,
    pub collections: Vec<CollectionConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store_timeout_ms: 10_000,
            collections: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    fn validate(&self) -> ServerResult<()> {
        if self.store_timeout_ms == 0 {
            return Err(ServerError::Config("store_timeout_ms must be positive".into()));
        }
        for c in &self.collections {
            if c.db.is_empty() || c.collection.is_empty() {
                return Err(ServerError::Config(
                    "collection entries need both db and collection".into(),
                ));
            }
            if let Some(idx) = c.unique_indexes.iter().find(|i| i.fields.is_empty()) {
                return Err(ServerError::Config(format!(
                    "unique index {} on {} has no fields",
                    idx.name,
                    c.collection_ref()
                )));
            }
        }
        Ok(())
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            store_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }

    /// Entity-tag policy for a collection; unlisted collections are optional.
    pub fn etag_policy(&self, coll: &CollectionRef) -> EtagPolicy {
        self.collections
            .iter()
            .find(|c| c.db == coll.db && c.collection == coll.collection)
            .map(|c| c.etag_policy)
            .unwrap_or_default()
    }
}

/// Per-collection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub db: String,
    pub collection: String,
    #[serde(default)]
    pub etag_policy: EtagPolicy,
    #[serde(default)]
    pub unique_indexes: Vec<UniqueIndex>,
}

impl CollectionConfig {
    pub fn collection_ref(&self) -> CollectionRef {
        CollectionRef::new(&self.db, &self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.executor_config().store_timeout, Duration::from_secs(10));
        assert!(c.collections.is_empty());
    }

    #[test]
    fn parse_collections() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:9000"

            [[collections]]
            db = "db"
            collection = "files"
            etag_policy = "required"

            [[collections.unique_indexes]]
            name = "by_filename"
            fields = ["filename"]
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.store_timeout_ms, 10_000);
        let files = CollectionRef::new("db", "files");
        assert_eq!(c.etag_policy(&files), EtagPolicy::Required);
        assert_eq!(c.etag_policy(&CollectionRef::new("db", "other")), EtagPolicy::Optional);
        assert_eq!(c.collections[0].unique_indexes[0].fields, vec!["filename"]);
    }

    #[test]
    fn rejects_bad_config() {
        assert!(matches!(
            ServerConfig::from_toml_str("store_timeout_ms = 0"),
            Err(ServerError::Config(_))
        ));
        assert!(ServerConfig::from_toml_str("bind_addr = 5").is_err());
        let empty_index = r#"
            [[collections]]
            db = "db"
            collection = "c"
            unique_indexes = [{ name = "x", fields = [] }]
        "#;
        assert!(ServerConfig::from_toml_str(empty_index).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store_timeout_ms = 250").unwrap();
        let c = ServerConfig::load(file.path()).unwrap();
        assert_eq!(c.executor_config().store_timeout, Duration::from_millis(250));
    }

    #[test]
    fn toml_round_trip() {
        let mut c = ServerConfig::default();
        c.collections.push(CollectionConfig {
            db: "db".into(),
            collection: "c".into(),
            etag_policy: EtagPolicy::Required,
            unique_indexes: vec![UniqueIndex::new("u", vec!["a".into()])],
        });
        let text = c.to_toml_string().unwrap();
        let back = ServerConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.etag_policy(&CollectionRef::new("db", "c")), EtagPolicy::Required);
    }
}
