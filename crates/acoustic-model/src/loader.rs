//! Checkpoint file resolution.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use hf_hub::api::tokio::{Api, ApiBuilder};
use hf_hub::{Cache, Repo, RepoType};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use tts_core::{ModelConfig, TtsError, TtsResult};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SINGLE_WEIGHTS_FILE: &str = "model.safetensors";
const WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";

/// Local paths of every file needed to build a Parler-TTS model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    /// Model `config.json`.
    pub config: PathBuf,
    /// HuggingFace `tokenizer.json`.
    pub tokenizer: PathBuf,
    /// One or more safetensors shards.
    pub weights: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct WeightsIndex {
    weight_map: std::collections::HashMap<String, String>,
}

/// Unique shard file names listed in a `model.safetensors.index.json`.
pub fn shard_names(index_json: &str) -> TtsResult<Vec<String>> {
    let index: WeightsIndex = serde_json::from_str(index_json)?;
    let shards: BTreeSet<String> = index.weight_map.into_values().collect();
    if shards.is_empty() {
        return Err(TtsError::config("weights index lists no shards"));
    }
    Ok(shards.into_iter().collect())
}

impl ModelFiles {
    /// Resolve files according to the model configuration.
    ///
    /// A configured `model_dir` wins; otherwise the hub is consulted.
    pub async fn resolve(config: &ModelConfig) -> TtsResult<Self> {
        match &config.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::from_hub(&config.model_id, config.revision.as_deref()).await,
        }
    }

    /// Use a local checkpoint directory.
    #[instrument(fields(dir = %dir.as_ref().display()))]
    pub fn from_dir(dir: impl AsRef<Path>) -> TtsResult<Self> {
        let dir = dir.as_ref();
        let config = require_file(dir, CONFIG_FILE)?;
        let tokenizer = require_file(dir, TOKENIZER_FILE)?;

        let single = dir.join(SINGLE_WEIGHTS_FILE);
        let weights = if single.is_file() {
            vec![single]
        } else {
            let index_path = require_file(dir, WEIGHTS_INDEX_FILE).map_err(|_| {
                TtsError::model_load(
                    dir,
                    format!("neither {SINGLE_WEIGHTS_FILE} nor {WEIGHTS_INDEX_FILE} found"),
                )
            })?;
            let index = std::fs::read_to_string(&index_path)?;
            shard_names(&index)?
                .iter()
                .map(|name| require_file(dir, name))
                .collect::<TtsResult<Vec<_>>>()?
        };

        debug!(shards = weights.len(), "Resolved local checkpoint");
        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }

    /// Fetch a checkpoint from the HuggingFace Hub, reusing the local cache.
    #[instrument]
    pub async fn from_hub(model_id: &str, revision: Option<&str>) -> TtsResult<Self> {
        let fetcher = HubFetcher::new(model_id, revision)?;
        info!(model_id, "Resolving checkpoint from the hub");

        let config = fetcher.get(CONFIG_FILE).await?;
        let tokenizer = fetcher.get(TOKENIZER_FILE).await?;

        let weights = match fetcher.get(SINGLE_WEIGHTS_FILE).await {
            Ok(path) => vec![path],
            Err(single_err) => {
                debug!(error = %single_err, "No single weights file, trying sharded index");
                let index_path = fetcher.get(WEIGHTS_INDEX_FILE).await?;
                let index = std::fs::read_to_string(&index_path)?;
                let mut paths = Vec::new();
                for name in shard_names(&index)? {
                    paths.push(fetcher.get(&name).await?);
                }
                paths
            }
        };

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }
}

fn require_file(dir: &Path, name: &str) -> TtsResult<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(TtsError::model_load(dir, format!("missing {name}")))
    }
}

/// Cache-first downloader for a single hub repository.
struct HubFetcher {
    cache: Cache,
    api: Api,
    repo: Repo,
}

impl HubFetcher {
    fn new(model_id: &str, revision: Option<&str>) -> TtsResult<Self> {
        let repo = match revision {
            Some(rev) => Repo::with_revision(model_id.to_string(), RepoType::Model, rev.to_string()),
            None => Repo::model(model_id.to_string()),
        };
        // Both halves honour HF_HOME; downloads also honour HF_ENDPOINT.
        let api = ApiBuilder::from_env()
            .with_progress(false)
            .build()
            .map_err(|e| TtsError::model_load(model_id, e.to_string()))?;

        Ok(Self {
            cache: Cache::from_env(),
            api,
            repo,
        })
    }

    async fn get(&self, filename: &str) -> TtsResult<PathBuf> {
        if let Some(path) = self.cache.repo(self.repo.clone()).get(filename) {
            return Ok(path);
        }
        debug!(filename, "Downloading from the hub");
        self.api
            .repo(self.repo.clone())
            .get(filename)
            .await
            .map_err(|e| TtsError::model_load(self.repo.url(), format!("{filename}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_shard_names_deduplicated_and_sorted() {
        let index = r#"{
            "metadata": {"total_size": 1},
            "weight_map": {
                "a.weight": "model-00002-of-00002.safetensors",
                "b.weight": "model-00001-of-00002.safetensors",
                "c.weight": "model-00001-of-00002.safetensors"
            }
        }"#;
        assert_eq!(
            shard_names(index).unwrap(),
            vec![
                "model-00001-of-00002.safetensors",
                "model-00002-of-00002.safetensors"
            ]
        );
    }

    #[test]
    fn test_shard_names_rejects_empty_map() {
        assert!(shard_names(r#"{"weight_map": {}}"#).is_err());
        assert!(shard_names("[]").is_err());
    }

    #[test]
    fn test_from_dir_single_weights() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE, "{}");
        touch(dir.path(), TOKENIZER_FILE, "{}");
        touch(dir.path(), SINGLE_WEIGHTS_FILE, "");

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.config, dir.path().join(CONFIG_FILE));
        assert_eq!(files.weights, vec![dir.path().join(SINGLE_WEIGHTS_FILE)]);
    }

    #[test]
    fn test_from_dir_sharded_weights() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE, "{}");
        touch(dir.path(), TOKENIZER_FILE, "{}");
        touch(
            dir.path(),
            WEIGHTS_INDEX_FILE,
            r#"{"weight_map": {"x": "part-1.safetensors", "y": "part-2.safetensors"}}"#,
        );
        touch(dir.path(), "part-1.safetensors", "");
        touch(dir.path(), "part-2.safetensors", "");

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.weights.len(), 2);
        assert!(files.weights[0].ends_with("part-1.safetensors"));
    }

    #[test]
    fn test_from_dir_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelFiles::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, TtsError::ModelLoad { .. }));

        touch(dir.path(), CONFIG_FILE, "{}");
        touch(dir.path(), TOKENIZER_FILE, "{}");
        let err = ModelFiles::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains(WEIGHTS_INDEX_FILE));
    }

    #[tokio::test]
    async fn test_from_hub_uses_hf_home_cache() {
        let home = tempfile::tempdir().unwrap();
        let repo_dir = home.path().join("hub").join("models--acme--tiny-tts");
        let snapshot = repo_dir.join("snapshots").join("0123abcd");
        std::fs::create_dir_all(repo_dir.join("refs")).unwrap();
        std::fs::create_dir_all(&snapshot).unwrap();
        touch(&repo_dir.join("refs"), "main", "0123abcd");
        touch(&snapshot, CONFIG_FILE, "{}");
        touch(&snapshot, TOKENIZER_FILE, "{}");
        touch(&snapshot, SINGLE_WEIGHTS_FILE, "");

        // SAFETY: no other test in this crate reads or writes HF_HOME.
        unsafe { std::env::set_var("HF_HOME", home.path()) };
        let files = ModelFiles::from_hub("acme/tiny-tts", None).await.unwrap();
        unsafe { std::env::remove_var("HF_HOME") };

        assert_eq!(files.config, snapshot.join(CONFIG_FILE));
        assert_eq!(files.tokenizer, snapshot.join(TOKENIZER_FILE));
        assert_eq!(files.weights, vec![snapshot.join(SINGLE_WEIGHTS_FILE)]);
    }

    #[test]
    fn test_from_dir_missing_shard() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE, "{}");
        touch(dir.path(), TOKENIZER_FILE, "{}");
        touch(
            dir.path(),
            WEIGHTS_INDEX_FILE,
            r#"{"weight_map": {"x": "gone.safetensors"}}"#,
        );
        let err = ModelFiles::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("gone.safetensors"));
    }
}
