//! Local in-process inference backend
//!
//! Loads a Mistral-Instruct model from an on-disk directory (safetensors
//! weights) and runs generation on CPU or CUDA. Loading is expensive, so
//! the adapter caches the handle for the process lifetime.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::mistral::{Config as MistralConfig, Model as Mistral};
use tokenizers::Tokenizer;

use super::BackendError;

/// Descriptor files that must exist before attempting a load
const REQUIRED_FILES: &[&str] = &["config.json", "tokenizer.json"];

/// Index file naming the weight shards of a multi-file checkpoint
const WEIGHT_INDEX_FILE: &str = "model.safetensors.index.json";

/// Single-file checkpoint name used when no index is present
const SINGLE_WEIGHT_FILE: &str = "model.safetensors";

/// Seed for greedy-but-reproducible sampling
const SAMPLING_SEED: u64 = 42;

/// Pre-flight validation of the model directory
///
/// Returns the resolved weight shard paths on success. Missing directory,
/// missing descriptor files, and a partial shard set are all reported as
/// `BackendError::Unavailable` with the expected path and the remediation
/// in the message.
pub fn validate_model_dir(dir: &Path) -> Result<Vec<PathBuf>, BackendError> {
    if !dir.is_dir() {
        return Err(BackendError::Unavailable(format!(
            "model directory not found at {}; download the model into this directory before enabling the local backend",
            dir.display()
        )));
    }

    let missing: Vec<&str> = REQUIRED_FILES
        .iter()
        .copied()
        .filter(|f| !dir.join(f).is_file())
        .collect();
    if !missing.is_empty() {
        return Err(BackendError::Unavailable(format!(
            "model files missing at {}: {}; the download appears incomplete, re-run it",
            dir.display(),
            missing.join(", ")
        )));
    }

    resolve_weight_shards(dir)
}

/// Resolve the weight shard set, distinguishing "incomplete" from "absent"
fn resolve_weight_shards(dir: &Path) -> Result<Vec<PathBuf>, BackendError> {
    let index_path = dir.join(WEIGHT_INDEX_FILE);
    if index_path.is_file() {
        let contents = fs::read_to_string(&index_path).map_err(|e| {
            BackendError::Unavailable(format!(
                "failed to read weight index {}: {}",
                index_path.display(),
                e
            ))
        })?;

        let index: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
            BackendError::Unavailable(format!(
                "failed to parse weight index {}: {}",
                index_path.display(),
                e
            ))
        })?;

        let shard_names: BTreeSet<String> = index
            .get("weight_map")
            .and_then(|m| m.as_object())
            .map(|m| {
                m.values()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        if shard_names.is_empty() {
            return Err(BackendError::Unavailable(format!(
                "weight index {} names no shards",
                index_path.display()
            )));
        }

        let mut shards = Vec::with_capacity(shard_names.len());
        let mut missing = Vec::new();
        for name in &shard_names {
            let shard = dir.join(name);
            if shard.is_file() {
                shards.push(shard);
            } else {
                missing.push(name.as_str());
            }
        }

        if !missing.is_empty() {
            return Err(BackendError::Unavailable(format!(
                "weight shards incomplete at {}: missing {} of {} ({}); re-run the model download",
                dir.display(),
                missing.len(),
                shard_names.len(),
                missing.join(", ")
            )));
        }

        return Ok(shards);
    }

    let single = dir.join(SINGLE_WEIGHT_FILE);
    if single.is_file() {
        return Ok(vec![single]);
    }

    Err(BackendError::Unavailable(format!(
        "no weight shards found at {}; download the model into this directory before enabling the local backend",
        dir.display()
    )))
}

/// Loaded local model: weights, tokenizer, and device
///
/// Generation mutates the KV cache, so callers serialize access (the
/// adapter wraps this in a mutex).
pub struct LocalModel {
    model: Mistral,
    tokenizer: Tokenizer,
    device: Device,
    eos_token_id: Option<u32>,
}

impl LocalModel {
    /// Load the model from a validated directory
    ///
    /// This maps multi-gigabyte weight files and must only happen once per
    /// process; run it on a blocking thread.
    pub fn load(dir: &Path) -> Result<Self, BackendError> {
        let shards = validate_model_dir(dir)?;

        tracing::info!(dir = %dir.display(), shards = shards.len(), "Loading local model");
        let start_time = std::time::Instant::now();

        let device = Device::cuda_if_available(0)
            .map_err(|e| BackendError::Unavailable(format!("failed to select device: {}", e)))?;
        let dtype = if device.is_cuda() {
            DType::BF16
        } else {
            DType::F32
        };

        let config_contents = fs::read(dir.join("config.json")).map_err(|e| {
            BackendError::Unavailable(format!("failed to read model config: {}", e))
        })?;
        let config: MistralConfig = serde_json::from_slice(&config_contents).map_err(|e| {
            BackendError::Unavailable(format!("failed to parse model config: {}", e))
        })?;

        let tokenizer = Tokenizer::from_file(dir.join("tokenizer.json"))
            .map_err(|e| BackendError::Unavailable(format!("failed to load tokenizer: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&shards, dtype, &device).map_err(|e| {
                BackendError::Unavailable(format!("failed to map weight shards: {}", e))
            })?
        };

        let model = Mistral::new(&config, vb)
            .map_err(|e| BackendError::Unavailable(format!("failed to build model: {}", e)))?;

        let eos_token_id = tokenizer.token_to_id("</s>");

        tracing::info!(
            dir = %dir.display(),
            elapsed_ms = start_time.elapsed().as_millis(),
            cuda = device.is_cuda(),
            "Local model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            eos_token_id,
        })
    }

    /// Render a system + user prompt in the Mistral instruct format
    pub fn format_prompt(system: &str, user: &str) -> String {
        format!("<s>[INST] {}\n\n{} [/INST]", system, user)
    }

    /// Generate a completion for an already-formatted prompt
    ///
    /// Greedy sampling with a fixed seed for reproducible answers.
    pub fn generate(&mut self, prompt: &str, max_new_tokens: usize) -> Result<String, BackendError> {
        self.model.clear_kv_cache();

        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| BackendError::Generation(format!("failed to encode prompt: {}", e)))?;
        let mut tokens: Vec<u32> = encoding.get_ids().to_vec();
        if tokens.is_empty() {
            return Err(BackendError::Generation("empty prompt encoding".to_string()));
        }

        let mut logits_processor = LogitsProcessor::new(SAMPLING_SEED, None, None);
        let mut generated: Vec<u32> = Vec::new();

        for index in 0..max_new_tokens {
            let context_size = if index > 0 { 1 } else { tokens.len() };
            let start_pos = tokens.len().saturating_sub(context_size);
            let input = Tensor::new(&tokens[start_pos..], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(|e| BackendError::Generation(e.to_string()))?;

            let logits = self
                .model
                .forward(&input, start_pos)
                .and_then(|l| l.squeeze(0))
                .and_then(|l| l.squeeze(0))
                .and_then(|l| l.to_dtype(DType::F32))
                .map_err(|e| BackendError::Generation(e.to_string()))?;

            let next = logits_processor
                .sample(&logits)
                .map_err(|e| BackendError::Generation(e.to_string()))?;

            tokens.push(next);
            if Some(next) == self.eos_token_id {
                break;
            }
            generated.push(next);
        }

        self.tokenizer
            .decode(&generated, true)
            .map(|text| text.trim().to_string())
            .map_err(|e| BackendError::Generation(format!("failed to decode output: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("does-not-exist");
        let err = validate_model_dir(&dir).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("model directory not found"));
        assert!(msg.contains(dir.to_str().unwrap()));
    }

    #[test]
    fn test_missing_descriptor_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "config.json", "{}");
        let err = validate_model_dir(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("tokenizer.json"));
    }

    #[test]
    fn test_single_weight_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "config.json", "{}");
        write(tmp.path(), "tokenizer.json", "{}");
        write(tmp.path(), "model.safetensors", "");
        let shards = validate_model_dir(tmp.path()).unwrap();
        assert_eq!(shards, vec![tmp.path().join("model.safetensors")]);
    }

    #[test]
    fn test_sharded_weights_complete() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "config.json", "{}");
        write(tmp.path(), "tokenizer.json", "{}");
        write(
            tmp.path(),
            "model.safetensors.index.json",
            r#"{"weight_map": {"a.weight": "model-00001.safetensors", "b.weight": "model-00002.safetensors"}}"#,
        );
        write(tmp.path(), "model-00001.safetensors", "");
        write(tmp.path(), "model-00002.safetensors", "");
        let shards = validate_model_dir(tmp.path()).unwrap();
        assert_eq!(shards.len(), 2);
    }

    #[test]
    fn test_sharded_weights_incomplete_is_distinct_from_absent() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "config.json", "{}");
        write(tmp.path(), "tokenizer.json", "{}");
        write(
            tmp.path(),
            "model.safetensors.index.json",
            r#"{"weight_map": {"a.weight": "model-00001.safetensors", "b.weight": "model-00002.safetensors"}}"#,
        );
        write(tmp.path(), "model-00001.safetensors", "");
        let err = validate_model_dir(tmp.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("incomplete"));
        assert!(msg.contains("model-00002.safetensors"));
    }

    #[test]
    fn test_no_weights_at_all() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "config.json", "{}");
        write(tmp.path(), "tokenizer.json", "{}");
        let err = validate_model_dir(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("no weight shards found"));
    }

    #[test]
    fn test_format_prompt() {
        let prompt = LocalModel::format_prompt("You are precise.", "Is water wet?");
        assert!(prompt.starts_with("<s>[INST]"));
        assert!(prompt.ends_with("[/INST]"));
        assert!(prompt.contains("Is water wet?"));
    }
}
