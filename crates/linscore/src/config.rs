//! Execution configuration, loadable from JSON or built programmatically.
//!
//! ```json
//! { "n_threads": 4, "parallel_rows": true, "opset": 9, "ml_opset": 1 }
//! ```
//!
//! Every field is optional in JSON and falls back to [`ExecutionConfig::default`].

use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::utils::build_thread_pool;

/// How kernels are resolved and run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Worker threads: 0 = all cores, 1 = serial, n = exactly n.
    pub n_threads: usize,
    /// Run bias-add and post-transform row-parallel when a pool is present.
    pub parallel_rows: bool,
    /// Opset version of the default operator domain.
    pub opset: u32,
    /// Opset version of the `ai.onnx.ml` domain.
    pub ml_opset: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            n_threads: 1,
            parallel_rows: true,
            opset: 9,
            ml_opset: 1,
        }
    }
}

impl ExecutionConfig {
    /// Parses configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Opset version that applies to `domain`.
    pub fn opset_for(&self, domain: &str) -> u32 {
        if domain == crate::registry::ML_DOMAIN {
            self.ml_opset
        } else {
            self.opset
        }
    }

    /// Build the thread pool handle described by `n_threads`.
    ///
    /// Returns `None` for serial execution.
    pub fn thread_pool(&self) -> Result<Option<ThreadPool>, rayon::ThreadPoolBuildError> {
        build_thread_pool(self.n_threads)
    }
}
