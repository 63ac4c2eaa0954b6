//! Kernel registry: `(op_type, domain, version range, dtype)` → factory.
//!
//! The registry is filled once at startup and queried once per node when a
//! model is loaded. Version and dtype selection happen here, so a kernel's
//! `compute` never sees them.
//!
//! # Example
//!
//! ```
//! use linscore::attributes::{AttributeValue, Attributes, NodeDef};
//! use linscore::{DataType, ExecutionConfig, KernelRegistry, TensorValue};
//! use ndarray::array;
//!
//! let registry = KernelRegistry::cpu().unwrap();
//! let node = NodeDef::new(
//!     "LinearRegressor",
//!     "ai.onnx.ml",
//!     Attributes::new()
//!         .with("targets", AttributeValue::Int(1))
//!         .with("coefficients", AttributeValue::Floats(vec![2.0, 3.0])),
//! );
//! let kernel = registry.create(&node, DataType::Double, &ExecutionConfig::default()).unwrap();
//! let y = kernel
//!     .compute_tensors(&[TensorValue::from(array![[1.0f64, 1.0]].into_dyn())], None)
//!     .unwrap();
//! assert_eq!(y.shape(), &[1, 1]);
//! ```

use std::fmt;

use crate::attributes::{Attributes, NodeDef};
use crate::config::ExecutionConfig;
use crate::element::{DataType, Element};
use crate::error::{ConfigError, RegistryError};
use crate::kernel::{gemm, linear_regressor, Gemm, Kernel, LinearRegressor};

/// The default operator domain.
pub const ONNX_DOMAIN: &str = "";

/// The traditional-ML operator domain.
pub const ML_DOMAIN: &str = "ai.onnx.ml";

/// Builds a kernel from node attributes.
pub type KernelFactory =
    Box<dyn Fn(&Attributes, &ExecutionConfig) -> Result<Box<dyn Kernel>, ConfigError> + Send + Sync>;

/// Inclusive range of opset versions a kernel serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub since: u32,
    /// Last supported version; `None` means open-ended.
    pub end: Option<u32>,
}

impl VersionRange {
    /// `since` and every later version.
    pub fn since(since: u32) -> Self {
        Self { since, end: None }
    }

    /// `since..=end`.
    pub fn between(since: u32, end: u32) -> Self {
        Self {
            since,
            end: Some(end),
        }
    }

    #[inline]
    pub fn contains(&self, version: u32) -> bool {
        version >= self.since && self.end.map_or(true, |end| version <= end)
    }

    #[inline]
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        self.since <= other.end.unwrap_or(u32::MAX) && other.since <= self.end.unwrap_or(u32::MAX)
    }
}

/// Key a factory is registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelDef {
    pub op_type: String,
    pub domain: String,
    pub versions: VersionRange,
    pub dtype: DataType,
}

impl KernelDef {
    pub fn new(op_type: impl Into<String>, domain: impl Into<String>, versions: VersionRange, dtype: DataType) -> Self {
        Self {
            op_type: op_type.into(),
            domain: domain.into(),
            versions,
            dtype,
        }
    }

    fn matches(&self, op_type: &str, domain: &str, opset: u32, dtype: DataType) -> bool {
        self.op_type == op_type && self.domain == domain && self.dtype == dtype && self.versions.contains(opset)
    }
}

/// Registered kernel factories.
#[derive(Default)]
pub struct KernelRegistry {
    entries: Vec<(KernelDef, KernelFactory)>,
}

impl fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.defs()).finish()
    }
}

impl KernelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in CPU kernels.
    pub fn cpu() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register_cpu_kernels()?;
        Ok(registry)
    }

    /// Register a factory.
    ///
    /// Fails if an entry with the same op, domain and dtype covers any of
    /// the same versions.
    pub fn register<F>(&mut self, def: KernelDef, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&Attributes, &ExecutionConfig) -> Result<Box<dyn Kernel>, ConfigError> + Send + Sync + 'static,
    {
        let overlapping = self.entries.iter().any(|(existing, _)| {
            existing.op_type == def.op_type
                && existing.domain == def.domain
                && existing.dtype == def.dtype
                && existing.versions.overlaps(&def.versions)
        });
        if overlapping {
            return Err(RegistryError::OverlappingKernel {
                op_type: def.op_type,
                domain: def.domain,
                dtype: def.dtype,
            });
        }
        self.entries.push((def, Box::new(factory)));
        Ok(())
    }

    /// All registered keys, in registration order.
    pub fn defs(&self) -> impl Iterator<Item = &KernelDef> {
        self.entries.iter().map(|(def, _)| def)
    }

    /// Find the entry serving `op_type` at `opset` for `dtype`.
    pub fn resolve(&self, op_type: &str, domain: &str, opset: u32, dtype: DataType) -> Result<&KernelDef, RegistryError> {
        self.find(op_type, domain, opset, dtype).map(|(def, _)| def)
    }

    /// Build the kernel for `node`, using the opset `config` sets for its domain.
    pub fn create(
        &self,
        node: &NodeDef,
        dtype: DataType,
        config: &ExecutionConfig,
    ) -> Result<Box<dyn Kernel>, RegistryError> {
        let opset = config.opset_for(&node.domain);
        let (def, factory) = self.find(&node.op_type, &node.domain, opset, dtype)?;
        tracing::debug!(
            op_type = %def.op_type,
            domain = %def.domain,
            opset,
            dtype = %dtype,
            "creating kernel"
        );
        Ok(factory(&node.attributes, config)?)
    }

    fn find(
        &self,
        op_type: &str,
        domain: &str,
        opset: u32,
        dtype: DataType,
    ) -> Result<(&KernelDef, &KernelFactory), RegistryError> {
        self.entries
            .iter()
            .find(|(def, _)| def.matches(op_type, domain, opset, dtype))
            .map(|(def, factory)| (def, factory))
            .ok_or_else(|| RegistryError::NoKernel {
                op_type: op_type.to_string(),
                domain: domain.to_string(),
                opset,
                dtype,
            })
    }

    fn register_cpu_kernels(&mut self) -> Result<(), RegistryError> {
        for dtype in [DataType::Float, DataType::Double] {
            let def = KernelDef::new(linear_regressor::OP_TYPE, ML_DOMAIN, VersionRange::since(1), dtype);
            match dtype {
                DataType::Float => self.register(def, linear_regressor_factory::<f32>)?,
                DataType::Double => self.register(def, linear_regressor_factory::<f64>)?,
            }
        }

        // Opset 9 also admits integer element types; only float is enabled.
        for versions in [VersionRange::between(7, 8), VersionRange::since(9)] {
            let def = KernelDef::new(gemm::OP_TYPE, ONNX_DOMAIN, versions, DataType::Float);
            self.register(def, gemm_factory::<f32>)?;
        }
        Ok(())
    }
}

fn linear_regressor_factory<T: Element>(
    attrs: &Attributes,
    config: &ExecutionConfig,
) -> Result<Box<dyn Kernel>, ConfigError> {
    let kernel = LinearRegressor::<T>::from_attributes(attrs)?.with_parallel_rows(config.parallel_rows);
    Ok(Box::new(kernel))
}

fn gemm_factory<T: Element>(attrs: &Attributes, config: &ExecutionConfig) -> Result<Box<dyn Kernel>, ConfigError> {
    let kernel = Gemm::<T>::from_attributes(attrs)?.for_opset(config.opset_for(ONNX_DOMAIN));
    Ok(Box::new(kernel))
}
