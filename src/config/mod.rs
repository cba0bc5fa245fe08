//! Configuration management.
//!
//! A [`StoreConfig`] is assembled from defaults, an optional TOML file, and
//! `ANNSTORE_*` environment overrides, in that order.

use serde::Deserialize;
use std::path::Path;

use crate::{Error, Result};

/// Default embedding dimensionality.
pub const DEFAULT_DIMENSIONS: usize = 128;

/// Default initial capacity of the index (doubles on overflow).
pub const DEFAULT_CAPACITY: usize = 128;

/// HNSW connectivity parameter (M).
/// Higher values improve recall but use more memory.
pub const DEFAULT_HNSW_M: usize = 16;

/// HNSW expansion factor for construction (`ef_construction`).
/// Higher values improve index quality but slow down construction.
pub const DEFAULT_HNSW_EF_CONSTRUCTION: usize = 64;

/// HNSW expansion factor for search (`ef`).
/// Higher values improve recall but slow down search.
pub const DEFAULT_HNSW_EF_SEARCH: usize = 64;

/// Index-build parameters for the HNSW graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HnswParams {
    /// Maximum connections per node on upper layers (layer 0 allows `2 * m`).
    pub m: usize,
    /// Candidate list size while inserting.
    pub ef_construction: usize,
    /// Candidate list size while searching.
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: DEFAULT_HNSW_M,
            ef_construction: DEFAULT_HNSW_EF_CONSTRUCTION,
            ef_search: DEFAULT_HNSW_EF_SEARCH,
        }
    }
}

impl HnswParams {
    /// Creates parameters from explicit values.
    #[must_use]
    pub const fn new(m: usize, ef_construction: usize, ef_search: usize) -> Self {
        Self {
            m,
            ef_construction,
            ef_search,
        }
    }

    /// Checks the parameters are usable by the graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `m < 2` or either `ef` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(Error::InvalidInput(format!(
                "hnsw m must be at least 2, got {}",
                self.m
            )));
        }
        if self.ef_construction == 0 {
            return Err(Error::InvalidInput(
                "hnsw ef_construction must be positive".to_string(),
            ));
        }
        if self.ef_search == 0 {
            return Err(Error::InvalidInput(
                "hnsw ef_search must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Construction-time configuration for a [`crate::VectorStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Length of every stored and queried vector.
    pub dimensions: usize,
    /// Initial index capacity; doubles whenever the next id would exceed it.
    pub capacity: usize,
    /// HNSW build and search parameters.
    pub hnsw: HnswParams,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
            capacity: DEFAULT_CAPACITY,
            hnsw: HnswParams::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
///
/// ```toml
/// dimensions = 384
/// capacity = 1024
///
/// [hnsw]
/// m = 16
/// ef_construction = 64
/// ef_search = 64
/// ```
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Vector dimensionality.
    pub dimensions: Option<usize>,
    /// Initial capacity.
    pub capacity: Option<usize>,
    /// HNSW section.
    pub hnsw: Option<ConfigFileHnsw>,
}

/// HNSW section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileHnsw {
    /// Max connections.
    pub m: Option<usize>,
    /// Construction candidate list size.
    pub ef_construction: Option<usize>,
    /// Search candidate list size.
    pub ef_search: Option<usize>,
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file, then applies env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml_str(&contents).map(Self::with_env_overrides)
    }

    /// Parses configuration from TOML text without env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads defaults with env overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `ANNSTORE_DIMENSIONS` | `dimensions` |
    /// | `ANNSTORE_CAPACITY` | `capacity` |
    /// | `ANNSTORE_HNSW_M` | `hnsw.m` |
    /// | `ANNSTORE_HNSW_EF_CONSTRUCTION` | `hnsw.ef_construction` |
    /// | `ANNSTORE_HNSW_EF_SEARCH` | `hnsw.ef_search` |
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = parse_usize_env("ANNSTORE_DIMENSIONS") {
            self.dimensions = v;
        }
        if let Some(v) = parse_usize_env("ANNSTORE_CAPACITY") {
            self.capacity = v;
        }
        if let Some(v) = parse_usize_env("ANNSTORE_HNSW_M") {
            self.hnsw.m = v;
        }
        if let Some(v) = parse_usize_env("ANNSTORE_HNSW_EF_CONSTRUCTION") {
            self.hnsw.ef_construction = v;
        }
        if let Some(v) = parse_usize_env("ANNSTORE_HNSW_EF_SEARCH") {
            self.hnsw.ef_search = v;
        }
        self
    }

    /// Converts a `ConfigFile` to `StoreConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(dimensions) = file.dimensions {
            config.dimensions = dimensions;
        }
        if let Some(capacity) = file.capacity {
            config.capacity = capacity;
        }
        if let Some(hnsw) = file.hnsw {
            if let Some(m) = hnsw.m {
                config.hnsw.m = m;
            }
            if let Some(ef) = hnsw.ef_construction {
                config.hnsw.ef_construction = ef;
            }
            if let Some(ef) = hnsw.ef_search {
                config.hnsw.ef_search = ef;
            }
        }

        config
    }

    /// Sets the dimensionality.
    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets the initial capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the HNSW parameters.
    #[must_use]
    pub const fn with_hnsw(mut self, hnsw: HnswParams) -> Self {
        self.hnsw = hnsw;
        self
    }

    /// Checks every field is in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for zero dimensions, a capacity of zero
    /// or beyond the `u32` id space, or invalid HNSW parameters.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidInput(
                "dimensions must be positive".to_string(),
            ));
        }
        if self.capacity == 0 || u32::try_from(self.capacity).is_err() {
            return Err(Error::InvalidInput(format!(
                "capacity must be in 1..={}, got {}",
                u32::MAX,
                self.capacity
            )));
        }
        self.hnsw.validate()
    }
}

fn parse_usize_env(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
