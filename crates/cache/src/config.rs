//! Pool configuration with precedence and validation
//!
//! Values are resolved as defaults, then the JSON config file, then
//! `MEMBOUND_*` environment variables. The result is immutable once a pool
//! has been built from it.

use crate::errors::{Error, RecoveryHint, Result, SerializationOp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default number of entries sampled when a store picks a victim.
pub const DEFAULT_SAMPLE_SIZE: usize = 30;

/// Which pool evictor reclaims bytes across stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictorKind {
    /// Evict from whichever store currently accounts the most bytes
    #[default]
    FromLargest,
    /// Evict from the store with the fewest hits per accounted byte
    Coldest,
    /// Never evict; additions over capacity are rejected
    None,
}

impl FromStr for EvictorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "from_largest" | "largest" => Ok(Self::FromLargest),
            "coldest" => Ok(Self::Coldest),
            "none" => Ok(Self::None),
            _ => Err(Error::Configuration {
                message: format!("Unknown pool evictor: {s}"),
                recovery_hint: RecoveryHint::UseDefault {
                    value: "from_largest".to_string(),
                },
            }),
        }
    }
}

/// Which size-of engine the pool uses by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizeOfEngineKind {
    /// Walk values through `DeepSizeOf`
    #[default]
    Deep,
    /// Charge fixed costs per part
    Constant {
        key_bytes: u64,
        value_bytes: u64,
        container_bytes: u64,
    },
}

impl FromStr for SizeOfEngineKind {
    type Err = Error;

    /// Accepts `deep` or `constant:<key>:<value>:<container>`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Configuration {
            message: format!("Unknown size-of engine: {s}"),
            recovery_hint: RecoveryHint::UseDefault {
                value: "deep".to_string(),
            },
        };

        let mut parts = s.split(':');
        match parts.next().map(str::to_lowercase).as_deref() {
            Some("deep") if parts.next().is_none() => Ok(Self::Deep),
            Some("constant") => {
                let mut next = || -> Result<u64> {
                    parts
                        .next()
                        .and_then(|p| p.trim().parse().ok())
                        .ok_or_else(invalid)
                };
                let kind = Self::Constant {
                    key_bytes: next()?,
                    value_bytes: next()?,
                    container_bytes: next()?,
                };
                if parts.next().is_some() {
                    return Err(invalid());
                }
                Ok(kind)
            }
            _ => Err(invalid()),
        }
    }
}

/// Victim selection rule applied to a store's sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePolicy {
    #[default]
    Lfu,
    Lru,
    Fifo,
}

impl StorePolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lfu => "lfu",
            Self::Lru => "lru",
            Self::Fifo => "fifo",
        }
    }
}

impl FromStr for StorePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lfu" => Ok(Self::Lfu),
            "lru" => Ok(Self::Lru),
            "fifo" => Ok(Self::Fifo),
            _ => Err(Error::Configuration {
                message: format!("Unknown eviction policy: {s}"),
                recovery_hint: RecoveryHint::UseDefault {
                    value: "lfu".to_string(),
                },
            }),
        }
    }
}

/// Per-store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum entry count; 0 leaves the store bounded by the pool only
    pub max_entries: usize,
    /// Entries sampled per victim selection
    pub sample_size: usize,
    /// Selection rule applied to the sample
    pub policy: StorePolicy,
    /// Lifetime of an element from creation, in milliseconds
    pub time_to_live_ms: Option<u64>,
    /// Lifetime of an element from its last access, in milliseconds
    pub time_to_idle_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            sample_size: DEFAULT_SAMPLE_SIZE,
            policy: StorePolicy::Lfu,
            time_to_live_ms: None,
            time_to_idle_ms: None,
        }
    }
}

impl StoreConfig {
    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live_ms.map(Duration::from_millis)
    }

    pub fn time_to_idle(&self) -> Option<Duration> {
        self.time_to_idle_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(Error::Configuration {
                message: "sample_size must be at least 1".to_string(),
                recovery_hint: RecoveryHint::UseDefault {
                    value: DEFAULT_SAMPLE_SIZE.to_string(),
                },
            });
        }
        Ok(())
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    /// Default configuration
    #[default]
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
    /// Built in code
    Programmatic,
}

/// Configuration for a pool and the stores it creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum aggregate bytes across all stores
    pub capacity_bytes: u64,
    /// Policy reclaiming bytes when the pool is full
    pub evictor: EvictorKind,
    /// Default engine for accessors created without one
    pub size_of_engine: SizeOfEngineKind,
    /// Defaults for stores created by the manager
    pub store: StoreConfig,
    /// Where the last override came from
    #[serde(skip)]
    pub source: ConfigSource,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 64 * 1024 * 1024, // 64MB
            evictor: EvictorKind::default(),
            size_of_engine: SizeOfEngineKind::default(),
            store: StoreConfig::default(),
            source: ConfigSource::Default,
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity_bytes == 0 {
            return Err(Error::Configuration {
                message: "capacity_bytes must be greater than zero".to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            });
        }
        self.store.validate()
    }
}

/// Builder for creating pool configurations
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig {
                source: ConfigSource::Programmatic,
                ..PoolConfig::default()
            },
        }
    }

    pub fn with_capacity(mut self, bytes: u64) -> Self {
        self.config.capacity_bytes = bytes;
        self
    }

    pub fn with_evictor(mut self, evictor: EvictorKind) -> Self {
        self.config.evictor = evictor;
        self
    }

    pub fn with_size_of_engine(mut self, engine: SizeOfEngineKind) -> Self {
        self.config.size_of_engine = engine;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.config.store.max_entries = max_entries;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.config.store.sample_size = sample_size;
        self
    }

    pub fn with_store_policy(mut self, policy: StorePolicy) -> Self {
        self.config.store.policy = policy;
        self
    }

    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.config.store.time_to_live_ms = Some(whole_millis(ttl));
        self
    }

    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.config.store.time_to_idle_ms = Some(whole_millis(tti));
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Milliseconds in `duration`, rounding a nonzero sub-millisecond rest up
fn whole_millis(duration: Duration) -> u64 {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if duration.subsec_nanos() % 1_000_000 != 0 {
        millis.saturating_add(1)
    } else {
        millis
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration loader that handles precedence
pub struct PoolConfigLoader;

impl PoolConfigLoader {
    /// Load configuration with full precedence handling
    pub fn load() -> Result<PoolConfig> {
        let path = Self::get_config_file_path()?;
        let config = match Self::load_from_path(&path)? {
            Some(config) => config,
            None => PoolConfig::default(),
        };
        let config = Self::apply_env(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file, `None` when it does not exist
    pub fn load_from_path(path: &Path) -> Result<Option<PoolConfig>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            operation: "read config file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        })?;

        let mut config: PoolConfig =
            serde_json::from_str(&content).map_err(|e| Error::Serialization {
                key: path.display().to_string(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Check config file syntax".to_string(),
                },
            })?;
        config.source = ConfigSource::ConfigFile(path.to_path_buf());

        tracing::debug!(path = %path.display(), "Loaded pool configuration file");
        Ok(Some(config))
    }

    /// Override values from `MEMBOUND_*` environment variables
    pub fn apply_env(mut config: PoolConfig) -> Result<PoolConfig> {
        let mut applied = Vec::new();

        if let Some(capacity) = Self::env_number::<u64>("MEMBOUND_POOL_CAPACITY")? {
            config.capacity_bytes = capacity;
            applied.push("MEMBOUND_POOL_CAPACITY");
        }

        if let Some(max_entries) = Self::env_number::<usize>("MEMBOUND_MAX_ENTRIES")? {
            config.store.max_entries = max_entries;
            applied.push("MEMBOUND_MAX_ENTRIES");
        }

        if let Some(sample_size) = Self::env_number::<usize>("MEMBOUND_SAMPLE_SIZE")? {
            config.store.sample_size = sample_size;
            applied.push("MEMBOUND_SAMPLE_SIZE");
        }

        if let Ok(evictor) = std::env::var("MEMBOUND_EVICTOR") {
            config.evictor = evictor.parse()?;
            applied.push("MEMBOUND_EVICTOR");
        }

        if let Ok(engine) = std::env::var("MEMBOUND_SIZE_OF_ENGINE") {
            config.size_of_engine = engine.parse()?;
            applied.push("MEMBOUND_SIZE_OF_ENGINE");
        }

        if let Ok(policy) = std::env::var("MEMBOUND_STORE_POLICY") {
            config.store.policy = policy.parse()?;
            applied.push("MEMBOUND_STORE_POLICY");
        }

        if let Some(last) = applied.last() {
            tracing::debug!(variables = ?applied, "Applied environment overrides");
            config.source = ConfigSource::EnvironmentVariable((*last).to_string());
        }

        Ok(config)
    }

    fn env_number<T: FromStr>(name: &str) -> Result<Option<T>> {
        match std::env::var(name) {
            Ok(raw) => raw.trim().parse().map(Some).map_err(|_| Error::Configuration {
                message: format!("{name} must be a non-negative integer, got '{raw}'"),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            }),
            Err(_) => Ok(None),
        }
    }

    /// Get the configuration file path
    pub fn get_config_file_path() -> Result<PathBuf> {
        let config_dir = if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config_home)
        } else {
            dirs::config_dir().ok_or_else(|| Error::Configuration {
                message: "Could not determine config directory".to_string(),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Set XDG_CONFIG_HOME or HOME environment variable".to_string(),
                },
            })?
        };

        Ok(config_dir.join("membound").join("config.json"))
    }
}
