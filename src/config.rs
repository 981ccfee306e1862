//! Configuration for bigstore
//!
//! Open-time tuning knobs with sensible defaults. The on-disk format itself
//! (block size, record encoding, directory layout) is fixed and not
//! configurable.

/// Configuration applied when opening a datastore
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Cache size handed to the redb index database, in bytes.
    /// `None` leaves redb's own default in place.
    pub index_cache_bytes: Option<usize>,

    // -------------------------------------------------------------------------
    // Region Configuration
    // -------------------------------------------------------------------------
    /// Pre-fault the bigfile mapping at open (MAP_POPULATE). Trades a slower
    /// open for no page-fault stalls on first access.
    pub populate_region: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_cache_bytes: None,
            populate_region: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the redb cache size (in bytes)
    pub fn index_cache_bytes(mut self, bytes: usize) -> Self {
        self.config.index_cache_bytes = Some(bytes);
        self
    }

    /// Pre-fault the region mapping at open
    pub fn populate_region(mut self, populate: bool) -> Self {
        self.config.populate_region = populate;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
