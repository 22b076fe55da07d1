//! Session configuration.

/// Default number of compiled programs kept per session.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Configuration for opening an engine session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of this session (used for the engine thread name and logs).
    pub name: String,

    /// Capacity of the output and error channels.
    ///
    /// The default of 1 keeps the engine at most one item ahead of the
    /// consumer. Zero is treated as 1.
    pub channel_capacity: usize,

    /// Number of compiled programs to keep. Zero disables the cache.
    pub cache_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            channel_capacity: 1,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Create a config with the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}
