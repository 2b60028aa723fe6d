//! Runtime switches for the mount state builder.

/// Defaults are safe for production and need no tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatConfig {
    /// Log every dropped tag at `info` level.
    pub log_dropped_views: bool,
    /// Discard queued non-create operations addressed to a view when it is
    /// dropped before the queue is flushed.
    pub prune_dropped_operations: bool,
}

impl FlatConfig {
    pub const LOG_DROPPED_VIEWS_ENV: &'static str = "FLAT_LOG_DROPPED_VIEWS";
    pub const PRUNE_DROPPED_OPERATIONS_ENV: &'static str = "FLAT_PRUNE_DROPPED_OPERATIONS";

    /// Reads switches from the environment; a variable that is set to
    /// anything but `0` or `false` turns its switch on.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = |name: &str| {
            lookup(name)
                .map(|value| !matches!(value.trim(), "0" | "false" | ""))
                .unwrap_or(false)
        };
        Self {
            log_dropped_views: enabled(Self::LOG_DROPPED_VIEWS_ENV),
            prune_dropped_operations: enabled(Self::PRUNE_DROPPED_OPERATIONS_ENV),
        }
    }

    pub fn with_log_dropped_views(mut self, enabled: bool) -> Self {
        self.log_dropped_views = enabled;
        self
    }

    pub fn with_prune_dropped_operations(mut self, enabled: bool) -> Self {
        self.prune_dropped_operations = enabled;
        self
    }
}
