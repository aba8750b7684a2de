// src/config/pool.rs
use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MIN_POOL_SIZE: u32 = 50;
pub const DEFAULT_MAX_POOL_SIZE: u32 = 150;
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
pub const DEFAULT_QUEUE_SIZE: i32 = 20;

/// Queue size meaning "no bound on queued connections".
pub const UNBOUNDED_QUEUE: i32 = -1;

const MAX_POOL_SIZE_LIMIT: u32 = 10_000;
const MAX_KEEP_ALIVE_SECS: u64 = 86_400;
const MAX_QUEUE_SIZE: i32 = 100_000;

/// How accepted connections are turned into running work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Fixed set of workers fed from a capacity-limited queue.
    BoundedPool,
    /// One tokio task per connection, no concurrency ceiling.
    #[default]
    LightweightPerTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    min_pool_size: u32,
    max_pool_size: u32,
    keep_alive_secs: u64,
    queue_size: i32,
    execution_strategy: ExecutionStrategy,
}

impl WorkerPoolConfig {
    pub fn builder() -> WorkerPoolConfigBuilder {
        WorkerPoolConfigBuilder::default()
    }

    pub fn min_pool_size(&self) -> usize {
        self.min_pool_size as usize
    }

    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size as usize
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Raw queue size as configured; `-1` is unbounded.
    pub fn queue_size(&self) -> i32 {
        self.queue_size
    }

    /// Queue bound, `None` when unbounded.
    pub fn queue_capacity(&self) -> Option<usize> {
        usize::try_from(self.queue_size).ok()
    }

    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.execution_strategy
    }

    /// True when any pool-sizing knob differs from the bounded-pool defaults.
    pub fn is_customized(&self) -> bool {
        self.min_pool_size != DEFAULT_MIN_POOL_SIZE
            || self.max_pool_size != DEFAULT_MAX_POOL_SIZE
            || self.queue_size != DEFAULT_QUEUE_SIZE
            || self.keep_alive_secs != DEFAULT_KEEP_ALIVE_SECS
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: DEFAULT_MIN_POOL_SIZE,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            queue_size: DEFAULT_QUEUE_SIZE,
            execution_strategy: ExecutionStrategy::default(),
        }
    }
}

pub fn validate_min_pool_size(size: u32) -> Result<u32, ConfigValidationError> {
    if size < 1 {
        return Err(ConfigValidationError::new(
            "min_pool_size",
            "Minimum pool size must be at least 1",
        ));
    }
    if size > MAX_POOL_SIZE_LIMIT {
        return Err(ConfigValidationError::new(
            "min_pool_size",
            "Minimum pool size cannot exceed 10000",
        ));
    }
    Ok(size)
}

pub fn validate_max_pool_size(size: u32) -> Result<u32, ConfigValidationError> {
    if size < 1 {
        return Err(ConfigValidationError::new(
            "max_pool_size",
            "Maximum pool size must be at least 1",
        ));
    }
    if size > MAX_POOL_SIZE_LIMIT {
        return Err(ConfigValidationError::new(
            "max_pool_size",
            "Maximum pool size cannot exceed 10000",
        ));
    }
    Ok(size)
}

pub fn validate_keep_alive(secs: u64) -> Result<u64, ConfigValidationError> {
    if secs > MAX_KEEP_ALIVE_SECS {
        return Err(ConfigValidationError::new(
            "keep_alive_seconds",
            "Keep alive seconds cannot exceed 86400 (24 hours)",
        ));
    }
    Ok(secs)
}

pub fn validate_queue_size(size: i32) -> Result<i32, ConfigValidationError> {
    if size < 0 && size != UNBOUNDED_QUEUE {
        return Err(ConfigValidationError::new(
            "queue_size",
            "Queue size must be non-negative or -1 for unbounded",
        ));
    }
    if size > MAX_QUEUE_SIZE {
        return Err(ConfigValidationError::new(
            "queue_size",
            "Queue size cannot exceed 100000",
        ));
    }
    Ok(size)
}

pub fn validate_pool_bounds(min: u32, max: u32) -> Result<(), ConfigValidationError> {
    if min > max {
        return Err(ConfigValidationError::new(
            "min_pool_size",
            format!(
                "Minimum pool size ({}) cannot exceed maximum pool size ({})",
                min, max
            ),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct WorkerPoolConfigBuilder {
    min_pool_size: u32,
    max_pool_size: u32,
    keep_alive_secs: u64,
    queue_size: i32,
    execution_strategy: ExecutionStrategy,
}

impl Default for WorkerPoolConfigBuilder {
    fn default() -> Self {
        let defaults = WorkerPoolConfig::default();
        Self {
            min_pool_size: defaults.min_pool_size,
            max_pool_size: defaults.max_pool_size,
            keep_alive_secs: defaults.keep_alive_secs,
            queue_size: defaults.queue_size,
            execution_strategy: defaults.execution_strategy,
        }
    }
}

impl WorkerPoolConfigBuilder {
    pub fn min_pool_size(&mut self, size: u32) -> Result<&mut Self, ConfigValidationError> {
        self.min_pool_size = validate_min_pool_size(size)?;
        Ok(self)
    }

    pub fn max_pool_size(&mut self, size: u32) -> Result<&mut Self, ConfigValidationError> {
        self.max_pool_size = validate_max_pool_size(size)?;
        Ok(self)
    }

    pub fn keep_alive_secs(&mut self, secs: u64) -> Result<&mut Self, ConfigValidationError> {
        self.keep_alive_secs = validate_keep_alive(secs)?;
        Ok(self)
    }

    pub fn queue_size(&mut self, size: i32) -> Result<&mut Self, ConfigValidationError> {
        self.queue_size = validate_queue_size(size)?;
        Ok(self)
    }

    pub fn execution_strategy(&mut self, strategy: ExecutionStrategy) -> &mut Self {
        self.execution_strategy = strategy;
        self
    }

    /// Min/max ordering is only checked here, so fields may be set in any order.
    pub fn build(&self) -> Result<WorkerPoolConfig, ConfigValidationError> {
        let min_pool_size = validate_min_pool_size(self.min_pool_size)?;
        let max_pool_size = validate_max_pool_size(self.max_pool_size)?;
        validate_pool_bounds(min_pool_size, max_pool_size)?;

        Ok(WorkerPoolConfig {
            min_pool_size,
            max_pool_size,
            keep_alive_secs: validate_keep_alive(self.keep_alive_secs)?,
            queue_size: validate_queue_size(self.queue_size)?,
            execution_strategy: self.execution_strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_worker_pool_defaults() {
        let config = WorkerPoolConfig::builder().build().unwrap();
        assert_eq!(config.min_pool_size(), 50);
        assert_eq!(config.max_pool_size(), 150);
        assert_eq!(config.keep_alive(), Duration::from_secs(60));
        assert_eq!(config.queue_size(), 20);
        assert_eq!(config.queue_capacity(), Some(20));
        assert_eq!(config.execution_strategy(), ExecutionStrategy::LightweightPerTask);
        assert!(!config.is_customized());
    }

    #[test]
    fn test_pool_size_field_messages() {
        let mut builder = WorkerPoolConfig::builder();
        assert_eq!(
            builder.min_pool_size(0).unwrap_err().message(),
            "Minimum pool size must be at least 1"
        );
        assert_eq!(
            builder.min_pool_size(10_001).unwrap_err().message(),
            "Minimum pool size cannot exceed 10000"
        );
        assert_eq!(
            builder.max_pool_size(0).unwrap_err().message(),
            "Maximum pool size must be at least 1"
        );
        assert_eq!(
            builder.max_pool_size(10_001).unwrap_err().message(),
            "Maximum pool size cannot exceed 10000"
        );
    }

    #[test]
    fn test_keep_alive_bounds() {
        assert!(validate_keep_alive(0).is_ok());
        assert!(validate_keep_alive(86_400).is_ok());
        assert_eq!(
            validate_keep_alive(86_401).unwrap_err().message(),
            "Keep alive seconds cannot exceed 86400 (24 hours)"
        );
    }

    #[test]
    fn test_queue_size_bounds() {
        assert_eq!(validate_queue_size(-1).unwrap(), -1);
        assert_eq!(validate_queue_size(0).unwrap(), 0);
        assert_eq!(validate_queue_size(100_000).unwrap(), 100_000);
        assert_eq!(
            validate_queue_size(-2).unwrap_err().message(),
            "Queue size must be non-negative or -1 for unbounded"
        );
        assert_eq!(
            validate_queue_size(100_001).unwrap_err().message(),
            "Queue size cannot exceed 100000"
        );
    }

    #[test]
    fn test_unbounded_queue_has_no_capacity() {
        let config = WorkerPoolConfig::builder()
            .queue_size(UNBOUNDED_QUEUE)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.queue_capacity(), None);
    }

    #[test]
    fn test_min_above_max_rejected_at_build() {
        let mut builder = WorkerPoolConfig::builder();
        builder.max_pool_size(10).unwrap().min_pool_size(20).unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(
            err.message(),
            "Minimum pool size (20) cannot exceed maximum pool size (10)"
        );
    }

    #[test]
    fn test_fields_can_be_set_in_any_order() {
        // Raising min past the default max is fine as long as max follows.
        let mut builder = WorkerPoolConfig::builder();
        builder.min_pool_size(500).unwrap();
        builder.max_pool_size(600).unwrap();
        let config = builder.build().unwrap();
        assert_eq!(config.min_pool_size(), 500);
        assert_eq!(config.max_pool_size(), 600);
    }

    #[test]
    fn test_builder_can_build_repeatedly() {
        let mut builder = WorkerPoolConfig::builder();
        builder
            .min_pool_size(5)
            .unwrap()
            .execution_strategy(ExecutionStrategy::BoundedPool);

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert_eq!(first, second);

        builder.max_pool_size(7).unwrap();
        let third = builder.build().unwrap();
        assert_eq!(first.max_pool_size(), 150);
        assert_eq!(third.max_pool_size(), 7);
    }

    #[test]
    fn test_is_customized_tracks_each_field() {
        let customized = |f: fn(&mut WorkerPoolConfigBuilder)| {
            let mut builder = WorkerPoolConfig::builder();
            f(&mut builder);
            builder.build().unwrap().is_customized()
        };
        assert!(customized(|b| {
            b.min_pool_size(10).unwrap();
        }));
        assert!(customized(|b| {
            b.max_pool_size(200).unwrap();
        }));
        assert!(customized(|b| {
            b.queue_size(-1).unwrap();
        }));
        assert!(customized(|b| {
            b.keep_alive_secs(0).unwrap();
        }));
        assert!(!customized(|b| {
            b.execution_strategy(ExecutionStrategy::BoundedPool);
        }));
    }

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&ExecutionStrategy::BoundedPool).unwrap();
        assert_eq!(json, "\"bounded_pool\"");
        let strategy: ExecutionStrategy = serde_json::from_str("\"lightweight_per_task\"").unwrap();
        assert_eq!(strategy, ExecutionStrategy::LightweightPerTask);
    }

    proptest! {
        #[test]
        fn prop_min_above_max_always_rejected(
            max in 1u32..=9_999,
            delta in 1u32..=1_000,
            min_first in any::<bool>(),
        ) {
            let min = (max + delta).min(10_000);
            prop_assume!(min > max);

            let mut builder = WorkerPoolConfig::builder();
            if min_first {
                builder.min_pool_size(min).unwrap();
                builder.max_pool_size(max).unwrap();
            } else {
                builder.max_pool_size(max).unwrap();
                builder.min_pool_size(min).unwrap();
            }

            let err = builder.build().unwrap_err();
            prop_assert_eq!(
                err.message(),
                format!("Minimum pool size ({}) cannot exceed maximum pool size ({})", min, max)
            );
        }

        #[test]
        fn prop_ordered_bounds_always_build(min in 1u32..=10_000, max in 1u32..=10_000) {
            prop_assume!(min <= max);
            let mut builder = WorkerPoolConfig::builder();
            builder.min_pool_size(min).unwrap().max_pool_size(max).unwrap();
            let config = builder.build().unwrap();
            prop_assert_eq!(config.min_pool_size(), min as usize);
            prop_assert_eq!(config.max_pool_size(), max as usize);
        }
    }
}
