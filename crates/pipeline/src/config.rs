use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bounded task queue capacity; workers block submission when full.
    pub queue_capacity: usize,
    pub num_workers: usize,
    /// Documents shorter than this are skipped without an API call.
    pub min_content_len: usize,
    /// Upper bound on documents enqueued per run.
    pub max_tasks: usize,
    /// Sampling parameters passed through to the chat client.
    pub temperature: f64,
    pub max_tokens: u32,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            num_workers: 10,
            min_content_len: 30,
            max_tasks: 2000,
            temperature: 0.01,
            max_tokens: 8192,
            // fixed 30 s delay between attempts (initial == max)
            retry: RetryConfig {
                max_retries: 10,
                initial_backoff_ms: 30_000,
                max_backoff_ms: 30_000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 10_000,
            },
        }
    }
}

impl PipelineConfig {
    /// Preset for heavily rate-limited endpoints: fewer workers, longer
    /// waits between attempts.
    pub fn rate_limited() -> Self {
        Self {
            queue_capacity: 20,
            num_workers: 2,
            retry: RetryConfig {
                max_retries: 10,
                initial_backoff_ms: 30_000,
                max_backoff_ms: 120_000,
            },
            ..Self::default()
        }
    }

    pub fn retry_policy(&self) -> extract::RetryPolicy {
        extract::RetryPolicy::new(
            self.retry.max_retries,
            self.retry.initial_backoff_ms,
            self.retry.max_backoff_ms,
        )
    }
}
