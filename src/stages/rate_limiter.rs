use crate::pipeline::{option_or, Namespace, Payload, Stage, StageConfig, StageError};
use serde::Serialize;
use serde_json::json;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Snapshot of the limiter's counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateLimitStats {
    pub requests_per_second: u32,
    pub current_count: u32,
    /// Milliseconds since the current window opened
    pub window_age_ms: u128,
}

/// Caps how many records pass per one-second window
///
/// When the cap is reached the calling thread sleeps until the window ends,
/// blocking it with `std::thread::sleep`. Inside a tokio runtime, run the
/// pipeline through [`StageRegistry::execute_pipeline_in_place`].
/// Counters are plain fields: the limiter assumes a single caller.
///
/// [`StageRegistry::execute_pipeline_in_place`]: crate::pipeline::StageRegistry::execute_pipeline_in_place
///
/// Options: `requests_per_second` (default 1).
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: StageConfig,
    requests_per_second: u32,
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        let requests_per_second: u32 = option_or(&config, "requests_per_second", 1)?;
        if requests_per_second == 0 {
            return Err(StageError::Config(
                "requests_per_second must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            config,
            requests_per_second,
            window_start: Instant::now(),
            count: 0,
        })
    }

    pub fn factory(config: StageConfig, _: &Namespace) -> Result<Box<dyn Stage>, StageError> {
        Ok(Box::new(Self::new(config)?))
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            requests_per_second: self.requests_per_second,
            current_count: self.count,
            window_age_ms: self.window_start.elapsed().as_millis(),
        }
    }

    /// Counts one request, sleeping first if the window is full
    fn acquire(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed >= WINDOW {
            self.count = 0;
            self.window_start = Instant::now();
        }

        if self.count >= self.requests_per_second {
            if let Some(wait) = WINDOW.checked_sub(self.window_start.elapsed()) {
                tracing::debug!("Rate limit reached, sleeping {:?}", wait);
                std::thread::sleep(wait);
            }
            self.count = 0;
            self.window_start = Instant::now();
        }

        self.count += 1;
    }
}

impl Stage for RateLimiter {
    fn name(&self) -> &str {
        "RateLimiter"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn initialize(&mut self) -> bool {
        self.window_start = Instant::now();
        self.count = 0;
        true
    }

    fn execute(&mut self, payload: Payload) -> Result<Payload, StageError> {
        self.acquire();

        match payload {
            Payload::Record(mut record) => {
                record.insert(
                    "rate_limit".into(),
                    json!({
                        "requests_per_second": self.requests_per_second,
                        "current_count": self.count,
                    }),
                );
                Ok(Payload::Record(record))
            }
            raw => Ok(raw),
        }
    }

    fn cleanup(&mut self) {}
}
