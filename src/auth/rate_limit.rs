use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use chrono::{DateTime, Utc, Duration};

/// Sliding-window throttle for login attempts, keyed by lowercased email.
/// Checked before any credential lookup so the throttle itself leaks no
/// user-existence signal.
#[derive(Debug, Clone)]
pub struct LoginRateLimitConfig {
    pub window_size: Duration,
    pub max_attempts: u32,
}

impl Default for LoginRateLimitConfig {
    fn default() -> Self {
        Self {
            window_size: Duration::minutes(1),
            max_attempts: 10,
        }
    }
}

#[derive(Debug)]
struct AttemptWindow {
    timestamps: Vec<DateTime<Utc>>,
}

impl AttemptWindow {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    fn cleanup_old_attempts(&mut self, window_size: Duration) {
        let cutoff = Utc::now() - window_size;
        self.timestamps.retain(|ts| *ts > cutoff);
    }

    fn add_attempt(&mut self) {
        self.timestamps.push(Utc::now());
    }

    fn attempt_count(&self) -> usize {
        self.timestamps.len()
    }
}

pub struct LoginRateLimiter {
    windows: Arc<RwLock<HashMap<String, AttemptWindow>>>,
    config: LoginRateLimitConfig,
}

impl LoginRateLimiter {
    pub fn new(config: LoginRateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Records an attempt and reports whether it is still within the
    /// window's limit.
    pub async fn check_attempt(&self, email: &str) -> bool {
        let key = email.trim().to_ascii_lowercase();
        let mut windows = self.windows.write().await;

        let window = windows.entry(key).or_insert_with(AttemptWindow::new);
        window.cleanup_old_attempts(self.config.window_size);

        if window.attempt_count() < self.config.max_attempts as usize {
            window.add_attempt();
            true
        } else {
            false
        }
    }

    pub async fn cleanup(&self) {
        let mut windows = self.windows.write().await;

        windows.retain(|_, window| {
            window.cleanup_old_attempts(self.config.window_size);
            !window.timestamps.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration as TokioDuration};

    #[tokio::test]
    async fn test_login_rate_limiter() {
        let config = LoginRateLimitConfig {
            window_size: Duration::seconds(1),
            max_attempts: 5,
        };
        let limiter = LoginRateLimiter::new(config);

        for _ in 0..5 {
            assert!(limiter.check_attempt("a@x.com").await);
        }
        assert!(!limiter.check_attempt("a@x.com").await);

        // Other emails have their own window; keys are case-insensitive.
        assert!(limiter.check_attempt("b@x.com").await);
        assert!(!limiter.check_attempt("A@X.COM").await);

        sleep(TokioDuration::from_millis(1100)).await;
        assert!(limiter.check_attempt("a@x.com").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_windows() {
        let config = LoginRateLimitConfig {
            window_size: Duration::seconds(1),
            max_attempts: 5,
        };
        let limiter = LoginRateLimiter::new(config);

        limiter.check_attempt("a@x.com").await;
        sleep(TokioDuration::from_millis(1100)).await;
        limiter.cleanup().await;

        assert!(limiter.windows.read().await.is_empty());
    }
}
