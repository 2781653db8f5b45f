//! Randomized delay between consecutive ports on the same host.

use crate::error::ConfigError;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Default lower bound of the inter-port delay.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);
/// Default upper bound of the inter-port delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(1000);

/// Uniformly random delay drawn from `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    /// Create a pacing interval. `min` must not exceed `max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidValue {
                field: "delay",
                reason: format!("minimum {min:?} exceeds maximum {max:?}"),
            });
        }
        Ok(Self { min, max })
    }

    /// No delay at all.
    pub const fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Whether every sampled delay is zero.
    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draw one delay.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }

    /// Sleep for one sampled delay.
    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        let delay = self.sample(&mut rand::thread_rng());
        sleep(delay).await;
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DELAY,
            max: DEFAULT_MAX_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_bounds() {
        let pacing = Pacing::default();
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let delay = pacing.sample(&mut rng);
            assert!(delay >= DEFAULT_MIN_DELAY && delay <= DEFAULT_MAX_DELAY);
        }
    }

    #[test]
    fn test_fixed_interval() {
        let fixed = Duration::from_millis(250);
        let pacing = Pacing::new(fixed, fixed).unwrap();
        assert_eq!(pacing.sample(&mut rand::thread_rng()), fixed);
    }

    #[test]
    fn test_inverted_interval_rejected() {
        assert!(Pacing::new(Duration::from_secs(2), Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_disabled_pacing_returns_immediately() {
        assert!(Pacing::none().is_disabled());
        Pacing::none().pause().await;
    }
}
