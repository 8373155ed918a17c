use std::{
    fmt,
    time::Duration,
};
use tracing::debug;

/// Pacing between attempts of a retried operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayPolicy {
    /// First attempt runs immediately; every retry waits the same duration.
    Fixed(Duration),
    /// Attempt `n` waits `n * step` before running, the first included.
    Linear(Duration),
}

impl DelayPolicy {
    fn delay_before(&self, attempt: u32) -> Option<Duration> {
        match self {
            DelayPolicy::Fixed(delay) => (attempt > 1).then_some(*delay),
            DelayPolicy::Linear(step) => Some(*step * attempt),
        }
    }
}

/// Runs `op` up to `max_attempts` times, sleeping per `policy` between
/// attempts, and surfaces the last error once the budget is spent.
pub async fn retry<T, E, F, Fut>(
    label: &str,
    max_attempts: u32,
    policy: DelayPolicy,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        if let Some(delay) = policy.delay_before(attempt) {
            tokio::time::sleep(delay).await;
        }
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt >= max_attempts => {
                debug!(label, attempt, %error, "giving up");
                return Err(error);
            }
            Err(error) => {
                debug!(label, attempt, max_attempts, %error, "attempt failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::sync::{
        Arc,
        Mutex,
    };
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn retry__first_attempt_succeeds__runs_once_without_delay() {
        // given
        let calls = Arc::new(Mutex::new(0u32));
        let counted = calls.clone();
        let started = Instant::now();

        // when
        let result: Result<u32, String> =
            retry("test", 5, DelayPolicy::Fixed(Duration::from_secs(2)), || {
                let counted = counted.clone();
                async move {
                    *counted.lock().unwrap() += 1;
                    Ok(7)
                }
            })
            .await;

        // then
        assert_eq!(Ok(7), result);
        assert_eq!(1, *calls.lock().unwrap());
        assert_eq!(Duration::ZERO, started.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn retry__budget_exhausted__returns_last_error_after_max_attempts() {
        // given
        let calls = Arc::new(Mutex::new(0u32));
        let counted = calls.clone();

        // when
        let result: Result<u32, String> =
            retry("test", 3, DelayPolicy::Fixed(Duration::from_secs(1)), || {
                let counted = counted.clone();
                async move {
                    let mut guard = counted.lock().unwrap();
                    *guard += 1;
                    Err(format!("failure {}", *guard))
                }
            })
            .await;

        // then
        assert_eq!(Err("failure 3".to_string()), result);
        assert_eq!(3, *calls.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn retry__fixed_policy__waits_between_attempts_only() {
        // given
        let started = Instant::now();

        // when
        let _: Result<(), String> =
            retry("test", 4, DelayPolicy::Fixed(Duration::from_secs(2)), || async {
                Err("nope".to_string())
            })
            .await;

        // then: three inter-attempt delays, none before the first
        assert_eq!(Duration::from_secs(6), started.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn retry__linear_policy__waits_before_every_attempt() {
        // given
        let started = Instant::now();

        // when
        let _: Result<(), String> =
            retry("test", 3, DelayPolicy::Linear(Duration::from_secs(2)), || async {
                Err("nope".to_string())
            })
            .await;

        // then: 2s + 4s + 6s
        assert_eq!(Duration::from_secs(12), started.elapsed());
    }
}
