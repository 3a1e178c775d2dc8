use crate::core::ElementState;
use crate::errors::Result;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// State an element must reach before an action may touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitCondition {
    Present,
    Visible,
    /// Visible and enabled
    Clickable,
}

impl WaitCondition {
    pub fn satisfied_by(&self, state: ElementState) -> bool {
        match self {
            WaitCondition::Present => true,
            WaitCondition::Visible => state.displayed,
            WaitCondition::Clickable => state.displayed && state.enabled,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            WaitCondition::Present => "present",
            WaitCondition::Visible => "visible",
            WaitCondition::Clickable => "clickable",
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Poll `probe` until it yields a value or `timeout` elapses.
///
/// The probe always runs at least once. `Ok(None)` means the deadline passed;
/// errors from the probe end the wait immediately.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
