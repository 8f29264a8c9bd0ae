//! Tokio-backed clock

use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::outbound::Clock;

/// Real time. Tests substitute an instant clock behind the same port.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
