//! Clock port - named delays slept through an interface so tests run on a
//! virtual clock

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
