use std::sync::Arc;

use async_trait::async_trait;

use crate::{prelude::*, state::AppState};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic housekeeping: expires idle registrations and drops unused locks.
pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "cron"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
      interval.tick().await;
      app.gc();
    }
  }
}
