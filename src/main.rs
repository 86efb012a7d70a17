//! Character registry - role-play profiles and event currency ledger
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Teloxide for the player bot and the admin bot
//! - Axum for the health endpoint
//! - Tokio for async runtime

mod auth;
mod entity;
mod error;
mod locks;
mod notify;
mod plugins;
mod prelude;
mod registration;
mod state;
mod sv;
mod utils;

use teloxide::Bot;
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  notify::Sinks,
  plugins::{App, cron, server, telegram},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "registry=debug,sea_orm=warn,tower_http=debug".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;
  info!("Starting character registry v{}", env!("CARGO_PKG_VERSION"));

  let user_bot = Bot::new(&config.user_token);
  let admin_bot = Bot::new(&config.admin_token);
  let sinks = Sinks::new(
    telegram::Telegram(user_bot.clone()),
    telegram::Telegram(admin_bot.clone()),
  );

  let app = Arc::new(AppState::new(config, sinks).await?);

  App::new()
    .register(telegram::UserBot(user_bot))
    .register(telegram::AdminBot(admin_bot))
    .register(cron::Plugin)
    .register(server::Plugin)
    .run(app)
    .await;

  tokio::signal::ctrl_c().await.context("Failed to listen for shutdown")?;
  info!("Shutting down");
  Ok(())
}
