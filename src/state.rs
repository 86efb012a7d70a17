use std::env;

use crate::{
  auth::Gate,
  entity::{event, profile},
  locks::Locks,
  notify::{self, Delivery, Sinks},
  prelude::*,
  registration::{Advance, Registrations, Step},
  sv,
};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub user_token: String,
  pub admin_token: String,
  pub admin_password: String,
  pub admin_chat_id: Option<i64>,
  pub registration_ttl: Duration,
  pub broadcast_concurrency: usize,
  pub port: u16,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite::memory:"),
      user_token: String::new(),
      admin_token: String::new(),
      admin_password: String::new(),
      admin_chat_id: None,
      registration_ttl: Duration::from_secs(30 * 60),
      broadcast_concurrency: 16,
      port: 3000,
    }
  }
}

fn required(name: &str) -> anyhow::Result<String> {
  env::var(name).with_context(|| format!("{name} not set"))
}

fn optional<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>>
where
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match env::var(name) {
    Ok(raw) if !raw.trim().is_empty() => {
      let value =
        raw.trim().parse().with_context(|| format!("Invalid {name}: {raw}"))?;
      Ok(Some(value))
    }
    _ => Ok(None),
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let defaults = Self::default();

    let registration_ttl = match env::var("REGISTRATION_TTL") {
      Ok(raw) => humantime::parse_duration(raw.trim())
        .with_context(|| format!("Invalid REGISTRATION_TTL: {raw}"))?,
      Err(_) => defaults.registration_ttl,
    };

    Ok(Self {
      database_url: env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:registry.db?mode=rwc".into()),
      user_token: required("USER_BOT_TOKEN")?,
      admin_token: required("ADMIN_BOT_TOKEN")?,
      admin_password: required("ADMIN_PASSWORD")?,
      admin_chat_id: optional("ADMIN_CHAT_ID")?,
      registration_ttl,
      broadcast_concurrency: optional("BROADCAST_CONCURRENCY")?
        .unwrap_or(defaults.broadcast_concurrency),
      port: optional("PORT")?.unwrap_or(defaults.port),
    })
  }
}

pub struct Services<'a> {
  pub profile: sv::Profile<'a>,
  pub event: sv::Event<'a>,
  pub ledger: sv::Ledger<'a>,
}

/// Outcome of one registration message.
#[derive(Debug)]
pub enum Progress {
  Next(Step),
  Retry(Step),
  Completed(profile::Model),
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub registrations: Registrations,
  pub gate: Gate,
  pub locks: Locks,
  pub sinks: Sinks,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config, sinks: Sinks) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    migration::Migrator::up(&db, None)
      .await
      .context("Failed to run migrations")?;

    Ok(Self {
      db,
      registrations: Registrations::new(),
      gate: Gate::new(config.admin_password.clone()),
      locks: Locks::new(),
      sinks,
      config,
    })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      profile: sv::Profile::new(&self.db),
      event: sv::Event::new(&self.db),
      ledger: sv::Ledger::new(&self.db, &self.locks),
    }
  }

  pub async fn begin_registration(
    &self,
    chat_id: i64,
    username: &str,
  ) -> Result<Step> {
    if let Some(profile) = self.sv().profile.by_chat(chat_id).await?
      && profile.is_registered()
    {
      return Err(Error::AlreadyRegistered);
    }

    debug!("Chat {chat_id} started registration");
    Ok(self.registrations.begin(chat_id, username))
  }

  /// Feeds one message into the chat's registration. `None` when the chat is
  /// not registering.
  pub async fn advance_registration(
    &self,
    chat_id: i64,
    input: &str,
  ) -> Result<Option<Progress>> {
    let draft = match self.registrations.advance(chat_id, input) {
      None => return Ok(None),
      Some(Advance::Next(step)) => return Ok(Some(Progress::Next(step))),
      Some(Advance::Retry(step)) => return Ok(Some(Progress::Retry(step))),
      Some(Advance::Completed(draft)) => draft,
    };

    let profile = self.sv().profile.save(&draft).await.inspect_err(|err| {
      error!("Failed to save profile of {chat_id}: {err}");
    })?;
    info!("Profile #{} registered for chat {chat_id}", profile.id);

    let user = self.sinks.user.as_ref();
    notify::text(user, chat_id, "✅ Profile created!").await;
    notify::card(user, chat_id, &profile.photo, &utils::profile_card(&profile))
      .await;

    match self.config.admin_chat_id {
      Some(admin) => {
        let caption = format!(
          "🆕 <b>New registration</b>\n\n{}",
          utils::admin_card(&profile)
        );
        notify::card(self.sinks.admin.as_ref(), admin, &profile.photo, &caption)
          .await;
      }
      None => warn!("ADMIN_CHAT_ID is not set, skipping registration notice"),
    }

    Ok(Some(Progress::Completed(profile)))
  }

  pub async fn create_event(
    &self,
    name: &str,
    currency: &str,
    amount: i64,
  ) -> Result<(event::Model, Delivery)> {
    let currency = currency.parse()?;
    let sv = self.sv();

    let event = sv.event.create(name, currency, amount).await?;
    info!(
      "Event #{} `{}` created: {} {}",
      event.id, event.name, event.amount, event.currency
    );

    let recipients = match sv.profile.all().await {
      Ok(profiles) => profiles.into_iter().map(|p| p.chat_id).collect(),
      Err(err) => {
        error!("Failed to list profiles for event broadcast: {err}");
        Vec::new()
      }
    };

    let delivery = notify::broadcast(
      self.sinks.user.as_ref(),
      recipients,
      &utils::event_announcement(&event),
      self.config.broadcast_concurrency,
    )
    .await;
    info!(
      "Event #{} announced: {} sent, {} failed",
      event.id, delivery.sent, delivery.failed
    );

    Ok((event, delivery))
  }

  pub fn gc(&self) {
    let ttl = TimeDelta::from_std(self.config.registration_ttl)
      .unwrap_or(TimeDelta::MAX);
    let expired = self.registrations.gc(ttl);
    if expired > 0 {
      debug!("Expired {expired} idle registrations");
    }
    self.locks.gc();
  }
}
