mod admin;
mod user;

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::{
  Bot,
  dispatching::{Dispatcher, HandlerExt, UpdateFilterExt},
  prelude::*,
  types::{ChatId, FileId, InputFile, Message, ParseMode, Update},
  utils::html::escape,
};

use crate::{error::Kind, notify::Notifier, prelude::*, state::AppState};

/// Notification sink backed by a bot.
#[derive(Clone)]
pub struct Telegram(pub Bot);

#[async_trait]
impl Notifier for Telegram {
  async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
    self.0.send_message(ChatId(chat_id), text).parse_mode(ParseMode::Html).await?;
    Ok(())
  }

  async fn send_photo(
    &self,
    chat_id: i64,
    photo: &str,
    caption: &str,
  ) -> anyhow::Result<()> {
    self
      .0
      .send_photo(ChatId(chat_id), InputFile::file_id(FileId(photo.into())))
      .caption(caption)
      .parse_mode(ParseMode::Html)
      .await?;
    Ok(())
  }
}

/// Player-facing bot: commands plus the registration conversation.
pub struct UserBot(pub Bot);

#[async_trait]
impl super::Plugin for UserBot {
  fn name(&self) -> &'static str {
    "user-bot"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    info!("Starting user bot...");

    let handler = teloxide::dptree::entry()
      .branch(
        Update::filter_message().filter_command::<user::Command>().endpoint({
          let app = app.clone();
          move |bot: Bot, msg: Message, cmd: user::Command| {
            let app = app.clone();
            let username = msg.chat.username().unwrap_or_default().to_string();
            user::handle(app, ReplyBot::new(bot, msg.chat.id), username, cmd)
          }
        }),
      )
      .branch(Update::filter_message().endpoint({
        let app = app.clone();
        move |bot: Bot, msg: Message| {
          let app = app.clone();
          user::converse(app, ReplyBot::new(bot, msg.chat.id), msg)
        }
      }));

    Dispatcher::builder(self.0.clone(), handler).build().dispatch().await;
    Ok(())
  }
}

/// Administrator bot; every command but `/auth` and `/help` sits behind the
/// gate.
pub struct AdminBot(pub Bot);

#[async_trait]
impl super::Plugin for AdminBot {
  fn name(&self) -> &'static str {
    "admin-bot"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    info!("Starting admin bot...");

    let handler = teloxide::dptree::entry().branch(
      Update::filter_message().filter_command::<admin::Command>().endpoint({
        let app = app.clone();
        move |bot: Bot, msg: Message, cmd: admin::Command| {
          let app = app.clone();
          admin::handle(app, ReplyBot::new(bot, msg.chat.id), cmd)
        }
      }),
    );

    Dispatcher::builder(self.0.clone(), handler).build().dispatch().await;
    Ok(())
  }
}

#[derive(Debug, Clone)]
struct ReplyBot {
  inner: Bot,
  pub chat_id: ChatId,
}

impl ReplyBot {
  pub fn new(inner: Bot, chat_id: ChatId) -> Self {
    Self { inner, chat_id }
  }

  async fn reply_html(&self, text: impl Into<String>) -> ResponseResult<()> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .await?;
    Ok(())
  }

  /// Send a potentially long message by splitting it into chunks if needed.
  async fn reply_html_chunked(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<()> {
    for chunk in utils::chunk_message(&text.into(), 0) {
      self.reply_html(chunk).await?;
    }
    Ok(())
  }

  async fn reply_error(&self, err: &Error) -> ResponseResult<()> {
    if err.kind() == Kind::Persistence {
      error!("Command in chat {} failed: {err}", self.chat_id);
    }
    self.reply_html(format!("❌ {}", escape(&err.user_message()))).await
  }

  /// Photo with caption when the profile has one, text otherwise.
  async fn reply_card(&self, photo: &str, caption: &str) {
    let sink = Telegram(self.inner.clone());
    crate::notify::card(&sink, self.chat_id.0, photo, caption).await;
  }
}
