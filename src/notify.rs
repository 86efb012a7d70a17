//! Outbound messages. Delivery failures are logged and swallowed: a user who
//! blocked the bot must never break the command that triggered the message.

use async_trait::async_trait;
use futures::{StreamExt, stream};

use crate::prelude::*;

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;

  async fn send_photo(
    &self,
    chat_id: i64,
    photo: &str,
    caption: &str,
  ) -> anyhow::Result<()>;
}

/// The two bots: one talks to players, the other to administrators.
#[derive(Clone)]
pub struct Sinks {
  pub user: Arc<dyn Notifier>,
  pub admin: Arc<dyn Notifier>,
}

impl Sinks {
  pub fn new(
    user: impl Notifier + 'static,
    admin: impl Notifier + 'static,
  ) -> Self {
    Self { user: Arc::new(user), admin: Arc::new(admin) }
  }
}

pub async fn text(sink: &dyn Notifier, chat_id: i64, text: &str) -> bool {
  match sink.send_text(chat_id, text).await {
    Ok(()) => true,
    Err(err) => {
      warn!("Failed to notify {chat_id}: {err:#}");
      false
    }
  }
}

/// Sends a photo with caption, or plain text when there is no photo or the
/// photo reference is rejected.
pub async fn card(
  sink: &dyn Notifier,
  chat_id: i64,
  photo: &str,
  caption: &str,
) -> bool {
  if !photo.is_empty() {
    match sink.send_photo(chat_id, photo, caption).await {
      Ok(()) => return true,
      Err(err) => warn!("Photo delivery to {chat_id} failed: {err:#}"),
    }
  }
  text(sink, chat_id, caption).await
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
  pub sent: usize,
  pub failed: usize,
}

pub async fn broadcast(
  sink: &dyn Notifier,
  recipients: impl IntoIterator<Item = i64>,
  message: &str,
  limit: usize,
) -> Delivery {
  stream::iter(recipients)
    .map(|chat_id| text(sink, chat_id, message))
    .buffer_unordered(limit.max(1))
    .fold(Delivery::default(), |mut delivery, ok| async move {
      if ok {
        delivery.sent += 1;
      } else {
        delivery.failed += 1;
      }
      delivery
    })
    .await
}

#[cfg(test)]
pub mod testing {
  use std::sync::Mutex;

  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  pub enum Sent {
    Text { chat_id: i64, text: String },
    Photo { chat_id: i64, photo: String, caption: String },
  }

  impl Sent {
    pub fn chat_id(&self) -> i64 {
      match self {
        Sent::Text { chat_id, .. } | Sent::Photo { chat_id, .. } => *chat_id,
      }
    }

    pub fn body(&self) -> &str {
      match self {
        Sent::Text { text, .. } => text,
        Sent::Photo { caption, .. } => caption,
      }
    }
  }

  /// Records every delivery; chats listed in `unreachable` fail.
  #[derive(Default)]
  pub struct Recorder {
    pub sent: Mutex<Vec<Sent>>,
    pub unreachable: Vec<i64>,
    pub reject_photos: bool,
  }

  impl Recorder {
    pub fn sent(&self) -> Vec<Sent> {
      self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<Sent> {
      self.sent().into_iter().filter(|s| s.chat_id() == chat_id).collect()
    }
  }

  #[async_trait]
  impl Notifier for Recorder {
    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
      if self.unreachable.contains(&chat_id) {
        anyhow::bail!("chat {chat_id} blocked the bot");
      }
      self
        .sent
        .lock()
        .unwrap()
        .push(Sent::Text { chat_id, text: text.to_string() });
      Ok(())
    }

    async fn send_photo(
      &self,
      chat_id: i64,
      photo: &str,
      caption: &str,
    ) -> anyhow::Result<()> {
      if self.reject_photos || self.unreachable.contains(&chat_id) {
        anyhow::bail!("wrong file identifier");
      }
      self.sent.lock().unwrap().push(Sent::Photo {
        chat_id,
        photo: photo.to_string(),
        caption: caption.to_string(),
      });
      Ok(())
    }
  }
}
