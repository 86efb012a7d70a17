use crate::prelude::*;

/// Admin gate: a chat becomes authenticated after presenting the shared
/// secret and stays so until the process exits.
pub struct Gate {
  secret: String,
  admins: DashSet<i64>,
}

impl Gate {
  pub fn new(secret: impl Into<String>) -> Self {
    Self { secret: secret.into(), admins: DashSet::new() }
  }

  pub fn authenticate(&self, chat_id: i64, supplied: &str) -> bool {
    if !self.secret.is_empty() && supplied.trim() == self.secret {
      if self.admins.insert(chat_id) {
        info!("Admin chat {chat_id} authenticated");
      }
      true
    } else {
      warn!("Failed admin authentication from chat {chat_id}");
      false
    }
  }

  pub fn is_authenticated(&self, chat_id: i64) -> bool {
    self.admins.contains(&chat_id)
  }

  pub fn require(&self, chat_id: i64) -> Result<()> {
    if self.is_authenticated(chat_id) {
      Ok(())
    } else {
      Err(Error::NotAuthenticated)
    }
  }
}
