use thiserror::Error;

/// Conflicts around event participation and event state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Claim {
  #[error("Event is not active")]
  Inactive,
  #[error("Event is already active")]
  AlreadyActive,
  #[error("Reward already claimed")]
  AlreadyClaimed,
  #[error("Reward was not claimed")]
  NotClaimed,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Profile not found")]
  ProfileNotFound,

  #[error("Event not found")]
  EventNotFound,

  #[error("Profile already registered")]
  AlreadyRegistered,

  #[error(transparent)]
  Claim(#[from] Claim),

  #[error("Unknown currency `{0}`")]
  InvalidCurrency(String),

  #[error("Unknown field `{0}`")]
  UnknownField(String),

  #[error("Invalid value `{value}` for `{field}`")]
  InvalidFieldValue { field: &'static str, value: String },

  #[error("Invalid arguments: {0}")]
  InvalidArgs(String),

  #[error("Not authenticated")]
  NotAuthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Validation,
  NotFound,
  Conflict,
  Authorization,
  Persistence,
}

impl Error {
  pub fn kind(&self) -> Kind {
    match self {
      Error::Database(_) => Kind::Persistence,
      Error::ProfileNotFound | Error::EventNotFound => Kind::NotFound,
      Error::AlreadyRegistered | Error::Claim(_) => Kind::Conflict,
      Error::InvalidCurrency(_)
      | Error::UnknownField(_)
      | Error::InvalidFieldValue { .. }
      | Error::InvalidArgs(_) => Kind::Validation,
      Error::NotAuthenticated => Kind::Authorization,
    }
  }

  /// Plain text shown to the chat that issued the command.
  pub fn user_message(&self) -> String {
    match self {
      Error::Database(err) => format!("Storage error: {err}"),
      Error::ProfileNotFound => {
        "Profile not found. Use /createprofile to register.".into()
      }
      Error::AlreadyRegistered => {
        "Your profile already exists. Use /profile to view it.".into()
      }
      Error::Claim(Claim::AlreadyClaimed) => {
        "You have already taken part in this event.".into()
      }
      Error::Claim(Claim::NotClaimed) => {
        "You have not taken part in this event.".into()
      }
      Error::InvalidCurrency(name) => {
        format!("Unknown currency `{name}`. Use piastres or oblomki.")
      }
      Error::UnknownField(name) => format!(
        "Unknown field `{name}`. Available: {}",
        crate::sv::profile::Field::NAMES.join(", ")
      ),
      Error::NotAuthenticated => {
        "Authentication required: /auth <password>".into()
      }
      other => other.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn taxonomy() {
    assert_eq!(Error::from(Claim::AlreadyClaimed).kind(), Kind::Conflict);
    assert_eq!(Error::AlreadyRegistered.kind(), Kind::Conflict);
    assert_eq!(Error::EventNotFound.kind(), Kind::NotFound);
    assert_eq!(Error::NotAuthenticated.kind(), Kind::Authorization);
    assert_eq!(
      Error::InvalidFieldValue { field: "age", value: "x".into() }.kind(),
      Kind::Validation
    );
    assert_eq!(
      Error::Database(sea_orm::DbErr::Custom("disk".into())).kind(),
      Kind::Persistence
    );
  }

  #[test]
  fn persistence_errors_are_reported_verbatim() {
    let err = Error::Database(sea_orm::DbErr::Custom("disk full".into()));
    assert!(err.user_message().contains("disk full"));
  }

  #[test]
  fn unknown_field_lists_valid_fields() {
    let message = Error::UnknownField("mood".into()).user_message();
    assert!(message.contains("mood"));
    assert!(message.contains("inventory"));
    assert!(message.contains("race"));
  }
}
