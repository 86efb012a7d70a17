pub mod event;
pub mod ledger;
pub mod profile;

pub use event::Event;
pub use ledger::Ledger;
pub use profile::Profile;

#[cfg(test)]
pub(crate) async fn test_db() -> sea_orm::DatabaseConnection {
  use crate::prelude::*;

  let db = Database::connect("sqlite::memory:").await.unwrap();
  migration::Migrator::up(&db, None).await.unwrap();
  db
}
