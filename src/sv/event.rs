use crate::{
  entity::{Currency, event, participation, profile},
  prelude::*,
};

pub struct Event<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Event<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    name: &str,
    currency: Currency,
    amount: i64,
  ) -> Result<event::Model> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::InvalidArgs("Event name must not be empty".into()));
    }

    let event = event::ActiveModel {
      id: NotSet,
      name: Set(name.to_string()),
      currency: Set(currency),
      amount: Set(amount),
      active: Set(true),
      created_at: Set(Utc::now().naive_utc()),
    };

    Ok(event.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<event::Model>> {
    Ok(event::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<event::Model>> {
    let events = event::Entity::find()
      .order_by_desc(event::Column::CreatedAt)
      .order_by_desc(event::Column::Id)
      .all(self.db)
      .await?;
    Ok(events)
  }

  pub async fn set_active(&self, id: i32, active: bool) -> Result<event::Model> {
    let event = self.by_id(id).await?.ok_or(Error::EventNotFound)?;

    match (event.active, active) {
      (false, false) => return Err(Claim::Inactive.into()),
      (true, true) => return Err(Claim::AlreadyActive.into()),
      _ => {}
    }

    let event = event::ActiveModel { active: Set(active), ..event.into() }
      .update(self.db)
      .await?;

    info!("Event #{} is now {}", event.id, if active { "open" } else { "closed" });
    Ok(event)
  }

  /// Registered profiles currently holding the event reward.
  pub async fn participants(&self, id: i32) -> Result<Vec<profile::Model>> {
    let profiles = profile::Entity::find()
      .inner_join(participation::Entity)
      .filter(participation::Column::EventId.eq(id))
      .order_by_asc(participation::Column::JoinedAt)
      .order_by_asc(participation::Column::Id)
      .all(self.db)
      .await?;
    Ok(profiles)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{locks::Locks, sv, sv::test_db};

  #[tokio::test]
  async fn create_defaults_to_active() {
    let db = test_db().await;
    let sv = Event::new(&db);

    let event = sv.create("  Fest ", Currency::Piastres, 50).await.unwrap();
    assert_eq!(event.name, "Fest");
    assert!(event.active);
    assert_eq!(sv.by_id(event.id).await.unwrap(), Some(event.clone()));

    assert!(matches!(
      sv.create(" ", Currency::Piastres, 50).await,
      Err(Error::InvalidArgs(_))
    ));
    assert_eq!(sv.all().await.unwrap(), [event]);
  }

  #[tokio::test]
  async fn close_and_reopen() {
    let db = test_db().await;
    let sv = Event::new(&db);
    let event = sv.create("Raid", Currency::Oblomki, 3).await.unwrap();

    assert!(matches!(
      sv.set_active(event.id, true).await,
      Err(Error::Claim(Claim::AlreadyActive))
    ));

    assert!(!sv.set_active(event.id, false).await.unwrap().active);
    assert!(matches!(
      sv.set_active(event.id, false).await,
      Err(Error::Claim(Claim::Inactive))
    ));

    assert!(sv.set_active(event.id, true).await.unwrap().active);
    assert!(matches!(
      sv.set_active(404, true).await,
      Err(Error::EventNotFound)
    ));
  }

  #[tokio::test]
  async fn participants_follow_claims() {
    let db = test_db().await;
    let locks = Locks::new();
    let event = Event::new(&db).create("Raid", Currency::Oblomki, 3).await.unwrap();

    for chat_id in [1, 2] {
      let draft = crate::registration::Draft {
        chat_id,
        name: Some(format!("p{chat_id}")),
        ..Default::default()
      };
      sv::Profile::new(&db).save(&draft).await.unwrap();
    }

    let ledger = sv::Ledger::new(&db, &locks);
    ledger.claim(event.id, 2).await.unwrap();
    ledger.claim(event.id, 1).await.unwrap();

    let chats: Vec<_> = Event::new(&db)
      .participants(event.id)
      .await
      .unwrap()
      .into_iter()
      .map(|p| p.chat_id)
      .collect();
    assert_eq!(chats, [2, 1]);

    ledger.unclaim(event.id, 2).await.unwrap();
    let left = Event::new(&db).participants(event.id).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].chat_id, 1);
  }

  #[tokio::test]
  async fn events_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());

    let id = {
      let db = Database::connect(&url).await.unwrap();
      migration::Migrator::up(&db, None).await.unwrap();
      let event =
        Event::new(&db).create("Fest", Currency::Piastres, 50).await.unwrap();
      db.close().await.unwrap();
      event.id
    };

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let event = Event::new(&db).by_id(id).await.unwrap().unwrap();
    assert_eq!(event.name, "Fest");
    assert_eq!(event.currency, Currency::Piastres);
    assert_eq!(event.amount, 50);
  }
}
