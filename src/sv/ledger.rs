//! Event rewards. Claiming is at most once per (event, chat): the
//! participation row, the balance write and the attendance counter change
//! together in one transaction or not at all.

use sea_orm::{DatabaseTransaction, SqlErr};

use crate::{
  entity::{Currency, event, participation, profile},
  locks::Locks,
  prelude::*,
};

#[derive(Debug, Clone)]
pub struct Receipt {
  pub event: event::Model,
  pub profile: profile::Model,
}

pub struct Ledger<'a> {
  db: &'a DatabaseConnection,
  locks: &'a Locks,
}

impl<'a> Ledger<'a> {
  pub fn new(db: &'a DatabaseConnection, locks: &'a Locks) -> Self {
    Self { db, locks }
  }

  #[cfg(test)]
  pub async fn has_claimed(&self, event_id: i32, chat_id: i64) -> Result<bool> {
    let row = participation::Entity::find()
      .filter(participation::Column::EventId.eq(event_id))
      .filter(participation::Column::ChatId.eq(chat_id))
      .one(self.db)
      .await?;
    Ok(row.is_some())
  }

  /// Credits the event amount to the chat's profile.
  pub async fn claim(&self, event_id: i32, chat_id: i64) -> Result<Receipt> {
    let _guard = self.locks.lock(chat_id).await;
    let txn = self.db.begin().await?;

    let event = active_event(&txn, event_id).await?;
    if participation_of(&txn, event_id, chat_id).await?.is_some() {
      return Err(Claim::AlreadyClaimed.into());
    }
    let profile = profile_of(&txn, chat_id).await?;

    let (profile, applied) =
      credit(&txn, profile, event.currency, event.amount, 1).await?;

    participation::ActiveModel {
      id: NotSet,
      event_id: Set(event_id),
      chat_id: Set(chat_id),
      delta: Set(applied),
      joined_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
      Some(SqlErr::UniqueConstraintViolation(_)) => Claim::AlreadyClaimed.into(),
      _ => Error::Database(err),
    })?;

    txn.commit().await?;

    info!(
      "Chat {chat_id} claimed event #{event_id}: {} {} (balance {})",
      event.amount,
      event.currency,
      profile.balance(event.currency)
    );
    Ok(Receipt { event, profile })
  }

  /// Reverts exactly what the claim applied. The debit saturates at zero.
  pub async fn unclaim(&self, event_id: i32, chat_id: i64) -> Result<Receipt> {
    let _guard = self.locks.lock(chat_id).await;
    let txn = self.db.begin().await?;

    let event = active_event(&txn, event_id).await?;
    let row = participation_of(&txn, event_id, chat_id)
      .await?
      .ok_or(Claim::NotClaimed)?;
    let profile = profile_of(&txn, chat_id).await?;

    let (profile, _) =
      credit(&txn, profile, event.currency, row.delta.saturating_neg(), -1)
        .await?;
    participation::Entity::delete_by_id(row.id).exec(&txn).await?;

    txn.commit().await?;

    info!(
      "Chat {chat_id} withdrew from event #{event_id} (balance {})",
      profile.balance(event.currency)
    );
    Ok(Receipt { event, profile })
  }
}

async fn active_event(
  txn: &DatabaseTransaction,
  event_id: i32,
) -> Result<event::Model> {
  let event = event::Entity::find_by_id(event_id)
    .one(txn)
    .await?
    .ok_or(Error::EventNotFound)?;

  if !event.active {
    return Err(Claim::Inactive.into());
  }
  Ok(event)
}

async fn participation_of(
  txn: &DatabaseTransaction,
  event_id: i32,
  chat_id: i64,
) -> Result<Option<participation::Model>> {
  let row = participation::Entity::find()
    .filter(participation::Column::EventId.eq(event_id))
    .filter(participation::Column::ChatId.eq(chat_id))
    .one(txn)
    .await?;
  Ok(row)
}

async fn profile_of(
  txn: &DatabaseTransaction,
  chat_id: i64,
) -> Result<profile::Model> {
  profile::Entity::find()
    .filter(profile::Column::ChatId.eq(chat_id))
    .one(txn)
    .await?
    .ok_or(Error::ProfileNotFound)
}

/// Returns the updated profile and the change actually applied to the
/// balance after saturation.
async fn credit(
  txn: &DatabaseTransaction,
  profile: profile::Model,
  currency: Currency,
  delta: i64,
  attendance: i32,
) -> Result<(profile::Model, i64)> {
  let before = profile.balance(currency);
  let balance = profile::shift(before, delta);
  let visits = (profile.attendance + attendance).max(0);

  let mut model: profile::ActiveModel = profile.into();
  model.set_balance(currency, balance);
  model.attendance = Set(visits);

  Ok((model.update(txn).await?, balance - before))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    registration::Draft,
    sv::{self, test_db},
  };

  async fn register(db: &DatabaseConnection, chat_id: i64) -> profile::Model {
    let draft =
      Draft { chat_id, name: Some(format!("p{chat_id}")), ..Default::default() };
    sv::Profile::new(db).save(&draft).await.unwrap()
  }

  async fn balance(db: &DatabaseConnection, chat_id: i64) -> profile::Model {
    sv::Profile::new(db).by_chat(chat_id).await.unwrap().unwrap()
  }

  #[tokio::test]
  async fn claim_credits_exactly_once() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);

    let user = register(&db, 1).await;
    sv::Profile::new(&db).adjust(user.id, Currency::Piastres, 10).await.unwrap();
    let event =
      sv::Event::new(&db).create("Fest", Currency::Piastres, 50).await.unwrap();

    let receipt = ledger.claim(event.id, 1).await.unwrap();
    assert_eq!(receipt.profile.piastres, 60);
    assert_eq!(receipt.profile.oblomki, 0);
    assert_eq!(receipt.profile.attendance, 1);

    assert!(matches!(
      ledger.claim(event.id, 1).await,
      Err(Error::Claim(Claim::AlreadyClaimed))
    ));
    assert_eq!(balance(&db, 1).await.piastres, 60);
    assert!(ledger.has_claimed(event.id, 1).await.unwrap());
  }

  #[tokio::test]
  async fn unclaim_restores_balance() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);

    let user = register(&db, 1).await;
    sv::Profile::new(&db).adjust(user.id, Currency::Oblomki, 4).await.unwrap();
    let event =
      sv::Event::new(&db).create("Raid", Currency::Oblomki, 6).await.unwrap();

    ledger.claim(event.id, 1).await.unwrap();
    let receipt = ledger.unclaim(event.id, 1).await.unwrap();

    assert_eq!(receipt.profile.oblomki, 4);
    assert_eq!(receipt.profile.attendance, 0);
    assert!(!ledger.has_claimed(event.id, 1).await.unwrap());
    assert!(matches!(
      ledger.unclaim(event.id, 1).await,
      Err(Error::Claim(Claim::NotClaimed))
    ));

    // a withdrawn reward can be claimed again
    assert_eq!(ledger.claim(event.id, 1).await.unwrap().profile.oblomki, 10);
  }

  #[tokio::test]
  async fn debit_never_goes_below_zero() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);

    let user = register(&db, 1).await;
    let event =
      sv::Event::new(&db).create("Fest", Currency::Piastres, 50).await.unwrap();

    ledger.claim(event.id, 1).await.unwrap();
    sv::Profile::new(&db).adjust(user.id, Currency::Piastres, -40).await.unwrap();
    assert_eq!(balance(&db, 1).await.piastres, 10);

    let receipt = ledger.unclaim(event.id, 1).await.unwrap();
    assert_eq!(receipt.profile.piastres, 0);
  }

  #[tokio::test]
  async fn penalty_events_subtract() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);

    let user = register(&db, 1).await;
    sv::Profile::new(&db).adjust(user.id, Currency::Piastres, 30).await.unwrap();
    let event = sv::Event::new(&db)
      .create("Tax", Currency::Piastres, -20)
      .await
      .unwrap();

    assert_eq!(ledger.claim(event.id, 1).await.unwrap().profile.piastres, 10);
    assert_eq!(ledger.unclaim(event.id, 1).await.unwrap().profile.piastres, 30);
  }

  #[tokio::test]
  async fn floored_penalty_reverts_what_it_took() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);

    let user = register(&db, 1).await;
    sv::Profile::new(&db).adjust(user.id, Currency::Piastres, 5).await.unwrap();
    let event = sv::Event::new(&db)
      .create("Tax", Currency::Piastres, -20)
      .await
      .unwrap();

    assert_eq!(ledger.claim(event.id, 1).await.unwrap().profile.piastres, 0);
    assert_eq!(ledger.unclaim(event.id, 1).await.unwrap().profile.piastres, 5);

    // repeating the cycle must not mint anything
    ledger.claim(event.id, 1).await.unwrap();
    assert_eq!(ledger.unclaim(event.id, 1).await.unwrap().profile.piastres, 5);
  }

  #[tokio::test]
  async fn extreme_amounts_do_not_overflow() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);
    let events = sv::Event::new(&db);

    let user = register(&db, 1).await;
    sv::Profile::new(&db).adjust(user.id, Currency::Oblomki, 5).await.unwrap();

    let drain = events.create("Drain", Currency::Oblomki, i64::MIN).await.unwrap();
    assert_eq!(ledger.claim(drain.id, 1).await.unwrap().profile.oblomki, 0);
    assert_eq!(ledger.unclaim(drain.id, 1).await.unwrap().profile.oblomki, 5);

    let flood = events.create("Flood", Currency::Oblomki, i64::MAX).await.unwrap();
    assert_eq!(
      ledger.claim(flood.id, 1).await.unwrap().profile.oblomki,
      i64::MAX
    );
    assert_eq!(ledger.unclaim(flood.id, 1).await.unwrap().profile.oblomki, 5);
  }

  #[tokio::test]
  async fn claim_preconditions() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);
    let events = sv::Event::new(&db);

    let event = events.create("Fest", Currency::Piastres, 50).await.unwrap();

    assert!(matches!(ledger.claim(404, 1).await, Err(Error::EventNotFound)));
    assert!(matches!(
      ledger.claim(event.id, 1).await,
      Err(Error::ProfileNotFound)
    ));
    assert!(!ledger.has_claimed(event.id, 1).await.unwrap());

    register(&db, 1).await;
    events.set_active(event.id, false).await.unwrap();
    assert!(matches!(
      ledger.claim(event.id, 1).await,
      Err(Error::Claim(Claim::Inactive))
    ));
    assert!(matches!(
      ledger.unclaim(event.id, 1).await,
      Err(Error::Claim(Claim::Inactive))
    ));
    assert_eq!(balance(&db, 1).await.piastres, 0);
  }

  #[tokio::test]
  async fn failed_participation_insert_rolls_back_credit() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);

    register(&db, 1).await;
    let event =
      sv::Event::new(&db).create("Fest", Currency::Piastres, 50).await.unwrap();

    db.execute_unprepared(
      "CREATE TRIGGER reject_participation BEFORE INSERT ON event_participation \
       BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .await
    .unwrap();

    let err = ledger.claim(event.id, 1).await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    let profile = balance(&db, 1).await;
    assert_eq!(profile.piastres, 0);
    assert_eq!(profile.attendance, 0);
    assert!(!ledger.has_claimed(event.id, 1).await.unwrap());
  }

  #[tokio::test]
  async fn concurrent_claims_credit_once() {
    let db = test_db().await;
    let locks = Locks::new();
    let ledger = Ledger::new(&db, &locks);

    register(&db, 1).await;
    let event =
      sv::Event::new(&db).create("Fest", Currency::Piastres, 50).await.unwrap();

    let (a, b) =
      tokio::join!(ledger.claim(event.id, 1), ledger.claim(event.id, 1));

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert!(
      matches!(a, Err(Error::Claim(Claim::AlreadyClaimed)))
        || matches!(b, Err(Error::Claim(Claim::AlreadyClaimed)))
    );
    assert_eq!(balance(&db, 1).await.piastres, 50);
  }
}
