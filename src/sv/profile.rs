use std::str::FromStr;

use crate::{
  entity::{Currency, profile},
  prelude::*,
  registration::Draft,
};

/// Fields an administrator may rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Name,
  Age,
  Height,
  Weight,
  Inventory,
  Photo,
  Rank,
  Team,
  Race,
}

impl Field {
  pub const NAMES: [&'static str; 9] = [
    "name",
    "age",
    "height",
    "weight",
    "inventory",
    "photo",
    "rank",
    "team",
    "race",
  ];

  pub fn name(self) -> &'static str {
    Self::NAMES[self as usize]
  }
}

impl FromStr for Field {
  type Err = Error;

  fn from_str(input: &str) -> Result<Self> {
    Ok(match input.trim().to_lowercase().as_str() {
      "name" => Field::Name,
      "age" => Field::Age,
      "height" => Field::Height,
      "weight" => Field::Weight,
      "inventory" => Field::Inventory,
      "photo" => Field::Photo,
      "rank" => Field::Rank,
      "team" => Field::Team,
      "race" => Field::Race,
      _ => return Err(Error::UnknownField(input.trim().to_string())),
    })
  }
}

/// A single validated field update.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
  Name(String),
  Age(i32),
  Height(f64),
  Weight(f64),
  Inventory(String),
  Photo(String),
  Rank(String),
  Team(String),
  Race(String),
}

impl Edit {
  pub fn parse(field: &str, value: &str) -> Result<Self> {
    let field: Field = field.parse()?;
    let invalid =
      || Error::InvalidFieldValue { field: field.name(), value: value.into() };

    Ok(match field {
      Field::Name => Edit::Name(value.into()),
      Field::Age => Edit::Age(profile::parse_age(value).ok_or_else(invalid)?),
      Field::Height => {
        Edit::Height(profile::parse_measure(value).ok_or_else(invalid)?)
      }
      Field::Weight => {
        Edit::Weight(profile::parse_measure(value).ok_or_else(invalid)?)
      }
      Field::Inventory => Edit::Inventory(value.into()),
      Field::Photo => Edit::Photo(value.into()),
      Field::Rank => Edit::Rank(value.into()),
      Field::Team => Edit::Team(value.into()),
      Field::Race => Edit::Race(value.into()),
    })
  }

  pub fn field(&self) -> Field {
    match self {
      Edit::Name(_) => Field::Name,
      Edit::Age(_) => Field::Age,
      Edit::Height(_) => Field::Height,
      Edit::Weight(_) => Field::Weight,
      Edit::Inventory(_) => Field::Inventory,
      Edit::Photo(_) => Field::Photo,
      Edit::Rank(_) => Field::Rank,
      Edit::Team(_) => Field::Team,
      Edit::Race(_) => Field::Race,
    }
  }

  fn apply(self, model: &mut profile::ActiveModel) {
    match self {
      Edit::Name(v) => model.name = Set(v),
      Edit::Age(v) => model.age = Set(v),
      Edit::Height(v) => model.height = Set(v),
      Edit::Weight(v) => model.weight = Set(v),
      Edit::Inventory(v) => model.inventory = Set(v),
      Edit::Photo(v) => model.photo = Set(v),
      Edit::Rank(v) => model.rank = Set(v),
      Edit::Team(v) => model.team = Set(v),
      Edit::Race(v) => model.race = Set(v),
    }
  }
}

pub struct Profile<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Profile<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_chat(&self, chat_id: i64) -> Result<Option<profile::Model>> {
    let profile = profile::Entity::find()
      .filter(profile::Column::ChatId.eq(chat_id))
      .one(self.db)
      .await?;
    Ok(profile)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<profile::Model>> {
    Ok(profile::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<profile::Model>> {
    let profiles = profile::Entity::find()
      .order_by_asc(profile::Column::Id)
      .all(self.db)
      .await?;
    Ok(profiles)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(profile::Entity::find().count(self.db).await?)
  }

  /// Create-or-update keyed by chat. An existing record keeps its id,
  /// balances and attendance.
  pub async fn save(&self, draft: &Draft) -> Result<profile::Model> {
    let txn = self.db.begin().await?;

    let existing = profile::Entity::find()
      .filter(profile::Column::ChatId.eq(draft.chat_id))
      .one(&txn)
      .await?;

    let profile = match existing {
      Some(existing) => {
        let mut model: profile::ActiveModel = existing.into();
        draft.fill(&mut model);
        model.update(&txn).await?
      }
      None => {
        let mut model = profile::ActiveModel {
          id: NotSet,
          chat_id: Set(draft.chat_id),
          piastres: Set(0),
          oblomki: Set(0),
          attendance: Set(0),
          ..Default::default()
        };
        draft.fill(&mut model);
        model.insert(&txn).await?
      }
    };

    txn.commit().await?;
    Ok(profile)
  }

  pub async fn delete_by_chat(&self, chat_id: i64) -> Result<()> {
    let result = profile::Entity::delete_many()
      .filter(profile::Column::ChatId.eq(chat_id))
      .exec(self.db)
      .await?;

    if result.rows_affected == 0 {
      return Err(Error::ProfileNotFound);
    }
    Ok(())
  }

  pub async fn delete_by_id(&self, id: i32) -> Result<()> {
    let result = profile::Entity::delete_by_id(id).exec(self.db).await?;

    if result.rows_affected == 0 {
      return Err(Error::ProfileNotFound);
    }
    Ok(())
  }

  pub async fn edit(&self, id: i32, edit: Edit) -> Result<profile::Model> {
    let profile = self.by_id(id).await?.ok_or(Error::ProfileNotFound)?;

    let mut model: profile::ActiveModel = profile.into();
    edit.apply(&mut model);

    Ok(model.update(self.db).await?)
  }

  /// Shifts a balance by `delta`, saturating at zero.
  pub async fn adjust(
    &self,
    id: i32,
    currency: Currency,
    delta: i64,
  ) -> Result<profile::Model> {
    let txn = self.db.begin().await?;

    let profile = profile::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::ProfileNotFound)?;

    let balance = profile::shift(profile.balance(currency), delta);
    let mut model: profile::ActiveModel = profile.into();
    model.set_balance(currency, balance);
    let profile = model.update(&txn).await?;

    txn.commit().await?;
    Ok(profile)
  }

  /// Richest first; ties keep registration order.
  pub async fn ranking(&self, currency: Currency) -> Result<Vec<profile::Model>> {
    let profiles = profile::Entity::find()
      .order_by_desc(currency.column())
      .order_by_asc(profile::Column::Id)
      .all(self.db)
      .await?;
    Ok(profiles)
  }
}
