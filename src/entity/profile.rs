use sea_orm::{Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

use super::{Currency, participation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  /// Telegram chat of the profile owner
  #[sea_orm(unique)]
  pub chat_id: i64,
  /// Telegram username, shown to admins only
  pub username: String,
  pub name: String,
  pub age: i32,
  pub height: f64,
  pub weight: f64,
  pub inventory: String,
  /// Telegram file id of the character photo, empty when absent
  pub photo: String,
  pub rank: String,
  pub team: String,
  pub race: String,
  pub piastres: i64,
  pub oblomki: i64,
  /// Number of event rewards currently held
  pub attendance: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "participation::Entity")]
  Participation,
}

impl Related<participation::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Participation.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn balance(&self, currency: Currency) -> i64 {
    match currency {
      Currency::Piastres => self.piastres,
      Currency::Oblomki => self.oblomki,
    }
  }

  pub fn is_registered(&self) -> bool {
    !self.name.is_empty()
  }
}

impl ActiveModel {
  pub fn set_balance(&mut self, currency: Currency, value: i64) {
    match currency {
      Currency::Piastres => self.piastres = Set(value),
      Currency::Oblomki => self.oblomki = Set(value),
    }
  }
}

impl Currency {
  pub fn column(self) -> Column {
    match self {
      Currency::Piastres => Column::Piastres,
      Currency::Oblomki => Column::Oblomki,
    }
  }
}

/// Applies a signed delta to a balance, saturating at zero.
pub fn shift(balance: i64, delta: i64) -> i64 {
  balance.saturating_add(delta).max(0)
}

pub fn parse_age(input: &str) -> Option<i32> {
  input.trim().parse::<i32>().ok().filter(|age| *age >= 0)
}

/// Height and weight are unit-less, but must be finite.
pub fn parse_measure(input: &str) -> Option<f64> {
  input.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}
