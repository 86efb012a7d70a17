use std::{fmt, str::FromStr};

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::participation;
use crate::error::Error;

/// Ledger field an event pays into
#[derive(
  Clone,
  Copy,
  Debug,
  PartialEq,
  Eq,
  Hash,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Currency {
  #[sea_orm(string_value = "piastres")]
  Piastres,
  #[sea_orm(string_value = "oblomki")]
  Oblomki,
}

impl FromStr for Currency {
  type Err = Error;

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    match input.trim().to_lowercase().as_str() {
      "piastres" | "пиастры" => Ok(Currency::Piastres),
      "oblomki" | "обломки" => Ok(Currency::Oblomki),
      _ => Err(Error::InvalidCurrency(input.trim().to_string())),
    }
  }
}

impl fmt::Display for Currency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Currency::Piastres => "piastres",
      Currency::Oblomki => "oblomki",
    })
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  pub currency: Currency,
  /// Signed delta applied on claim and reverted on unclaim
  pub amount: i64,
  pub active: bool,
  pub created_at: DateTime,
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
