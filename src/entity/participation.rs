use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{event, profile};

/// A row means the chat has claimed the event reward. Unique per pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_participation")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub event_id: i32,
  pub chat_id: i64,
  /// Balance change the claim actually applied, reverted on unclaim
  pub delta: i64,
  pub joined_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "event::Entity",
    from = "Column::EventId",
    to = "event::Column::Id"
  )]
  Event,
  #[sea_orm(
    belongs_to = "profile::Entity",
    from = "Column::ChatId",
    to = "profile::Column::ChatId"
  )]
  Profile,
}

impl Related<event::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Event.def()
  }
}

impl Related<profile::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Profile.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
