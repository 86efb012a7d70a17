use sea_orm_migration::prelude::*;

use super::m20260301_000002_create_events::Events;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(EventParticipation::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(EventParticipation::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(EventParticipation::EventId).integer().not_null())
          .col(
            ColumnDef::new(EventParticipation::ChatId).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(EventParticipation::Delta)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(EventParticipation::JoinedAt).date_time().not_null(),
          )
          // no FK to profiles: a claim outlives the profile that made it
          .foreign_key(
            ForeignKey::create()
              .name("fk_event_participation_event")
              .from(EventParticipation::Table, EventParticipation::EventId)
              .to(Events::Table, Events::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_event_participation_unique")
          .table(EventParticipation::Table)
          .col(EventParticipation::EventId)
          .col(EventParticipation::ChatId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(EventParticipation::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum EventParticipation {
  Table,
  Id,
  EventId,
  ChatId,
  Delta,
  JoinedAt,
}
