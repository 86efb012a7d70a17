use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Profiles::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Profiles::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Profiles::ChatId)
              .big_integer()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Profiles::Username).string().not_null().default(""))
          .col(ColumnDef::new(Profiles::Name).string().not_null().default(""))
          .col(ColumnDef::new(Profiles::Age).integer().not_null().default(0))
          .col(ColumnDef::new(Profiles::Height).double().not_null().default(0.0))
          .col(ColumnDef::new(Profiles::Weight).double().not_null().default(0.0))
          .col(ColumnDef::new(Profiles::Inventory).string().not_null().default(""))
          .col(ColumnDef::new(Profiles::Photo).string().not_null().default(""))
          .col(ColumnDef::new(Profiles::Rank).string().not_null().default(""))
          .col(ColumnDef::new(Profiles::Team).string().not_null().default(""))
          .col(ColumnDef::new(Profiles::Race).string().not_null().default(""))
          .col(
            ColumnDef::new(Profiles::Piastres)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Profiles::Oblomki)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Profiles::Attendance)
              .integer()
              .not_null()
              .default(0),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Profiles::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Profiles {
  Table,
  Id,
  ChatId,
  Username,
  Name,
  Age,
  Height,
  Weight,
  Inventory,
  Photo,
  Rank,
  Team,
  Race,
  Piastres,
  Oblomki,
  Attendance,
}
