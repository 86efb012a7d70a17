use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Events::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Events::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Events::Name).string().not_null())
          .col(ColumnDef::new(Events::Currency).string().not_null())
          .col(ColumnDef::new(Events::Amount).big_integer().not_null())
          .col(ColumnDef::new(Events::Active).boolean().not_null().default(true))
          .col(ColumnDef::new(Events::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Events::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Events {
  Table,
  Id,
  Name,
  Currency,
  Amount,
  Active,
  CreatedAt,
}
