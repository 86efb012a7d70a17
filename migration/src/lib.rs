pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_profiles;
mod m20260301_000002_create_events;
mod m20260301_000003_create_event_participation;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_profiles::Migration),
      Box::new(m20260301_000002_create_events::Migration),
      Box::new(m20260301_000003_create_event_participation::Migration),
    ]
  }
}
