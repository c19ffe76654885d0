pub use sea_orm_migration::prelude::*;

mod m20240301_000001_auth_rbac;
mod m20240301_000002_catalog;
mod m20240301_000003_reviews;

pub struct Migrator;
#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_auth_rbac::Migration),
            Box::new(m20240301_000002_catalog::Migration),
            Box::new(m20240301_000003_reviews::Migration),
        ]
    }
}
