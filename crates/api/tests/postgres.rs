//! Runs only when `TEST_DATABASE_URL` points at a Postgres server. A scratch
//! database is created per run and dropped afterwards.

use migration::{Migrator, MigratorTrait};
use review_api::{seed::seed_demo, service::analytics};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use url::Url;

struct PgTestContext {
    db: DatabaseConnection,
    admin_url: String,
    db_name: String,
}

impl PgTestContext {
    async fn new() -> Option<Self> {
        let base = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("skipping Postgres tests: TEST_DATABASE_URL not set");
                return None;
            }
        };
        let (admin_url, db_name, test_url) = build_urls(&base)?;
        let admin = Database::connect(&admin_url).await.ok()?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\";", db_name),
            ))
            .await
            .ok()?;
        let db = Database::connect(&test_url).await.ok()?;
        Migrator::up(&db, None).await.ok()?;
        Some(Self {
            db,
            admin_url,
            db_name,
        })
    }

    async fn cleanup(self) {
        let Self {
            db,
            admin_url,
            db_name,
        } = self;
        let _ = db.close().await;
        if let Ok(admin) = Database::connect(&admin_url).await {
            let _ = admin
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE);", db_name),
                ))
                .await;
        }
    }
}

fn build_urls(base: &str) -> Option<(String, String, String)> {
    let url = Url::parse(base).ok()?;
    let path = url.path().trim_start_matches('/');
    let prefix = if path.is_empty() { "review_test" } else { path };
    let db_name = format!("{}_{:08x}", prefix, rand::random::<u32>());
    let mut admin_url = url.clone();
    admin_url.set_path("/postgres");
    let mut test_url = url;
    test_url.set_path(&format!("/{}", db_name));
    Some((admin_url.to_string(), db_name, test_url.to_string()))
}

#[tokio::test]
async fn seeded_demo_aggregates_on_postgres() {
    let Some(ctx) = PgTestContext::new().await else {
        return;
    };
    let seeded = seed_demo(&ctx.db)
        .await
        .expect("seed")
        .expect("fresh database gets seeded");
    assert!(seeded.category_named("Kitchen").is_some());
    assert!(seed_demo(&ctx.db).await.expect("reseed").is_none());

    let kpis = analytics::kpis(&ctx.db).await.expect("kpis");
    assert_eq!(kpis.total_reviews, seeded.reviews as u64);
    assert_eq!(kpis.rated_reviews, kpis.active_reviews);
    let average = kpis.average_rating.expect("average present");
    assert!((1.0..=5.0).contains(&average));

    let top = analytics::top_products(&ctx.db, Some(3), Default::default(), None)
        .await
        .expect("top products");
    assert_eq!(top.len(), 3);
    assert!(top[0].average_rating >= top[2].average_rating);

    let criteria = analytics::criterion_averages(&ctx.db, None)
        .await
        .expect("criteria");
    assert_eq!(criteria.len(), seeded.criteria.len());

    let trend = analytics::monthly_trend(&ctx.db, None, None)
        .await
        .expect("trend");
    assert_eq!(trend.len(), 12);

    ctx.cleanup().await;
}
