//! Demo dataset for local runs and smoke tests.

use chrono::{Duration, Utc};
use entity::{category, role::RoleName, user};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, TransactionTrait};
use tracing::info;

use crate::{
    dto::{
        CategoryDto, CategoryRequest, CreateReviewRequest, CriterionDto, CriterionRequest,
        ProductDto, ProductRequest, RatingInput,
    },
    error::ApiResult,
    service::{catalog, reviews, users},
};

pub const DEMO_ADMIN_EMAIL: &str = "admin@reviews.test";
pub const DEMO_ANALYST_EMAIL: &str = "analyst@reviews.test";
pub const DEMO_PASSWORD: &str = "changeme123";

const CATEGORIES: &[&str] = &["Headphones", "Kitchen", "Laptops"];

const CRITERIA: &[(&str, f64, &[usize])] = &[
    ("Build quality", 2.0, &[0, 1, 2]),
    ("Value for money", 1.5, &[0, 1, 2]),
    ("Sound", 3.0, &[0]),
    ("Ease of cleaning", 1.0, &[1]),
    ("Performance", 2.5, &[2]),
    ("Battery life", 1.5, &[0, 2]),
];

const PRODUCTS: &[(&str, &str, usize)] = &[
    ("Studio Monitor X", "Auralis", 0),
    ("Commuter Buds", "Auralis", 0),
    ("Bass Cannon 900", "Thump", 0),
    ("Pro Kettle", "Hearthware", 1),
    ("Compact Blender", "Hearthware", 1),
    ("Air Fryer Max", "Crispo", 1),
    ("Ultrabook 14", "Nimbus", 2),
    ("Workstation 16", "Nimbus", 2),
    ("Budget Book", "Lumen", 2),
];

const REVIEWS_PER_PRODUCT: usize = 8;

#[derive(Debug, Default)]
pub struct SeededRecords {
    pub users: Vec<user::Model>,
    pub categories: Vec<CategoryDto>,
    pub criteria: Vec<CriterionDto>,
    pub products: Vec<ProductDto>,
    pub reviews: usize,
}

impl SeededRecords {
    pub fn user_email(&self, email: &str) -> Option<&user::Model> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn category_named(&self, name: &str) -> Option<&CategoryDto> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn product_named(&self, name: &str) -> Option<&ProductDto> {
        self.products.iter().find(|p| p.name == name)
    }
}

/// Inserts the demo dataset. Returns `None` when the catalog already has data.
pub async fn seed_demo(db: &DatabaseConnection) -> ApiResult<Option<SeededRecords>> {
    if category::Entity::find().count(db).await? > 0 {
        info!("catalog already populated, skipping demo seed");
        return Ok(None);
    }
    users::ensure_roles(db).await?;

    let mut seeded = SeededRecords::default();
    for (email, name, role) in [
        (DEMO_ADMIN_EMAIL, "Ada Admin", RoleName::Admin),
        (DEMO_ANALYST_EMAIL, "Alan Analyst", RoleName::Analyst),
    ] {
        let exists = users::list_users(db, Some(email))
            .await?
            .iter()
            .any(|u| u.email == email);
        if exists {
            continue;
        }
        let txn = db.begin().await?;
        let created = users::create_user(&txn, name, email, DEMO_PASSWORD, &[role]).await?;
        txn.commit().await?;
        seeded.users.push(created);
    }

    for name in CATEGORIES {
        let created = catalog::create_category(
            db,
            CategoryRequest {
                name: (*name).to_string(),
            },
        )
        .await?;
        seeded.categories.push(created);
    }

    for (name, weight, category_indexes) in CRITERIA {
        let category_ids = category_indexes
            .iter()
            .filter_map(|i| seeded.categories.get(*i).map(|c| c.id))
            .collect();
        let created = catalog::create_criterion(
            db,
            CriterionRequest {
                name: (*name).to_string(),
                weight: *weight,
                category_ids,
            },
        )
        .await?;
        seeded.criteria.push(created);
    }

    for (name, brand, category_index) in PRODUCTS {
        let Some(category) = seeded.categories.get(*category_index) else {
            continue;
        };
        let created = catalog::create_product(
            db,
            ProductRequest {
                name: (*name).to_string(),
                brand: (*brand).to_string(),
                description: Some(format!("{} by {}", name, brand)),
                category_id: category.id,
            },
        )
        .await?;
        seeded.products.push(created);
    }

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let now = Utc::now();
    for (index, product) in seeded.products.iter().enumerate() {
        let criteria: Vec<&CriterionDto> = seeded
            .criteria
            .iter()
            .filter(|c| c.category_ids.contains(&product.category_id))
            .collect();
        // Each product leans towards its own baseline so rankings differ.
        let baseline = 2 + (index % 3) as i32;
        for _ in 0..REVIEWS_PER_PRODUCT {
            let ratings = criteria
                .iter()
                .map(|c| RatingInput {
                    criterion_id: c.id,
                    rating: (baseline + rng.gen_range(-1..=2)).clamp(1, 5),
                })
                .collect();
            let age = Duration::days(rng.gen_range(0..330));
            reviews::create_review(
                db,
                CreateReviewRequest {
                    product_id: product.id,
                    date_created: Some(now - age),
                    ratings,
                },
            )
            .await?;
            seeded.reviews += 1;
        }
    }

    info!(
        users = seeded.users.len(),
        categories = seeded.categories.len(),
        criteria = seeded.criteria.len(),
        products = seeded.products.len(),
        reviews = seeded.reviews,
        "demo data seeded"
    );
    Ok(Some(seeded))
}
