use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Review {
    Table,
    Id,
    DateCreated,
    IntegralRating,
    Status,
    ProductId,
}

#[derive(DeriveIden)]
enum ReviewRating {
    Table,
    Id,
    ReviewId,
    CriterionId,
    Rating,
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Criterion {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Review::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Review::DateCreated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Review::IntegralRating).double())
                    .col(
                        ColumnDef::new(Review::Status)
                            .string_len(16)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Review::ProductId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_product")
                            .from(Review::Table, Review::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_product")
                    .table(Review::Table)
                    .col(Review::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_status_date")
                    .table(Review::Table)
                    .col(Review::Status)
                    .col(Review::DateCreated)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReviewRating::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReviewRating::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReviewRating::ReviewId).integer().not_null())
                    .col(
                        ColumnDef::new(ReviewRating::CriterionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReviewRating::Rating).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_rating_review")
                            .from(ReviewRating::Table, ReviewRating::ReviewId)
                            .to(Review::Table, Review::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_rating_criterion")
                            .from(ReviewRating::Table, ReviewRating::CriterionId)
                            .to(Criterion::Table, Criterion::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_rating_review_criterion")
                    .table(ReviewRating::Table)
                    .col(ReviewRating::ReviewId)
                    .col(ReviewRating::CriterionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_rating_criterion")
                    .table(ReviewRating::Table)
                    .col(ReviewRating::CriterionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReviewRating::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await?;
        Ok(())
    }
}
