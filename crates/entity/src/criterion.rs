use sea_orm::entity::prelude::*;

/// A rating dimension. `weight` scales its share of a review's integral rating.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "criterion")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub weight: f64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    CriterionCategory,
    ReviewRating,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::CriterionCategory => Entity::has_many(super::criterion_category::Entity).into(),
            Self::ReviewRating => Entity::has_many(super::review_rating::Entity).into(),
        }
    }
}

impl Related<super::criterion_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CriterionCategory.def()
    }
}

impl Related<super::review_rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewRating.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::criterion_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::criterion_category::Relation::Criterion.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
