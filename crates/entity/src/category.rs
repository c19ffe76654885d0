use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Product,
    CriterionCategory,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Product => Entity::has_many(super::product::Entity).into(),
            Self::CriterionCategory => Entity::has_many(super::criterion_category::Entity).into(),
        }
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::criterion_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CriterionCategory.def()
    }
}

impl Related<super::criterion::Entity> for Entity {
    fn to() -> RelationDef {
        super::criterion_category::Relation::Criterion.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::criterion_category::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
