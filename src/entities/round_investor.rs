use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Links an investor to a sub-round. The flags belong to the relationship,
/// not to the investor, and have to be copied explicitly when a sub-round is cloned.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "round_investors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub sub_round_id: i32,
    pub investor_id: i32,
    pub lead: bool,
    pub new: bool,
    pub corporate: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sub_round::Entity",
        from = "Column::SubRoundId",
        to = "super::sub_round::Column::Id"
    )]
    SubRound,
    #[sea_orm(
        belongs_to = "super::investor::Entity",
        from = "Column::InvestorId",
        to = "super::investor::Column::Id"
    )]
    Investor,
}

impl Related<super::sub_round::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubRound.def()
    }
}

impl Related<super::investor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Investor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
