use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Lifecycle status of a company evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "calculating")]
    Calculating,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Draft => "draft",
            CompanyStatus::Calculating => "calculating",
            CompanyStatus::Rejected => "rejected",
            CompanyStatus::Closed => "closed",
            CompanyStatus::InProgress => "in_progress",
        }
    }

    /// Parses a status name, ignoring ASCII case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(CompanyStatus::Draft),
            "calculating" => Some(CompanyStatus::Calculating),
            "rejected" => Some(CompanyStatus::Rejected),
            "closed" => Some(CompanyStatus::Closed),
            "in_progress" => Some(CompanyStatus::InProgress),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub uuid: Option<Uuid>,
    pub status: CompanyStatus,
    pub progress_bar: Option<f64>, // 0.1 ..= 1.0
    pub name: String,
    pub former_name: Option<String>,
    pub year_founded: Option<i32>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub pitchbook_url: Option<String>,
    pub first_financing_date: Option<DateTime<Utc>>,
    pub first_financing_deal_type: Option<i32>,
    // Derived from company_competitor, rewritten with every competitor change
    pub number_competitors: i32,
    pub comment: Option<String>,
    pub decision_threshold: Option<f64>,
    pub total_score: Option<f64>,
    pub pb_id: Option<String>,
    pub is_active: bool,
    pub user_id: Option<i32>,
    pub dashboard_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::round::Entity")]
    Rounds,
    #[sea_orm(has_many = "super::company_status_history::Entity")]
    StatusHistory,
    #[sea_orm(
        belongs_to = "super::deal_type::Entity",
        from = "Column::FirstFinancingDealType",
        to = "super::deal_type::Column::Id"
    )]
    DealType,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::round::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rounds.def()
    }
}

impl Related<super::company_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl Related<super::deal_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DealType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
