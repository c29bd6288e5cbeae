//! The company aggregate: persistence of the company tree, the status state
//! machine, the draft clone, and the read side used by the HTTP layer.

pub mod draft;
pub mod query;
pub mod status;
pub mod write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::CompanyStatus;

pub use draft::{clone_as_draft, CompanyTree};
pub use query::{delete_draft, get_company, get_draft, list_companies, reference_list, ListFilter, StatusFilter};
pub use status::{change_status, StatusChange, TransitionOutcome};
pub use write::{create_company, save_draft};

/// `{id, name}` projection of a lookup row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}

macro_rules! named_ref_from {
    ($($entity:ident),+ $(,)?) => {
        $(
            impl From<crate::entities::$entity::Model> for NamedRef {
                fn from(model: crate::entities::$entity::Model) -> Self {
                    NamedRef { id: model.id, name: model.name }
                }
            }
        )+
    };
}

named_ref_from!(industry, competitor, deal_type, ceo_education, investor);

/// Body of `POST /companies` and `POST /companies/draft`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPayload {
    /// Existing draft to update (draft endpoint) or submit (create endpoint).
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    pub former_name: Option<String>,
    pub year_founded: Option<i32>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub pitchbook_url: Option<String>,
    pub first_financing_date: Option<DateTime<Utc>>,
    pub first_financing_deal_type: Option<i32>,
    pub comment: Option<String>,
    pub decision_threshold: Option<f64>,
    pub progress_bar: Option<f64>,
    pub pb_id: Option<String>,
    /// Industry ids; must exist.
    #[serde(default)]
    pub industries: Vec<i32>,
    /// Competitor names; unknown names are created.
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub rounds: Vec<RoundPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoundPayload {
    pub name: Option<String>,
    pub deal_type_id: Option<i32>,
    pub date: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub sub_rounds: Vec<SubRoundPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubRoundPayload {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub investors: Vec<InvestorPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestorPayload {
    pub name: String,
    #[serde(default)]
    pub lead: bool,
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub corporate: bool,
}

/// Row of the company list.
#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    pub name: String,
    pub status: CompanyStatus,
    pub progress_bar: Option<f64>,
    pub total_score: Option<f64>,
    pub decision_threshold: Option<f64>,
    pub industries: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full company as returned by `GET /companies/{id}` and the draft endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetail {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    pub status: CompanyStatus,
    pub progress_bar: Option<f64>,
    pub name: String,
    pub former_name: Option<String>,
    pub year_founded: Option<i32>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub pitchbook_url: Option<String>,
    pub first_financing_date: Option<String>,
    pub first_financing_deal_type: Option<NamedRef>,
    pub number_competitors: i32,
    pub comment: Option<String>,
    pub decision_threshold: Option<f64>,
    pub total_score: Option<f64>,
    pub pb_id: Option<String>,
    pub is_active: bool,
    pub user_id: Option<i32>,
    pub dashboard_id: Option<i32>,
    pub industries: Vec<NamedRef>,
    pub competitors: Vec<NamedRef>,
    pub rounds: Vec<RoundView>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundView {
    pub id: i32,
    pub name: Option<String>,
    pub deal_type_id: Option<i32>,
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub sub_rounds: Vec<SubRoundView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubRoundView {
    pub id: i32,
    pub name: Option<String>,
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub investors: Vec<InvestorLinkView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestorLinkView {
    pub id: i32,
    pub name: String,
    pub lead: bool,
    pub new: bool,
    pub corporate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusHistoryEntry {
    pub status: CompanyStatus,
    pub created_at: String,
}

/// Dates in responses use `YYYY-MM-DD HH:MM:SS`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}
