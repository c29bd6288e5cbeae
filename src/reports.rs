//! Inference reports written by the ML service into `dashboards`.
//!
//! A report belongs to one company row. Because a revert-to-draft produces a
//! new row, successive reports of the same company are linked by lineage:
//! the company `uuid` when it has one, otherwise its name (case-insensitive).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::company::format_date;
use crate::company::query::name_contains;
use crate::entities::{company, dashboard, Company, CompanyStatus, Dashboard};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub id: i32,
    pub company_id: i32,
    pub company_name: String,
    pub total_score: Option<f64>,
    pub decision_threshold: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportCompany {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    pub name: String,
    pub status: CompanyStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDetail {
    pub id: i32,
    pub total_score: Option<f64>,
    pub decision_threshold: Option<f64>,
    pub features: Value,
    pub created_at: String,
    pub company: ReportCompany,
}

/// Feature-level comparison of two reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureDiff {
    /// `current - previous` for features numeric in both.
    pub deltas: BTreeMap<String, f64>,
    pub changed: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDifference {
    pub id: i32,
    pub previous_id: i32,
    pub company_id: i32,
    pub previous_company_id: i32,
    pub total_score: Option<f64>,
    pub decision_threshold: Option<f64>,
    pub features: FeatureDiff,
}

/// Reports newest first, optionally narrowed to companies whose name contains `name`.
#[tracing::instrument(skip(db))]
pub async fn history(
    db: &DatabaseConnection,
    name: Option<&str>,
    offset: u64,
    limit: u64,
) -> Result<(Vec<ReportSummary>, u64), AppError> {
    let mut select = Dashboard::find().join(sea_orm::JoinType::InnerJoin, dashboard::Relation::Company.def());
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col((company::Entity, company::Column::Name)))).like(name_contains(name)),
        );
    }

    let total = select.clone().count(db).await?;
    let reports = select
        .order_by_desc(dashboard::Column::CreatedAt)
        .order_by_desc(dashboard::Column::Id)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    let company_ids: Vec<i32> = reports.iter().map(|r| r.company_id).collect();
    let names: HashMap<i32, String> = if company_ids.is_empty() {
        HashMap::new()
    } else {
        Company::find()
            .filter(company::Column::Id.is_in(company_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    };

    let results = reports
        .into_iter()
        .map(|r| ReportSummary {
            id: r.id,
            company_name: names.get(&r.company_id).cloned().unwrap_or_default(),
            company_id: r.company_id,
            total_score: r.total_score,
            decision_threshold: r.decision_threshold,
            created_at: format_date(&r.created_at),
        })
        .collect();

    Ok((results, total))
}

async fn find_report(db: &DatabaseConnection, id: i32) -> Result<(dashboard::Model, company::Model), AppError> {
    let (report, company) = Dashboard::find_by_id(id)
        .find_also_related(Company)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;
    let company = company.ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    Ok((report, company))
}

pub async fn report(db: &DatabaseConnection, id: i32) -> Result<ReportDetail, AppError> {
    let (report, company) = find_report(db, id).await?;
    Ok(ReportDetail {
        id: report.id,
        total_score: report.total_score,
        decision_threshold: report.decision_threshold,
        features: report.features.unwrap_or(Value::Null),
        created_at: format_date(&report.created_at),
        company: ReportCompany { id: company.id, uuid: company.uuid, name: company.name, status: company.status },
    })
}

/// Compares report `id` with the latest earlier report of the same company lineage.
#[tracing::instrument(skip(db))]
pub async fn difference(db: &DatabaseConnection, id: i32) -> Result<ReportDifference, AppError> {
    let (current, company) = find_report(db, id).await?;

    let lineage = match company.uuid {
        Some(uuid) => Company::find().filter(company::Column::Uuid.eq(uuid)),
        None => Company::find()
            .filter(Expr::expr(Func::lower(Expr::col(company::Column::Name))).eq(company.name.to_lowercase())),
    };
    let lineage_ids: Vec<i32> = lineage.all(db).await?.into_iter().map(|c| c.id).collect();

    let previous = Dashboard::find()
        .filter(dashboard::Column::CompanyId.is_in(lineage_ids))
        .filter(
            Condition::any()
                .add(dashboard::Column::CreatedAt.lt(current.created_at))
                .add(
                    Condition::all()
                        .add(dashboard::Column::CreatedAt.eq(current.created_at))
                        .add(dashboard::Column::Id.lt(current.id)),
                ),
        )
        .order_by_desc(dashboard::Column::CreatedAt)
        .order_by_desc(dashboard::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No previous report for {}", company.name)))?;

    let empty = Value::Null;
    let features = diff_features(
        current.features.as_ref().unwrap_or(&empty),
        previous.features.as_ref().unwrap_or(&empty),
    );

    Ok(ReportDifference {
        id: current.id,
        previous_id: previous.id,
        company_id: current.company_id,
        previous_company_id: previous.company_id,
        total_score: delta(current.total_score, previous.total_score),
        decision_threshold: delta(current.decision_threshold, previous.decision_threshold),
        features,
    })
}

fn delta(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    Some(current? - previous?)
}

/// Key-wise comparison of two feature objects. Non-objects count as empty.
pub fn diff_features(current: &Value, previous: &Value) -> FeatureDiff {
    let empty = serde_json::Map::new();
    let current = current.as_object().unwrap_or(&empty);
    let previous = previous.as_object().unwrap_or(&empty);

    let keys: BTreeSet<&String> = current.keys().chain(previous.keys()).collect();
    let mut diff = FeatureDiff::default();
    for key in keys {
        match (current.get(key), previous.get(key)) {
            (Some(now), Some(before)) => {
                if let (Some(a), Some(b)) = (now.as_f64(), before.as_f64()) {
                    diff.deltas.insert(key.clone(), a - b);
                }
                if now != before {
                    diff.changed.push(key.clone());
                }
            }
            (Some(_), None) => diff.added.push(key.clone()),
            (None, Some(_)) => diff.removed.push(key.clone()),
            (None, None) => {}
        }
    }
    diff
}
