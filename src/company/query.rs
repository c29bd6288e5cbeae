use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};

use super::draft::CompanyTree;
use super::write::delete_company_rows;
use super::{
    format_date, CompanyDetail, CompanySummary, InvestorLinkView, NamedRef, RoundView, StatusHistoryEntry,
    SubRoundView,
};
use crate::entities::{
    company, company_industry, company_status_history, Company, CompanyIndustry, CompanyStatus,
    CompanyStatusHistory, Competitor, DealType, Industry, Investor,
};
use crate::error::AppError;

const LIKE_ESCAPE: char = '\\';

fn escape_like(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match for a lowercased column; `%` and `_` in
/// `name` match themselves.
pub(crate) fn name_contains(name: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(name))).escape(LIKE_ESCAPE)
}

/// Status values accepted by the company list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Only(CompanyStatus),
    /// `closed,rejected`: finished evaluations of either outcome.
    ClosedOrRejected,
}

impl StatusFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let raw = match raw.map(str::trim) {
            Some(value) if !value.is_empty() => value.to_ascii_lowercase(),
            _ => return Err(AppError::Validation("status is required".to_string())),
        };
        match raw.as_str() {
            "draft" => Ok(StatusFilter::Only(CompanyStatus::Draft)),
            "in_progress" => Ok(StatusFilter::Only(CompanyStatus::InProgress)),
            "closed" => Ok(StatusFilter::Only(CompanyStatus::Closed)),
            "rejected" => Ok(StatusFilter::Only(CompanyStatus::Rejected)),
            "closed,rejected" => Ok(StatusFilter::ClosedOrRejected),
            _ => Err(AppError::Validation(
                "status should be draft, in_progress, closed, or rejected".to_string(),
            )),
        }
    }

    fn statuses(&self) -> Vec<CompanyStatus> {
        match self {
            StatusFilter::Only(status) => vec![*status],
            StatusFilter::ClosedOrRejected => vec![CompanyStatus::Closed, CompanyStatus::Rejected],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListFilter {
    pub name: Option<String>,
    pub status: StatusFilter,
    pub offset: u64,
    pub limit: u64,
}

/// One page of active companies, newest first, plus the total match count.
#[tracing::instrument(skip(db))]
pub async fn list_companies(
    db: &DatabaseConnection,
    filter: &ListFilter,
) -> Result<(Vec<CompanySummary>, u64), AppError> {
    let mut select = Company::find()
        .filter(company::Column::IsActive.eq(true))
        .filter(company::Column::Status.is_in(filter.status.statuses()));

    if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        select = select.filter(Expr::expr(Func::lower(Expr::col(company::Column::Name))).like(name_contains(name)));
    }

    let total = select.clone().count(db).await?;
    let companies = select
        .order_by_desc(company::Column::Id)
        .offset(filter.offset)
        .limit(filter.limit)
        .all(db)
        .await?;

    let ids: Vec<i32> = companies.iter().map(|c| c.id).collect();
    let mut industries_by_company: HashMap<i32, Vec<String>> = HashMap::new();
    if !ids.is_empty() {
        let links = CompanyIndustry::find()
            .filter(company_industry::Column::CompanyId.is_in(ids))
            .order_by_asc(company_industry::Column::Id)
            .all(db)
            .await?;
        let names = industry_names(db, links.iter().map(|l| l.industry_id).collect()).await?;
        for link in links {
            if let Some(name) = names.get(&link.industry_id) {
                industries_by_company.entry(link.company_id).or_default().push(name.clone());
            }
        }
    }

    let results = companies
        .into_iter()
        .map(|c| CompanySummary {
            industries: industries_by_company.remove(&c.id).unwrap_or_default(),
            id: c.id,
            uuid: c.uuid,
            name: c.name,
            status: c.status,
            progress_bar: c.progress_bar,
            total_score: c.total_score,
            decision_threshold: c.decision_threshold,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
        .collect();

    Ok((results, total))
}

async fn industry_names<C: ConnectionTrait>(conn: &C, ids: Vec<i32>) -> Result<HashMap<i32, String>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(Industry::find()
        .filter(crate::entities::industry::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect())
}

/// Loads the full company view: tags, deal type, rounds with investor links, and status history.
pub(crate) async fn build_detail<C: ConnectionTrait>(conn: &C, company_id: i32) -> Result<CompanyDetail, AppError> {
    let company = Company::find_by_id(company_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    let tree = CompanyTree::load(conn, company).await?;

    let industry_lookup = industry_names(conn, tree.industry_ids.clone()).await?;
    let industries = tree
        .industry_ids
        .iter()
        .filter_map(|id| industry_lookup.get(id).map(|name| NamedRef { id: *id, name: name.clone() }))
        .collect();

    let competitor_lookup: HashMap<i32, String> = if tree.competitor_ids.is_empty() {
        HashMap::new()
    } else {
        Competitor::find()
            .filter(crate::entities::competitor::Column::Id.is_in(tree.competitor_ids.clone()))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    };
    let competitors = tree
        .competitor_ids
        .iter()
        .filter_map(|id| competitor_lookup.get(id).map(|name| NamedRef { id: *id, name: name.clone() }))
        .collect();

    let deal_type = match tree.company.first_financing_deal_type {
        Some(id) => DealType::find_by_id(id).one(conn).await?.map(NamedRef::from),
        None => None,
    };

    let investor_ids: Vec<i32> = tree
        .rounds
        .iter()
        .flat_map(|r| r.sub_rounds.iter())
        .flat_map(|s| s.investors.iter().map(|l| l.investor_id))
        .collect();
    let investor_lookup: HashMap<i32, String> = if investor_ids.is_empty() {
        HashMap::new()
    } else {
        Investor::find()
            .filter(crate::entities::investor::Column::Id.is_in(investor_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|i| (i.id, i.name))
            .collect()
    };

    let rounds = tree
        .rounds
        .iter()
        .map(|r| RoundView {
            id: r.round.id,
            name: r.round.name.clone(),
            deal_type_id: r.round.deal_type_id,
            date: r.round.date.as_ref().map(format_date),
            amount: r.round.amount,
            sub_rounds: r
                .sub_rounds
                .iter()
                .map(|s| SubRoundView {
                    id: s.sub_round.id,
                    name: s.sub_round.name.clone(),
                    date: s.sub_round.date.as_ref().map(format_date),
                    amount: s.sub_round.amount,
                    investors: s
                        .investors
                        .iter()
                        .map(|l| InvestorLinkView {
                            id: l.investor_id,
                            name: investor_lookup.get(&l.investor_id).cloned().unwrap_or_default(),
                            lead: l.lead,
                            new: l.new,
                            corporate: l.corporate,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    let status_history = CompanyStatusHistory::find()
        .filter(company_status_history::Column::CompanyId.eq(tree.company.id))
        .order_by_desc(company_status_history::Column::CreatedAt)
        .order_by_desc(company_status_history::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|h| StatusHistoryEntry { status: h.status, created_at: format_date(&h.created_at) })
        .collect();

    let c = tree.company;
    Ok(CompanyDetail {
        id: c.id,
        uuid: c.uuid,
        status: c.status,
        progress_bar: c.progress_bar,
        name: c.name,
        former_name: c.former_name,
        year_founded: c.year_founded,
        bio: c.bio,
        website_url: c.website_url,
        pitchbook_url: c.pitchbook_url,
        first_financing_date: c.first_financing_date.as_ref().map(format_date),
        first_financing_deal_type: deal_type,
        number_competitors: c.number_competitors,
        comment: c.comment,
        decision_threshold: c.decision_threshold,
        total_score: c.total_score,
        pb_id: c.pb_id,
        is_active: c.is_active,
        user_id: c.user_id,
        dashboard_id: c.dashboard_id,
        industries,
        competitors,
        rounds,
        status_history,
        created_at: format_date(&c.created_at),
        updated_at: format_date(&c.updated_at),
    })
}

pub async fn get_company(db: &DatabaseConnection, id: i32) -> Result<CompanyDetail, AppError> {
    build_detail(db, id).await
}

/// Like [`get_company`], but only for drafts.
pub async fn get_draft(db: &DatabaseConnection, id: i32) -> Result<CompanyDetail, AppError> {
    let detail = build_detail(db, id).await?;
    if detail.status != CompanyStatus::Draft {
        return Err(AppError::NotFound("company status should be draft".to_string()));
    }
    Ok(detail)
}

/// Deletes a draft and everything it owns. Other statuses are refused.
#[tracing::instrument(skip(db))]
pub async fn delete_draft(db: &DatabaseConnection, id: i32) -> Result<i32, AppError> {
    let txn = db.begin().await?;
    let company = Company::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    if company.status != CompanyStatus::Draft {
        return Err(AppError::NotFound("only draft companies can be deleted".to_string()));
    }

    delete_company_rows(&txn, id).await?;
    txn.commit().await?;
    tracing::info!(company_id = id, "Draft deleted");
    Ok(id)
}

/// `{id, name}` rows of a lookup table, ordered by id.
pub async fn reference_list<E>(db: &DatabaseConnection) -> Result<Vec<NamedRef>, AppError>
where
    E: EntityTrait,
    E::Model: Into<NamedRef>,
{
    let mut rows: Vec<NamedRef> = E::find().all(db).await?.into_iter().map(Into::into).collect();
    rows.sort_by_key(|r| r.id);
    Ok(rows)
}
