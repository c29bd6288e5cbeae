use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};

use super::query::build_detail;
use super::status::record_status;
use super::{CompanyDetail, CompanyPayload};
use crate::entities::{
    company, company_competitor, company_industry, company_status_history, competitor, dashboard, deal_type,
    investor, round, round_investor, sub_round, Company, CompanyCompetitor, CompanyIndustry, CompanyStatus,
    CompanyStatusHistory, Competitor, Dashboard, DealType, Industry, Investor, Round, RoundInvestor, SubRound,
};
use crate::error::AppError;

pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!("{} must be at most {} characters", field, max)));
    }
    Ok(())
}

/// Checks everything that can be checked without the database.
pub fn validate_payload(payload: &CompanyPayload) -> Result<(), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    check_len("name", name, 100)?;
    if let Some(former_name) = &payload.former_name {
        check_len("former_name", former_name, 100)?;
    }
    if let Some(bio) = &payload.bio {
        check_len("bio", bio, 1000)?;
    }
    if let Some(comment) = &payload.comment {
        check_len("comment", comment, 500)?;
    }
    if let Some(pb_id) = &payload.pb_id {
        check_len("pb_id", pb_id, 100)?;
    }
    if let Some(progress) = payload.progress_bar {
        if !(0.1..=1.0).contains(&progress) {
            return Err(AppError::Validation("progress_bar must be between 0.1 and 1".to_string()));
        }
    }
    if let Some(year) = payload.year_founded {
        if year <= 0 {
            return Err(AppError::Validation("year_founded must be a positive year".to_string()));
        }
    }
    if payload.competitors.iter().any(|c| c.trim().is_empty()) {
        return Err(AppError::Validation("competitor names must not be empty".to_string()));
    }
    for round in &payload.rounds {
        if let Some(name) = &round.name {
            check_len("round name", name, 100)?;
        }
        for sub_round in &round.sub_rounds {
            if let Some(name) = &sub_round.name {
                check_len("sub round name", name, 100)?;
            }
            if sub_round.investors.iter().any(|i| i.name.trim().is_empty()) {
                return Err(AppError::Validation("investor names must not be empty".to_string()));
            }
        }
    }
    Ok(())
}

/// Creates a company for evaluation, or submits the draft named by `payload.id`.
#[tracing::instrument(skip(db, payload), fields(name = %payload.name, draft_id = ?payload.id))]
pub async fn create_company(
    db: &DatabaseConnection,
    payload: CompanyPayload,
    acting_user_id: i32,
) -> Result<CompanyDetail, AppError> {
    validate_payload(&payload)?;
    let txn = db.begin().await?;
    let now = Utc::now();

    let company_id = match payload.id {
        Some(id) => {
            let existing = load_draft_for_update(&txn, id).await?;
            let mut active: company::ActiveModel = existing.into();
            apply_payload(&mut active, &payload);
            active.status = Set(CompanyStatus::Calculating);
            active.updated_at = Set(now);
            active.update(&txn).await?;
            delete_children(&txn, id).await?;
            record_status(&txn, id, CompanyStatus::Calculating, now).await?;
            id
        }
        None => insert_company(&txn, &payload, CompanyStatus::Calculating, acting_user_id).await?,
    };

    write_children(&txn, company_id, &payload).await?;
    let detail = build_detail(&txn, company_id).await?;
    txn.commit().await?;

    tracing::info!(company_id, "Company submitted for evaluation");
    Ok(detail)
}

/// Stores a new draft, or replaces the contents of the draft named by `payload.id`.
#[tracing::instrument(skip(db, payload), fields(name = %payload.name, draft_id = ?payload.id))]
pub async fn save_draft(
    db: &DatabaseConnection,
    payload: CompanyPayload,
    acting_user_id: i32,
) -> Result<CompanyDetail, AppError> {
    validate_payload(&payload)?;
    let txn = db.begin().await?;

    let company_id = match payload.id {
        Some(id) => {
            let existing = load_draft_for_update(&txn, id).await?;
            let mut active: company::ActiveModel = existing.into();
            apply_payload(&mut active, &payload);
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?;
            delete_children(&txn, id).await?;
            id
        }
        None => insert_company(&txn, &payload, CompanyStatus::Draft, acting_user_id).await?,
    };

    write_children(&txn, company_id, &payload).await?;
    let detail = build_detail(&txn, company_id).await?;
    txn.commit().await?;

    tracing::info!(company_id, "Draft saved");
    Ok(detail)
}

async fn load_draft_for_update<C: ConnectionTrait>(conn: &C, id: i32) -> Result<company::Model, AppError> {
    let existing = Company::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    if existing.status != CompanyStatus::Draft {
        return Err(AppError::NotFound("company status should be draft".to_string()));
    }
    Ok(existing)
}

fn apply_payload(active: &mut company::ActiveModel, payload: &CompanyPayload) {
    if payload.uuid.is_some() {
        active.uuid = Set(payload.uuid);
    }
    active.name = Set(payload.name.trim().to_string());
    active.former_name = Set(payload.former_name.clone());
    active.year_founded = Set(payload.year_founded);
    active.bio = Set(payload.bio.clone());
    active.website_url = Set(payload.website_url.clone());
    active.pitchbook_url = Set(payload.pitchbook_url.clone());
    active.first_financing_date = Set(payload.first_financing_date);
    active.first_financing_deal_type = Set(payload.first_financing_deal_type);
    active.comment = Set(payload.comment.clone());
    active.decision_threshold = Set(payload.decision_threshold);
    active.progress_bar = Set(payload.progress_bar);
    active.pb_id = Set(payload.pb_id.clone());
}

async fn insert_company<C: ConnectionTrait>(
    conn: &C,
    payload: &CompanyPayload,
    status: CompanyStatus,
    acting_user_id: i32,
) -> Result<i32, AppError> {
    let now = Utc::now();
    let mut active = company::ActiveModel {
        status: Set(status),
        number_competitors: Set(0),
        total_score: Set(None),
        is_active: Set(true),
        user_id: Set(Some(acting_user_id)),
        dashboard_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    apply_payload(&mut active, payload);
    let inserted = active.insert(conn).await?;
    Ok(inserted.id)
}

/// Removes rounds, sub-rounds, investor links and tag rows owned by a company.
pub(crate) async fn delete_children<C: ConnectionTrait>(conn: &C, company_id: i32) -> Result<(), AppError> {
    let round_ids: Vec<i32> = Round::find()
        .filter(round::Column::CompanyId.eq(company_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    if !round_ids.is_empty() {
        let sub_round_ids: Vec<i32> = SubRound::find()
            .filter(sub_round::Column::RoundId.is_in(round_ids.clone()))
            .all(conn)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if !sub_round_ids.is_empty() {
            RoundInvestor::delete_many()
                .filter(round_investor::Column::SubRoundId.is_in(sub_round_ids))
                .exec(conn)
                .await?;
        }
        SubRound::delete_many()
            .filter(sub_round::Column::RoundId.is_in(round_ids))
            .exec(conn)
            .await?;
        Round::delete_many()
            .filter(round::Column::CompanyId.eq(company_id))
            .exec(conn)
            .await?;
    }

    CompanyIndustry::delete_many()
        .filter(company_industry::Column::CompanyId.eq(company_id))
        .exec(conn)
        .await?;
    CompanyCompetitor::delete_many()
        .filter(company_competitor::Column::CompanyId.eq(company_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Deletes a company row together with everything that references it.
pub(crate) async fn delete_company_rows<C: ConnectionTrait>(conn: &C, company_id: i32) -> Result<(), AppError> {
    delete_children(conn, company_id).await?;
    CompanyStatusHistory::delete_many()
        .filter(company_status_history::Column::CompanyId.eq(company_id))
        .exec(conn)
        .await?;
    Dashboard::delete_many()
        .filter(dashboard::Column::CompanyId.eq(company_id))
        .exec(conn)
        .await?;
    Company::delete_by_id(company_id).exec(conn).await?;
    Ok(())
}

async fn ensure_deal_type<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), AppError> {
    let found = DealType::find()
        .filter(deal_type::Column::Id.eq(id))
        .count(conn)
        .await?;
    if found == 0 {
        return Err(AppError::Validation(format!("unknown deal type id {}", id)));
    }
    Ok(())
}

async fn competitor_id<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i32, AppError> {
    let name = name.trim();
    if let Some(existing) = Competitor::find()
        .filter(competitor::Column::Name.eq(name))
        .one(conn)
        .await?
    {
        return Ok(existing.id);
    }
    let created = competitor::ActiveModel { name: Set(name.to_string()), ..Default::default() }
        .insert(conn)
        .await?;
    Ok(created.id)
}

async fn investor_id<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i32, AppError> {
    let name = name.trim();
    if let Some(existing) = Investor::find()
        .filter(investor::Column::Name.eq(name))
        .one(conn)
        .await?
    {
        return Ok(existing.id);
    }
    let created = investor::ActiveModel { name: Set(name.to_string()), ..Default::default() }
        .insert(conn)
        .await?;
    Ok(created.id)
}

/// Writes tags and the round graph from `payload`, then recomputes `number_competitors`.
async fn write_children<C: ConnectionTrait>(
    conn: &C,
    company_id: i32,
    payload: &CompanyPayload,
) -> Result<(), AppError> {
    if let Some(deal_type_id) = payload.first_financing_deal_type {
        ensure_deal_type(conn, deal_type_id).await?;
    }

    let mut seen = HashSet::new();
    for industry_id in payload.industries.iter().copied().filter(|id| seen.insert(*id)) {
        if Industry::find_by_id(industry_id).one(conn).await?.is_none() {
            return Err(AppError::Validation(format!("unknown industry id {}", industry_id)));
        }
        company_industry::ActiveModel {
            company_id: Set(company_id),
            industry_id: Set(industry_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    let mut competitor_ids = Vec::new();
    for name in &payload.competitors {
        let id = competitor_id(conn, name).await?;
        if !competitor_ids.contains(&id) {
            competitor_ids.push(id);
        }
    }
    for id in &competitor_ids {
        company_competitor::ActiveModel {
            company_id: Set(company_id),
            competitor_id: Set(*id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    for round_payload in &payload.rounds {
        if let Some(deal_type_id) = round_payload.deal_type_id {
            ensure_deal_type(conn, deal_type_id).await?;
        }
        let new_round = round::ActiveModel {
            company_id: Set(company_id),
            name: Set(round_payload.name.clone()),
            deal_type_id: Set(round_payload.deal_type_id),
            date: Set(round_payload.date),
            amount: Set(round_payload.amount),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        for sub_payload in &round_payload.sub_rounds {
            let new_sub = sub_round::ActiveModel {
                round_id: Set(new_round.id),
                name: Set(sub_payload.name.clone()),
                date: Set(sub_payload.date),
                amount: Set(sub_payload.amount),
                ..Default::default()
            }
            .insert(conn)
            .await?;

            let mut linked = HashSet::new();
            for investor in &sub_payload.investors {
                let investor_id = investor_id(conn, &investor.name).await?;
                if !linked.insert(investor_id) {
                    continue;
                }
                round_investor::ActiveModel {
                    sub_round_id: Set(new_sub.id),
                    investor_id: Set(investor_id),
                    lead: Set(investor.lead),
                    new: Set(investor.new),
                    corporate: Set(investor.corporate),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
            }
        }
    }

    // number_competitors always mirrors the association count
    let count = CompanyCompetitor::find()
        .filter(company_competitor::Column::CompanyId.eq(company_id))
        .count(conn)
        .await?;
    company::ActiveModel {
        id: Set(company_id),
        number_competitors: Set(count as i32),
        ..Default::default()
    }
    .update(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{InvestorPayload, RoundPayload, SubRoundPayload};

    fn payload(name: &str) -> CompanyPayload {
        CompanyPayload { name: name.to_string(), ..Default::default() }
    }

    #[test]
    fn name_is_required() {
        let err = validate_payload(&payload("   ")).unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn length_limits_follow_the_schema() {
        assert!(validate_payload(&payload(&"x".repeat(100))).is_ok());
        assert!(validate_payload(&payload(&"x".repeat(101))).is_err());

        let mut long_bio = payload("Acme");
        long_bio.bio = Some("b".repeat(1001));
        let err = validate_payload(&long_bio).unwrap_err();
        assert_eq!(err.to_string(), "bio must be at most 1000 characters");
    }

    #[test]
    fn sub_round_names_are_length_checked() {
        let mut p = payload("Acme");
        p.rounds = vec![RoundPayload {
            name: Some("Seed".to_string()),
            sub_rounds: vec![SubRoundPayload { name: Some("s".repeat(101)), ..Default::default() }],
            ..Default::default()
        }];
        let err = validate_payload(&p).unwrap_err();
        assert_eq!(err.to_string(), "sub round name must be at most 100 characters");

        p.rounds[0].sub_rounds[0].name = Some("s".repeat(100));
        assert!(validate_payload(&p).is_ok());
    }

    #[test]
    fn progress_bar_must_be_in_range() {
        let mut p = payload("Acme");
        p.progress_bar = Some(0.05);
        assert!(validate_payload(&p).is_err());
        p.progress_bar = Some(0.1);
        assert!(validate_payload(&p).is_ok());
        p.progress_bar = Some(1.0);
        assert!(validate_payload(&p).is_ok());
        p.progress_bar = Some(1.2);
        assert!(validate_payload(&p).is_err());
    }

    #[test]
    fn blank_investor_names_are_rejected() {
        let mut p = payload("Acme");
        p.rounds = vec![RoundPayload {
            sub_rounds: vec![SubRoundPayload {
                investors: vec![InvestorPayload { name: " ".to_string(), ..Default::default() }],
                ..Default::default()
            }],
            ..Default::default()
        }];
        let err = validate_payload(&p).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
