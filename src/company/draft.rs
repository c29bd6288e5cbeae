//! Draft clone: copies a company with its tags and funding-round graph into a
//! new draft owned by the acting user.
//!
//! The original subtree is read into plain values first, then written back
//! top-down with fresh keys. Investor link flags are copied from the original
//! link rows, one by one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{
    company, company_competitor, company_industry, round, round_investor, sub_round, CompanyCompetitor,
    CompanyIndustry, CompanyStatus, Round, RoundInvestor, SubRound,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SubRoundTree {
    pub sub_round: sub_round::Model,
    pub investors: Vec<round_investor::Model>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundTree {
    pub round: round::Model,
    pub sub_rounds: Vec<SubRoundTree>,
}

/// A company and everything it owns or tags, as loaded from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyTree {
    pub company: company::Model,
    pub industry_ids: Vec<i32>,
    pub competitor_ids: Vec<i32>,
    pub rounds: Vec<RoundTree>,
}

impl CompanyTree {
    /// Reads the subtree of `company`. Children come back in insertion (id) order.
    pub async fn load<C: ConnectionTrait>(conn: &C, company: company::Model) -> Result<Self, DbErr> {
        let industry_ids = CompanyIndustry::find()
            .filter(company_industry::Column::CompanyId.eq(company.id))
            .order_by_asc(company_industry::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(|row| row.industry_id)
            .collect();

        let competitor_ids = CompanyCompetitor::find()
            .filter(company_competitor::Column::CompanyId.eq(company.id))
            .order_by_asc(company_competitor::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(|row| row.competitor_id)
            .collect();

        let rounds = company
            .find_related(Round)
            .order_by_asc(round::Column::Id)
            .all(conn)
            .await?;

        let round_ids: Vec<i32> = rounds.iter().map(|r| r.id).collect();
        let sub_rounds = if round_ids.is_empty() {
            Vec::new()
        } else {
            SubRound::find()
                .filter(sub_round::Column::RoundId.is_in(round_ids))
                .order_by_asc(sub_round::Column::Id)
                .all(conn)
                .await?
        };

        let sub_round_ids: Vec<i32> = sub_rounds.iter().map(|s| s.id).collect();
        let links = if sub_round_ids.is_empty() {
            Vec::new()
        } else {
            RoundInvestor::find()
                .filter(round_investor::Column::SubRoundId.is_in(sub_round_ids))
                .order_by_asc(round_investor::Column::Id)
                .all(conn)
                .await?
        };

        let mut links_by_sub_round: HashMap<i32, Vec<round_investor::Model>> = HashMap::new();
        for link in links {
            links_by_sub_round.entry(link.sub_round_id).or_default().push(link);
        }

        let mut subs_by_round: HashMap<i32, Vec<SubRoundTree>> = HashMap::new();
        for sub_round in sub_rounds {
            let investors = links_by_sub_round.remove(&sub_round.id).unwrap_or_default();
            subs_by_round
                .entry(sub_round.round_id)
                .or_default()
                .push(SubRoundTree { sub_round, investors });
        }

        let rounds = rounds
            .into_iter()
            .map(|round| RoundTree {
                sub_rounds: subs_by_round.remove(&round.id).unwrap_or_default(),
                round,
            })
            .collect();

        Ok(CompanyTree { company, industry_ids, competitor_ids, rounds })
    }

    /// Number of investor links across all sub-rounds.
    pub fn investor_link_count(&self) -> usize {
        self.rounds
            .iter()
            .flat_map(|r| r.sub_rounds.iter())
            .map(|s| s.investors.len())
            .sum()
    }
}

/// New-row values for the draft copy of `original`.
fn draft_row(original: &company::Model, acting_user_id: i32, competitor_count: usize, now: DateTime<Utc>) -> company::ActiveModel {
    let mut draft = company::ActiveModel::from(original.clone()).reset_all();
    draft.id = NotSet;
    draft.dashboard_id = Set(None);
    draft.status = Set(CompanyStatus::Draft);
    draft.is_active = Set(true);
    draft.user_id = Set(Some(acting_user_id));
    draft.number_competitors = Set(competitor_count as i32);
    draft.updated_at = Set(now);
    draft
}

/// Writes a draft copy of `tree` and returns the new company row.
///
/// Must run inside the caller's transaction; nothing here commits.
#[tracing::instrument(skip(conn, tree), fields(original_id = tree.company.id, rounds = tree.rounds.len()))]
pub async fn clone_as_draft<C: ConnectionTrait>(
    conn: &C,
    tree: &CompanyTree,
    acting_user_id: i32,
    now: DateTime<Utc>,
) -> Result<company::Model, DbErr> {
    let draft = draft_row(&tree.company, acting_user_id, tree.competitor_ids.len(), now)
        .insert(conn)
        .await?;

    for industry_id in &tree.industry_ids {
        company_industry::ActiveModel {
            company_id: Set(draft.id),
            industry_id: Set(*industry_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    for competitor_id in &tree.competitor_ids {
        company_competitor::ActiveModel {
            company_id: Set(draft.id),
            competitor_id: Set(*competitor_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    for round_tree in &tree.rounds {
        let mut new_round = round::ActiveModel::from(round_tree.round.clone()).reset_all();
        new_round.id = NotSet;
        new_round.company_id = Set(draft.id);
        let new_round = new_round.insert(conn).await?;

        for sub_tree in &round_tree.sub_rounds {
            let mut new_sub = sub_round::ActiveModel::from(sub_tree.sub_round.clone()).reset_all();
            new_sub.id = NotSet;
            new_sub.round_id = Set(new_round.id);
            let new_sub = new_sub.insert(conn).await?;

            for link in &sub_tree.investors {
                round_investor::ActiveModel {
                    sub_round_id: Set(new_sub.id),
                    investor_id: Set(link.investor_id),
                    lead: Set(link.lead),
                    new: Set(link.new),
                    corporate: Set(link.corporate),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
            }
        }
    }

    tracing::info!(
        draft_id = draft.id,
        investor_links = tree.investor_link_count(),
        "Cloned company into draft"
    );
    Ok(draft)
}
