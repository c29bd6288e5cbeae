mod common;

use axum::http::StatusCode;
use common::{full_payload, insert_company, spawn_app, TestApp};
use dealflow::entities::{
    company, company_status_history, Company, CompanyStatus, CompanyStatusHistory, Round, RoundInvestor, SubRound,
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

async fn history_rows(app: &TestApp, company_id: i32) -> Vec<company_status_history::Model> {
    CompanyStatusHistory::find()
        .filter(company_status_history::Column::CompanyId.eq(company_id))
        .all(&app.db)
        .await
        .unwrap()
}

async fn company_row(app: &TestApp, id: i32) -> company::Model {
    Company::find_by_id(id).one(&app.db).await.unwrap().unwrap()
}

/// Saves the full payload as a draft, then moves it to `status` in place.
async fn seeded_company(app: &TestApp, status: &str) -> i32 {
    let (code, draft) = app.post("/companies/draft", full_payload("Acme Robotics")).await;
    assert_eq!(code, StatusCode::OK, "{}", draft);
    let id = draft["id"].as_i64().unwrap() as i32;
    if status != "draft" {
        let (code, body) = app.patch(&format!("/companies/{}", id), json!({ "status": status })).await;
        assert_eq!(code, StatusCode::OK, "{}", body);
    }
    id
}

/// Rounds, sub-rounds and investor links with generated keys stripped.
fn graph_shape(detail: &Value) -> Value {
    let rounds: Vec<Value> = detail["rounds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|round| {
            let subs: Vec<Value> = round["sub_rounds"]
                .as_array()
                .unwrap()
                .iter()
                .map(|sub| {
                    let investors: Vec<Value> = sub["investors"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|i| json!([i["id"], i["name"], i["lead"], i["new"], i["corporate"]]))
                        .collect();
                    json!({ "name": sub["name"], "amount": sub["amount"], "investors": investors })
                })
                .collect();
            json!({
                "name": round["name"],
                "deal_type_id": round["deal_type_id"],
                "amount": round["amount"],
                "sub_rounds": subs,
            })
        })
        .collect();
    Value::Array(rounds)
}

#[tokio::test]
async fn draft_to_draft_changes_nothing() {
    let app = spawn_app().await;
    let id = seeded_company(&app, "draft").await;
    let companies_before = Company::find().count(&app.db).await.unwrap();

    let (code, body) = app.patch(&format!("/companies/{}", id), json!({ "status": "draft" })).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["status"], "draft");
    assert!(body.get("draft_id").is_none());
    assert_eq!(Company::find().count(&app.db).await.unwrap(), companies_before);
    assert!(history_rows(&app, id).await.is_empty());
    assert_eq!(company_row(&app, id).await.status, CompanyStatus::Draft);
}

#[tokio::test]
async fn closed_to_rejected_updates_in_place_with_one_history_row() {
    let app = spawn_app().await;
    let id = seeded_company(&app, "closed").await;
    let companies_before = Company::find().count(&app.db).await.unwrap();

    let (code, body) = app
        .patch(&format!("/companies/{}", id), json!({ "status": "rejected", "comment": "market too small" }))
        .await;

    assert_eq!(code, StatusCode::OK, "{}", body);
    assert_eq!(body, json!({ "id": id, "status": "rejected" }));

    let row = company_row(&app, id).await;
    assert_eq!(row.status, CompanyStatus::Rejected);
    assert_eq!(row.comment.as_deref(), Some("market too small"));
    assert!(row.is_active);
    assert_eq!(Company::find().count(&app.db).await.unwrap(), companies_before);

    let rejected: Vec<_> = history_rows(&app, id)
        .await
        .into_iter()
        .filter(|h| h.status == CompanyStatus::Rejected)
        .collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].company_id, id);
}

#[tokio::test]
async fn reverting_to_draft_clones_the_whole_graph() {
    let app = spawn_app().await;
    let id = seeded_company(&app, "closed").await;
    let companies_before = Company::find().count(&app.db).await.unwrap();

    let (code, outcome) = app.patch(&format!("/companies/{}", id), json!({ "status": "draft" })).await;
    assert_eq!(code, StatusCode::OK, "{}", outcome);
    assert_eq!(outcome["id"], id);
    assert_eq!(outcome["status"], "draft");
    let draft_id = outcome["draft_id"].as_i64().unwrap() as i32;
    assert_ne!(draft_id, id);

    // exactly one new row
    assert_eq!(Company::find().count(&app.db).await.unwrap(), companies_before + 1);

    let original = company_row(&app, id).await;
    let draft = company_row(&app, draft_id).await;
    assert!(!original.is_active);
    assert!(draft.is_active);
    assert_eq!(draft.status, CompanyStatus::Draft);
    assert_eq!(draft.user_id, Some(app.user_id));
    assert_eq!(draft.dashboard_id, None);
    assert_eq!(draft.name, original.name);
    assert_eq!(draft.number_competitors, 2);

    let history = history_rows(&app, id).await;
    assert_eq!(history.iter().filter(|h| h.status == CompanyStatus::Draft).count(), 1);

    let (_, original_detail) = app.get(&format!("/companies/{}", id)).await;
    let (code, draft_detail) = app.get(&format!("/companies/draft/{}", draft_id)).await;
    assert_eq!(code, StatusCode::OK, "{}", draft_detail);

    assert_eq!(draft_detail["industries"], original_detail["industries"]);
    assert_eq!(draft_detail["competitors"], original_detail["competitors"]);
    assert_eq!(draft_detail["first_financing_deal_type"], original_detail["first_financing_deal_type"]);
    assert_eq!(graph_shape(&draft_detail), graph_shape(&original_detail));

    // the copy has its own rows
    let original_round = original_detail["rounds"][0]["id"].as_i64().unwrap();
    let draft_round = draft_detail["rounds"][0]["id"].as_i64().unwrap();
    assert_ne!(original_round, draft_round);
}

#[tokio::test]
async fn revert_keeps_investor_flags_per_link() {
    let app = spawn_app().await;
    let id = seeded_company(&app, "in_progress").await;

    let (_, outcome) = app.patch(&format!("/companies/{}", id), json!({ "status": "draft" })).await;
    let draft_id = outcome["draft_id"].as_i64().unwrap();
    let (_, detail) = app.get(&format!("/companies/{}", draft_id)).await;

    let seed_links = &detail["rounds"][0]["sub_rounds"][0]["investors"];
    assert_eq!(seed_links[0]["name"], "Alpha Capital");
    assert_eq!(seed_links[0]["lead"], true);
    assert_eq!(seed_links[0]["new"], false);
    assert_eq!(seed_links[1]["name"], "Beta Ventures");
    assert_eq!(seed_links[1]["new"], true);
    assert_eq!(seed_links[1]["corporate"], true);

    // same investor, different flags in a later sub-round
    let a2 = &detail["rounds"][1]["sub_rounds"][1]["investors"][0];
    assert_eq!(a2["name"], "Alpha Capital");
    assert_eq!(a2["lead"], false);
    assert_eq!(a2["new"], true);
}

#[tokio::test]
async fn rejected_reverts_to_draft_with_a_full_copy() {
    let app = spawn_app().await;
    let id = seeded_company(&app, "rejected").await;
    let companies_before = Company::find().count(&app.db).await.unwrap();

    let (code, outcome) = app.patch(&format!("/companies/{}", id), json!({ "status": "draft" })).await;
    assert_eq!(code, StatusCode::OK, "{}", outcome);
    assert_eq!(outcome["id"], id);
    let draft_id = outcome["draft_id"].as_i64().unwrap() as i32;
    assert_ne!(draft_id, id);
    assert_eq!(Company::find().count(&app.db).await.unwrap(), companies_before + 1);

    let original = company_row(&app, id).await;
    assert!(!original.is_active);
    assert_eq!(original.status, CompanyStatus::Rejected);
    let draft = company_row(&app, draft_id).await;
    assert!(draft.is_active);
    assert_eq!(draft.status, CompanyStatus::Draft);

    let (_, original_detail) = app.get(&format!("/companies/{}", id)).await;
    let (_, draft_detail) = app.get(&format!("/companies/draft/{}", draft_id)).await;
    assert_eq!(draft_detail["industries"], original_detail["industries"]);
    assert_eq!(graph_shape(&draft_detail), graph_shape(&original_detail));
}

#[tokio::test]
async fn failed_copy_leaves_the_original_untouched() {
    let app = spawn_app().await;
    let id = seeded_company(&app, "closed").await;
    let companies_before = Company::find().count(&app.db).await.unwrap();
    let rounds_before = Round::find().count(&app.db).await.unwrap();
    let sub_rounds_before = SubRound::find().count(&app.db).await.unwrap();
    let links_before = RoundInvestor::find().count(&app.db).await.unwrap();
    let history_before = history_rows(&app, id).await.len();

    // rounds and sub-rounds are copied before the investor links
    app.db
        .execute_unprepared(
            "CREATE TRIGGER fail_link_copy BEFORE INSERT ON round_investors BEGIN SELECT RAISE(ABORT, 'link copy failed'); END;",
        )
        .await
        .unwrap();

    let (code, body) = app.patch(&format!("/companies/{}", id), json!({ "status": "draft" })).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR, "{}", body);
    assert_eq!(body["status"], "error");

    assert_eq!(Company::find().count(&app.db).await.unwrap(), companies_before);
    assert_eq!(Round::find().count(&app.db).await.unwrap(), rounds_before);
    assert_eq!(SubRound::find().count(&app.db).await.unwrap(), sub_rounds_before);
    assert_eq!(RoundInvestor::find().count(&app.db).await.unwrap(), links_before);

    let original = company_row(&app, id).await;
    assert!(original.is_active);
    assert_eq!(original.status, CompanyStatus::Closed);
    let history = history_rows(&app, id).await;
    assert_eq!(history.len(), history_before);
    assert!(history.iter().all(|h| h.status != CompanyStatus::Draft));
}

#[tokio::test]
async fn draft_to_in_progress_updates_in_place() {
    let app = spawn_app().await;
    let id = seeded_company(&app, "draft").await;

    let (_, promoted) = app.patch(&format!("/companies/{}", id), json!({ "status": "in_progress" })).await;
    assert_eq!(promoted["status"], "in_progress");
    assert!(company_row(&app, id).await.is_active);
}

#[tokio::test]
async fn calculating_rejects_every_transition() {
    let app = spawn_app().await;
    let (code, created) = app.post("/companies", full_payload("Busy Corp")).await;
    assert_eq!(code, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap() as i32;
    let before = company_row(&app, id).await;
    let history_before = history_rows(&app, id).await.len();

    for target in ["draft", "closed", "rejected", "in_progress"] {
        let (code, body) = app.patch(&format!("/companies/{}", id), json!({ "status": target })).await;
        assert_eq!(code, StatusCode::CONFLICT);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"], "InvalidStateError");
    }

    assert_eq!(company_row(&app, id).await, before);
    assert_eq!(history_rows(&app, id).await.len(), history_before);
    assert_eq!(Company::find().count(&app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_company_or_status_is_a_bad_request() {
    let app = spawn_app().await;
    let id = insert_company(&app.db, "Solo", CompanyStatus::Closed, true).await;

    let (code, body) = app.patch("/companies/999", json!({ "status": "closed" })).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Company not found");

    let (code, body) = app.patch(&format!("/companies/{}", id), json!({ "status": "archived" })).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"], "ValidationError");
}

#[tokio::test]
async fn same_status_with_threshold_only_updates_fields() {
    let app = spawn_app().await;
    let id = insert_company(&app.db, "Solo", CompanyStatus::Closed, true).await;

    let (code, body) = app
        .patch(&format!("/companies/{}", id), json!({ "status": "closed", "decision_threshold": 0.65 }))
        .await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "closed");
    assert_eq!(company_row(&app, id).await.decision_threshold, Some(0.65));
    assert!(history_rows(&app, id).await.is_empty());
}
