mod common;

use axum::http::{header, Method, StatusCode};
use chrono::Utc;
use common::TestApp;
use serde_json::json;
use tripdesk_app::modules::contact::models::ContactMessage;
use tripdesk_app::modules::users::models::User;
use tripdesk_authz::Role;
use tripdesk_db::Repository;

#[tokio::test]
async fn health_check_responds() {
    let app = TestApp::spawn().await;
    let (status, body) = app.request(Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::spawn().await;
    let (id, token) = app.register("Traveller@Example.com").await;

    let (status, me) = app.request(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id.as_str());
    assert_eq!(me["email"], "traveller@example.com");
    assert_eq!(me["role"], "user");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "traveller@example.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn plain_users_cannot_reach_admin_listings() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register("someone@example.com").await;

    let (status, _) = app.request(Method::GET, "/api/leads", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request(Method::GET, "/api/dashboard/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn contact_submission_stores_one_unread_message() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/contact",
            None,
            Some(json!({
                "name": "Meera",
                "email": "meera@example.com",
                "subject": "Honeymoon",
                "message": "Looking for ideas in June."
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let repo: Repository<ContactMessage> = app.app.ctx.repo();
    let stored = repo.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].email, "meera@example.com");
    assert!(!stored[0].read);
    assert_eq!(json!(stored[0].status), json!("new"));

    let token = app.admin_token().await;
    let id = stored[0].id.clone();
    let (status, read) = app
        .request(Method::POST, &format!("/api/contact/{id}/read"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["read"], true);
}

#[tokio::test]
async fn role_change_requires_confirmation() {
    let app = TestApp::spawn().await;
    let (user_id, _) = app.register("editor@example.com").await;
    let admin = app.admin_token().await;
    let uri = format!("/api/users/{user_id}/role");

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&admin), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "confirm");

    let (_, user) = app
        .request(Method::GET, &format!("/api/users/{user_id}"), Some(&admin), None)
        .await;
    assert_eq!(user["role"], "user");

    let (status, user) = app
        .request(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({"role": "admin", "confirm": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "admin");
}

#[tokio::test]
async fn lead_status_cycles_back_to_new() {
    let app = TestApp::spawn().await;
    let (status, lead) = app
        .request(
            Method::POST,
            "/api/leads",
            None,
            Some(json!({"name": "Ravi", "email": "ravi@example.com", "destination": "Kerala"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{lead}");
    assert_eq!(lead["status"], "new");
    assert_eq!(lead["source"], "website");

    let admin = app.admin_token().await;
    let uri = format!("/api/leads/{}/cycle-status", lead["id"].as_str().unwrap());
    let mut seen = Vec::new();
    for _ in 0..3 {
        let (status, lead) = app.request(Method::POST, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        seen.push(lead["status"].as_str().unwrap().to_string());
    }
    assert_eq!(seen, vec!["contacted", "converted", "new"]);
}

#[tokio::test]
async fn itinerary_balance_and_history_follow_updates() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let (status, created) = app
        .request(
            Method::POST,
            "/api/itineraries",
            Some(&admin),
            Some(json!({
                "customer_name": "Lena Ford",
                "customer_email": "LENA@example.com",
                "destination": "Bali",
                "start_date": "2026-05-01",
                "end_date": "2026-05-05",
                "adults": 2,
                "total_cost": 2000,
                "advance_paid": 500
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["balance_due"], 1500.0);
    assert_eq!(created["customer_email"], "lena@example.com");
    assert!(created["reference"].as_str().unwrap().starts_with("TD-"));
    assert_eq!(created["history"].as_array().unwrap().len(), 1);

    let id = created["id"].as_str().unwrap();
    let mut changed = created.clone();
    changed["advance_paid"] = json!(1200);
    let (status, updated) = app
        .request(Method::PUT, &format!("/api/itineraries/{id}"), Some(&admin), Some(changed))
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["balance_due"], 800.0);
    assert_eq!(updated["reference"], created["reference"]);
    let history = updated["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["action"], "updated");

    let mut overpaid = updated.clone();
    overpaid["advance_paid"] = json!(5000);
    let (status, _) = app
        .request(Method::PUT, &format!("/api/itineraries/{id}"), Some(&admin), Some(overpaid))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn workbook_preview_excludes_stored_packages() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/packages",
            Some(&admin),
            Some(json!({"destination_id": "bkk001", "title": "Bangkok Nights", "price": 799})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let workbook = json!({
        "Packages_Master": [
            {"Destination_ID": "BKK001", "Title": "Bangkok again", "Price": 850},
            {"Destination_ID": "HKT001", "Title": "Phuket Beaches", "Duration_Days": 6, "Price": 1100}
        ]
    });
    let (status, summary) = app
        .request(Method::POST, "/api/packages/import/preview", Some(&admin), Some(workbook.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["new_count"], 1);
    assert_eq!(summary["duplicate_count"], 1);
    assert_eq!(summary["duplicates"][0]["destination_id"], "BKK001");

    let (status, report) = app
        .request(Method::POST, "/api/packages/import", Some(&admin), Some(workbook))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["created"].as_array().unwrap().len(), 1);

    let (_, page) = app.request(Method::GET, "/api/packages", Some(&admin), None).await;
    assert_eq!(page["total"], 2);
}

#[tokio::test]
async fn empty_workbook_upload_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let (status, _) = app
        .request(Method::POST, "/api/packages/import/preview", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wizard_submission_creates_a_tailored_lead() {
    let app = TestApp::spawn().await;
    let answers = json!({
        "destinations": ["Kerala"],
        "start_date": "2026-12-10",
        "duration_days": 6,
        "adults": 2,
        "budget": "standard",
        "interests": ["backwaters"],
        "name": "Priya",
        "email": "priya@example.com",
        "phone": "+91 98765 43210"
    });

    let (status, body) = app
        .request(
            Method::POST,
            "/api/tailored/advance",
            None,
            Some(json!({"step": 4, "answers": {"name": "Priya"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["step"], 4);

    let (status, body) = app
        .request(Method::POST, "/api/tailored/submit", None, Some(answers))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["lead"]["source"], "tailored");
    assert_eq!(body["lead"]["destination"], "Kerala");
    assert_eq!(body["lead"]["travelers"], 2);

    let admin = app.admin_token().await;
    let (_, stats) = app
        .request(Method::GET, "/api/dashboard/stats", Some(&admin), None)
        .await;
    assert_eq!(stats["counts"]["leads"], 1);
    assert_eq!(stats["leads_by_status"]["new"], 1);
    assert_eq!(stats["recent_leads"][0]["name"], "Priya");
}

#[tokio::test]
async fn itinerary_pdf_is_an_attachment() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let (status, created) = app
        .request(
            Method::POST,
            "/api/itineraries",
            Some(&admin),
            Some(json!({
                "reference": "TD-20260501-XYZ123",
                "customer_name": "Lena Ford",
                "customer_email": "lena@example.com",
                "destination": "Bali",
                "days": [{"day": 1, "title": "Arrival"}],
                "total_cost": 900,
                "advance_paid": 100
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let id = created["id"].as_str().unwrap();

    let (status, headers, bytes) = app
        .raw(Method::GET, &format!("/api/itineraries/{id}/pdf"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"itinerary-TD-20260501-XYZ123.pdf\""
    );
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn itinerary_balance_keeps_every_decimal() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let (status, created) = app
        .request(
            Method::POST,
            "/api/itineraries",
            Some(&admin),
            Some(json!({
                "customer_name": "Omar",
                "destination": "Cairo",
                "total_cost": 100.333,
                "advance_paid": 0
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["balance_due"], 100.333);
}

#[tokio::test]
async fn users_sort_by_last_login_with_gaps_last() {
    let app = TestApp::spawn().await;
    let now = Utc::now();
    let repo: Repository<User> = app.app.ctx.repo();
    repo.create(User {
        id: String::new(),
        email: "never@example.com".to_string(),
        display_name: "Never".to_string(),
        role: Role::User,
        permissions: vec![],
        active: true,
        password_hash: String::new(),
        last_login_at: None,
        created_at: now,
        updated_at: now,
    })
    .await
    .unwrap();
    app.register("first@example.com").await;
    app.register("second@example.com").await;
    let admin = app.admin_token().await;

    let (status, page) = app
        .request(
            Method::GET,
            "/api/users?sort=last_login_at&order=asc",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["email"].as_str().unwrap())
        .collect();
    assert_eq!(
        emails,
        vec![
            "first@example.com",
            "second@example.com",
            common::ADMIN_EMAIL,
            "never@example.com"
        ]
    );
}

#[tokio::test]
async fn out_of_range_pages_are_empty() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let uri = format!("/api/users?page={}&per_page=100", usize::MAX);
    let (status, page) = app.request(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert!(page["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn workbook_headers_are_case_insensitive() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let workbook = json!({
        "packages_master": [
            {"destination_id": "goa01", "title": "Goa Beaches", "price": 450}
        ]
    });
    let (status, summary) = app
        .request(Method::POST, "/api/packages/import/preview", Some(&admin), Some(workbook))
        .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["new_count"], 1);
    assert_eq!(summary["rejected_count"], 0);
}

#[tokio::test]
async fn repeated_stored_ids_are_all_duplicates() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.request(
        Method::POST,
        "/api/packages",
        Some(&admin),
        Some(json!({"destination_id": "DXB1", "title": "Dubai", "price": 999})),
    )
    .await;

    let workbook = json!({
        "Packages_Master": [
            {"Destination_ID": "DXB1", "Title": "Dubai"},
            {"Destination_ID": "dxb1", "Title": "Dubai again"}
        ]
    });
    let (status, summary) = app
        .request(Method::POST, "/api/packages/import/preview", Some(&admin), Some(workbook))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["duplicate_count"], 2);
    assert_eq!(summary["rejected_count"], 0);
    assert_eq!(summary["new_count"], 0);
}

#[tokio::test]
async fn wizard_submission_enforces_lead_limits() {
    let app = TestApp::spawn().await;
    let answers = json!({
        "destinations": ["Kerala"],
        "start_date": "2026-12-10",
        "duration_days": 6,
        "adults": 500,
        "budget": "standard",
        "interests": ["backwaters"],
        "name": "Priya",
        "email": "priya@example.com",
        "phone": "+91 98765 43210"
    });
    let (status, body) = app
        .request(Method::POST, "/api/tailored/submit", None, Some(answers))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let admin = app.admin_token().await;
    let (_, leads) = app.request(Method::GET, "/api/leads", Some(&admin), None).await;
    assert_eq!(leads["total"], 0);
}
