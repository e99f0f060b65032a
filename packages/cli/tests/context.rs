//! Wiring from settings and flags to a working service

use a11y_cli::{Context, Overrides};
use a11y_client::{ReportKey, Settings};
use a11y_flows::{AnalyzeFlow, AnalyzeForm, AnalyzeMode, ReportList};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        api_url: server.uri(),
        default_platform: "Web".to_string(),
        notifications: false,
    }
}

#[tokio::test]
async fn test_token_flag_reaches_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/reports"))
        .and(query_param("platform", "Web"))
        .and(header("authorization", "Bearer from-flag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reports": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v5/reports/A11Y-1"))
        .and(header("authorization", "Bearer from-flag"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let overrides = Overrides {
        token: Some("from-flag".to_string()),
        ..Default::default()
    };
    let ctx = Context::with_settings(settings_for(&server), &overrides, true).unwrap();
    assert_eq!(ctx.platform_or_default(None), "Web");

    let list = ReportList::new(ctx.service.clone(), ctx.notifier.clone(), ctx.confirmer.clone());
    list.refresh(&a11y_client::ReportQuery::new(ctx.platform_or_default(None)))
        .await
        .unwrap();
    assert!(list.delete(&ReportKey::new("A11Y-1")).await.unwrap());
}

#[tokio::test]
async fn test_analyze_through_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ticket_id": "A11Y-7",
            "created_at": "2025-10-15T08:00:00",
            "updated_at": "2025-10-15T08:00:00",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = Context::with_settings(settings_for(&server), &Overrides::default(), true).unwrap();
    let flow = AnalyzeFlow::new(Arc::clone(&ctx.service), Arc::clone(&ctx.notifier));

    let mut form = AnalyzeForm::new(AnalyzeMode::TicketReference);
    form.ticket_link = "https://jira.example.com/browse/A11Y-7".to_string();
    form.description = "Buttons lack labels".to_string();

    let outcome = flow.submit(&form).await.unwrap();
    assert_eq!(outcome.message(), "Report for A11Y-7 created successfully!");
}

#[test]
fn test_bad_url_fails_before_any_request() {
    let settings = Settings {
        api_url: "not a url".to_string(),
        ..Settings::default()
    };
    assert!(Context::with_settings(settings, &Overrides::default(), true).is_err());
}
