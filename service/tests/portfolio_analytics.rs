use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use shelf_service::domain::AnalyticsOptions;
use shelf_service::domain::repository::EventRepository;
use shelf_service::infrastructure::AppStateImpl;
use shelf_service::infrastructure::http::{USER_ID_HEADER, router};
use shelf_service::infrastructure::memory::{FailingEventStore, ManualClock, MemoryStore};
use tower::ServiceExt;

struct TestApp {
    router: Router,
}

impl TestApp {
    fn build<E>(store: MemoryStore, events: E, options: AnalyticsOptions) -> Self
    where
        E: EventRepository + Clone,
    {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
        let state = AppStateImpl::new(store, events, clock, options);
        Self {
            router: router(state),
        }
    }

    fn new() -> Self {
        Self::with_options(AnalyticsOptions::default())
    }

    fn with_options(options: AnalyticsOptions) -> Self {
        let store = MemoryStore::new();
        Self::build(store.clone(), store, options)
    }

    fn with_failing_events() -> Self {
        Self::build(MemoryStore::new(), FailingEventStore, AnalyticsOptions::default())
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register(&self, username: &str, role: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "role": role
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_project(&self, owner: &str, title: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/projects",
                Some(owner),
                Some(json!({ "title": title, "technologies": ["rust"] })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn publish(&self, owner: &str, project: &str) {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/projects/{project}/publish"),
                Some(owner),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["isPublished"], json!(true));
    }

    async fn view_project(&self, project: &str, user: Option<&str>) -> StatusCode {
        let uri = format!("/api/portfolio/alice/projects/{project}");
        self.send(Method::GET, &uri, user, None).await.0
    }

    async fn project_stats(&self, owner: &str, query: &str) -> (StatusCode, Value) {
        let uri = format!("/api/analytics/project-views{query}");
        self.send(Method::GET, &uri, Some(owner), None).await
    }
}

#[tokio::test]
async fn test_published_project_view_is_counted_once() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let demo = app.create_project(&alice, "Demo").await;

    assert_eq!(app.view_project(&demo, None).await, StatusCode::NOT_FOUND);

    app.publish(&alice, &demo).await;
    assert_eq!(app.view_project(&demo, None).await, StatusCode::OK);

    let (status, stats) = app.project_stats(&alice, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({
            "total": 1,
            "uniqueViewers": 0,
            "dailyViews": [{ "day": "2024-05-10", "count": 1 }],
            "projectBreakdown": [{ "projectId": demo, "projectTitle": "Demo", "count": 1 }]
        })
    );
}

#[tokio::test]
async fn test_distinct_visitors_are_counted_once_each() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let bob = app.register("bob", "VISITOR").await;
    let carol = app.register("carol", "VISITOR").await;
    let demo = app.create_project(&alice, "Demo").await;
    app.publish(&alice, &demo).await;

    for visitor in [Some(bob.as_str()), Some(bob.as_str()), Some(carol.as_str()), None] {
        assert_eq!(app.view_project(&demo, visitor).await, StatusCode::OK);
    }

    let (_, stats) = app.project_stats(&alice, "?period=week").await;
    assert_eq!(stats["total"], json!(4));
    assert_eq!(stats["uniqueViewers"], json!(2));
}

#[tokio::test]
async fn test_owner_views_follow_configuration() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let demo = app.create_project(&alice, "Demo").await;
    app.publish(&alice, &demo).await;

    assert_eq!(app.view_project(&demo, Some(&alice)).await, StatusCode::OK);
    let (_, stats) = app.project_stats(&alice, "").await;
    assert_eq!(stats["total"], json!(0));
    assert_eq!(stats["dailyViews"], json!([]));

    let app = TestApp::with_options(AnalyticsOptions {
        count_owner_views: true,
        ..AnalyticsOptions::default()
    });
    let alice = app.register("alice", "CREATOR").await;
    let demo = app.create_project(&alice, "Demo").await;
    app.publish(&alice, &demo).await;

    assert_eq!(app.view_project(&demo, Some(&alice)).await, StatusCode::OK);
    let (_, stats) = app.project_stats(&alice, "").await;
    assert_eq!(stats["total"], json!(1));
    assert_eq!(stats["uniqueViewers"], json!(1));
}

#[tokio::test]
async fn test_owner_sees_own_draft_but_visitors_do_not() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let bob = app.register("bob", "VISITOR").await;
    let demo = app.create_project(&alice, "Demo").await;

    assert_eq!(app.view_project(&demo, Some(&alice)).await, StatusCode::OK);
    assert_eq!(app.view_project(&demo, Some(&bob)).await, StatusCode::NOT_FOUND);

    let (status, portfolio) = app.send(Method::GET, "/api/portfolio/alice", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(portfolio["projects"], json!([]));
    assert_eq!(portfolio["isOwner"], json!(false));
}

#[tokio::test]
async fn test_unpublished_project_is_hidden_again() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let demo = app.create_project(&alice, "Demo").await;
    app.publish(&alice, &demo).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/projects/{demo}/unpublish"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isPublished"], json!(false));
    assert_eq!(app.view_project(&demo, None).await, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/projects/{demo}/unpublish"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_content_is_served_when_event_store_is_down() {
    let app = TestApp::with_failing_events();
    let alice = app.register("alice", "CREATOR").await;
    let demo = app.create_project(&alice, "Demo").await;
    app.publish(&alice, &demo).await;

    assert_eq!(app.view_project(&demo, None).await, StatusCode::OK);
    let (status, portfolio) = app.send(Method::GET, "/api/portfolio/alice", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(portfolio["projects"].as_array().map(Vec::len), Some(1));

    let (status, _) = app.project_stats(&alice, "").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_stats_require_identity_and_known_period() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;

    let (status, _) = app
        .send(Method::GET, "/api/analytics/project-views", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.project_stats(&alice, "?period=decade").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["statusCode"], json!(422));

    let (status, stats) = app.project_stats(&alice, "?period=all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], json!(0));
}

#[tokio::test]
async fn test_foreign_project_stats_are_forbidden() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let dave = app.register("dave", "CREATOR").await;
    let demo = app.create_project(&alice, "Demo").await;

    let (status, _) = app
        .project_stats(&dave, &format!("?projectId={demo}"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_portfolio_visits_through_page_and_tracking() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let bob = app.register("bob", "VISITOR").await;

    let (status, _) = app
        .send(Method::GET, "/api/portfolio/alice", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/analytics/portfolio-visit",
            None,
            Some(json!({ "username": "alice", "metadata": { "source": "card" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["recorded"], json!(true));

    let (status, stats) = app
        .send(Method::GET, "/api/analytics/portfolio-visits", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], json!(2));
    assert_eq!(stats["uniqueVisitors"], json!(1));
    assert_eq!(stats["dailyVisits"], json!([{ "day": "2024-05-10", "count": 2 }]));
}

#[tokio::test]
async fn test_tracking_unknown_subject_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            Method::POST,
            "/api/analytics/portfolio-visit",
            None,
            Some(json!({ "username": "nobody" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/analytics/page-hit",
            None,
            Some(json!({ "username": "nobody" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_carries_request_id() {
    let app = TestApp::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_listing_shows_only_published_portfolios() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let dave = app.register("dave", "CREATOR").await;
    let demo = app.create_project(&alice, "Demo").await;
    app.create_project(&alice, "Sketch").await;
    app.create_project(&dave, "Hidden").await;
    app.publish(&alice, &demo).await;

    let (status, listing) = app.send(Method::GET, "/api/portfolios", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().map(Vec::len), Some(1));
    assert_eq!(listing[0]["id"], json!(alice));
    assert_eq!(listing[0]["username"], json!("alice"));
    assert_eq!(listing[0]["displayName"], json!("alice"));
    assert_eq!(listing[0]["projectCount"], json!(1));
}

#[tokio::test]
async fn test_portfolio_found_by_email() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;

    let (status, portfolio) = app
        .send(Method::GET, "/api/portfolio/alice@example.com", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(portfolio["user"]["id"], json!(alice));
}

#[tokio::test]
async fn test_tracking_counts_visitor_named_in_body() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let bob = app.register("bob", "VISITOR").await;
    let carol = app.register("carol", "VISITOR").await;

    for _ in 0..2 {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/analytics/portfolio-visit",
                None,
                Some(json!({ "username": "alice", "viewerId": bob })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .send(
            Method::POST,
            "/api/analytics/portfolio-visit",
            Some(&bob),
            Some(json!({ "username": "alice", "visitorId": carol })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, stats) = app
        .send(Method::GET, "/api/analytics/portfolio-visits", Some(&alice), None)
        .await;
    assert_eq!(stats["total"], json!(2));
    assert_eq!(stats["uniqueVisitors"], json!(1));
}

#[tokio::test]
async fn test_owner_tracking_of_draft_project_is_not_found() {
    let app = TestApp::new();
    let alice = app.register("alice", "CREATOR").await;
    let draft = app.create_project(&alice, "Demo").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/analytics/project-view",
            Some(&alice),
            Some(json!({ "username": "alice", "projectId": draft })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/analytics/project-view",
            Some(&alice),
            Some(json!({ "username": "alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
