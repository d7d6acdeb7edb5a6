//! Router tests over in-memory storage with stub verifier and mailer

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::{build_router, AppState, ClientIpSource};
use crate::cache::MemoryCache;
use crate::config::{DeploymentProfile, SiteConfig};
use crate::models::fixtures::valid_input;
use crate::services::testing::{RecordingMailer, StubVerifier};
use crate::services::{
    content::parse_post, BlogService, ContentLibrary, DynVerifier, LeadService, MarkdownRenderer,
    RateLimiter, SeoRenderer, SitemapGenerator, UserService,
};
use crate::storage::{DynStorage, MemoryStorage};

const ADMIN_PASSWORD: &str = "changeme123";

struct Harness {
    server: TestServer,
    storage: DynStorage,
    mailer: Arc<RecordingMailer>,
    _static_dir: tempfile::TempDir,
}

struct Options {
    profile: DeploymentProfile,
    verifier: Option<DynVerifier>,
    lead_limit: usize,
    trust_forwarded_headers: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            profile: DeploymentProfile::Server,
            verifier: None,
            lead_limit: 50,
            trust_forwarded_headers: false,
        }
    }
}

async fn harness(options: Options) -> Harness {
    let storage: DynStorage = Arc::new(MemoryStorage::new());
    let mailer = Arc::new(RecordingMailer::default());

    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        static_dir.path().join("index.html"),
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>ZeengoCorp</title></head><body><div id=\"root\"></div></body></html>",
    )
    .unwrap();
    std::fs::create_dir(static_dir.path().join("assets")).unwrap();
    std::fs::write(static_dir.path().join("assets/app-1a2b.js"), "console.log(1)").unwrap();

    let post = parse_post(
        "why-we-build",
        "---\ntitle: Why We Build\ndate: 2024-03-01\ndescription: Our thesis\n---\n# Why\n",
        &MarkdownRenderer::new(),
    );
    let content = Arc::new(ContentLibrary::from_posts(vec![post]));

    let user_service = Arc::new(UserService::new(
        storage.clone(),
        Arc::new(RateLimiter::for_logins()),
    ));
    user_service.ensure_admin("admin", ADMIN_PASSWORD).await.unwrap();

    let client_ip_source =
        ClientIpSource::from_config(options.profile, options.trust_forwarded_headers);
    let lead_service = Arc::new(LeadService::new(
        storage.clone(),
        options.verifier,
        mailer.clone(),
        Arc::new(RateLimiter::new(
            options.lead_limit,
            chrono::Duration::minutes(1),
        )),
        options.profile,
        "contact@zeengocorp.com",
    ));

    let site = SiteConfig::default();
    let state = AppState {
        storage: storage.clone(),
        user_service,
        blog_service: Arc::new(BlogService::new(
            storage.clone(),
            Arc::new(MemoryCache::with_ttl(Duration::from_secs(60))),
        )),
        lead_service,
        content,
        seo: Arc::new(SeoRenderer::new(site.clone()).unwrap()),
        sitemap: Arc::new(SitemapGenerator::new(&site.url).unwrap()),
        site: Arc::new(site),
        static_dir: Arc::new(PathBuf::from(static_dir.path())),
        client_ip_source,
    };

    let router = build_router(state, "http://localhost:5173").unwrap();
    Harness {
        server: TestServer::new(router).unwrap(),
        storage,
        mailer,
        _static_dir: static_dir,
    }
}

fn contact_body() -> Value {
    json!({
        "name": "Jane Founder",
        "email": "jane@example.com",
        "interestArea": "Ventures",
        "message": "Let's build something together.",
    })
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

async fn admin_token(h: &Harness) -> String {
    let response = h
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": ADMIN_PASSWORD }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

// ============================================================================
// Leads
// ============================================================================

#[tokio::test]
async fn contact_is_stored_and_notified() {
    let h = harness(Options::default()).await;

    let response = h.server.post("/api/contact").json(&contact_body()).await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["interestArea"], "Ventures");

    assert_eq!(h.storage.get_contacts().await.unwrap().len(), 1);
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New Lead: Jane Founder (Ventures)");
}

#[tokio::test]
async fn contact_with_invalid_email_is_rejected() {
    let h = harness(Options::default()).await;
    let mut body = contact_body();
    body["email"] = json!("not-an-email");

    let response = h.server.post("/api/contact").json(&body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["errors"][0]["field"], "email");
    assert!(h.storage.get_contacts().await.unwrap().is_empty());
}

#[tokio::test]
async fn padded_email_is_accepted_and_stored_trimmed() {
    let h = harness(Options::default()).await;

    let response = h
        .server
        .post("/api/newsletter")
        .json(&json!({ "name": "Sam", "email": "  sam@example.com " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["email"], "sam@example.com");

    // Same address without padding is a duplicate
    h.server
        .post("/api/newsletter")
        .json(&json!({ "name": "Sam", "email": "sam@example.com" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let h = harness(Options::default()).await;

    let response = h
        .server
        .post("/api/contact")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn honeypot_gets_fake_success() {
    let h = harness(Options::default()).await;
    let mut body = contact_body();
    body["bot_field"] = json!("http://spam.example");

    let response = h.server.post("/api/contact").json(&body).await;

    response.assert_status_ok();
    response.assert_json(&json!({ "success": true, "message": "Message sent" }));
    assert!(h.storage.get_contacts().await.unwrap().is_empty());
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn newsletter_rejects_duplicates() {
    let h = harness(Options::default()).await;
    let body = json!({ "name": "Sam", "email": "sam@example.com" });

    h.server
        .post("/api/newsletter")
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);

    let response = h.server.post("/api/newsletter").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["message"], "Email already subscribed");
    assert_eq!(h.storage.get_newsletters().await.unwrap().len(), 1);
}

#[tokio::test]
async fn lead_rate_limit_is_per_ip_and_shared() {
    let h = harness(Options {
        lead_limit: 2,
        trust_forwarded_headers: true,
        ..Default::default()
    })
    .await;
    let ip = HeaderName::from_static("x-forwarded-for");

    h.server
        .post("/api/contact")
        .add_header(ip.clone(), HeaderValue::from_static("198.51.100.1"))
        .json(&contact_body())
        .await
        .assert_status(StatusCode::CREATED);
    // Invalid input still counts
    h.server
        .post("/api/newsletter")
        .add_header(ip.clone(), HeaderValue::from_static("198.51.100.1"))
        .json(&json!({ "name": "", "email": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = h
        .server
        .post("/api/contact")
        .add_header(ip.clone(), HeaderValue::from_static("198.51.100.1"))
        .json(&contact_body())
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Too many requests. Please try again later."
    );

    h.server
        .post("/api/contact")
        .add_header(ip, HeaderValue::from_static("198.51.100.2"))
        .json(&contact_body())
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_lead_limit() {
    let h = harness(Options {
        lead_limit: 2,
        ..Default::default()
    })
    .await;
    let forwarded = HeaderName::from_static("x-forwarded-for");

    let mut created = 0;
    for i in 0..10 {
        let response = h
            .server
            .post("/api/contact")
            .add_header(
                forwarded.clone(),
                HeaderValue::from_str(&format!("10.9.9.{}", i)).unwrap(),
            )
            .json(&contact_body())
            .await;
        if response.status_code() == StatusCode::CREATED {
            created += 1;
        } else {
            response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    assert_eq!(created, 2);
    assert_eq!(h.storage.get_contacts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn edge_profile_keys_on_cloudflare_ip_only() {
    let h = harness(Options {
        profile: DeploymentProfile::Edge,
        lead_limit: 1,
        ..Default::default()
    })
    .await;
    let cf = HeaderName::from_static("cf-connecting-ip");
    let forwarded = HeaderName::from_static("x-forwarded-for");

    h.server
        .post("/api/contact")
        .add_header(cf.clone(), HeaderValue::from_static("203.0.113.7"))
        .add_header(forwarded.clone(), HeaderValue::from_static("10.0.0.1"))
        .json(&contact_body())
        .await
        .assert_status_ok();

    h.server
        .post("/api/contact")
        .add_header(cf.clone(), HeaderValue::from_static("203.0.113.7"))
        .add_header(forwarded, HeaderValue::from_static("10.0.0.2"))
        .json(&contact_body())
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    h.server
        .post("/api/contact")
        .add_header(cf, HeaderValue::from_static("203.0.113.8"))
        .json(&contact_body())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn rejected_token_is_forbidden() {
    let h = harness(Options {
        verifier: Some(Arc::new(StubVerifier::rejecting())),
        ..Default::default()
    })
    .await;
    let mut body = contact_body();
    body["token"] = json!("bad-token");

    let response = h.server.post("/api/contact").json(&body).await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Turnstile verification failed"
    );
}

#[tokio::test]
async fn edge_profile_requires_token_and_skips_storage() {
    let h = harness(Options {
        profile: DeploymentProfile::Edge,
        verifier: Some(Arc::new(StubVerifier::accepting())),
        ..Default::default()
    })
    .await;

    let response = h.server.post("/api/contact").json(&contact_body()).await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["message"], "Turnstile token required");

    let mut body = contact_body();
    body["token"] = json!("good-token");
    let response = h.server.post("/api/contact").json(&body).await;
    response.assert_status_ok();
    response.assert_json(&json!({ "success": true, "message": "Message sent successfully" }));

    assert!(h.storage.get_contacts().await.unwrap().is_empty());
    assert_eq!(h.mailer.sent().len(), 1);
}

// ============================================================================
// Auth and admin
// ============================================================================

#[tokio::test]
async fn login_sets_cookie_and_me_works() {
    let h = harness(Options::default()).await;

    let response = h
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": ADMIN_PASSWORD }))
        .await;
    response.assert_status_ok();
    let cookie = response.header(header::SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));

    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();
    let me = h
        .server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["username"], "admin");
    assert_eq!(me.json::<Value>()["role"], "admin");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let h = harness(Options::default()).await;

    let response = h
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": "nope-nope" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_session() {
    let h = harness(Options::default()).await;
    let token = admin_token(&h).await;

    let response = h
        .server
        .post("/api/auth/logout")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response
        .header(header::SET_COOKIE)
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    h.server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_admin() {
    let h = harness(Options::default()).await;

    let response = h.server.get("/api/admin/posts").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["message"], "Not authenticated");

    let user_service = UserService::new(h.storage.clone(), Arc::new(RateLimiter::for_logins()));
    user_service
        .create_user(crate::models::CreateUserInput {
            username: "viewer".to_string(),
            password: "password123".to_string(),
            confirm_password: "password123".to_string(),
            role: None,
        })
        .await
        .unwrap();
    let response = h
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "viewer", "password": "password123" }))
        .await;
    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

    let response = h
        .server
        .get("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["message"], "Not authorized");
}

#[tokio::test]
async fn admin_post_workflow() {
    let h = harness(Options::default()).await;
    let token = admin_token(&h).await;

    // Draft is created but not public
    let response = h
        .server
        .post("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&valid_input_json("Scaling Ventures Responsibly"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let post = response.json::<Value>();
    assert_eq!(post["slug"], "scaling-ventures-responsibly");
    assert_eq!(post["author"], "admin");
    let id = post["id"].as_i64().unwrap();

    h.server.get("/api/blogs").await.assert_json(&json!([]));
    h.server
        .get(&format!("/api/blogs/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Same title again conflicts on the slug
    h.server
        .post("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&valid_input_json("Scaling Ventures Responsibly"))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Publish
    h.server
        .patch(&format!("/api/admin/posts/{}/status", id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "status": "published" }))
        .await
        .assert_status_ok();

    let listed = h.server.get("/api/blogs").await.json::<Value>();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let response = h.server.get(&format!("/api/blogs/{}", id)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "published");

    // Bad status and missing post
    h.server
        .patch(&format!("/api/admin/posts/{}/status", id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "status": "archived" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.server
        .patch("/api/admin/posts/9999/status")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "status": "draft" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_post_validation_errors() {
    let h = harness(Options::default()).await;
    let token = admin_token(&h).await;

    let response = h
        .server
        .post("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Too short", "content": "tiny" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let fields: Vec<String> = response.json::<Value>()["error"]["details"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_string())
        .collect();
    assert!(fields.contains(&"title".to_string()));
    assert!(fields.contains(&"content".to_string()));
    assert!(fields.contains(&"category".to_string()));
}

#[tokio::test]
async fn admin_lists_leads() {
    let h = harness(Options::default()).await;
    let token = admin_token(&h).await;

    h.server.post("/api/contact").json(&contact_body()).await;
    h.server
        .post("/api/newsletter")
        .json(&json!({ "name": "Sam", "email": "sam@example.com" }))
        .await;

    let contacts = h
        .server
        .get("/api/admin/contacts")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json::<Value>();
    assert_eq!(contacts[0]["email"], "jane@example.com");

    let subscribers = h
        .server
        .get("/api/admin/subscribers")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json::<Value>();
    assert_eq!(subscribers[0]["email"], "sam@example.com");
}

fn valid_input_json(title: &str) -> Value {
    let input = valid_input(title);
    json!({
        "title": input.title,
        "content": input.content,
        "description": input.description,
        "category": input.category,
        "tags": input.tags,
    })
}

// ============================================================================
// Content, ventures, sitemap, SPA
// ============================================================================

#[tokio::test]
async fn markdown_posts_are_served() {
    let h = harness(Options::default()).await;

    let list = h.server.get("/api/posts").await.json::<Value>();
    assert_eq!(list[0]["slug"], "why-we-build");
    assert_eq!(list[0]["readingTime"], "1 min read");
    assert!(list[0].get("html").is_none());

    let post = h.server.get("/api/posts/why-we-build").await.json::<Value>();
    assert!(post["html"].as_str().unwrap().contains("<h1>Why</h1>"));

    h.server
        .get("/api/posts/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ventures_are_served() {
    let h = harness(Options::default()).await;

    let list = h.server.get("/api/ventures").await.json::<Value>();
    assert_eq!(list.as_array().unwrap().len(), 5);

    let venture = h.server.get("/api/ventures/zeengo-gpt").await.json::<Value>();
    assert_eq!(venture["schemaType"], "Product");

    h.server
        .get("/api/ventures/unknown")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sitemap_lists_routes() {
    let h = harness(Options::default()).await;

    let response = h.server.get("/sitemap.xml").await;
    response.assert_status_ok();
    let xml = response.text();
    assert!(xml.contains("<loc>https://zeengocorp.com/ventures/yatree</loc>"));
    assert!(xml.contains("<loc>https://zeengocorp.com/blogs/why-we-build</loc>"));
}

#[tokio::test]
async fn spa_fallback_injects_seo() {
    let h = harness(Options::default()).await;

    let response = h.server.get("/ventures/yatree").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("<title>Yatree Mobility | ZeengoCorp Innovations Pvt. Ltd.</title>"));
    assert!(!html.contains("<title>ZeengoCorp</title>"));
    assert!(html.contains(r#"<link rel="canonical" href="https://zeengocorp.com/ventures/yatree">"#));

    let html = h.server.get("/blogs/why-we-build").await.text();
    assert!(html.contains("Why We Build - ZeengoCorp Blog"));
}

#[tokio::test]
async fn static_assets_and_unknown_api_paths() {
    let h = harness(Options::default()).await;

    let response = h.server.get("/assets/app-1a2b.js").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "console.log(1)");
    assert!(response
        .header(header::CACHE_CONTROL)
        .to_str()
        .unwrap()
        .contains("immutable"));

    h.server
        .get("/api/does-not-exist")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
