//! ZeengoCorp venture site server

use anyhow::Result;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use venture_site::{
    api::{self, AppState, ClientIpSource},
    cache::MemoryCache,
    config::Config,
    services::{
        create_mailer, BlogService, ContentLibrary, LeadService, RateLimiter, SeoRenderer,
        SitemapGenerator, TurnstileVerifier, UserService,
    },
    storage::create_storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venture_site=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ZeengoCorp venture site...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded (lead profile: {:?})", config.leads.profile);

    // Storage backend (runs migrations for the database driver)
    let storage = create_storage(&config).await?;

    let cache = Arc::new(MemoryCache::with_ttl(Duration::from_secs(
        config.cache.ttl_seconds,
    )));

    // Outbound integrations
    let verifier = TurnstileVerifier::from_config(&config.turnstile)?;
    if verifier.is_none() {
        tracing::warn!("TURNSTILE_SECRET_KEY not set, skipping human verification");
    }
    let mailer = create_mailer(&config.mail)?;

    // Services
    let lead_limiter = Arc::new(RateLimiter::new(
        config.leads.rate_limit_max,
        chrono::Duration::seconds(config.leads.rate_limit_window_seconds),
    ));
    let login_limiter = Arc::new(RateLimiter::for_logins());

    let lead_service = Arc::new(LeadService::new(
        storage.clone(),
        verifier,
        mailer,
        lead_limiter.clone(),
        config.leads.profile,
        config.mail.recipient.clone(),
    ));
    let user_service = Arc::new(UserService::new(storage.clone(), login_limiter.clone()));
    let blog_service = Arc::new(BlogService::new(storage.clone(), cache));

    if let (Some(username), Some(password)) = (&config.admin.username, &config.admin.password) {
        user_service.ensure_admin(username, password).await?;
    } else {
        tracing::warn!("No admin credentials configured, the admin API is unusable");
    }

    // Content and SEO
    let content = ContentLibrary::load(&config.content.posts_dir)?;
    tracing::info!("Loaded {} markdown posts", content.len());
    let seo = SeoRenderer::new(config.site.clone())?;
    let sitemap = SitemapGenerator::new(&config.site.url)?;

    let state = AppState {
        storage,
        user_service: user_service.clone(),
        blog_service,
        lead_service,
        content: Arc::new(content),
        seo: Arc::new(seo),
        sitemap: Arc::new(sitemap),
        site: Arc::new(config.site.clone()),
        static_dir: Arc::new(PathBuf::from(&config.server.static_dir)),
        client_ip_source: ClientIpSource::from_config(
            config.leads.profile,
            config.server.trust_forwarded_headers,
        ),
    };

    // Periodic cleanup (every 5 minutes)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            lead_limiter.cleanup().await;
            login_limiter.cleanup().await;
            match user_service.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Removed {} expired sessions", n),
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
        }
    });

    // Build router
    let app = api::build_router(state, &config.server.cors_origin)?;

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
