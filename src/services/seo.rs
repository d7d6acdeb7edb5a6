//! SEO head tags for the single-page app
//!
//! The client renders pages in the browser, so crawlers only see what the
//! server injects into `index.html`. [`page_meta`] maps a request path to the
//! page's metadata and [`SeoRenderer`] turns it into `<head>` markup.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use tera::{Context as TeraContext, Tera};

use super::content::ContentLibrary;
use super::markdown::html_escape;
use super::ventures::{self, SchemaType};
use crate::config::SiteConfig;

const HEAD_TEMPLATE_NAME: &str = "seo_head";

const HEAD_TEMPLATE: &str = r#"<title>{{ full_title | attr }}</title>
<meta name="description" content="{{ description | attr }}">
<meta name="robots" content="{{ robots }}">
<link rel="canonical" href="{{ canonical | attr }}">
<meta property="og:site_name" content="{{ site_name | attr }}">
<meta property="og:title" content="{{ full_title | attr }}">
<meta property="og:description" content="{{ description | attr }}">
<meta property="og:type" content="website">
<meta property="og:url" content="{{ canonical | attr }}">
<meta property="og:image" content="{{ image | attr }}">
<meta name="twitter:card" content="summary_large_image">
<meta name="twitter:creator" content="{{ twitter_handle | attr }}">
<meta name="twitter:title" content="{{ full_title | attr }}">
<meta name="twitter:description" content="{{ description | attr }}">
<meta name="twitter:image" content="{{ image | attr }}">
{%- if json_ld %}
<script type="application/ld+json">{{ json_ld }}</script>
{%- endif %}
"#;

/// Metadata for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    /// Absolute, or relative to the site URL
    pub url: Option<String>,
    pub image: Option<String>,
    pub json_ld: Option<Value>,
    pub no_index: bool,
}

impl SeoMeta {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn with_json_ld(mut self, json_ld: Value) -> Self {
        self.json_ld = Some(json_ld);
        self
    }

    pub fn no_index(mut self) -> Self {
        self.no_index = true;
        self
    }
}

/// Tera filter escaping a value for a double-quoted attribute or text node
fn attr_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::String(html_escape(&s)))
}

pub struct SeoRenderer {
    tera: Tera,
    site: SiteConfig,
}

impl SeoRenderer {
    pub fn new(site: SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("attr", attr_filter);
        tera.add_raw_template(HEAD_TEMPLATE_NAME, HEAD_TEMPLATE)
            .context("Failed to compile SEO head template")?;
        Ok(Self { tera, site })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn full_title(&self, title: &str) -> String {
        format!("{} | {}", title, self.site.name)
    }

    /// Absolute URLs are kept, relative ones are joined to the site URL and a
    /// missing URL means the site root.
    pub fn canonical_url(&self, url: Option<&str>) -> String {
        match url {
            Some(u) if u.starts_with("http://") || u.starts_with("https://") => u.to_string(),
            Some(u) => format!("{}{}", self.site.url, u),
            None => self.site.url.clone(),
        }
    }

    pub fn render(&self, meta: &SeoMeta) -> Result<String> {
        let json_ld = meta
            .json_ld
            .as_ref()
            .map(|v| serde_json::to_string(v).map(|s| s.replace("</", "<\\/")))
            .transpose()
            .context("Failed to serialize JSON-LD")?;

        let mut ctx = TeraContext::new();
        ctx.insert("full_title", &self.full_title(&meta.title));
        ctx.insert("description", &meta.description);
        ctx.insert(
            "robots",
            if meta.no_index {
                "noindex, nofollow"
            } else {
                "index, follow"
            },
        );
        ctx.insert("canonical", &self.canonical_url(meta.url.as_deref()));
        ctx.insert("site_name", &self.site.name);
        ctx.insert(
            "image",
            meta.image.as_deref().unwrap_or(&self.site.default_image),
        );
        ctx.insert("twitter_handle", &self.site.twitter_handle);
        ctx.insert("json_ld", &json_ld);

        self.tera
            .render(HEAD_TEMPLATE_NAME, &ctx)
            .context("Failed to render SEO head")
    }
}

/// Insert `tags` before `</head>`, dropping the document's own `<title>`.
/// Documents without a head are returned unchanged.
pub fn inject_head(html: &str, tags: &str) -> String {
    let mut result = html.to_string();

    if let Some(start) = result.find("<title>") {
        if let Some(end) = result[start..].find("</title>") {
            result.replace_range(start..start + end + "</title>".len(), "");
        }
    }

    if let Some(pos) = result.find("</head>") {
        result.insert_str(pos, tags);
    }
    result
}

/// Metadata for a client route. Unknown routes get a `noindex` page.
pub fn page_meta(path: &str, content: &ContentLibrary, site: &SiteConfig) -> SeoMeta {
    let route = path.trim_matches('/');

    match route {
        "" => SeoMeta::new(
            "ZeengoCorp - We Build What Matters",
            "ZeengoCorp Innovations is a venture builder and innovation studio. We fund, build, and scale high-impact ventures in AI, real estate, security, mobility, and digital publishing.",
        )
        .with_url("/")
        .with_json_ld(organization_schema(site)),
        "about" => SeoMeta::new(
            "About Us - We Build What Matters",
            "ZeengoCorp combines human-centered design, engineering discipline, and rapid validation to turn ideas into products that create measurable value.",
        )
        .with_url("/about")
        .with_json_ld(founder_schema(site)),
        "services" => SeoMeta::new(
            "Our Services",
            "Real estate solutions, security services and AI-driven tools from ZeengoCorp Innovations.",
        )
        .with_url("/services"),
        "contact" => SeoMeta::new(
            "Contact Us",
            "Get in touch with ZeengoCorp about partnerships, investments and ventures.",
        )
        .with_url("/contact"),
        "blogs" => SeoMeta::new(
            "Blog - Insights from ZeengoCorp",
            "Articles on venture building, technology and growth from the ZeengoCorp team.",
        )
        .with_url("/blogs"),
        "resources" => SeoMeta::new(
            "Resources",
            "Guides, publications and resources from ZeengoCorp Innovations.",
        )
        .with_url("/resources"),
        "investors" => SeoMeta::new(
            "Investor Relations",
            "ZeengoCorp Investor Relations. Financial highlights, corporate governance, and sustainable growth strategy.",
        )
        .with_url("/investors"),
        "careers" => SeoMeta::new(
            "Careers at ZeengoCorp",
            "Join the team building what matters. Explore career opportunities at ZeengoCorp Innovations.",
        )
        .with_url("/careers"),
        "ventures" => SeoMeta::new(
            "Our Companies & Ventures",
            "Explore ZeengoCorp's portfolio of companies across Real Estate, Artificial Intelligence, Security, and Mobility.",
        )
        .with_url("/ventures")
        .with_json_ld(venture_list_schema(site)),
        "privacy" => SeoMeta::new(
            "Privacy Policy - ZeengoCorp",
            "Privacy Policy for ZeengoCorp Innovations Pvt. Ltd. How we collect, use, and protect your data.",
        )
        .with_url("/privacy"),
        "terms" => SeoMeta::new(
            "Terms of Service - ZeengoCorp",
            "Terms and Conditions for using ZeengoCorp Innovations Pvt. Ltd. services and website.",
        )
        .with_url("/terms"),
        _ => derived_meta(route, content, site),
    }
}

fn derived_meta(route: &str, content: &ContentLibrary, site: &SiteConfig) -> SeoMeta {
    if let Some(slug) = route.strip_prefix("ventures/") {
        if let Some(venture) = ventures::find(slug) {
            let url = format!("/ventures/{}", venture.slug);
            return SeoMeta::new(venture.title, venture.description)
                .with_json_ld(json!({
                    "@context": "https://schema.org",
                    "@type": match venture.schema_type {
                        SchemaType::Product => "Product",
                        SchemaType::Service => "Service",
                    },
                    "name": venture.title,
                    "description": venture.description,
                    "brand": { "@type": "Brand", "name": "ZeengoCorp Innovations" },
                    "url": format!("{}{}", site.url, url),
                }))
                .with_url(url);
        }
    }

    if let Some(slug) = route.strip_prefix("blogs/") {
        if let Some(post) = content.get(slug) {
            return SeoMeta::new(
                format!("{} - ZeengoCorp Blog", post.summary.title),
                post.summary.description.clone(),
            )
            .with_url(format!("/blogs/{}", post.summary.slug))
            .with_image(post.summary.image.clone());
        }
    }

    if route == "admin" || route.starts_with("admin/") {
        return SeoMeta::new("Admin", "Site administration").no_index();
    }

    SeoMeta::new("Page Not Found", "The page you are looking for does not exist.").no_index()
}

fn organization_schema(site: &SiteConfig) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": site.name,
        "alternateName": "ZeengoCorp",
        "url": site.url,
        "logo": format!("{}/logo.png", site.url),
        "description": "ZeengoCorp is a venture builder and innovation studio that funds, builds, and scales high-impact ventures in AI, real estate, security, mobility, and digital publishing.",
        "foundingDate": "2024",
        "founder": { "@type": "Person", "name": "Abhishek Rajput" },
        "address": { "@type": "PostalAddress", "addressCountry": "IN" },
        "sameAs": ["https://www.linkedin.com/company/zeengocorp"],
        "contactPoint": {
            "@type": "ContactPoint",
            "contactType": "customer service",
            "url": format!("{}/contact", site.url),
        },
    })
}

fn founder_schema(site: &SiteConfig) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Person",
        "name": "Abhishek Rajput",
        "jobTitle": "Founder & CEO",
        "affiliation": { "@type": "Organization", "name": site.name },
        "url": format!("{}/about", site.url),
        "sameAs": [
            "https://www.linkedin.com/in/abhishekrajput",
            "https://twitter.com/abhishekrajput",
        ],
        "description": "Founder of ZeengoCorp. Dedicated to building scalable, human-centered technologies.",
    })
}

fn venture_list_schema(site: &SiteConfig) -> Value {
    let items: Vec<Value> = ventures::all()
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "url": format!("{}/ventures/{}", site.url, v.slug),
                "name": v.title,
                "description": v.description,
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "itemListElement": items,
    })
}
