//! `sitemap.xml` generation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context as TeraContext, Tera};

use super::content::ContentLibrary;
use super::markdown::html_escape;
use super::ventures;

const SITEMAP_TEMPLATE_NAME: &str = "sitemap";

const SITEMAP_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{%- for entry in entries %}
  <url>
    <loc>{{ entry.loc | xml }}</loc>
    <lastmod>{{ lastmod }}</lastmod>
    <changefreq>{{ entry.changefreq }}</changefreq>
    <priority>{{ entry.priority }}</priority>
  </url>
{%- endfor %}
</urlset>
"#;

/// Client routes that always exist, relative to the site root
pub const STATIC_ROUTES: &[&str] = &[
    "",
    "about",
    "ventures",
    "services",
    "contact",
    "blogs",
    "resources",
    "investors",
    "careers",
    "privacy",
    "terms",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

pub fn priority(route: &str) -> &'static str {
    match route {
        "" => "1.0",
        "about" | "ventures" | "services" => "0.9",
        "blogs" | "contact" => "0.8",
        r if r.starts_with("ventures/") => "0.7",
        "resources" | "investors" | "careers" => "0.6",
        r if r.starts_with("blogs/") => "0.5",
        _ => "0.3",
    }
}

pub fn changefreq(route: &str) -> &'static str {
    match route {
        "" | "ventures" | "blogs" => "weekly",
        "privacy" | "terms" => "yearly",
        _ => "monthly",
    }
}

fn xml_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(html_escape(s))),
        other => Ok(other.clone()),
    }
}

pub struct SitemapGenerator {
    tera: Tera,
    base_url: String,
}

impl SitemapGenerator {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("xml", xml_filter);
        tera.add_raw_template(SITEMAP_TEMPLATE_NAME, SITEMAP_TEMPLATE)
            .context("Failed to compile sitemap template")?;
        Ok(Self {
            tera,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Static routes, then every venture, then every markdown post
    pub fn entries(&self, content: &ContentLibrary) -> Vec<SitemapEntry> {
        let routes = STATIC_ROUTES
            .iter()
            .map(|r| r.to_string())
            .chain(ventures::all().iter().map(|v| format!("ventures/{}", v.slug)))
            .chain(content.slugs().map(|s| format!("blogs/{}", s)));

        routes
            .map(|route| SitemapEntry {
                loc: format!("{}/{}", self.base_url, route),
                changefreq: changefreq(&route),
                priority: priority(&route),
            })
            .collect()
    }

    pub fn render(&self, content: &ContentLibrary, today: NaiveDate) -> Result<String> {
        let mut ctx = TeraContext::new();
        ctx.insert("entries", &self.entries(content));
        ctx.insert("lastmod", &today.format("%Y-%m-%d").to_string());
        self.tera
            .render(SITEMAP_TEMPLATE_NAME, &ctx)
            .context("Failed to render sitemap")
    }
}
