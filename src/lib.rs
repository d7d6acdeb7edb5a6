//! ZeengoCorp venture site
//!
//! Backend for the company website: lead capture, the blog CMS and its admin,
//! markdown posts, the ventures catalogue, and SEO for the client bundle.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod storage;
