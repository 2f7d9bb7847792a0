#![forbid(unsafe_code)]

pub mod build;
pub mod cli;
pub mod compile;
pub mod crawl;
pub mod css;
pub mod embeds;
pub mod formats;
pub mod fragment_store;
pub mod html;
pub mod layout;
pub mod localize;
pub mod logging;
pub mod migrate;
pub mod previews;
pub mod rules;
pub mod sitemap;
