//! Article extraction for the Newsdesk bot
//!
//! This crate finds candidate article URLs in message text and resolves a
//! display title for them by fetching the page and reading its Open-Graph
//! title meta tag or `<title>` element.

pub mod article;
pub mod error;
pub mod links;

pub use article::ArticleFetcher;
pub use error::ExtractError;
pub use links::first_url;
