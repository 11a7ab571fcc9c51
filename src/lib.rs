//! Core library for the book-infos command line application.
//!
//! The library reconciles a want-list of books against the inventory already
//! owned and looks up bibliographic data for the titles. Titles are matched
//! through [`normalize`], catalogue lookups live in [`lookup`] and
//! [`editions`] and fan out through [`batch`], the join itself is in
//! [`reconcile`], spreadsheet adapters live under [`io`] and [`tables`], and
//! the stages exposed by the CLI are in [`pipeline`].

pub mod batch;
pub mod config;
pub mod editions;
pub mod error;
pub mod io;
pub mod isbn;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod search;
pub mod tables;

pub use error::{Result, ToolError};
pub use normalize::normalize;
pub use reconcile::reconcile;
pub use search::build_search_url;
