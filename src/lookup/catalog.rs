use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::MetadataService;
use crate::error::{Result, ToolError};
use crate::isbn;
use crate::model::BookRecord;

pub const GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1";
pub const OPEN_LIBRARY_URL: &str = "https://openlibrary.org";

/// HTTP client for Google Books (metadata, descriptions, word search) and
/// Open Library (edition lists).
pub struct CatalogClient {
    client: reqwest::Client,
    metadata_base_url: String,
    editions_base_url: String,
}

impl CatalogClient {
    pub fn new(
        metadata_base_url: impl Into<String>,
        editions_base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            metadata_base_url: metadata_base_url.into(),
            editions_base_url: editions_base_url.into(),
        })
    }

    async fn get_json(&self, url: Url, subject: &str) -> Result<Value> {
        debug!(%url, "catalogue request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::lookup(subject, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::lookup(subject, format!("HTTP {}", status.as_u16())));
        }
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::lookup(subject, e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ToolError::ParseFailure(e.to_string()))
    }

    async fn volumes(&self, query: &str, subject: &str) -> Result<Vec<Value>> {
        let mut url = build_url(&self.metadata_base_url, &["volumes"])?;
        url.query_pairs_mut().append_pair("q", query);
        let json = self.get_json(url, subject).await?;
        if !json.is_object() {
            return Err(ToolError::ParseFailure(format!(
                "unexpected volumes payload for {subject}"
            )));
        }
        Ok(json
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    async fn first_volume(&self, isbn: &str) -> Result<Value> {
        self.volumes(&format!("isbn:{isbn}"), isbn)
            .await?
            .into_iter()
            .find_map(|item| item.get("volumeInfo").cloned())
            .ok_or_else(|| ToolError::lookup(isbn, "book not found"))
    }
}

#[async_trait]
impl MetadataService for CatalogClient {
    async fn fetch_metadata(&self, isbn: &str) -> Result<BookRecord> {
        let info = self.first_volume(isbn).await?;
        let title = volume_title(&info)
            .ok_or_else(|| ToolError::ParseFailure(format!("volume without title for {isbn}")))?;
        let mut record = BookRecord::new(title, volume_authors(&info));
        record.publisher = info
            .get("publisher")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        record.identifier = Some(volume_isbn13(&info).unwrap_or_else(|| isbn.to_string()));
        Ok(record)
    }

    async fn fetch_description(&self, isbn: &str) -> Result<Option<String>> {
        let info = self.first_volume(isbn).await?;
        Ok(info
            .get("description")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(ToOwned::to_owned))
    }

    async fn isbn_from_words(&self, words: &str) -> Result<Option<String>> {
        let items = self.volumes(words, words).await?;
        Ok(items
            .iter()
            .filter_map(|item| item.get("volumeInfo"))
            .find_map(volume_isbn13))
    }

    async fn work_of(&self, isbn: &str) -> Result<String> {
        let edition_url = build_url(&self.editions_base_url, &["isbn", &format!("{isbn}.json")])?;
        let edition = self.get_json(edition_url, isbn).await?;
        edition
            .get("works")
            .and_then(Value::as_array)
            .and_then(|works| works.first())
            .and_then(|work| work.get("key"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| ToolError::ParseFailure(format!("edition without work for {isbn}")))
    }

    async fn work_editions(&self, work: &str) -> Result<Vec<String>> {
        let mut segments: Vec<&str> = work.split('/').filter(|s| !s.is_empty()).collect();
        segments.push("editions.json");
        let mut works_url = build_url(&self.editions_base_url, &segments)?;
        works_url.query_pairs_mut().append_pair("limit", "100");
        let listing = self.get_json(works_url, work).await?;

        let mut found = Vec::new();
        for entry in listing
            .get("entries")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
        {
            for field in ["isbn_13", "isbn_10"] {
                let values = entry.get(field).and_then(Value::as_array);
                for value in values.into_iter().flatten().filter_map(Value::as_str) {
                    if let Some(canonical) = isbn::canonical(value) {
                        found.push(canonical);
                    }
                }
            }
        }
        Ok(found)
    }
}

fn build_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| ToolError::Config(format!("invalid URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ToolError::Config(format!("URL {base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn volume_title(info: &Value) -> Option<String> {
    let title = info.get("title").and_then(Value::as_str)?.trim();
    if title.is_empty() {
        return None;
    }
    Some(match info.get("subtitle").and_then(Value::as_str) {
        Some(subtitle) if !subtitle.trim().is_empty() => format!("{title}: {}", subtitle.trim()),
        _ => title.to_string(),
    })
}

fn volume_authors(info: &Value) -> String {
    info.get("authors")
        .and_then(Value::as_array)
        .map(|authors| {
            authors
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn volume_isbn13(info: &Value) -> Option<String> {
    let identifiers = info.get("industryIdentifiers").and_then(Value::as_array)?;
    let by_kind = |kind: &str| {
        identifiers
            .iter()
            .filter(|entry| entry.get("type").and_then(Value::as_str) == Some(kind))
            .filter_map(|entry| entry.get("identifier").and_then(Value::as_str))
            .find_map(isbn::canonical)
    };
    by_kind("ISBN_13").or_else(|| by_kind("ISBN_10"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prefers_isbn13_identifier() {
        let info = json!({
            "title": "Dune",
            "industryIdentifiers": [
                {"type": "ISBN_10", "identifier": "0441172717"},
                {"type": "ISBN_13", "identifier": "9780441172719"}
            ]
        });
        assert_eq!(volume_isbn13(&info).as_deref(), Some("9780441172719"));
    }

    #[test]
    fn falls_back_to_isbn10() {
        let info = json!({
            "industryIdentifiers": [{"type": "ISBN_10", "identifier": "0306406152"}]
        });
        assert_eq!(volume_isbn13(&info).as_deref(), Some("9780306406157"));
    }

    #[test]
    fn joins_authors_and_subtitle() {
        let info = json!({
            "title": "Le Petit Prince",
            "subtitle": "avec les dessins de l'auteur",
            "authors": ["Antoine de Saint-Exupéry", "Other"]
        });
        assert_eq!(
            volume_title(&info).as_deref(),
            Some("Le Petit Prince: avec les dessins de l'auteur")
        );
        assert_eq!(volume_authors(&info), "Antoine de Saint-Exupéry, Other");
    }

    #[test]
    fn url_segments_are_appended() {
        let url = build_url("https://www.googleapis.com/books/v1", &["volumes"]).unwrap();
        assert_eq!(url.as_str(), "https://www.googleapis.com/books/v1/volumes");
        let url = build_url("http://127.0.0.1:1234/", &["isbn", "1.json"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:1234/isbn/1.json");
    }
}
