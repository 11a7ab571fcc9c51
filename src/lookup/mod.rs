//! Resolution of ISBNs and free-text titles into catalogue records.

pub mod catalog;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::batch::{BatchOptions, CancellationFlag, Throttle, run_batch};
use crate::error::{Result, ToolError};
use crate::isbn;
use crate::model::{BookRecord, LookupOutcome};

pub use catalog::CatalogClient;

/// A bibliographic catalogue queried by ISBN or by words.
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Title, authors and publisher of the edition with this ISBN-13.
    async fn fetch_metadata(&self, isbn: &str) -> Result<BookRecord>;

    /// Free-text description of the edition, if the catalogue has one.
    async fn fetch_description(&self, isbn: &str) -> Result<Option<String>>;

    /// Best matching ISBN-13 for a word query.
    async fn isbn_from_words(&self, words: &str) -> Result<Option<String>>;

    /// Key of the work this ISBN is an edition of.
    async fn work_of(&self, isbn: &str) -> Result<String>;

    /// ISBNs of every edition listed under `work`.
    async fn work_editions(&self, work: &str) -> Result<Vec<String>>;
}

/// Drives a [`MetadataService`] one item or one batch at a time.
pub struct Resolver<S> {
    service: S,
    options: BatchOptions,
    cancel: CancellationFlag,
}

impl<S: MetadataService> Resolver<S> {
    pub fn new(service: S, options: BatchOptions, cancel: CancellationFlag) -> Self {
        Self {
            service,
            options,
            cancel,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Looks up the record of one ISBN.
    pub async fn resolve_by_identifier(&self, id: &str) -> Result<BookRecord> {
        let throttle = Throttle::new(self.options.delay);
        self.resolve_identifier_with(id, &throttle).await
    }

    /// Searches an ISBN for a title and author. `Ok(None)` means unresolved.
    pub async fn resolve_by_text(&self, title: &str, author: &str) -> Result<Option<String>> {
        let throttle = Throttle::new(self.options.delay);
        self.resolve_text_with(title, author, &throttle).await
    }

    /// Resolves every ISBN independently. One slot per input, in order.
    #[instrument(level = "info", skip_all, fields(count = ids.len()))]
    pub async fn resolve_identifiers(&self, ids: &[String]) -> Result<Vec<LookupOutcome<BookRecord>>> {
        let outcomes = run_batch(ids.to_vec(), self.options, &self.cancel, |id, throttle| async move {
            match self.resolve_identifier_with(&id, &throttle).await {
                Ok(record) => LookupOutcome::Resolved(record),
                Err(error) => {
                    warn!(isbn = %id, %error, "book lookup failed");
                    LookupOutcome::Failed(error.to_string())
                }
            }
        })
        .await?;
        let failed = outcomes.iter().filter(|outcome| outcome.is_failed()).count();
        info!(resolved = outcomes.len() - failed, failed, "book information retrieved");
        Ok(outcomes)
    }

    /// Searches ISBNs for `(title, author)` pairs. One slot per input, in order.
    #[instrument(level = "info", skip_all, fields(count = queries.len()))]
    pub async fn resolve_texts(
        &self,
        queries: &[(String, String)],
    ) -> Result<Vec<LookupOutcome<String>>> {
        let outcomes = run_batch(
            queries.to_vec(),
            self.options,
            &self.cancel,
            |(title, author), throttle| async move {
                match self.resolve_text_with(&title, &author, &throttle).await {
                    Ok(Some(isbn)) => LookupOutcome::Resolved(isbn),
                    Ok(None) => LookupOutcome::NotFound,
                    Err(error) => {
                        warn!(%title, %error, "ISBN search failed");
                        LookupOutcome::Failed(error.to_string())
                    }
                }
            },
        )
        .await?;
        info!(
            found = outcomes.iter().filter(|o| matches!(o, LookupOutcome::Resolved(_))).count(),
            "ISBN search completed"
        );
        Ok(outcomes)
    }

    pub(crate) async fn resolve_identifier_with(
        &self,
        id: &str,
        throttle: &Throttle,
    ) -> Result<BookRecord> {
        let cleaned = isbn::clean(id);
        let canonical = isbn::canonical(&cleaned)
            .ok_or_else(|| ToolError::lookup(id, "not a valid ISBN"))?;

        throttle.wait().await;
        let mut record = self.service.fetch_metadata(&canonical).await?;
        record.identifier.get_or_insert_with(|| canonical.clone());
        record.isbn = Some(cleaned);

        throttle.wait().await;
        match self.service.fetch_description(&canonical).await {
            Ok(description) => record.description = description,
            Err(error) => debug!(isbn = %canonical, %error, "no description"),
        }
        Ok(record)
    }

    pub(crate) async fn resolve_text_with(
        &self,
        title: &str,
        author: &str,
        throttle: &Throttle,
    ) -> Result<Option<String>> {
        let words = format!("{title} {author}");
        let words = words.trim();
        if words.is_empty() {
            return Ok(None);
        }
        throttle.wait().await;
        self.service.isbn_from_words(words).await
    }
}
