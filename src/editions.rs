//! Expansion of ISBNs to every edition of the same work.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::batch::{Throttle, run_batch};
use crate::error::Result;
use crate::isbn;
use crate::lookup::{MetadataService, Resolver};

/// Removes exact duplicates, keeping the first occurrence of each identifier.
pub fn dedup<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .map(Into::into)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

impl<S: MetadataService> Resolver<S> {
    /// All known edition ISBNs of `identifier`.
    ///
    /// A failed lookup means no alternate edition is known, and the identifier
    /// itself is returned.
    pub async fn expand_editions(&self, identifier: &str) -> Vec<String> {
        let throttle = Throttle::new(self.options().delay);
        self.expand_editions_with(identifier, &throttle).await
    }

    async fn expand_editions_with(&self, identifier: &str, throttle: &Throttle) -> Vec<String> {
        let mut found = vec![identifier.to_string()];

        throttle.wait().await;
        let work = match self.service().work_of(identifier).await {
            Ok(work) => work,
            Err(error) => {
                debug!(isbn = %identifier, %error, "no work known");
                return found;
            }
        };

        throttle.wait().await;
        match self.service().work_editions(&work).await {
            Ok(editions) => found.extend(editions),
            Err(error) => debug!(isbn = %identifier, %work, %error, "no editions known"),
        }
        found
    }

    /// Expands every identifier, then returns the cleaned, deduplicated union.
    #[instrument(level = "info", skip_all, fields(count = identifiers.len()))]
    pub async fn expand_all(&self, identifiers: &[String]) -> Result<Vec<String>> {
        let expanded = run_batch(
            identifiers.to_vec(),
            self.options(),
            self.cancellation(),
            |id, throttle| async move { self.expand_editions_with(&id, &throttle).await },
        )
        .await?;
        let unique = dedup(
            expanded
                .into_iter()
                .flatten()
                .map(|id| isbn::clean(&id))
                .filter(|id| !id.is_empty()),
        );
        info!(editions = unique.len(), "editions expanded");
        Ok(unique)
    }
}
