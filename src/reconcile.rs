use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::model::{
    BookRecord, NewBook, ObservedCollection, ReconciliationResult, ReferenceCollection,
};
use crate::normalize::normalize;
use crate::search::build_search_url;

/// Splits a want-list into titles already held, with the number of copies
/// still missing, and titles absent from the reference collection.
///
/// Titles are matched on their [`normalize`]d form. When the reference holds
/// several rows with the same key, the first one is used.
pub fn reconcile(
    reference: &ReferenceCollection,
    observed: &ObservedCollection,
) -> ReconciliationResult {
    let index = index_by_title(reference);
    let mut result = ReconciliationResult::default();

    for wanted in &observed.records {
        let key = normalize(&wanted.title);
        match index.get(key.as_str()) {
            Some(held) => {
                let delta = i64::from(wanted.quantity) - i64::from(held.quantity);
                if delta > 0 {
                    result.existing.push(missing_copies(held, wanted, delta));
                } else {
                    debug!(title = %wanted.title, delta, "enough copies held");
                }
            }
            None => result.new.push(NewBook {
                url: build_search_url(&wanted.title, &wanted.author),
                record: wanted.clone(),
            }),
        }
    }

    result
}

fn index_by_title(reference: &ReferenceCollection) -> HashMap<String, &BookRecord> {
    let mut index = HashMap::with_capacity(reference.records.len());
    for record in &reference.records {
        match index.entry(normalize(&record.title)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(slot) => {
                warn!(
                    title = %record.title,
                    key = %slot.key(),
                    "duplicate title in reference collection, keeping first row"
                );
            }
        }
    }
    index
}

fn missing_copies(held: &BookRecord, wanted: &BookRecord, delta: i64) -> BookRecord {
    BookRecord {
        id: held.id.clone(),
        title: held.title.clone(),
        quantity: u32::try_from(delta).unwrap_or(u32::MAX),
        destination: wanted.destination.clone(),
        ..BookRecord::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, quantity: u32) -> BookRecord {
        BookRecord::new(title, "").with_quantity(quantity)
    }

    fn held(id: &str, title: &str, quantity: u32) -> BookRecord {
        let mut record = book(title, quantity);
        record.id = Some(id.to_string());
        record
    }

    #[test]
    fn positive_delta_is_reported() {
        let reference = ReferenceCollection::from(vec![held("7", "Dune", 2)]);
        let mut wanted = book("Dune", 5);
        wanted.destination = Some("Salon".into());
        let observed = ObservedCollection::from(vec![wanted]);

        let result = reconcile(&reference, &observed);
        assert_eq!(result.existing.len(), 1);
        assert_eq!(result.existing[0].title, "Dune");
        assert_eq!(result.existing[0].quantity, 3);
        assert_eq!(result.existing[0].id.as_deref(), Some("7"));
        assert_eq!(result.existing[0].destination.as_deref(), Some("Salon"));
        assert!(result.new.is_empty());
    }

    #[test]
    fn non_positive_delta_is_dropped() {
        let reference = ReferenceCollection::from(vec![book("Dune", 2)]);
        for quantity in [0, 1, 2] {
            let observed = ObservedCollection::from(vec![book("Dune", quantity)]);
            let result = reconcile(&reference, &observed);
            assert!(result.existing.is_empty());
            assert!(result.new.is_empty());
        }
    }

    #[test]
    fn join_ignores_case_and_accents() {
        let reference = ReferenceCollection::from(vec![book("L'École des femmes", 1)]);
        let observed = ObservedCollection::from(vec![book("l'ecole des FEMMES", 4)]);
        let result = reconcile(&reference, &observed);
        assert_eq!(result.existing[0].quantity, 3);
        assert_eq!(result.existing[0].title, "L'École des femmes");
    }

    #[test]
    fn unknown_titles_are_new_with_link() {
        let reference = ReferenceCollection::default();
        let observed = ObservedCollection::from(vec![BookRecord::new("Foo", "Bar").with_quantity(1)]);
        let result = reconcile(&reference, &observed);
        assert!(result.existing.is_empty());
        assert_eq!(result.new.len(), 1);
        assert_eq!(result.new[0].record.title, "Foo");
        assert!(result.new[0].url.contains("Search=Foo+Bar+poche"));
    }

    #[test]
    fn empty_want_list_gives_empty_result() {
        let reference = ReferenceCollection::from(vec![book("Dune", 1)]);
        let result = reconcile(&reference, &ObservedCollection::default());
        assert_eq!(result, ReconciliationResult::default());
    }

    #[test]
    fn first_reference_row_wins_on_duplicate_titles() {
        let reference = ReferenceCollection::from(vec![
            held("1", "Dune", 1),
            held("2", "DUNE", 4),
        ]);
        let observed = ObservedCollection::from(vec![book("Dune", 3)]);
        let result = reconcile(&reference, &observed);
        assert_eq!(result.existing.len(), 1);
        assert_eq!(result.existing[0].id.as_deref(), Some("1"));
        assert_eq!(result.existing[0].quantity, 2);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let reference = ReferenceCollection::from(vec![book("Dune", 1)]);
        let observed = ObservedCollection::from(vec![book("Dune", 3), book("Foo", 1)]);
        let before = (reference.clone(), observed.clone());
        let _ = reconcile(&reference, &observed);
        assert_eq!((reference, observed), before);
    }
}
