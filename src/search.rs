//! Links attached to exported rows to help find a book by hand.

const RETAIL_SEARCH_PREFIX: &str = "https://www.fnac.com/SearchResult/ResultList.aspx?SCat=0%211&Search=";
const RETAIL_SEARCH_SUFFIX: &str = "+poche&sft=1&sa=0";
const CATALOG_SEARCH_PREFIX: &str = "https://search.worldcat.org/fr/search?q=";

/// Joins title and author into a query string for the retail search page.
pub fn make_search_string(title: &str, author: &str) -> String {
    let query = if author.is_empty() {
        title.to_string()
    } else {
        format!("{title} {author}")
    };
    query.replace(' ', "+").replace('\'', "%27")
}

/// Retail search link for a paperback edition of the book.
pub fn build_search_url(title: &str, author: &str) -> String {
    format!(
        "{RETAIL_SEARCH_PREFIX}{}{RETAIL_SEARCH_SUFFIX}",
        make_search_string(title, author)
    )
}

/// Library catalogue link for an ISBN.
pub fn build_catalog_url(isbn: &str) -> String {
    format!("{CATALOG_SEARCH_PREFIX}{isbn}&offset=1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_title_and_author() {
        let url = build_search_url("Le Petit Prince", "Saint-Exupéry");
        assert!(url.contains("Le+Petit+Prince+Saint-Exupéry"));
        assert!(!url.contains(' '));
        assert_eq!(
            url,
            "https://www.fnac.com/SearchResult/ResultList.aspx?SCat=0%211&Search=Le+Petit+Prince+Saint-Exupéry+poche&sft=1&sa=0"
        );
    }

    #[test]
    fn escapes_apostrophes() {
        assert_eq!(make_search_string("L'Étranger", ""), "L%27Étranger");
        assert!(build_search_url("L'Étranger", "Camus").contains("L%27Étranger+Camus"));
    }

    #[test]
    fn empty_author_adds_no_separator() {
        assert_eq!(make_search_string("Dune", ""), "Dune");
    }

    #[test]
    fn catalog_url_embeds_isbn() {
        assert_eq!(
            build_catalog_url("9782070612758"),
            "https://search.worldcat.org/fr/search?q=9782070612758&offset=1"
        );
    }
}
