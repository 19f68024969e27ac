//! Translation of listing parameters into store predicates.

use catalog_db::{Filter, FindOptions, Sort, SortOrder};

/// Fields matched by the free-text `search` parameter.
pub const SEARCH_FIELDS: [&str; 3] = ["title", "author", "genre"];

/// How many books the recently-added listing returns.
pub const RECENT_LIMIT: usize = 10;

/// Optional filters accepted by the book listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<String>,
}

impl BookQuery {
    /// Build from raw query-string pairs.
    ///
    /// Unknown keys and blank values are ignored; the first non-blank value of
    /// a repeated key wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            if value.trim().is_empty() {
                continue;
            }
            let slot = match key.as_str() {
                "search" => &mut query.search,
                "genre" => &mut query.genre,
                "publicationYear" => &mut query.publication_year,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }

    /// Compose the predicate: (search over any field) AND (genre AND year).
    ///
    /// Every match is a case-insensitive literal substring. No parameters
    /// match every book.
    pub fn filter(&self) -> Filter {
        let mut clauses = Vec::new();

        if let Some(search) = &self.search {
            clauses.push(Filter::or(
                SEARCH_FIELDS
                    .iter()
                    .map(|field| Filter::contains(*field, search.as_str())),
            ));
        }

        let mut narrowing = Vec::new();
        if let Some(genre) = &self.genre {
            narrowing.push(Filter::contains("genre", genre.as_str()));
        }
        if let Some(year) = &self.publication_year {
            narrowing.push(Filter::contains("publicationDate", year.as_str()));
        }
        if !narrowing.is_empty() {
            clauses.push(Filter::And(narrowing));
        }

        if clauses.is_empty() {
            Filter::All
        } else {
            Filter::And(clauses)
        }
    }
}

/// Newest books first, capped at [`RECENT_LIMIT`].
pub fn recently_added() -> FindOptions {
    FindOptions::default()
        .sort(Sort::Natural(SortOrder::Descending))
        .limit(RECENT_LIMIT)
}
