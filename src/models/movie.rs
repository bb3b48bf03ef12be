use serde::{Deserialize, Serialize};

/// Minimum length of a stored poster URL before it is trusted
const MIN_POSTER_URL_LEN: usize = 10;

/// A catalog movie as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Option<String>,
    pub actors: Option<String>,
    pub director: Option<String>,
    pub poster_url: Option<String>,
    pub imdb_url: Option<String>,
    pub description: Option<String>,
}

impl Movie {
    /// Whether the stored poster can be shown as-is
    ///
    /// Imported catalogs carry placeholders like "N/A" or truncated paths,
    /// both of which trigger a fresh lookup.
    pub fn has_usable_poster(&self) -> bool {
        match &self.poster_url {
            Some(url) => url.len() > MIN_POSTER_URL_LEN && !url.contains("N/A"),
            None => false,
        }
    }

    /// Title without a trailing release year, e.g. "Heat (1995)" -> "Heat"
    pub fn search_title(&self) -> &str {
        clean_title(&self.title)
    }
}

/// Strips a trailing " (YYYY)" suffix from a title
pub fn clean_title(title: &str) -> &str {
    let trimmed = title.trim_end();
    if let Some(open) = trimmed.rfind('(') {
        let inner = &trimmed[open + 1..];
        if inner.len() == 5
            && inner.ends_with(')')
            && inner[..4].chars().all(|c| c.is_ascii_digit())
        {
            return trimmed[..open].trim();
        }
    }
    trimmed.trim()
}

/// Fields used to insert a catalog movie
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Option<String>,
    pub actors: Option<String>,
    pub director: Option<String>,
    pub poster_url: Option<String>,
    pub imdb_url: Option<String>,
    pub description: Option<String>,
}

impl NewMovie {
    pub fn titled(title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            title: title.into(),
            year,
            ..Default::default()
        }
    }

    pub fn into_movie(self, id: i64) -> Movie {
        Movie {
            id,
            tmdb_id: self.tmdb_id,
            title: self.title,
            year: self.year,
            genres: self.genres,
            actors: self.actors,
            director: self.director,
            poster_url: self.poster_url,
            imdb_url: self.imdb_url,
            description: self.description,
        }
    }
}

/// Movie enriched with the dynamic external rating
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieView {
    #[serde(flatten)]
    pub movie: Movie,
    pub tmdb_rating: Option<String>,
}

/// Query parameters of the catalog listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieListQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl MovieListQuery {
    /// Requested page, falling back to the first page on garbage or values below 1
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(1)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// One page of the movie catalog
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub movies: Vec<MovieView>,
    pub total_pages: u64,
    pub current_page: u32,
    pub total_items: u64,
}

impl MoviePage {
    pub fn new(movies: Vec<MovieView>, total_items: u64, current_page: u32, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        Self {
            movies,
            total_pages: total_items.div_ceil(page_size),
            current_page,
            total_items,
        }
    }
}

/// Catalog search matcher shared by the in-memory store
pub fn matches_search(movie: &Movie, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .map(|v| v.to_lowercase().contains(&needle))
            .unwrap_or(false)
    };

    movie.title.to_lowercase().contains(&needle) || contains(&movie.actors) || contains(&movie.director)
}
