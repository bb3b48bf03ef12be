//! Catalog import from the TMDB metadata dump
//!
//! Reads `movies_metadata.csv` (one row per movie, genres as a Python-style
//! list of dicts) plus an optional credits JSON keyed by TMDB id, and turns
//! them into `NewMovie` rows. Rows without a title, with an unparseable release
//! date, or with a missing, non-positive or repeated TMDB id are skipped.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::{db::Store, error::AppResult, models::NewMovie};

const IMDB_TITLE_URL: &str = "https://www.imdb.com/title";

/// Cast and director of one movie
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credit {
    #[serde(default)]
    pub actors: String,
    #[serde(default)]
    pub director: String,
}

/// Columns read from the metadata CSV; the others are ignored
#[derive(Debug, Deserialize)]
struct MetadataRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    genres: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    poster_path: String,
    #[serde(default)]
    imdb_id: String,
}

/// Parsed catalog ready for insertion
#[derive(Debug, Default)]
pub struct ParsedCatalog {
    pub movies: Vec<NewMovie>,
    pub skipped: usize,
}

/// Loads the credits map, `{"<tmdb id>": {"actors": "...", "director": "..."}}`
pub fn load_credits<R: Read>(reader: R) -> anyhow::Result<HashMap<i64, Credit>> {
    let credits: HashMap<i64, Credit> = serde_json::from_reader(reader)?;
    Ok(credits)
}

/// Parses the metadata CSV into deduplicated catalog rows
pub fn read_catalog<R: Read>(
    reader: R,
    credits: &HashMap<i64, Credit>,
    image_base_url: &str,
) -> anyhow::Result<ParsedCatalog> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = csv.headers()?;
    anyhow::ensure!(
        headers.iter().any(|h| h == "id") && headers.iter().any(|h| h == "title"),
        "movies CSV needs `id` and `title` columns"
    );

    let mut catalog = ParsedCatalog::default();
    let mut seen = HashSet::new();

    for (line, row) in csv.deserialize::<MetadataRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::debug!(line = line + 2, error = %e, "Skipping malformed CSV row");
                catalog.skipped += 1;
                continue;
            }
        };

        match to_new_movie(row, credits, image_base_url) {
            Some((tmdb_id, movie)) if seen.insert(tmdb_id) => catalog.movies.push(movie),
            _ => catalog.skipped += 1,
        }
    }

    Ok(catalog)
}

/// Inserts the catalog in chunks, returning how many rows were new
pub async fn import_movies(
    store: &dyn Store,
    movies: &[NewMovie],
    chunk_size: usize,
) -> AppResult<u64> {
    let mut inserted = 0;

    for (index, chunk) in movies.chunks(chunk_size.max(1)).enumerate() {
        inserted += store.insert_movies(chunk).await?;
        tracing::debug!(chunk = index + 1, inserted, "Movie chunk stored");
    }

    tracing::info!(
        inserted,
        already_present = movies.len() as u64 - inserted,
        "Catalog import finished"
    );
    Ok(inserted)
}

fn to_new_movie(
    row: MetadataRow,
    credits: &HashMap<i64, Credit>,
    image_base_url: &str,
) -> Option<(i64, NewMovie)> {
    let title = row.title.trim();
    if title.is_empty() {
        return None;
    }

    let year = match row.release_date.trim() {
        "" => None,
        date => Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?.year()),
    };

    let tmdb_id = row.id.trim().parse::<i64>().ok().filter(|id| *id > 0)?;

    let genres = genre_names(&row.genres).join(", ");
    let credit = credits.get(&tmdb_id).cloned().unwrap_or_default();

    let movie = NewMovie {
        tmdb_id: Some(tmdb_id),
        title: title.to_string(),
        year,
        genres: non_empty(genres),
        actors: non_empty(credit.actors),
        director: non_empty(credit.director),
        poster_url: non_empty(row.poster_path)
            .map(|path| format!("{}{}", image_base_url.trim_end_matches('/'), path)),
        imdb_url: non_empty(row.imdb_id).map(|id| format!("{}/{}/", IMDB_TITLE_URL, id)),
        description: non_empty(row.overview),
    };

    Some((tmdb_id, movie))
}

/// Extracts the `name` values of a list like `[{'id': 18, 'name': 'Drama'}]`
pub fn genre_names(raw: &str) -> Vec<String> {
    const NAME_KEYS: [&str; 2] = ["'name':", "\"name\":"];

    let mut names = Vec::new();
    let mut rest = raw;

    while let Some((at, key)) = NAME_KEYS
        .iter()
        .filter_map(|key| rest.find(key).map(|at| (at, key)))
        .min_by_key(|(at, _)| *at)
    {
        let value = rest[at + key.len()..].trim_start();
        let Some(quote) = value.chars().next().filter(|c| *c == '\'' || *c == '"') else {
            rest = value;
            continue;
        };

        let value = &value[1..];
        let Some(end) = value.find(quote) else {
            break;
        };
        names.push(value[..end].to_string());
        rest = &value[end + 1..];
    }

    names
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const BASE: &str = "https://image.tmdb.org/t/p/w500";

    const CSV: &str = "\
adult,genres,id,imdb_id,overview,poster_path,release_date,title
False,\"[{'id': 80, 'name': 'Crime'}, {'id': 18, 'name': 'Drama'}]\",949,tt0113277,A heist goes wrong.,/heat.jpg,1995-12-15,Heat
False,[],949,tt0113277,Duplicate row,,1995-12-15,Heat
False,[],0,,Bad id,,1990-01-01,Zero
False,[],abc,,Bad id,,1990-01-01,Letters
False,[],77,,No title,,1990-01-01,
False,[],78,,Bad date,,1,Broken
False,\"[{'id': 35, 'name': \"\"Children's\"\"}]\",11524,,,,,Thief
";

    fn credits() -> HashMap<i64, Credit> {
        load_credits(
            r#"{"949": {"actors": "Al Pacino, Robert De Niro", "director": "Michael Mann"}}"#
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_genre_names() {
        assert_eq!(
            genre_names("[{'id': 80, 'name': 'Crime'}, {'id': 18, 'name': 'Drama'}]"),
            vec!["Crime", "Drama"]
        );
        assert_eq!(
            genre_names(r#"[{"id": 10751, "name": "Family"}]"#),
            vec!["Family"]
        );
        assert!(genre_names("[]").is_empty());
        assert!(genre_names("").is_empty());
        assert!(genre_names("{'name': 12}").is_empty());
    }

    #[test]
    fn test_read_catalog_filters_and_maps_rows() {
        let catalog = read_catalog(CSV.as_bytes(), &credits(), BASE).unwrap();

        let titles: Vec<_> = catalog.movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Heat", "Thief"]);
        assert_eq!(catalog.skipped, 5);

        let heat = &catalog.movies[0];
        assert_eq!(heat.tmdb_id, Some(949));
        assert_eq!(heat.year, Some(1995));
        assert_eq!(heat.genres.as_deref(), Some("Crime, Drama"));
        assert_eq!(heat.director.as_deref(), Some("Michael Mann"));
        assert_eq!(
            heat.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/heat.jpg")
        );
        assert_eq!(
            heat.imdb_url.as_deref(),
            Some("https://www.imdb.com/title/tt0113277/")
        );

        let thief = &catalog.movies[1];
        assert_eq!(thief.year, None);
        assert_eq!(thief.genres.as_deref(), Some("Children's"));
        assert!(thief.actors.is_none());
        assert!(thief.poster_url.is_none());
        assert!(thief.description.is_none());
    }

    #[test]
    fn test_csv_without_required_columns_is_rejected() {
        let result = read_catalog("name,year\nHeat,1995\n".as_bytes(), &HashMap::new(), BASE);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_import_is_repeatable() {
        let store = MemoryStore::new();
        let catalog = read_catalog(CSV.as_bytes(), &credits(), BASE).unwrap();

        assert_eq!(import_movies(&store, &catalog.movies, 1).await.unwrap(), 2);
        assert_eq!(import_movies(&store, &catalog.movies, 500).await.unwrap(), 0);

        let (movies, total) = store.list_movies(Some("mann"), 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(movies[0].title, "Heat");
    }
}
