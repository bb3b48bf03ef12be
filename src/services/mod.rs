pub mod catalog;
pub mod catalog_import;
pub mod enrichment;
pub mod friends;
pub mod model_client;
pub mod recommendations;
pub mod tmdb;
pub mod users;

pub use enrichment::{enrich_movies, MovieEnricher, PosterSource, TmdbEnricher, TmdbPosterSource};
pub use model_client::{HttpModelService, ModelService};
pub use tmdb::TmdbClient;
