/// Read-through caching over an optional Redis [`Cache`](crate::db::Cache).
///
/// With no cache configured the block runs every time. A failed cache read is
/// logged and treated as a miss so that Redis outages only cost latency.
/// Computed values are written back in the background with `$ttl` seconds.
///
/// Must be used inside a function returning `AppResult`; errors from `$block`
/// are propagated with `?`.
///
/// # Example
/// ```rust,ignore
/// let details = cached!(self.cache.as_ref(), CacheKey::TmdbMovie(id), 3600, async {
///     self.fetch_details(id).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache {
            Some(cache) => {
                let hit = match cache.lookup(&key).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                        None
                    }
                };
                match hit {
                    Some(value) => value,
                    None => {
                        let value = $block.await?;
                        cache.store_in_background(&key, &value, $ttl);
                        value
                    }
                }
            }
            None => $block.await?,
        }
    }};
}
