/// Read-through caching for an optional Redis cache.
///
/// On a hit the cached value is returned. On a miss (or with no cache
/// configured) the block runs and, if a cache is present, its value is stored
/// in the background. A failing cache read is logged and treated as a miss.
///
/// # Arguments
/// * `$cache`: `Option<&Cache>`.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live for the stored value in seconds.
/// * `$block`: future yielding `AppResult<T>`, run on a miss.
///
/// # Example
/// ```rust,ignore
/// let details = cached!(self.cache.as_ref(), key, DETAILS_CACHE_TTL, async move {
///     fetch_details(title).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache {
            Some(cache) => {
                let hit = match cache.get_json(&key).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                        None
                    }
                };
                match hit {
                    Some(cached) => Ok(cached),
                    None => match $block.await {
                        Ok(value) => {
                            cache.put_json(&key, &value, $ttl);
                            Ok(value)
                        }
                        Err(e) => Err(e),
                    },
                }
            }
            None => $block.await,
        }
    }};
}
