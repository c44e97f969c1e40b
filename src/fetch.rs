use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

pub use crate::error::FetchError;

/// Default HTTP timeout for the blocking client.
pub static DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can retrieve the text behind a URL.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.clone(),
            source,
        };

        let response = self.client.get(url.clone()).send().map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(request_error)
    }
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

/// Memoizes fetched content by URL for the lifetime of a session.
///
/// Entries are never evicted. Failed fetches are not stored.
#[derive(Debug)]
pub struct ContentCache<F> {
    fetcher: F,
    entries: HashMap<Url, String>,
}

impl<F: Fetch> ContentCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, url: &Url) -> Result<&str, FetchError> {
        if !self.entries.contains_key(url) {
            debug!(%url, "content cache miss");
            let body = self.fetcher.fetch(url)?;
            self.entries.insert(url.clone(), body);
        } else {
            debug!(%url, "content cache hit");
        }

        Ok(self.entries[url].as_str())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.entries.contains_key(url)
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_cache_fetches_once() -> Result<()> {
        let url = Url::parse("https://x/a.txt")?;
        let mut cache = ContentCache::new(StubFetcher::default().with("https://x/a.txt", "hello"));

        assert_eq!(cache.get(&url)?, "hello");
        assert_eq!(cache.get(&url)?, "hello");
        assert!(cache.contains(&url));
        assert_eq!(cache.fetcher().calls("https://x/a.txt"), 1);

        Ok(())
    }

    #[test]
    fn test_failures_are_not_cached() -> Result<()> {
        let url = Url::parse("https://x/missing.txt")?;
        let mut cache = ContentCache::new(StubFetcher::default());

        assert!(matches!(cache.get(&url), Err(FetchError::Status { status: 404, .. })));
        assert!(cache.get(&url).is_err());
        assert!(!cache.contains(&url));
        assert_eq!(cache.fetcher().calls("https://x/missing.txt"), 2);

        Ok(())
    }

    #[test]
    fn test_cache_over_borrowed_fetcher() -> Result<()> {
        let stub = StubFetcher::default().with("https://x/b.txt", "b");
        let url = Url::parse("https://x/b.txt")?;

        {
            let mut cache = ContentCache::new(&stub);
            cache.get(&url)?;
            cache.get(&url)?;
        }

        assert_eq!(stub.total_calls(), 1);
        Ok(())
    }
}
