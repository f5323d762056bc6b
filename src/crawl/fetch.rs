use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use thiserror::Error;
use url::Url;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot request {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Result of a GET, after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Fetcher {
    fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError>;
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Blocking reqwest client; a fresh user agent on every request.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `timeout_secs == 0` keeps reqwest's default.
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        Ok(HttpFetcher {
            client: builder.build()?,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let target = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = self
            .client
            .get(target)
            .header(USER_AGENT, random_user_agent())
            .send()
            .map_err(transport)?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text().map_err(transport)?;

        Ok(FetchedPage {
            final_url,
            status,
            body,
        })
    }
}

/// Uniform random pause between fetches.
#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    min_secs: f64,
    max_secs: f64,
}

impl Jitter {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let min_secs = min_secs.max(0.0);
        Jitter {
            min_secs,
            max_secs: max_secs.max(min_secs),
        }
    }

    pub fn next_delay(&self) -> Duration {
        if self.max_secs <= self.min_secs {
            return Duration::from_secs_f64(self.min_secs);
        }
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }

    pub fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
