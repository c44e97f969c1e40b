use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::Level;
use url::{ParseError, Url};

use crate::error::SitemapError;
use crate::fetch::DEFAULT_TIMEOUT;
use crate::sitemap::DEFAULT_SITEMAP_PATH;

pub static DEFAULT_BASE_URL: &str = "https://clueless.no/";

#[derive(Debug, Parser)]
#[command(version, about = "Browse a website's sitemap as a shell", long_about = None)]
pub struct SiteshCli {
    /// Origin of the site; sitemap and files are fetched below it
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Path of the sitemap below the base url
    #[arg(long, default_value = DEFAULT_SITEMAP_PATH)]
    pub sitemap_path: String,

    /// Read the sitemap from this file instead of fetching it
    #[arg(short, long)]
    pub sitemap_file: Option<PathBuf>,

    /// Host name shown in the prompt [default: host of the base url]
    #[arg(long)]
    pub site: Option<String>,

    /// HTTP timeout in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Write logs to this file
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl SiteshCli {
    /// The site origin. Urls that cannot carry a path, like `data:`, are rejected.
    pub fn base_url(&self) -> Result<Url, SitemapError> {
        let invalid = |source| SitemapError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        };

        let url = Url::parse(&self.base_url).map_err(invalid)?;
        if url.cannot_be_a_base() {
            return Err(invalid(ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(url)
    }

    pub fn sitemap_url(&self) -> Result<Url, SitemapError> {
        self.base_url()?
            .join(&self.sitemap_path)
            .map_err(|source| SitemapError::InvalidUrl {
                url: self.sitemap_path.clone(),
                source,
            })
    }

    /// Label for the prompt: `--site`, else the host of the base url.
    pub fn site_label(&self) -> Result<String, SitemapError> {
        if let Some(site) = &self.site {
            return Ok(site.clone());
        }
        Ok(self.base_url()?.host_str().unwrap_or_default().to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            true => Level::DEBUG,
            false => Level::INFO,
        }
    }
}
