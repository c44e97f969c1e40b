use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use url::Url;

/// Failure to retrieve the text behind a URL.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("failed to build HTTP client")]
    #[diagnostic(code(sitesh::fetch::client))]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    #[diagnostic(
        code(sitesh::fetch::request),
        help("check the base url and your network connection")
    )]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    #[diagnostic(code(sitesh::fetch::status))]
    Status { url: Url, status: u16 },

    #[error("cannot resolve {path} against {base}")]
    #[diagnostic(code(sitesh::fetch::join))]
    Join {
        base: Url,
        path: String,
        #[source]
        source: url::ParseError,
    },
}

/// The sitemap could not be turned into a list of URLs.
#[derive(Debug, Error, Diagnostic)]
pub enum SitemapError {
    #[error("failed to fetch the sitemap")]
    #[diagnostic(code(sitesh::sitemap::fetch))]
    Fetch(#[from] FetchError),

    #[error("failed to read sitemap file {}", path.display())]
    #[diagnostic(code(sitesh::sitemap::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sitemap url {url:?}")]
    #[diagnostic(code(sitesh::sitemap::url), help("pass an absolute url such as https://example.com/"))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Malformed(#[from] MalformedSitemap),

    #[error("the sitemap lists no pages")]
    #[diagnostic(
        code(sitesh::sitemap::empty),
        help("the shell needs at least one <url><loc> entry to build its filesystem")
    )]
    Empty,

    #[error("none of the {entries} sitemap entries is an absolute url with a path")]
    #[diagnostic(
        code(sitesh::sitemap::no_pages),
        help("<loc> must hold absolute urls such as https://example.com/about.html")
    )]
    NoPages { entries: usize },
}

/// A sitemap document that could not be parsed.
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
#[error("{message}")]
#[diagnostic(code(sitesh::sitemap::malformed))]
pub struct MalformedSitemap {
    /// The sitemap document.
    #[source_code]
    pub input: Arc<String>,

    /// Offset of the failure.
    #[label("{}", label.clone().unwrap_or_else(|| "here".into()))]
    pub span: SourceSpan,

    /// Message for the error itself.
    pub message: String,

    /// Label text for the span. Defaults to `"here"`.
    pub label: Option<String>,

    /// Suggestion for fixing the document.
    #[help]
    pub help: Option<String>,
}

/// A command failed. The display text is exactly what the shell prints.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("ls: cannot access '{0}': No such file or directory")]
    ListNotFound(String),

    #[error("cd: no such file or directory: {0}")]
    ChangeDirNotFound(String),

    #[error("cd: not a directory: {0}")]
    NotADirectory(String),

    #[error("cat: {0}: No such file or directory")]
    CatNotFound(String),

    #[error("cat: {0}: Is a directory")]
    IsADirectory(String),

    #[error("cat: {path}: Error reading file")]
    Read {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("Command not found: {0}")]
    CommandNotFound(String),
}
