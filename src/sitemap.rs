use std::path::Path;
use std::sync::Arc;

use tracing::info;
use url::Url;
use winnow::combinator::{cut_err, opt, repeat, terminated};
use winnow::error::{AddContext, ErrorKind, ParserError};
use winnow::prelude::*;
use winnow::stream::{Compare, FindSlice, Location, Stream, StreamIsPartial};
use winnow::token::take_until;
use winnow::LocatingSlice;

use crate::error::{MalformedSitemap, SitemapError};
use crate::fetch::Fetch;
use crate::vfs::VfsTree;

type Input<'a> = LocatingSlice<&'a str>;
type ParserResult<T> = winnow::PResult<T, SitemapParserError>;

/// Default location of the sitemap below the site origin.
pub static DEFAULT_SITEMAP_PATH: &str = "/sitemap.xml";

static COMMENT_OPEN: &str = "<!--";
static COMMENT_CLOSE: &str = "-->";
static CDATA_OPEN: &str = "<![CDATA[";
static CDATA_CLOSE: &str = "]]>";

#[derive(Debug, Default, Clone, Eq, PartialEq)]
struct SitemapParserError {
    message: Option<String>,
    label: Option<String>,
    help: Option<String>,
    /// Absolute offset of the failure, when known better than the stream position.
    offset: Option<usize>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
struct SitemapParseContext {
    message: Option<String>,
    label: Option<String>,
    help: Option<String>,
}

impl SitemapParseContext {
    fn msg(mut self, txt: impl AsRef<str>) -> Self {
        self.message = Some(txt.as_ref().to_string());
        self
    }

    fn lbl(mut self, txt: impl AsRef<str>) -> Self {
        self.label = Some(txt.as_ref().to_string());
        self
    }

    fn help(mut self, txt: impl AsRef<str>) -> Self {
        self.help = Some(txt.as_ref().to_string());
        self
    }
}

fn cx() -> SitemapParseContext {
    Default::default()
}

impl<I: Stream> ParserError<I> for SitemapParserError {
    fn from_error_kind(_input: &I, _kind: ErrorKind) -> Self {
        Self::default()
    }

    fn append(
        self,
        _input: &I,
        _token_start: &<I as Stream>::Checkpoint,
        _kind: ErrorKind,
    ) -> Self {
        self
    }
}

impl<I: Stream> AddContext<I, SitemapParseContext> for SitemapParserError {
    fn add_context(
        mut self,
        _input: &I,
        _token_start: &<I as Stream>::Checkpoint,
        ctx: SitemapParseContext,
    ) -> Self {
        self.message = ctx.message.or(self.message);
        self.label = ctx.label.or(self.label);
        self.help = ctx.help.or(self.help);
        self
    }
}

/// Extract the `<loc>` of every `<url>` entry, in document order.
///
/// # Grammar
///
/// ```md
/// sitemap   := (junk url_entry)* junk;
/// url_entry := "<url>" (junk loc)? junk "</url>";
/// loc       := "<loc>" text "</loc>";
/// ```
///
/// `<loc>` elements outside `<url>` (as in sitemap indexes) are ignored.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut input = LocatingSlice::new(xml);

    let entries: Vec<Option<String>> = repeat(0.., url_entry)
        .parse_next(&mut input)
        .map_err(|err| {
            let err = err.into_inner().unwrap_or_default();
            let offset = err.offset.unwrap_or_else(|| input.location());
            failure(xml, offset, err)
        })?;

    let locations: Vec<String> = entries
        .into_iter()
        .flatten()
        .filter(|loc| !loc.is_empty())
        .collect();

    if locations.is_empty() {
        return Err(SitemapError::Empty);
    }

    Ok(locations)
}

/// Build the filesystem for the sitemap entries.
///
/// Entries that are not absolute URLs are skipped; a sitemap where that
/// leaves no page at all is rejected.
pub fn sitemap_tree(locations: &[String]) -> Result<VfsTree, SitemapError> {
    let tree = VfsTree::from_urls(locations);
    if tree.is_empty() {
        return Err(SitemapError::NoPages {
            entries: locations.len(),
        });
    }
    Ok(tree)
}

/// Download and parse the sitemap at `url`.
pub fn fetch_sitemap<F: Fetch>(fetcher: &F, url: &Url) -> Result<Vec<String>, SitemapError> {
    let xml = fetcher.fetch(url)?;
    let locations = parse_sitemap(&xml)?;
    info!(%url, urls = locations.len(), "loaded sitemap");
    Ok(locations)
}

/// Read and parse a sitemap stored on disk.
pub fn read_sitemap(path: &Path) -> Result<Vec<String>, SitemapError> {
    let xml = std::fs::read_to_string(path).map_err(|source| SitemapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let locations = parse_sitemap(&xml)?;
    info!(path = %path.display(), urls = locations.len(), "loaded sitemap");
    Ok(locations)
}

fn failure(xml: &str, offset: usize, err: SitemapParserError) -> SitemapError {
    MalformedSitemap {
        input: Arc::new(xml.to_string()),
        span: (offset, 0).into(),
        message: err.message.unwrap_or_else(|| "Failed to parse sitemap".into()),
        label: err.label,
        help: err.help,
    }
    .into()
}

fn url_entry(input: &mut Input<'_>) -> ParserResult<Option<String>> {
    skip_to(input, "<url>")?;

    let body_offset = input.location();
    let body: &str = cut_err(terminated(take_until(0.., "</url>"), "</url>"))
        .context(
            cx().msg("Unterminated <url> element")
                .lbl("<url> opened here")
                .help("every <url> needs a matching </url>"),
        )
        .parse_next(input)?;

    let mut rest = body;
    opt(loc_element).parse_next(&mut rest).map_err(|err| {
        err.map(|mut err: SitemapParserError| {
            err.offset = Some(body_offset + body.len() - rest.len());
            err
        })
    })
}

fn loc_element(input: &mut &str) -> ParserResult<String> {
    skip_to(input, "<loc>")?;

    cut_err(terminated(take_until(0.., "</loc>"), "</loc>"))
        .context(
            cx().msg("Unterminated <loc> element")
                .lbl("<loc> opened here")
                .help("every <loc> needs a matching </loc> inside its <url>"),
        )
        .map(element_text)
        .parse_next(input)
}

/// Advance past the next `tag` that is not inside a comment.
///
/// Backtracks when no such tag is left.
fn skip_to<I>(input: &mut I, tag: &'static str) -> ParserResult<()>
where
    I: Stream + StreamIsPartial + Compare<&'static str> + FindSlice<&'static str>,
{
    loop {
        take_until(0.., "<").void().parse_next(input)?;

        if opt(COMMENT_OPEN).parse_next(input)?.is_some() {
            cut_err(terminated(take_until(0.., COMMENT_CLOSE), COMMENT_CLOSE))
                .context(
                    cx().msg("Unterminated comment")
                        .lbl("comment opened here")
                        .help("every <!-- needs a matching -->"),
                )
                .void()
                .parse_next(input)?;
            continue;
        }

        if opt(tag).parse_next(input)?.is_some() {
            return Ok(());
        }

        "<".void().parse_next(input)?;
    }
}

/// Text content of an element: CDATA sections verbatim, everything else
/// entity-decoded, surrounding whitespace trimmed.
fn element_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find(CDATA_OPEN) {
        text.push_str(&decode_entities(&rest[..start]));

        let section = &rest[start + CDATA_OPEN.len()..];
        let end = section.find(CDATA_CLOSE).unwrap_or(section.len());
        text.push_str(&section[..end]);
        rest = section.get(end + CDATA_CLOSE.len()..).unwrap_or_default();
    }
    text.push_str(&decode_entities(rest));

    text.trim().to_string()
}

/// Decode the XML predefined entities and numeric character references.
///
/// Unknown references are kept verbatim.
fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        rest = &rest[start..];

        let replacement = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, end))
        });

        match replacement {
            Some((ch, end)) => {
                decoded.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}
