use std::io::{self, Write};

use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};

/// Non-breaking space, printed by `echo` without arguments so the line keeps its height.
pub static NBSP: &str = "\u{00A0}";

/// Where processed commands end up.
///
/// Display strings are HTML fragments: `cat` output is escaped with
/// [`escape_html`] and line breaks are `<br>`.
pub trait OutputSink {
    /// Record one command: the prompt captured before it ran, the raw input,
    /// and its result line if it produced one.
    fn append(&mut self, prompt: &str, input: &str, result: Option<&str>) -> io::Result<()>;

    /// Discard everything shown so far.
    fn clear(&mut self) -> io::Result<()>;
}

/// Escape text the way the DOM serializes a text node set through `innerText`.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\u{00A0}' => escaped.push_str("&nbsp;"),
            '\r' => {
                chars.next_if_eq(&'\n');
                escaped.push_str("<br>");
            }
            '\n' => escaped.push_str("<br>"),
            ch => escaped.push(ch),
        }
    }

    escaped
}

/// Turn a display fragment back into plain text for a character terminal.
pub fn html_to_text(fragment: &str) -> String {
    fragment
        .replace("<br>", "\n")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", NBSP)
        .replace("&amp;", "&")
}

/// Accumulates the same markup the web terminal rendered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HtmlTranscript {
    lines: Vec<String>,
}

impl HtmlTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn html(&self) -> String {
        self.lines.join("\n")
    }
}

impl OutputSink for HtmlTranscript {
    fn append(&mut self, prompt: &str, input: &str, result: Option<&str>) -> io::Result<()> {
        self.lines.push(format!(
            r#"<div class="terminal-line"><span class="terminal-input-label">{prompt}</span> {input}</div>"#
        ));
        if let Some(result) = result {
            self.lines
                .push(format!(r#"<div class="terminal-line">{result}</div>"#));
        }
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.lines.clear();
        Ok(())
    }
}

/// A raw-mode character terminal.
///
/// Output scrolls by itself, so the newest line is always at the bottom.
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Redraw the line being edited.
    pub fn draw_input(&mut self, prompt: &str, input: &str) -> io::Result<()> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            PrintStyledContent(prompt.green().bold()),
            Print(" "),
            Print(input),
        )?;
        self.out.flush()
    }

    /// Print a line that is not tied to a command, e.g. a start-up banner.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        self.print_text(text)?;
        self.out.flush()
    }

    fn print_text(&mut self, text: &str) -> io::Result<()> {
        // Raw mode does not translate `\n`, so every line is terminated explicitly.
        for line in text.split('\n') {
            queue!(self.out, Print(line), Print("\r\n"))?;
        }
        Ok(())
    }
}

impl<W: Write> OutputSink for ConsoleSink<W> {
    fn append(&mut self, prompt: &str, input: &str, result: Option<&str>) -> io::Result<()> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            PrintStyledContent(prompt.green().bold()),
            Print(" "),
            Print(input),
            Print("\r\n"),
        )?;
        if let Some(result) = result {
            self.print_text(&html_to_text(result))?;
        }
        self.out.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            Clear(ClearType::All),
            Clear(ClearType::Purge),
            MoveTo(0, 0),
        )?;
        self.out.flush()
    }
}
