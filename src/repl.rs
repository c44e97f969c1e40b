use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use miette::{IntoDiagnostic, Result};
use tracing::debug;

use crate::editor::{Key, LineEditor};
use crate::output::{ConsoleSink, OutputSink};
use crate::system::{execute, Outcome, System};

/// A shell session: the system being browsed, the input field and the
/// surface results are written to.
#[derive(Debug)]
pub struct Terminal<S, O>
where
    S: System,
    O: OutputSink,
{
    system: S,
    editor: LineEditor,
    sink: O,
}

impl<S, O> Terminal<S, O>
where
    S: System,
    O: OutputSink,
{
    pub fn new(system: S, sink: O) -> Self {
        Self {
            system,
            editor: LineEditor::new(),
            sink,
        }
    }

    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut O {
        &mut self.sink
    }

    pub fn into_parts(self) -> (S, O) {
        (self.system, self.sink)
    }

    /// Feed one key to the input field, running the line if it was submitted.
    pub fn press(&mut self, key: Key) -> io::Result<()> {
        let submitted = self
            .editor
            .handle(key, self.system.tree(), self.system.cwd());

        match submitted {
            Some(line) => self.submit(&line),
            None => Ok(()),
        }
    }

    /// Run a trimmed command line and write the result.
    ///
    /// The prompt is taken before the command runs, so `cd` is echoed under
    /// the directory it was typed in.
    pub fn submit(&mut self, line: &str) -> io::Result<()> {
        let prompt = self.system.prompt();

        match execute(&mut self.system, line) {
            Outcome::Line(result) => self.sink.append(&prompt, line, Some(&result)),
            Outcome::Silent => self.sink.append(&prompt, line, None),
            Outcome::Clear => self.sink.clear(),
        }
    }
}

impl<S, W> Terminal<S, ConsoleSink<W>>
where
    S: System,
    W: Write,
{
    /// Read key events from the controlling terminal until Ctrl-C or Ctrl-D.
    pub fn run(&mut self) -> Result<()> {
        let _raw = RawModeGuard::enable()?;
        self.redraw()?;

        loop {
            let Event::Key(event) = event::read().into_diagnostic()? else {
                continue;
            };
            if event.kind != KeyEventKind::Press {
                continue;
            }
            if is_exit(&event) {
                debug!("exit requested");
                break;
            }

            if let Some(key) = translate(&event) {
                self.press(key).into_diagnostic()?;
            }
            self.redraw()?;
        }

        self.sink.notice("").into_diagnostic()
    }

    fn redraw(&mut self) -> Result<()> {
        let prompt = self.system.prompt();
        self.sink
            .draw_input(&prompt, self.editor.input())
            .into_diagnostic()
    }
}

/// Leaves raw mode when dropped, also on early returns.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().into_diagnostic()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn is_exit(event: &KeyEvent) -> bool {
    event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(event.code, KeyCode::Char('c') | KeyCode::Char('d'))
}

/// Map a terminal key event to an editor key. Unhandled keys map to `None`.
pub fn translate(event: &KeyEvent) -> Option<Key> {
    match event.code {
        KeyCode::Char(_) if event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            None
        }
        KeyCode::Char(ch) => Some(Key::Char(ch)),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StubFetcher;
    use crate::output::HtmlTranscript;
    use crate::system::SiteSystem;
    use crate::vfs::VfsTree;
    use anyhow::Result;
    use url::Url;

    fn terminal() -> Result<Terminal<SiteSystem<StubFetcher>, HtmlTranscript>> {
        let tree = VfsTree::from_urls(["https://x/a/b.html", "https://x/about.html"]);
        let fetcher = StubFetcher::default().with("https://x/a/b.html", "one\ntwo");
        let system = SiteSystem::new(tree, Url::parse("https://x/")?, "x", fetcher);
        Ok(Terminal::new(system, HtmlTranscript::new()))
    }

    fn type_line<S: System, O: OutputSink>(terminal: &mut Terminal<S, O>, line: &str) -> io::Result<()> {
        for ch in line.chars() {
            terminal.press(Key::Char(ch))?;
        }
        terminal.press(Key::Enter)
    }

    fn input_line(prompt: &str, input: &str) -> String {
        format!(r#"<div class="terminal-line"><span class="terminal-input-label">{prompt}</span> {input}</div>"#)
    }

    fn result_line(result: &str) -> String {
        format!(r#"<div class="terminal-line">{result}</div>"#)
    }

    #[test]
    fn test_transcript_of_a_session() -> Result<()> {
        let mut terminal = terminal()?;

        type_line(&mut terminal, "ls")?;
        type_line(&mut terminal, "cd a")?;
        type_line(&mut terminal, "cat b.html")?;

        assert_eq!(
            terminal.sink().lines(),
            [
                input_line("anonymous@x:~$", "ls"),
                result_line("a/  about.html"),
                input_line("anonymous@x:~$", "cd a"),
                input_line("anonymous@x:/a$", "cat b.html"),
                result_line("one<br>two"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_clear_wipes_transcript() -> Result<()> {
        let mut terminal = terminal()?;

        type_line(&mut terminal, "echo hi")?;
        type_line(&mut terminal, "clear")?;
        assert!(terminal.sink().lines().is_empty());

        type_line(&mut terminal, "echo")?;
        assert_eq!(
            terminal.sink().lines(),
            [input_line("anonymous@x:~$", "echo"), result_line("\u{00A0}")]
        );
        Ok(())
    }

    #[test]
    fn test_blank_enter_writes_nothing() -> Result<()> {
        let mut terminal = terminal()?;

        type_line(&mut terminal, "  ")?;

        assert!(terminal.sink().lines().is_empty());
        assert!(terminal.editor().history().entries().is_empty());
        Ok(())
    }

    #[test]
    fn test_results_follow_command_order() -> Result<()> {
        let mut terminal = terminal()?;

        type_line(&mut terminal, "cat a/b.html")?;
        type_line(&mut terminal, "echo after")?;

        let lines = terminal.sink().lines();
        assert_eq!(lines[1], result_line("one<br>two"));
        assert_eq!(lines[3], result_line("after"));
        Ok(())
    }

    #[test]
    fn test_tab_uses_current_directory() -> Result<()> {
        let mut terminal = terminal()?;
        type_line(&mut terminal, "cd a")?;

        for ch in "cat b".chars() {
            terminal.press(Key::Char(ch))?;
        }
        terminal.press(Key::Tab)?;

        assert_eq!(terminal.editor().input(), "cat b.html");
        Ok(())
    }

    #[test]
    fn test_console_session() -> Result<()> {
        let tree = VfsTree::from_urls(["https://x/a/b.html"]);
        let system = SiteSystem::new(tree, Url::parse("https://x/")?, "x", StubFetcher::default());
        let mut terminal = Terminal::new(system, ConsoleSink::new(Vec::new()));

        type_line(&mut terminal, "ls")?;
        type_line(&mut terminal, "nope")?;

        let (_, sink) = terminal.into_parts();
        let printed = String::from_utf8(sink.into_inner())?;
        assert!(printed.contains("ls\r\na/\r\n"));
        assert!(printed.contains("nope\r\nCommand not found: nope\r\n"));
        Ok(())
    }

    #[test]
    fn test_translate() {
        let plain = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(translate(&plain(KeyCode::Char('x'))), Some(Key::Char('x')));
        assert_eq!(
            translate(&KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT)),
            Some(Key::Char('X'))
        );
        assert_eq!(translate(&plain(KeyCode::Enter)), Some(Key::Enter));
        assert_eq!(translate(&plain(KeyCode::Tab)), Some(Key::Tab));
        assert_eq!(translate(&plain(KeyCode::Up)), Some(Key::Up));
        assert_eq!(translate(&plain(KeyCode::Left)), None);
        assert_eq!(
            translate(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
        assert!(is_exit(&KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)));
        assert!(!is_exit(&plain(KeyCode::Char('d'))));
    }
}
