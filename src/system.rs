use tracing::{debug, warn};
use url::Url;

use crate::command::Command;
use crate::error::ShellError;
use crate::fetch::{ContentCache, Fetch, FetchError};
use crate::output::{escape_html, NBSP};
use crate::path::resolve;
use crate::vfs::{NodeId, VfsTree, ROOT_PATH};

/// Simulated user shown in the prompt.
pub static PROMPT_USER: &str = "anonymous";

/// Result of running one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print this line (possibly empty) below the command.
    Line(String),
    /// The command succeeded without output.
    Silent,
    /// Wipe the output surface.
    Clear,
}

/// A system that can execute shell commands
///
/// This trait is used to define the interface for a session over a virtual filesystem.
pub trait System {
    /// The filesystem being browsed
    fn tree(&self) -> &VfsTree;
    /// Get the current working directory
    fn cwd(&self) -> NodeId;
    /// Render the prompt label for the current directory
    fn prompt(&self) -> String;
    /// List the contents of a directory, or the name of a file
    fn list(&self, path: &str) -> Result<String, ShellError>;
    /// Change the current directory; an empty path goes to the root
    fn change_dir(&mut self, path: &str) -> Result<(), ShellError>;
    /// Fetch the content of a file, escaped for display
    fn cat(&mut self, path: &str) -> Result<String, ShellError>;
}

/// Run one (already trimmed) command line against `system`.
///
/// Failures are rendered into their display text here; nothing escapes
/// to the caller.
pub fn execute<S: System + ?Sized>(system: &mut S, input: &str) -> Outcome {
    let command = Command::parse(input);
    debug!(?command, "dispatching command");

    let result = match command {
        Command::List { path } => system.list(path).map(Outcome::Line),
        Command::ChangeDir { path } => system.change_dir(path).map(|_| Outcome::Silent),
        Command::Cat { path } => system.cat(path).map(Outcome::Line),
        Command::Echo { text } if text.is_empty() => Ok(Outcome::Line(NBSP.to_string())),
        Command::Echo { text } => Ok(Outcome::Line(text.to_string())),
        Command::Clear => Ok(Outcome::Clear),
        Command::Unknown { verb } => Err(ShellError::CommandNotFound(verb.to_string())),
    };

    result.unwrap_or_else(|err| {
        if let ShellError::Read { source, .. } = &err {
            warn!(error = %source, "cat failed");
        }
        Outcome::Line(err.to_string())
    })
}

/// A browsing session over the pages of one site.
#[derive(Debug)]
pub struct SiteSystem<F> {
    tree: VfsTree,
    cwd: NodeId,
    origin: Url,
    host: String,
    cache: ContentCache<F>,
}

impl<F: Fetch> SiteSystem<F> {
    /// Start a session at the root of `tree`.
    ///
    /// Files are fetched from `origin` joined with their path; `host` is the
    /// name shown in the prompt.
    pub fn new(tree: VfsTree, origin: Url, host: impl Into<String>, fetcher: F) -> Self {
        Self {
            cwd: tree.root(),
            tree,
            origin,
            host: host.into(),
            cache: ContentCache::new(fetcher),
        }
    }

    pub fn cache(&self) -> &ContentCache<F> {
        &self.cache
    }

    fn file_url(&self, node: NodeId) -> Result<Url, FetchError> {
        let path = self.tree.node(node).path();
        self.origin.join(path).map_err(|source| FetchError::Join {
            base: self.origin.clone(),
            path: path.to_string(),
            source,
        })
    }
}

impl<F: Fetch> System for SiteSystem<F> {
    fn tree(&self) -> &VfsTree {
        &self.tree
    }

    fn cwd(&self) -> NodeId {
        self.cwd
    }

    fn prompt(&self) -> String {
        let path = match self.tree.node(self.cwd).path() {
            ROOT_PATH => "~",
            path => path,
        };
        format!("{PROMPT_USER}@{}:{path}$", self.host)
    }

    fn list(&self, path: &str) -> Result<String, ShellError> {
        let target = resolve(&self.tree, path, self.cwd)
            .ok_or_else(|| ShellError::ListNotFound(path.to_string()))?;
        let node = self.tree.node(target);

        if node.is_file() {
            return Ok(node.name().to_string());
        }

        let entries: Vec<String> = node
            .children()
            .map(|(name, child)| match self.tree.node(child).is_dir() {
                true => format!("{name}/"),
                false => name.to_string(),
            })
            .collect();

        Ok(entries.join("  "))
    }

    fn change_dir(&mut self, path: &str) -> Result<(), ShellError> {
        let target = match path {
            "" => Some(self.tree.root()),
            path => resolve(&self.tree, path, self.cwd),
        }
        .ok_or_else(|| ShellError::ChangeDirNotFound(path.to_string()))?;

        if self.tree.node(target).is_file() {
            return Err(ShellError::NotADirectory(path.to_string()));
        }

        self.cwd = target;
        Ok(())
    }

    fn cat(&mut self, path: &str) -> Result<String, ShellError> {
        let target = resolve(&self.tree, path, self.cwd)
            .ok_or_else(|| ShellError::CatNotFound(path.to_string()))?;

        if self.tree.node(target).is_dir() {
            return Err(ShellError::IsADirectory(path.to_string()));
        }

        let read_error = |source| ShellError::Read {
            path: path.to_string(),
            source,
        };
        let url = self.file_url(target).map_err(read_error)?;

        self.cache.get(&url).map(escape_html).map_err(read_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StubFetcher;
    use anyhow::Result;

    fn system() -> Result<SiteSystem<StubFetcher>> {
        let tree = VfsTree::from_urls([
            "https://x/a/b.html",
            "https://x/a/c.html",
            "https://x/about.html",
            "https://x/a/deep/index.html",
            "https://x/empty/",
        ]);
        let fetcher = StubFetcher::default()
            .with("https://x/about.html", "<h1>About</h1>\nfish & chips")
            .with("https://x/a/b.html", "b");
        Ok(SiteSystem::new(tree, Url::parse("https://x/")?, "x", fetcher))
    }

    fn line(outcome: Outcome) -> String {
        match outcome {
            Outcome::Line(line) => line,
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn test_ls() -> Result<()> {
        let mut system = system()?;

        assert_eq!(line(execute(&mut system, "ls")), "a/  about.html  empty");
        assert_eq!(line(execute(&mut system, "ls a")), "b.html  c.html  deep/");
        assert_eq!(line(execute(&mut system, "dir a")), "b.html  c.html  deep/");
        assert_eq!(line(execute(&mut system, "ls about.html")), "about.html");
        assert_eq!(
            line(execute(&mut system, "ls nope")),
            "ls: cannot access 'nope': No such file or directory"
        );
        Ok(())
    }

    #[test]
    fn test_ls_empty_directory() -> Result<()> {
        let mut system = SiteSystem::new(VfsTree::new(), Url::parse("https://x/")?, "x", StubFetcher::default());

        assert_eq!(execute(&mut system, "ls"), Outcome::Line(String::new()));
        assert_eq!(execute(&mut system, "ls ~"), Outcome::Line(String::new()));
        Ok(())
    }

    #[test]
    fn test_ls_through_promoted_directory() -> Result<()> {
        let tree = VfsTree::from_urls(["https://x/a", "https://x/a/b"]);
        let mut system = SiteSystem::new(tree, Url::parse("https://x/")?, "x", StubFetcher::default());

        assert_eq!(line(execute(&mut system, "ls")), "a/");
        assert_eq!(line(execute(&mut system, "ls a/b/..")), "b");
        Ok(())
    }

    #[test]
    fn test_cd_and_prompt() -> Result<()> {
        let mut system = system()?;
        assert_eq!(system.prompt(), "anonymous@x:~$");

        assert_eq!(execute(&mut system, "cd a"), Outcome::Silent);
        assert_eq!(system.prompt(), "anonymous@x:/a$");

        assert_eq!(execute(&mut system, "cd deep"), Outcome::Silent);
        assert_eq!(system.prompt(), "anonymous@x:/a/deep$");

        assert_eq!(execute(&mut system, "cd .."), Outcome::Silent);
        assert_eq!(execute(&mut system, "cd .."), Outcome::Silent);
        assert_eq!(system.cwd(), system.tree().root());
        assert_eq!(system.prompt(), "anonymous@x:~$");
        Ok(())
    }

    #[test]
    fn test_cd_without_arguments_goes_home() -> Result<()> {
        let mut system = system()?;
        execute(&mut system, "cd /a/deep");
        assert_ne!(system.cwd(), system.tree().root());

        assert_eq!(execute(&mut system, "cd"), Outcome::Silent);
        assert_eq!(system.cwd(), system.tree().root());
        Ok(())
    }

    #[test]
    fn test_cd_errors_keep_cwd() -> Result<()> {
        let mut system = system()?;
        execute(&mut system, "cd a");
        let before = system.cwd();

        assert_eq!(
            line(execute(&mut system, "cd nonexistent")),
            "cd: no such file or directory: nonexistent"
        );
        assert_eq!(line(execute(&mut system, "cd b.html")), "cd: not a directory: b.html");
        assert_eq!(system.cwd(), before);
        Ok(())
    }

    #[test]
    fn test_cat() -> Result<()> {
        let mut system = system()?;

        assert_eq!(
            line(execute(&mut system, "cat about.html")),
            "&lt;h1&gt;About&lt;/h1&gt;<br>fish &amp; chips"
        );
        assert_eq!(
            line(execute(&mut system, "cat missingfile")),
            "cat: missingfile: No such file or directory"
        );
        assert_eq!(line(execute(&mut system, "cat a")), "cat: a: Is a directory");
        assert_eq!(line(execute(&mut system, "cat a/c.html")), "cat: a/c.html: Error reading file");
        Ok(())
    }

    #[test]
    fn test_cat_uses_cache() -> Result<()> {
        let mut system = system()?;

        execute(&mut system, "cat a/b.html");
        execute(&mut system, "cd a");
        assert_eq!(line(execute(&mut system, "cat b.html")), "b");
        assert_eq!(line(execute(&mut system, "cat /a/b.html")), "b");

        assert_eq!(system.cache().fetcher().calls("https://x/a/b.html"), 1);
        assert_eq!(system.cache().fetcher().total_calls(), 1);
        Ok(())
    }

    #[test]
    fn test_cat_with_opaque_origin_is_a_read_error() -> Result<()> {
        let tree = VfsTree::from_urls(["https://x/a/b.html"]);
        let mut system = SiteSystem::new(tree, Url::parse("data:x")?, "x", StubFetcher::default());

        assert_eq!(line(execute(&mut system, "cat a/b.html")), "cat: a/b.html: Error reading file");
        assert_eq!(system.cache().fetcher().total_calls(), 0);
        Ok(())
    }

    #[test]
    fn test_echo_clear_and_unknown() -> Result<()> {
        let mut system = system()?;

        assert_eq!(line(execute(&mut system, "echo hello  world")), "hello  world");
        assert_eq!(line(execute(&mut system, "echo")), "\u{00A0}");
        assert_eq!(execute(&mut system, "clear"), Outcome::Clear);
        assert_eq!(line(execute(&mut system, "vim")), "Command not found: vim");
        Ok(())
    }
}
