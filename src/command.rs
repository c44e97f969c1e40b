/// The complete set of commands understood by the shell.
///
/// Arguments are kept as the raw text following the verb, so `echo` output
/// and error messages reproduce exactly what was typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// List directory contents (`ls` and its alias `dir`)
    List { path: &'a str },
    /// Change the current directory; an empty path goes back to the root
    ChangeDir { path: &'a str },
    /// Fetch a file and print its content
    Cat { path: &'a str },
    /// Print the arguments back
    Echo { text: &'a str },
    /// Wipe the output surface
    Clear,
    /// Anything else
    Unknown { verb: &'a str },
}

/// Verb names offered by tab completion.
pub static VERBS: [&str; 6] = ["cat", "cd", "clear", "dir", "echo", "ls"];

impl<'a> Command<'a> {
    /// Split `input` at its first space into a verb and the remaining argument text.
    ///
    /// Verbs are case-sensitive.
    pub fn parse(input: &'a str) -> Self {
        let (verb, args) = input.split_once(' ').unwrap_or((input, ""));

        match verb {
            "ls" | "dir" => Command::List { path: args },
            "cd" => Command::ChangeDir { path: args },
            "cat" => Command::Cat { path: args },
            "echo" => Command::Echo { text: args },
            "clear" => Command::Clear,
            _ => Command::Unknown { verb },
        }
    }
}
