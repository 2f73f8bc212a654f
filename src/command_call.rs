/// Characters that hand a line over to the shell interpreter.
pub const SHELL_METACHARACTERS: [char; 3] = ['|', '>', '<'];

/// Where a single line of input is sent.
///
/// Routing happens before any built-in lookup, so a line like
/// `echo hi > out.txt` is classified as [`Route::Shell`] even though it
/// starts with a built-in name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Nothing to run.
    Empty,
    /// Contains pipe or redirection syntax; run verbatim by the shell.
    Shell(&'a str),
    /// Built-in lookup first, then external dispatch.
    Direct(&'a str),
}

impl<'a> Route<'a> {
    /// Classifies a line after stripping its trailing newline. Shell lines
    /// are kept verbatim; direct lines are trimmed.
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            Route::Empty
        } else if needs_shell(line) {
            Route::Shell(line)
        } else {
            Route::Direct(line.trim())
        }
    }
}

/// Returns true if the line uses pipe or redirection syntax.
pub fn needs_shell(line: &str) -> bool {
    line.contains(SHELL_METACHARACTERS)
}

/// A program name and its arguments, ready to be spawned.
///
/// Generated from a line that matched no built-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    /// The program to run (e.g., "ls", "uname").
    pub program: String,
    /// Positional arguments, passed through untouched.
    pub args: Vec<String>,
}

impl CommandCall {
    /// Splits a line on spaces, tabs and newlines.
    ///
    /// At most `max_args` tokens are kept, program name included; the rest
    /// are dropped without complaint. Returns `None` for a blank line.
    ///
    /// # Example
    /// ```
    /// use webshell::CommandCall;
    ///
    /// let call = CommandCall::parse("ls -la /tmp", 100).unwrap();
    /// assert_eq!(call.program, "ls");
    /// assert_eq!(call.args, vec!["-la", "/tmp"]);
    /// ```
    pub fn parse(line: &str, max_args: usize) -> Option<Self> {
        let mut tokens = tokenize(line)
            .take(max_args.max(1))
            .map(str::to_string);

        let program = tokens.next()?;
        Some(Self {
            program,
            args: tokens.collect(),
        })
    }
}

/// Whitespace tokenizer. Quotes and escapes carry no meaning here; lines
/// that need them should go through the shell.
pub fn tokenize(input: &str) -> impl Iterator<Item = &str> {
    input
        .split([' ', '\t', '\n'])
        .filter(|token| !token.is_empty())
}
