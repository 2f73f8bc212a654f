use std::fmt::Write;
use std::fs::{DirBuilder, File, OpenOptions};
use std::io::Read;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::ExecStatus;
use crate::output::OutputBuffer;

/// How a built-in name is recognised in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// The whole line is the name.
    Exact,
    /// The line is the name, or the name followed by whitespace and an argument.
    Word,
    /// The line starts with the name; the argument is whatever follows the
    /// first space.
    Prefix,
}

/// Everything a built-in may touch while it runs.
pub struct Invocation<'a> {
    pub cwd: &'a mut PathBuf,
    pub commands: &'a CommandList,
    /// Text after the name and its separator, untrimmed.
    pub arg: &'a str,
    pub out: &'a mut OutputBuffer,
}

type Callback = fn(&mut Invocation<'_>) -> ExecStatus;

pub struct Command {
    usage: String,
    help: String,
    matcher: Matcher,
    callback: Callback,
}

impl Command {
    pub fn new(usage: &str, help: &str, matcher: Matcher, callback: Callback) -> Self {
        Self {
            usage: usage.to_string(),
            help: help.to_string(),
            matcher,
            callback,
        }
    }

    /// Returns the argument text if `line` invokes the command called `name`.
    fn matches<'l>(&self, name: &str, line: &'l str) -> Option<&'l str> {
        let rest = line.strip_prefix(name)?;
        match self.matcher {
            Matcher::Exact => rest.is_empty().then_some(""),
            Matcher::Word => {
                let mut chars = rest.chars();
                match chars.next() {
                    None => Some(""),
                    Some(sep) if sep.is_whitespace() => Some(chars.as_str()),
                    Some(_) => None,
                }
            }
            Matcher::Prefix => Some(rest.split_once(' ').map_or("", |(_, arg)| arg)),
        }
    }
}

/// Ordered table of built-ins. Exact names are tried first, then word
/// names, then prefixes; within each group the first registered match wins.
pub struct CommandList {
    cmds: Vec<(String, Command)>,
}

impl CommandList {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    pub fn register(&mut self, name: &str, cmd: Command) {
        self.cmds.push((name.to_string(), cmd));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cmds.iter().map(|(name, _)| name.as_str())
    }

    /// Finds the built-in for `line` and the argument text it receives.
    pub fn find<'l>(&self, line: &'l str) -> Option<(&str, &Command, &'l str)> {
        [Matcher::Exact, Matcher::Word, Matcher::Prefix].into_iter().find_map(|pass| {
            self.cmds
                .iter()
                .filter(|(_, cmd)| cmd.matcher == pass)
                .find_map(|(name, cmd)| cmd.matches(name, line).map(|arg| (name.as_str(), cmd, arg)))
        })
    }

    /// Runs the matching built-in. `None` means the line is not a built-in.
    pub fn dispatch(
        &self,
        line: &str,
        cwd: &mut PathBuf,
        out: &mut OutputBuffer,
    ) -> Option<ExecStatus> {
        let (name, cmd, arg) = self.find(line)?;
        tracing::debug!(builtin = name, "running built-in");

        let mut invocation = Invocation {
            cwd,
            commands: self,
            arg,
            out,
        };
        Some((cmd.callback)(&mut invocation))
    }

    fn write_help(&self, out: &mut OutputBuffer) {
        out.push_str("📘 HELP MENU - Mini Linux Shell Commands\n");
        out.push_str("=================================================\n");
        out.push_str("============== BUILT-IN COMMANDS ==============\n");
        for (_, cmd) in &self.cmds {
            let _ = writeln!(out, " {:18} → {}", cmd.usage, cmd.help);
        }
        out.push_str(HELP_FOOTER);
    }
}

const HELP_FOOTER: &str = "\
-------------------------------------------------
============ ⚙️ SYSTEM COMMANDS ============
 ls, whoami, ps, uname, df, cal, grep, wc, etc.
 → Runs the real program with the same output.
-------------------------------------------------
============ 🚀 SHELL FEATURES ============
 >  → Output redirection  (e.g., echo Hello > out.txt)
 <  → Input redirection   (e.g., wc -l < in.txt)
 |  → Piping              (e.g., ls | grep .rs)
-------------------------------------------------
💡 Lines using |, < or > are run by the system shell.
=================================================
";

const ABOUT: &str = "\
=== 🐧 Mini Linux Shell ===
---------------------------------------------
A small command shell reachable from a console or a browser.
---------------------------------------------
⚙️  Features:
   • Built-in commands (cd, mkdir, touch, cat, etc.)
   • External programs run as child processes
   • Input/Output redirection (<, >)
   • Command piping (|)
---------------------------------------------
💡 Tip: Use 'help' to view all available commands.
---------------------------------------------
";

const JOKES: [&str; 5] = [
    "💻 Why did the computer get cold? It left its Windows open!",
    "😂 Debugging: being the detective in a crime movie where you are also the murderer.",
    "🤣 Why do programmers prefer dark mode? Because light attracts bugs!",
    "😅 I would tell you a UDP joke, but you might not get it.",
    "😜 There are 10 kinds of people: those who understand binary and those who don't.",
];

pub fn command_list() -> CommandList {
    let mut cmds = CommandList::new();

    cmds.register("date", Command::new("date", "Show current date and time.", Matcher::Exact, date_callback));
    cmds.register("pwd", Command::new("pwd", "Print current working directory.", Matcher::Exact, pwd_callback));
    cmds.register("cd", Command::new("cd <dir>", "Change working directory.", Matcher::Word, cd_callback));
    cmds.register("mkdir", Command::new("mkdir <dir>", "Create a new directory.", Matcher::Word, mkdir_callback));
    cmds.register("touch", Command::new("touch <file>", "Create an empty file.", Matcher::Word, touch_callback));
    cmds.register("cat", Command::new("cat <file>", "Display contents of a file.", Matcher::Word, cat_callback));
    cmds.register("echo", Command::new("echo <msg>", "Print text to the screen.", Matcher::Word, echo_callback));
    cmds.register("greet", Command::new("greet [name]", "Display a greeting message.", Matcher::Prefix, greet_callback));
    cmds.register("roll", Command::new("roll", "Roll a dice (1-6).", Matcher::Exact, roll_callback));
    cmds.register("joke", Command::new("joke", "Tell a random programming joke.", Matcher::Exact, joke_callback));
    cmds.register("about", Command::new("about", "Show project information.", Matcher::Exact, about_callback));
    cmds.register("help", Command::new("help", "Display this help menu.", Matcher::Exact, help_callback));
    cmds.register("exit", Command::new("exit", "Exit from the shell.", Matcher::Exact, exit_callback));

    cmds
}

fn resolve(cwd: &Path, arg: &str) -> PathBuf {
    cwd.join(arg)
}

fn usage(out: &mut OutputBuffer, text: &str) -> ExecStatus {
    let _ = writeln!(out, "Usage: {}", text);
    ExecStatus::Error
}

fn date_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let now = chrono::Local::now();
    let _ = writeln!(inv.out, "Current Date & Time: {}", now.format("%a %b %e %H:%M:%S %Y"));
    ExecStatus::Success
}

fn echo_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let _ = writeln!(inv.out, "{}", inv.arg);
    ExecStatus::Success
}

fn pwd_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let _ = writeln!(inv.out, "{}", inv.cwd.display());
    ExecStatus::Success
}

fn cd_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let dir = inv.arg.trim();
    if dir.is_empty() {
        return usage(inv.out, "cd <directory>");
    }

    let target = resolve(inv.cwd.as_path(), dir);
    match target.canonicalize() {
        Ok(path) if path.is_dir() => {
            tracing::debug!(cwd = %path.display(), "working directory changed");
            *inv.cwd = path;
            let _ = writeln!(inv.out, "Directory changed to: {}", dir);
            ExecStatus::Success
        }
        _ => {
            let _ = writeln!(inv.out, "Error: No such directory: {}", dir);
            ExecStatus::Error
        }
    }
}

fn mkdir_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let name = inv.arg.trim();
    if name.is_empty() {
        return usage(inv.out, "mkdir <directory_name>");
    }

    match DirBuilder::new().mode(0o755).create(resolve(inv.cwd.as_path(), name)) {
        Ok(()) => {
            let _ = writeln!(inv.out, "Directory '{}' created successfully.", name);
            ExecStatus::Success
        }
        Err(err) => {
            tracing::debug!(dir = name, "mkdir failed: {err}");
            let _ = writeln!(inv.out, "Error: could not create directory '{}'.", name);
            ExecStatus::Error
        }
    }
}

fn touch_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let name = inv.arg.trim();
    if name.is_empty() {
        return usage(inv.out, "touch <file_name>");
    }

    let opened = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .mode(0o644)
        .open(resolve(inv.cwd.as_path(), name));

    match opened {
        Ok(_) => {
            let _ = writeln!(inv.out, "File '{}' created successfully.", name);
            ExecStatus::Success
        }
        Err(err) => {
            tracing::debug!(file = name, "touch failed: {err}");
            let _ = writeln!(inv.out, "Error: could not create file '{}'.", name);
            ExecStatus::Error
        }
    }
}

fn cat_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let name = inv.arg.trim();
    if name.is_empty() {
        return usage(inv.out, "cat <file_name>");
    }

    // One byte past the room left is enough to notice truncation.
    let limit = inv.out.remaining() as u64 + 1;
    let mut contents = Vec::new();
    let read = File::open(resolve(inv.cwd.as_path(), name))
        .and_then(|file| file.take(limit).read_to_end(&mut contents));

    match read {
        Ok(_) => {
            inv.out.push_str(&String::from_utf8_lossy(&contents));
            ExecStatus::Success
        }
        Err(err) => {
            tracing::debug!(file = name, "cat failed: {err}");
            let _ = writeln!(inv.out, "Error: could not open file '{}'.", name);
            ExecStatus::Error
        }
    }
}

fn greet_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let name = match inv.arg.trim() {
        "" => "User",
        name => name,
    };
    let _ = writeln!(inv.out, "Hello, {}! Welcome to Mini Linux Shell!", name);
    ExecStatus::Success
}

fn roll_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let roll = rand::thread_rng().gen_range(1..=6);
    let _ = writeln!(inv.out, "🎲 You rolled a {}!", roll);
    ExecStatus::Success
}

fn joke_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    let joke = JOKES.choose(&mut rand::thread_rng()).unwrap_or(&JOKES[0]);
    let _ = writeln!(inv.out, "{}", joke);
    ExecStatus::Success
}

fn about_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    inv.out.push_str(ABOUT);
    ExecStatus::Success
}

fn help_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    inv.commands.write_help(inv.out);
    ExecStatus::Success
}

fn exit_callback(inv: &mut Invocation<'_>) -> ExecStatus {
    inv.out.push_str("Session closed.\n");
    ExecStatus::Exit
}
