use std::process::ExitCode;

use std::io::{
    self, BufRead, Write, stdin, stdout
};

use webshell::{
    ExecStatus, OutputBuffer, Shell, ShellConfig, logging
};

const BANNER: &str = "\
=== Mini Linux Shell ===
Type 'help' for the command list, 'exit' to quit

";

/// `ls` on its own shows the long listing in the console.
const CONSOLE_LS: &str = "ls -l";

fn main() -> ExitCode {
    logging::init("warn");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("webshell: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), webshell::ShellError> {
    let mut shell = Shell::new(ShellConfig::from_env()?)?;
    console(&mut shell, stdin().lock(), stdout())?;
    Ok(())
}

/// Reads lines until `exit` or end of input and returns how many were entered.
///
/// Blank lines count as entries; `exit` does not.
fn console<R: BufRead, W: Write>(shell: &mut Shell, mut input: R, mut output: W) -> io::Result<usize> {
    let mut out = OutputBuffer::with_capacity(shell.config().output_capacity);
    let mut command_no = 1;
    let mut line = String::new();

    output.write_all(BANNER.as_bytes())?;

    loop {
        write!(output, "Command [{}]> ", command_no)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 { break; }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            command_no += 1;
            continue;
        }

        let command = if trimmed == "ls" { CONSOLE_LS } else { trimmed };
        let status = shell.execute(command, &mut out);
        output.write_all(out.as_str().as_bytes())?;

        if status == ExecStatus::Exit { break; }
        command_no += 1;
    }

    writeln!(output, "Mini Linux Shell terminated. Total commands entered: {}", command_no - 1)?;
    output.flush()?;
    Ok(command_no - 1)
}
