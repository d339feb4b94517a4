//! Line-oriented console loop.
//!
//! Commands:
//! - empty line: ignored
//! - `check`: list the default source
//! - `open <path>` / `open -s <code>`: open a folder in the desktop file manager
//! - `exit` (or end of input): leave the loop
//! - anything else: relocate the default source to the target of that path code

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command as Process;
use tracing::{debug, error, info};

use crate::errors::SortboxError;
use crate::output as out;
use crate::relocate::OverallOutcome;
use crate::service::RelocationService;
use crate::shutdown::ShutdownToken;

pub const PROMPT: &str = "path code>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Check,
    OpenPath(PathBuf),
    OpenCode(String),
    Exit,
    Relocate(String),
    /// Recognised command with missing arguments; holds the usage text.
    Usage(&'static str),
}

const OPEN_CODE_USAGE: &str = "usage: open -s <path code>";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line.eq_ignore_ascii_case("exit") {
            return Command::Exit;
        }
        if line.eq_ignore_ascii_case("check") {
            return Command::Check;
        }
        if let Some(rest) = line.strip_prefix("open ") {
            let rest = rest.trim();
            if rest == "-s" {
                return Command::Usage(OPEN_CODE_USAGE);
            }
            if let Some(code) = rest.strip_prefix("-s ") {
                return Command::OpenCode(code.trim().to_string());
            }
            if !rest.is_empty() {
                return Command::OpenPath(PathBuf::from(rest.trim_matches(['"', '\''])));
            }
        }
        Command::Relocate(line.to_string())
    }
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug)]
pub struct Repl<'a> {
    service: &'a RelocationService,
    token: ShutdownToken,
    interactive: bool,
}

impl<'a> Repl<'a> {
    pub fn new(service: &'a RelocationService, token: ShutdownToken) -> Self {
        Self {
            service,
            token,
            interactive: true,
        }
    }

    /// Suppress the prompt (input is not a terminal).
    pub fn quiet_prompt(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Read commands until `exit`, end of input, or cancellation.
    pub fn run<R: BufRead>(&self, mut input: R) -> anyhow::Result<()> {
        let mut line = String::new();
        loop {
            if self.token.is_cancelled() {
                debug!("Console loop cancelled");
                return Ok(());
            }
            if self.interactive {
                out::print_prompt(PROMPT);
            }
            line.clear();
            if input.read_line(&mut line)? == 0 {
                debug!("End of input");
                return Ok(());
            }
            if self.execute(Command::parse(&line)) == Flow::Exit {
                return Ok(());
            }
        }
    }

    pub fn execute(&self, command: Command) -> Flow {
        let result = match command {
            Command::Empty => return Flow::Continue,
            Command::Exit => return Flow::Exit,
            Command::Usage(usage) => {
                out::print_warn(usage);
                return Flow::Continue;
            }
            Command::Check => self.check(),
            Command::OpenPath(path) => open_folder(&path),
            Command::OpenCode(code) => self
                .service
                .target_for(&code)
                .and_then(|target| open_folder(&target)),
            Command::Relocate(code) => self.relocate(&code),
        };
        match result {
            Ok(()) => out::print_success_separator(),
            Err(e) => {
                error!(code = e.code(), error = %e, "Command failed");
                out::print_error(&e.to_string());
                out::print_exception_separator();
            }
        }
        Flow::Continue
    }

    fn check(&self) -> Result<(), SortboxError> {
        let names = self.service.check_source()?;
        if names.is_empty() {
            out::print_info("The buffer has no files yet.");
        } else {
            for name in names {
                out::print_user(&name);
            }
        }
        Ok(())
    }

    fn relocate(&self, code: &str) -> Result<(), SortboxError> {
        let report = self.service.run(code).inspect_err(|e| {
            if let (SortboxError::UnknownPathCode(_), Ok(mapping)) = (e, self.service.mapping()) {
                let known: Vec<_> = mapping.codes().collect();
                out::print_info(&format!("Known path codes: {}", known.join(", ")));
            }
        })?;
        match report.outcome {
            OverallOutcome::Success => out::print_success(&format!(
                "Moved {} file(s) for '{}' ({} failed)",
                report.moved,
                code.trim(),
                report.failed
            )),
            OverallOutcome::NothingFound => out::print_info("Nothing to move."),
            OverallOutcome::IoFailure => {
                out::print_error("Relocation failed; see the log for details.")
            }
        }
        Ok(())
    }
}

fn opener() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Open `dir` in the platform file manager. Does not wait for it to exit.
pub fn open_folder(dir: &Path) -> Result<(), SortboxError> {
    if !dir.is_dir() {
        return Err(SortboxError::InvalidDirectory(dir.to_path_buf()));
    }
    Process::new(opener())
        .arg(dir)
        .spawn()
        .map_err(|e| SortboxError::OpenFolder {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
    info!(dir = %dir.display(), "Opened folder");
    Ok(())
}
