use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use console::style;

use bumper::config::{BumperConfig, CliOverrides};
use bumper::engine::{self, Confirm, ReleaseOutcome, Reporter};
use bumper::version::BumpKind;
use bumper_process::SystemRunner;

#[derive(Parser, Debug)]
#[command(name = "bumper", disable_version_flag = true)]
#[command(about = "Conventional-commit releases: bump, changelog, tag, push, publish")]
struct Cli {
    /// Command to run. Only `publish` is recognised; extra words are ignored.
    #[arg(value_name = "COMMAND")]
    words: Vec<String>,

    /// Force a major version bump.
    #[arg(long)]
    major: bool,

    /// Force a minor version bump.
    #[arg(long)]
    minor: bool,

    /// Force a patch version bump.
    #[arg(long)]
    patch: bool,

    /// Force a prerelease bump and publish under the prerelease dist tag.
    #[arg(long, alias = "pre")]
    prerelease: bool,

    /// Release exactly this version. Forced bump flags take precedence.
    #[arg(short = 'v', long = "version", value_name = "VERSION")]
    exact_version: Option<String>,

    /// Do not ask for confirmation.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Config file (default: .bumper.toml in the working directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Package manifest, overriding the config file
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Stop after pushing; skip the publish step.
    #[arg(long)]
    no_publish: bool,
}

impl Cli {
    /// `publish` wherever it appears, otherwise the first word.
    fn command_name(&self) -> &str {
        self.words
            .iter()
            .find(|w| *w == "publish")
            .or_else(|| self.words.first())
            .map_or("", String::as_str)
    }

    fn forced_bump(&self) -> Option<BumpKind> {
        if self.major {
            Some(BumpKind::Major)
        } else if self.minor {
            Some(BumpKind::Minor)
        } else if self.patch {
            Some(BumpKind::Patch)
        } else if self.prerelease {
            Some(BumpKind::Prerelease)
        } else {
            None
        }
    }

    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            bump: self.forced_bump(),
            version: self.exact_version.clone(),
            prerelease: self.prerelease,
            assume_yes: self.yes,
            manifest: self.manifest.clone(),
            no_publish: self.no_publish,
        }
    }
}

struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("{}", style(msg).for_stderr().dim());
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("{} {msg}", style("[warn]").for_stderr().yellow().bold());
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{} {msg}", style("[error]").for_stderr().red().bold());
    }
}

/// Yes/no prompt on stdin. Anything but `y`/`yes` declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        eprint!("{} {question} [y/N] ", style("?").for_stderr().green().bold());
        io::stderr().flush().context("failed to flush prompt")?;

        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .context("failed to read confirmation")?;
        eprintln!();

        let answer = input.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }
}

/// Drop options clap does not define, so stray flags never abort a run.
///
/// Everything after `--` is kept as is.
fn retain_known_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let cmd = Cli::command();
    let is_long = |name: &str| {
        name == "help"
            || cmd.get_arguments().any(|a| {
                a.get_long() == Some(name)
                    || a.get_all_aliases().is_some_and(|aliases| aliases.contains(&name))
            })
    };
    let is_short =
        |c: char| c == 'h' || cmd.get_arguments().any(|a| a.get_short() == Some(c));

    let mut out = Vec::new();
    let mut positional_only = false;
    for arg in args {
        let keep = if positional_only || arg == "-" {
            true
        } else if arg == "--" {
            positional_only = true;
            true
        } else if let Some(long) = arg.strip_prefix("--") {
            is_long(long.split('=').next().unwrap_or_default())
        } else if let Some(short) = arg.strip_prefix('-') {
            short.chars().next().is_some_and(&is_short)
        } else {
            true
        };
        if keep {
            out.push(arg);
        }
    }
    out
}

fn main() -> Result<ExitCode> {
    let mut args = std::env::args();
    let bin = args.next().unwrap_or_else(|| "bumper".to_string());
    let cli = Cli::parse_from(std::iter::once(bin).chain(retain_known_args(args)));

    let command = cli.command_name();
    if command != "publish" {
        println!("{}", style(format!("Unknown command \"{command}\"")).red().bold());
        return Ok(ExitCode::SUCCESS);
    }

    let root = std::env::current_dir().context("failed to determine working directory")?;
    let config = match &cli.config {
        Some(path) => BumperConfig::load_from_file(&root.join(path))?,
        None => BumperConfig::load_from_dir(&root)?.unwrap_or_default(),
    };
    let opts = config.build_options(&root, &cli.overrides())?;

    let mut runner = SystemRunner::new(&root);
    let mut reporter = ConsoleReporter;
    let mut confirm = StdinConfirm;

    match engine::run_release(&opts, &mut runner, &mut confirm, &mut reporter) {
        Ok(ReleaseOutcome::Released { version, .. }) => {
            println!("{}", style(format!("Released v{version}")).green().bold());
            Ok(ExitCode::SUCCESS)
        }
        Ok(ReleaseOutcome::NoNewCommits | ReleaseOutcome::Declined { .. }) => {
            Ok(ExitCode::SUCCESS)
        }
        // Already reported by the engine.
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
