use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for spincube")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand, Clone, Copy)]
enum Task {
    /// fmt, clippy, tests, then a headless frame trace
    Ci,
    /// cargo fmt --check
    Fmt,
    /// clippy with warnings denied
    Clippy,
    /// Unit tests for every crate
    Test,
    /// Run the CLI's recorded trace as a smoke test
    Smoke,
}

impl Task {
    fn args(self) -> &'static [&'static str] {
        match self {
            Task::Fmt => &["fmt", "--all", "--", "--check"],
            Task::Clippy => &[
                "clippy",
                "--workspace",
                "--all-targets",
                "--",
                "-D",
                "warnings",
            ],
            Task::Test => &["test", "--workspace"],
            Task::Smoke => &[
                "run",
                "-q",
                "-p",
                "spincube-cli",
                "--",
                "trace",
                "--frames",
                "2",
                "--json",
            ],
            Task::Ci => &[],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let steps = match cli.command {
        Task::Ci => vec![Task::Fmt, Task::Clippy, Task::Test, Task::Smoke],
        task => vec![task],
    };
    for step in steps {
        cargo(step.args())?;
    }
    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("cargo {} failed ({status})", args[0]);
    }
    Ok(())
}
