use std::{io::Write, ops::ControlFlow, str::FromStr};

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, warn};

use crate::tracker::{storage::usage_store::UsageStore, Tracker};

use super::output::{render_error, render_notice, render_warning, NO_DATA};

const HELP: &str = "\
Commands:
  start    Start tracking in the background
  stop     Stop tracking and save the current session
  stats    Show today's total and the last 7 tracked days
  status   Show whether tracking is active
  help     Show this message
  quit     Leave. A session that wasn't stopped is not saved";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Start,
    Stop,
    Stats,
    Status,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" | "s" => Ok(Self::Start),
            "stop" | "x" => Ok(Self::Stop),
            "stats" | "view" | "v" => Ok(Self::Stats),
            "status" => Ok(Self::Status),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(anyhow!("Unknown command {other:?}, type `help` for a list")),
        }
    }
}

/// Line based front end for [Tracker]. Commands are handled one at a time while sampling runs
/// on its own task.
pub struct Shell<S, W> {
    tracker: Tracker<S>,
    output: W,
    colors: bool,
}

impl<S: UsageStore + Send + Sync + 'static, W: Write> Shell<S, W> {
    pub fn new(tracker: Tracker<S>, output: W, colors: bool) -> Self {
        Self {
            tracker,
            output,
            colors,
        }
    }

    /// Reads commands until `quit` or end of input.
    pub async fn run(mut self, input: impl AsyncBufRead + Unpin) -> Result<()> {
        writeln!(self.output, "Editor time tracker. Type `help` for commands.")?;
        let mut lines = input.lines();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(self.output)?;
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<ShellCommand>() {
                Ok(command) => command,
                Err(e) => {
                    writeln!(self.output, "{e}")?;
                    continue;
                }
            };
            debug!("Executing {command:?}");

            if self.execute(command).await?.is_break() {
                break;
            }
        }

        if self.tracker.is_tracking() {
            warn!("Leaving while tracking, the open session is not saved");
        }
        Ok(())
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<ControlFlow<()>> {
        match command {
            ShellCommand::Start => {
                let notice = self.tracker.start();
                writeln!(self.output, "{}", render_notice(notice, self.colors))?;
            }
            ShellCommand::Stop => {
                let notice = self.tracker.stop().await;
                writeln!(self.output, "{}", render_notice(notice, self.colors))?;
            }
            ShellCommand::Stats => self.print_stats().await?,
            ShellCommand::Status => {
                let status = if self.tracker.is_tracking() {
                    "Tracking is active."
                } else {
                    "Tracking is not active."
                };
                writeln!(self.output, "{status}")?;
            }
            ShellCommand::Help => writeln!(self.output, "{HELP}")?,
            ShellCommand::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn print_stats(&mut self) -> Result<()> {
        match self.tracker.generate_report().await {
            Ok(Some(report)) => write!(self.output, "{report}")?,
            Ok(None) => writeln!(
                self.output,
                "{}",
                render_warning("No Data", NO_DATA, self.colors)
            )?,
            Err(e) => {
                error!("Failed to build report {e:?}");
                writeln!(
                    self.output,
                    "{}",
                    render_error("Error Reading Log", &format!("Error: {e}"), self.colors)
                )?
            }
        }
        Ok(())
    }
}
