//! Line-oriented interactive shell over a chronometer.
//!
//! Each input line is one command, parsed with clap. Errors are reported on
//! the output and the session continues. The shell asks its clock for the
//! current instant once per command, so tests can drive it with a fixed one.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ww_core::{ChronoError, Chronometer, TimerId, format_duration, sum_durations};

use crate::render::{TimerRow, write_timer_table, write_totals};

const HELP: &str = "\
Commands:
  add <name...>            add a timer
  start <id>               start a timer, stopping any other
  row <index>              start the timer shown at a table row
  stop                     stop tracking (counts idle time)
  rename <id> <name...>    rename a timer
  remove <id> [--force]    remove a timer
  status                   show all timers
  help                     show this help
  quit                     end the session";

#[derive(Debug, Parser)]
#[command(
    name = "ww",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    Add {
        #[arg(required = true)]
        name: Vec<String>,
    },
    Start {
        id: TimerId,
    },
    Row {
        index: usize,
    },
    Stop,
    Rename {
        id: TimerId,
        #[arg(required = true)]
        name: Vec<String>,
    },
    Remove {
        id: TimerId,
        #[arg(long)]
        force: bool,
    },
    Status,
    Help,
    #[command(alias = "exit")]
    Quit,
}

/// Whether the session continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive session bound to one chronometer.
pub struct Shell<'a, C> {
    chrono: &'a Chronometer,
    clock: C,
}

impl<'a, C> Shell<'a, C>
where
    C: Fn() -> DateTime<Utc>,
{
    pub const fn new(chrono: &'a Chronometer, clock: C) -> Self {
        Self { chrono, clock }
    }

    /// Reads commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<()> {
        writeln!(output, "Type 'help' for commands.")?;
        self.status(output)?;

        for line in input.lines() {
            let line = line.context("failed to read command")?;
            if self.execute(&line, output)? == Flow::Quit {
                break;
            }
            output.flush()?;
        }
        Ok(())
    }

    /// Executes a single command line.
    pub fn execute<W: Write>(&self, line: &str, output: &mut W) -> Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(Flow::Continue);
        }

        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                let message = err.to_string();
                let first = message.lines().next().unwrap_or("error: invalid command");
                writeln!(output, "{first}")?;
                return Ok(Flow::Continue);
            }
        };
        tracing::debug!(?command, "shell command");

        let now = (self.clock)();
        let result = match command {
            ShellCommand::Add { name } => {
                let name = name.join(" ");
                let id = self.chrono.add_at(name.as_str(), now);
                Ok(format!("added {id} {name}"))
            }
            ShellCommand::Start { id } => self.start(id, now),
            ShellCommand::Row { index } => self
                .chrono
                .id_at(index)
                .and_then(|id| self.start(id, now)),
            ShellCommand::Stop => {
                self.chrono.stop_at(now);
                Ok("stopped, tracking idle time".to_string())
            }
            ShellCommand::Rename { id, name } => self
                .chrono
                .update_name(id, name.join(" "))
                .map(|()| format!("renamed {id}")),
            ShellCommand::Remove { id, force } => {
                self.chrono.remove_at(id, force, now).map(|removed| {
                    format!(
                        "removed {id} {} ({})",
                        removed.name(),
                        format_duration(removed.total())
                    )
                })
            }
            ShellCommand::Status => {
                self.status(output)?;
                return Ok(Flow::Continue);
            }
            ShellCommand::Help => {
                writeln!(output, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        };

        match result {
            Ok(message) => writeln!(output, "{message}")?,
            Err(err) => writeln!(output, "error: {err}")?,
        }
        Ok(Flow::Continue)
    }

    fn start(&self, id: TimerId, now: DateTime<Utc>) -> Result<String, ChronoError> {
        self.chrono.start_at(id, now)?;
        Ok(format!("started {id}"))
    }

    fn status<W: Write>(&self, output: &mut W) -> Result<()> {
        let now = (self.clock)();
        let snapshot = self.chrono.snapshot();
        if snapshot.timer_list.is_empty() {
            writeln!(output, "No timers. Use 'add <name>' to create one.")?;
        } else {
            let rows: Vec<TimerRow<'_>> = snapshot
                .timer_list
                .iter()
                .enumerate()
                .map(|(index, watch)| TimerRow {
                    index,
                    id: watch.id(),
                    state: watch.state(),
                    total: format_duration(watch.live_total(now)),
                    name: watch.name(),
                })
                .collect();
            write_timer_table(output, &rows)?;
        }
        let total = sum_durations(snapshot.timer_list.iter().map(|w| w.live_total(now)));
        write_totals(
            output,
            &format_duration(snapshot.stop_timer.live_total(now)),
            &format_duration(total),
        )?;
        Ok(())
    }
}
