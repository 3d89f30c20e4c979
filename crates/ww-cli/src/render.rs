//! Plain-text timer tables shared by the shell and `ww show`.

use std::io::{self, Write};

use ww_core::{TimerId, TimerState};

/// One display row.
#[derive(Debug, Clone)]
pub struct TimerRow<'a> {
    pub index: usize,
    pub id: TimerId,
    pub state: TimerState,
    pub total: String,
    pub name: &'a str,
}

pub fn write_timer_table<W: Write>(writer: &mut W, rows: &[TimerRow<'_>]) -> io::Result<()> {
    write_line(
        writer,
        &format!(
            "{:<3} {:<4} {:<7}  {:>9}  {}",
            "#", "ID", "State", "Total", "Name"
        ),
    )?;
    for row in rows {
        write_line(
            writer,
            &format!(
                "{:<3} {:<4} {:<7}  {:>9}  {}",
                row.index,
                row.id.to_string(),
                row.state.as_str(),
                row.total,
                row.name
            ),
        )?;
    }
    Ok(())
}

/// Idle and work totals below a table.
pub fn write_totals<W: Write>(writer: &mut W, idle: &str, total: &str) -> io::Result<()> {
    writeln!(writer, "Idle:  {idle}")?;
    writeln!(writer, "Total: {total}")
}

// Empty names would otherwise leave trailing padding.
fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writeln!(writer, "{}", line.trim_end())
}
