//! Startup parameter collection.
//!
//! Values given on the command line or in a config file are used as-is;
//! anything still missing is prompted for, in order, re-prompting until a
//! non-negative integer is entered.

use std::io::{BufRead, Write};

use lfg_core::{ConfigError, Field, PartialConfig, SimConfig};
use tracing::debug;

/// Resolve `partial` into a full config, prompting on `output` and reading
/// answers from `input` for each missing field.
pub fn resolve<R, W>(partial: PartialConfig, input: &mut R, output: &mut W) -> Result<SimConfig, ConfigError>
where
    R: BufRead,
    W: Write,
{
    if !partial.missing().is_empty() {
        writeln!(output, "--- LFG Dungeon Queue Simulator ---")?;
    }
    partial.resolve_with(|field| ask(field, input, output))
}

fn ask<R, W>(field: Field, input: &mut R, output: &mut W) -> Result<u64, ConfigError>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "{}", field.prompt())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(ConfigError::InputClosed(field.name()));
        }

        match field.parse(&line) {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!(field = field.name(), input = line.trim(), "rejected startup value");
                writeln!(output, "{e}")?;
            }
        }
    }
}
