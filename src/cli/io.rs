//! JSON I/O handling for CLI
//!
//! - Input: one JSON object, inline, from an `@path` file or via stdin
//! - Output: one JSON object or explain text via stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Resolves the `--query` argument to a JSON value.
///
/// `@path` reads the file, any other string is parsed inline, and a
/// missing argument reads all of stdin.
pub fn read_query(arg: Option<&str>) -> CliResult<Value> {
    let text = match arg {
        Some(arg) => match arg.strip_prefix('@') {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path, e)))?,
            None => arg.to_string(),
        },
        None => read_stdin()?,
    };

    parse_query(&text)
}

/// Parses query text, rejecting blank input
pub fn parse_query(text: &str) -> CliResult<Value> {
    if text.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(text)?)
}

fn read_stdin() -> CliResult<String> {
    let mut buf = String::new();
    io::stdin().lock().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write plain text to stdout
pub fn write_text(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()?;

    Ok(())
}
