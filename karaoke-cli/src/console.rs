//! Small helpers for styled prompts and messages on stdout.

use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};

pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn thin_rule(width: usize) -> String {
    "-".repeat(width)
}

pub fn error(message: &str) {
    println!("{}", message.red());
}

pub fn notice(message: &str) {
    println!("{}", message.yellow());
}

pub fn success(message: &str) {
    println!("{}", message.green());
}

/// Print a prompt and read one trimmed line. `None` means stdin is closed.
pub fn prompt(message: &str) -> io::Result<Option<String>> {
    print!("{}", message.yellow());
    io::stdout().flush()?;
    read_trimmed_line(&mut io::stdin().lock())
}

/// Wait for Enter. Returns `false` if stdin is closed.
pub fn pause(message: &str) -> io::Result<bool> {
    Ok(prompt(message)?.is_some())
}

fn read_trimmed_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Whether an answer means "yes" (English or Spanish)
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}
