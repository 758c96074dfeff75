//! Interactive prompts
//!
//! Line-based prompts for editing books and confirming destructive commands.

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    // Check if stdin is a TTY
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let answer = read_answer(&mut io::stdin().lock())?;
    Ok(is_yes(&answer))
}

/// Prompt with a default value, returns None if user keeps default
pub fn prompt_with_default(prompt: &str, default: &str) -> Result<Option<String>> {
    if default.is_empty() {
        print!("{}: ", prompt);
    } else {
        print!("{} [{}]: ", prompt, default);
    }
    io::stdout().flush()?;

    let answer = read_answer(&mut io::stdin().lock())?;
    Ok((!answer.is_empty()).then_some(answer))
}

/// Whether stdin is an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

fn read_answer(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("YES"));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_read_answer_trims() {
        let mut input = Cursor::new("  Dune  \nrest");
        assert_eq!(read_answer(&mut input).unwrap(), "Dune");

        let mut empty = Cursor::new("");
        assert_eq!(read_answer(&mut empty).unwrap(), "");
    }
}
