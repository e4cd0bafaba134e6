//! Identifier syntax check and quoting. Table and column names come from configuration
//! and payload keys, so they are checked before they reach statement text.

use crate::error::CompileError;
use regex::Regex;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern"))
}

pub fn check_identifier(s: &str) -> Result<(), CompileError> {
    if identifier_re().is_match(s) {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier(s.to_string()))
    }
}

/// Quote identifier for SQLite (only called on names that passed `check_identifier`).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for ok in ["users", "_tmp", "Order_Items2"] {
            assert!(check_identifier(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_injection_shapes() {
        for bad in ["", "1users", "users; DROP TABLE x", "a.b", "name\"", "sp ace", "a--"] {
            assert_eq!(
                check_identifier(bad),
                Err(CompileError::InvalidIdentifier(bad.to_string()))
            );
        }
    }

    #[test]
    fn quoting_wraps_in_double_quotes() {
        assert_eq!(quoted("users"), "\"users\"");
    }
}
