// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tokenizer for `/command arg --key=value` messages.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name without the slash or `@botname` suffix.
    pub name: String,
    pub args: Vec<String>,
    /// `--key=value` options; a bare `--flag` maps to `"true"`.
    pub options: BTreeMap<String, String>,
}

impl ParsedCommand {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// Splits a command message on whitespace. Returns `None` if `text` is not a
/// command.
pub fn parse(text: &str) -> Option<ParsedCommand> {
    let mut words = text.split_whitespace();
    let head = words.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or_default().to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    let mut args = Vec::new();
    let mut options = BTreeMap::new();
    for word in words {
        match word.strip_prefix("--") {
            Some(option) if !option.is_empty() => {
                let (key, value) = option.split_once('=').unwrap_or((option, "true"));
                options.insert(key.to_ascii_lowercase(), value.to_string());
            }
            _ => args.push(word.to_string()),
        }
    }
    Some(ParsedCommand {
        name,
        args,
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_args_and_options() {
        let parsed = parse("/subscribe octo/app --secret=s3cr=t --quiet").unwrap();
        assert_eq!(parsed.name, "subscribe");
        assert_eq!(parsed.args, vec!["octo/app"]);
        assert_eq!(parsed.option("secret"), Some("s3cr=t"));
        assert_eq!(parsed.option("quiet"), Some("true"));
    }

    #[test]
    fn strips_bot_mention() {
        let parsed = parse("/List@OctorelayBot").unwrap();
        assert_eq!(parsed.name, "list");
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn non_commands_are_none() {
        assert!(parse("hello /start").is_none());
        assert!(parse("/").is_none());
        assert!(parse("/@bot").is_none());
        assert!(parse("   ").is_none());
    }

    #[test]
    fn bare_double_dash_is_an_argument() {
        let parsed = parse("/help --").unwrap();
        assert_eq!(parsed.args, vec!["--"]);
        assert!(parsed.options.is_empty());
    }
}
