// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 building blocks for Telegram Bot API messages.
//!
//! Every piece of user-controlled text (issue titles, branch names, commit
//! messages) goes through [`escape`] before being wrapped in formatting.

/// Characters that must be escaped in MarkdownV2 outside code entities.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escapes plain text for MarkdownV2.
pub fn escape(text: &str) -> String {
    escape_set(text, SPECIAL_CHARS)
}

/// Escapes text placed inside `` `code` `` or a pre block.
pub fn escape_code(text: &str) -> String {
    escape_set(text, &['`', '\\'])
}

/// Escapes the URL part of an inline link.
pub fn escape_url(url: &str) -> String {
    escape_set(url, &[')', '\\'])
}

fn escape_set(text: &str, set: &[char]) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if set.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn bold(text: &str) -> String {
    format!("*{}*", escape(text))
}

pub fn italic(text: &str) -> String {
    format!("_{}_", escape(text))
}

pub fn code(text: &str) -> String {
    format!("`{}`", escape_code(text))
}

/// Inline link; `text` is escaped, `url` is escaped for the link target.
pub fn link(text: &str, url: &str) -> String {
    format!("[{}]({})", escape(text), escape_url(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_special_character() {
        assert_eq!(
            escape("_*[]()~`>#+-=|{}.!\\"),
            "\\_\\*\\[\\]\\(\\)\\~\\`\\>\\#\\+\\-\\=\\|\\{\\}\\.\\!\\\\"
        );
        assert_eq!(escape("plain words"), "plain words");
    }

    #[test]
    fn code_only_escapes_backtick_and_backslash() {
        assert_eq!(code("a.b`c\\d"), "`a.b\\`c\\\\d`");
    }

    #[test]
    fn link_escapes_text_and_url_separately() {
        assert_eq!(
            link("fix (#1)", "https://github.com/o/r/pull/1?x=(y)"),
            "[fix \\(\\#1\\)](https://github.com/o/r/pull/1?x=(y\\))"
        );
    }

    #[test]
    fn bold_and_italic_wrap_escaped_text() {
        assert_eq!(bold("v1.2"), "*v1\\.2*");
        assert_eq!(italic("feature/x-y"), "_feature/x\\-y_");
    }
}
