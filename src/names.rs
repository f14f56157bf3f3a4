//! logos-based lexer for naming attributes.
//!
//! A naming attribute holds one or more logical names separated by whitespace
//! or commas. A name immediately followed by `[]` marks a list binding:
//!
//! ```text
//! name="first_name"          -> [first_name]
//! name="title, heading"      -> [title, heading]
//! name="rows[]"              -> [rows (list)]
//! ```

use logos::Logos;

/// Token produced by the naming-attribute lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f,]+")]
enum Token<'a> {
    /// `[]` suffix marking the preceding name as a list.
    #[token("[]")]
    ListMarker,

    /// A logical name: anything that is not a separator or bracket.
    #[regex(r"[^ \t\n\r\f,\[\]]+", |lex| lex.slice())]
    Name(&'a str),
}

/// One logical name parsed from a naming attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderName {
    /// The name with any `[]` suffix stripped.
    pub name: String,
    /// Whether the name carried the `[]` list suffix.
    pub list: bool,
}

impl PlaceholderName {
    /// A plain (non-list) name.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: false,
        }
    }

    /// A list name.
    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: true,
        }
    }
}

/// Split a naming attribute into logical names, in order.
///
/// Stray brackets and a `[]` with no preceding name are skipped.
pub fn parse_names(input: &str) -> Vec<PlaceholderName> {
    let mut names: Vec<PlaceholderName> = Vec::new();
    let mut lexer = Token::lexer(input);
    let mut previous_end = None;
    while let Some(token) = lexer.next() {
        let span = lexer.span();
        match token {
            Ok(Token::Name(name)) => names.push(PlaceholderName::plain(name)),
            // Only a marker glued to the name that precedes it counts.
            Ok(Token::ListMarker) if previous_end == Some(span.start) => {
                if let Some(last) = names.last_mut() {
                    last.list = true;
                }
            }
            Ok(Token::ListMarker) => {}
            Err(()) => {
                tracing::trace!(input, at = span.start, "skipping stray bracket in name");
            }
        }
        previous_end = Some(span.end);
    }
    names
}
