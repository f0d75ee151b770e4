use serde::{Deserialize, Serialize};

/// One slot in a token stream.
///
/// `Filtered` marks a stopword or sub-threshold token: it is never indexed but
/// still occupies its position so positional offsets stay aligned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Kept(String),
    Filtered,
}

impl Token {
    pub fn term(&self) -> Option<&str> {
        match self {
            Token::Kept(term) => Some(term),
            Token::Filtered => None,
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, Token::Filtered)
    }
}

impl From<&str> for Token {
    fn from(term: &str) -> Self {
        Token::Kept(term.to_string())
    }
}

impl From<String> for Token {
    fn from(term: String) -> Self {
        Token::Kept(term)
    }
}

/// Convenience for tests and callers holding plain strings.
pub fn kept<I, S>(terms: I) -> Vec<Token>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    terms.into_iter().map(|t| Token::Kept(t.into())).collect()
}
