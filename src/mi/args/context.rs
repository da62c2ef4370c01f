use itertools::Itertools;

/// Remaining, not yet consumed, arguments of a single command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenContext {
    tokens: Vec<String>,
}

impl TokenContext {
    /// Split raw argument text into tokens.
    ///
    /// Tokens are separated by whitespaces. Token that starts with `"` runs until the first
    /// not escaped `"` followed by a whitespace (or by the end of input), so it may contain
    /// spaces and escaped quotes. Quotes are kept in token text.
    pub fn new(raw: &str) -> Self {
        let chars: Vec<char> = raw.chars().collect();
        let mut tokens = vec![];
        let mut i = 0;

        while i < chars.len() {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }

            let start = i;
            if chars[i] == '"' {
                i += 1;
                while i < chars.len() {
                    match chars[i] {
                        '\\' => i += 2,
                        '"' if chars.get(i + 1).map_or(true, |c| c.is_whitespace()) => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
            } else {
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
            }

            let end = i.min(chars.len());
            tokens.push(chars[start..end].iter().collect());
        }

        Self { tokens }
    }

    pub(crate) fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Return first not consumed token.
    pub fn front(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.tokens.get(idx).map(String::as_str)
    }

    /// Return position of a first token equals to one of `candidates`.
    pub fn position(&self, candidates: &[&str]) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| candidates.contains(&t.as_str()))
    }

    /// Remove token at index. Removed token never returns into the context.
    pub fn remove(&mut self, idx: usize) -> Option<String> {
        (idx < self.tokens.len()).then(|| self.tokens.remove(idx))
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.remove(0)
    }

    /// Return all remaining tokens joined by a single space.
    pub fn remainder(&self) -> String {
        self.tokens.iter().join(" ")
    }

    /// Consume all remaining tokens, return them joined by a single space.
    pub fn take_remainder(&mut self) -> String {
        let rest = self.remainder();
        self.tokens.clear();
        rest
    }
}

/// Return true if token is enclosed in double quotes.
pub fn is_quoted(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('"') && token.ends_with('"')
}

/// Remove enclosing quotes and escaping slashes (`\"` -> `"`, `\\` -> `\`).
pub fn unquote(token: &str) -> String {
    let trimmed = token.trim();
    let inner = if is_quoted(trimmed) {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    strip_slashes(inner)
}

/// Remove slashes that escape quotes or slashes.
pub fn strip_slashes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    result.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        result.push(c);
    }
    result
}
