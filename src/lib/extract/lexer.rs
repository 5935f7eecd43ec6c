//! A minimal character-level scanner over Go source, just capable enough
//! to find top-level declaration boundaries and comment-strip/whitespace-
//! normalize type expressions. This is not a Go parser: it tracks bracket
//! depth and string/rune state so it doesn't get confused by braces inside
//! a string literal or a line that merely mentions the word "func" in a
//! comment, but it has no notion of Go grammar beyond that.

/// Removes `//` and `/* */` comments from `src`, replacing them with a
/// single space so column positions still roughly line up. String and rune
/// literals (including raw strings) are passed through untouched so that
/// e.g. a struct tag containing `//` isn't mistaken for a comment.
pub fn strip_comments(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                        out.push(chars[i]);
                    } else if chars[i] == '"' {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '\'' => {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                        out.push(chars[i]);
                    } else if chars[i] == '\'' {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '`' => {
                out.push(c);
                i += 1;
                while i < chars.len() && chars[i] != '`' {
                    out.push(chars[i]);
                    i += 1;
                }
                if i < chars.len() {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                out.push(' ');
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    if chars[i] == '\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                i += 2;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Collapses runs of ASCII whitespace to a single space and trims the ends.
pub fn normalize_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.trim().chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

pub fn is_plain_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return false,
    }
    chars.all(is_ident_continue)
}

/// A name begins with an uppercase letter, or a non-ASCII letter that is
/// itself uppercase under Unicode's casing rules (Go's exported-identifier
/// rule for non-Latin scripts).
pub fn is_exported(name: &str) -> bool {
    match name.chars().next() {
        Some(c) => c.is_uppercase(),
        None => false,
    }
}

/// A cursor over a char buffer that understands bracket depth and
/// string/rune/raw-string literals well enough to find matching
/// delimiters and top-level split points.
pub struct Cursor<'a> {
    chars: &'a [char],
    pub pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(chars: &'a [char]) -> Self {
        Cursor { chars, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skips to (and past) the next unescaped string/rune/raw-string
    /// literal boundary, given that `self.pos` currently points at its
    /// opening quote character.
    fn skip_literal(&mut self) {
        let quote = self.chars[self.pos];
        self.pos += 1;
        if quote == '`' {
            while let Some(c) = self.peek() {
                self.pos += 1;
                if c == '`' {
                    break;
                }
            }
            return;
        }
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\\' {
                self.pos += 1;
            } else if c == quote {
                break;
            }
        }
    }

    /// If the word at the current position exactly matches `kw` (and isn't
    /// a prefix of a longer identifier), advances past it and returns true.
    pub fn eat_keyword(&mut self, kw: &str) -> bool {
        let kw_chars: Vec<char> = kw.chars().collect();
        if self.pos + kw_chars.len() > self.chars.len() {
            return false;
        }
        if self.chars[self.pos..self.pos + kw_chars.len()] != kw_chars[..] {
            return false;
        }
        if let Some(next) = self.chars.get(self.pos + kw_chars.len()) {
            if is_ident_continue(*next) {
                return false;
            }
        }
        self.pos += kw_chars.len();
        true
    }

    /// True if the word at the current position is `kw`, without consuming.
    pub fn at_keyword(&self, kw: &str) -> bool {
        let mut c = Cursor {
            chars: self.chars,
            pos: self.pos,
        };
        c.eat_keyword(kw)
    }

    /// Reads a bare identifier starting at the current position, if any.
    pub fn read_ident(&mut self) -> Option<String> {
        let start = self.pos;
        if !self.peek().map(is_ident_start).unwrap_or(false) {
            return None;
        }
        while self.peek().map(is_ident_continue).unwrap_or(false) {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    /// Given that `self.pos` points at an opening bracket (one of
    /// `([{`), consumes through its matching close, correctly skipping
    /// nested brackets and string/rune/raw-string literals. Returns the
    /// consumed text including both delimiters, or `None` if the input is
    /// truncated (the close never appears).
    pub fn skip_balanced(&mut self) -> Option<String> {
        let open = self.peek()?;
        let close = match open {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            _ => return None,
        };
        let start = self.pos;
        self.pos += 1;
        let mut depth = 1usize;
        while depth > 0 {
            let c = self.peek()?;
            match c {
                '"' | '\'' | '`' => self.skip_literal(),
                _ if c == open => {
                    depth += 1;
                    self.pos += 1;
                }
                _ if c == close => {
                    depth -= 1;
                    self.pos += 1;
                }
                _ => {
                    self.pos += 1;
                }
            }
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    /// Advances to just past the next top-level newline (a statement
    /// terminator for single-line, non-grouped top-level declarations),
    /// or to EOF if there is none. Respects nested brackets and literals so
    /// a newline inside e.g. a function body doesn't end the scan early.
    pub fn skip_to_top_level_line_end(&mut self) {
        let mut depth = 0i32;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' | '`' => self.skip_literal(),
                '(' | '[' | '{' => {
                    depth += 1;
                    self.pos += 1;
                }
                ')' | ']' | '}' => {
                    depth -= 1;
                    self.pos += 1;
                }
                '\n' if depth <= 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {
                    self.pos += 1;
                }
            }
        }
    }

    pub fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    /// The text from `start` up to the current position.
    pub fn slice_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }
}

/// Splits `s` on top-level occurrences of `sep` (outside any nested
/// bracket and outside string/rune/raw-string literals).
pub fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut cur = Cursor::new(&chars);
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut depth = 0i32;
    while let Some(c) = cur.peek() {
        match c {
            '"' | '\'' | '`' => cur.skip_literal(),
            '(' | '[' | '{' => {
                depth += 1;
                cur.pos += 1;
            }
            ')' | ']' | '}' => {
                depth -= 1;
                cur.pos += 1;
            }
            _ if c == sep && depth == 0 => {
                parts.push(chars[start..cur.pos].iter().collect::<String>());
                cur.pos += 1;
                start = cur.pos;
            }
            _ => {
                cur.pos += 1;
            }
        }
    }
    parts.push(chars[start..].iter().collect());
    parts
}

/// Splits `s` into (first-word, rest) at the first top-level whitespace
/// run, or returns `(s, None)` if there is none. Used to separate a
/// parameter's name from its type expression.
pub fn split_first_top_level_ws(s: &str) -> (String, Option<String>) {
    let chars: Vec<char> = s.chars().collect();
    let mut cur = Cursor::new(&chars);
    let mut depth = 0i32;
    while let Some(c) = cur.peek() {
        match c {
            '"' | '\'' | '`' => cur.skip_literal(),
            '(' | '[' | '{' => {
                depth += 1;
                cur.pos += 1;
            }
            ')' | ']' | '}' => {
                depth -= 1;
                cur.pos += 1;
            }
            _ if c.is_whitespace() && depth == 0 => {
                let first: String = chars[..cur.pos].iter().collect();
                let rest: String = chars[cur.pos..].iter().collect();
                return (first.trim().to_string(), Some(rest.trim().to_string()));
            }
            _ => {
                cur.pos += 1;
            }
        }
    }
    (s.trim().to_string(), None)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let src = "func F() int { // returns one\n/* nothing to see */ return 1 }";
        let stripped = strip_comments(src);
        assert!(!stripped.contains("returns one"));
        assert!(!stripped.contains("nothing to see"));
        assert!(stripped.contains("func F() int"));
    }

    #[test]
    fn preserves_strings_containing_comment_markers() {
        let src = r#"const X = "http://example.com" // a url"#;
        let stripped = strip_comments(src);
        assert!(stripped.contains("\"http://example.com\""));
        assert!(!stripped.contains("a url"));
    }

    #[test]
    fn split_top_level_respects_nesting() {
        let parts = split_top_level("a, b map[string]int, c func(int, int) int", ',');
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].trim(), "b map[string]int");
    }

    #[test]
    fn splits_name_from_type() {
        let (name, ty) = split_first_top_level_ws("x ...int");
        assert_eq!(name, "x");
        assert_eq!(ty.unwrap(), "...int");
    }
}
