//! Parses a Go parameter or result list's interior text into an ordered
//! list of (name, type) pairs, handling the "shared type" grouping Go
//! allows (`a, b int` means both `a` and `b` have type `int`) and the
//! fully-unnamed style (`int, string`) uniformly.

use super::lexer::{is_plain_ident, normalize_whitespace, split_first_top_level_ws, split_top_level};
use crate::types::Param;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenClass {
    /// A bare identifier with no following text; might be a parameter name
    /// awaiting a type from a later comma-separated group, or (if nothing
    /// in the list is `Named`) a single-identifier type such as `int`.
    Bare(String),
    Named(String, String),
    TypeOnly(String),
}

fn is_type_keyword(token: &str) -> bool {
    const PAREN_PREFIXES: [&str; 2] = ["func(", "func ("];
    const WORD_PREFIXES: [&str; 3] = ["struct", "interface", "chan"];

    if token.starts_with("<-chan") {
        return true;
    }
    for p in PAREN_PREFIXES.iter() {
        if token.starts_with(p) {
            return true;
        }
    }
    for p in WORD_PREFIXES.iter() {
        if token.starts_with(p) {
            match token[p.len()..].chars().next() {
                Some(c) if c == '_' || c.is_alphanumeric() => continue,
                _ => return true,
            }
        }
    }
    false
}

fn classify_token(token: &str) -> TokenClass {
    let token = token.trim();
    if token.is_empty() {
        return TokenClass::TypeOnly(String::new());
    }
    if is_type_keyword(token) {
        return TokenClass::TypeOnly(token.to_string());
    }
    match split_first_top_level_ws(token) {
        (first, Some(rest)) => {
            if is_plain_ident(&first) {
                TokenClass::Named(first, rest)
            } else {
                TokenClass::TypeOnly(token.to_string())
            }
        }
        (only, None) => {
            if is_plain_ident(&only) {
                TokenClass::Bare(only)
            } else {
                TokenClass::TypeOnly(token.to_string())
            }
        }
    }
}

fn resolve(tokens: Vec<TokenClass>) -> Vec<Param> {
    let any_named = tokens
        .iter()
        .any(|t| matches!(t, TokenClass::Named(..)));

    if !any_named {
        return tokens
            .into_iter()
            .map(|t| match t {
                TokenClass::Bare(ty) => Param::new("_", normalize_whitespace(&ty)),
                TokenClass::TypeOnly(ty) => Param::new("_", normalize_whitespace(&ty)),
                TokenClass::Named(n, ty) => Param::new(n, normalize_whitespace(&ty)),
            })
            .collect();
    }

    let mut out = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for t in tokens {
        match t {
            TokenClass::Bare(name) => pending.push(name),
            TokenClass::Named(name, ty) => {
                let ty = normalize_whitespace(&ty);
                for p in pending.drain(..) {
                    out.push(Param::new(p, ty.clone()));
                }
                out.push(Param::new(name, ty));
            }
            TokenClass::TypeOnly(ty) => {
                let ty = normalize_whitespace(&ty);
                for p in pending.drain(..) {
                    out.push(Param::new(p, ty.clone()));
                }
                out.push(Param::new("_", ty));
            }
        }
    }
    // Names with no following type (malformed input) still get recorded
    // rather than silently dropped, matching the extractor's "recover what
    // we can" failure policy.
    for p in pending.drain(..) {
        out.push(Param::new(p, "_"));
    }
    out
}

/// Parses the interior of a parameter list (the text between the parens,
/// not including them) into an ordered parameter list.
pub fn parse_params(content: &str) -> Vec<Param> {
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }
    let tokens: Vec<TokenClass> = split_top_level(content, ',')
        .iter()
        .map(|t| classify_token(t))
        .collect();
    resolve(tokens)
}

/// The number of results described by a single, unparenthesized result
/// type expression (0 if empty, 1 otherwise -- Go requires parens for more
/// than one unnamed result).
pub fn single_result_count(text: &str) -> usize {
    if text.trim().is_empty() {
        0
    } else {
        1
    }
}
