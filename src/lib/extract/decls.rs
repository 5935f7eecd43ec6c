//! Finds the package clause and every exported top-level declaration in a
//! single Go source file's text.

use super::lexer::{is_exported, is_plain_ident, split_top_level, strip_comments, Cursor};
use super::signature::{parse_params, single_result_count};
use crate::types::{Arity, Symbol};

/// Everything this module recovers from one file: its package clause (if
/// any was found) and the exported symbols declared at top level.
#[derive(Debug, Default)]
pub struct FileDecls {
    pub package: Option<String>,
    pub symbols: Vec<Symbol>,
}

/// Parses comment-stripped Go source into a package name and exported
/// top-level symbols. Tolerant of malformed input: anything it doesn't
/// recognize at the current position is skipped one character at a time
/// rather than treated as an error, matching the rest of the extractor's
/// "recover what we can" policy.
pub fn parse_source(src: &str) -> FileDecls {
    let stripped = strip_comments(src);
    let chars: Vec<char> = stripped.chars().collect();
    let mut cur = Cursor::new(&chars);
    let mut decls = FileDecls::default();

    while !cur.eof() {
        cur.skip_ws();
        if cur.eof() {
            break;
        }

        if cur.eat_keyword("package") {
            cur.skip_ws();
            if decls.package.is_none() {
                decls.package = cur.read_ident();
            }
            cur.skip_to_top_level_line_end();
        } else if cur.eat_keyword("import") {
            cur.skip_ws();
            if cur.peek() == Some('(') {
                cur.skip_balanced();
            } else {
                cur.skip_to_top_level_line_end();
            }
        } else if cur.at_keyword("const") {
            cur.eat_keyword("const");
            parse_value_group(&mut cur, Kind::Const, &mut decls.symbols);
        } else if cur.at_keyword("var") {
            cur.eat_keyword("var");
            parse_value_group(&mut cur, Kind::Var, &mut decls.symbols);
        } else if cur.at_keyword("type") {
            cur.eat_keyword("type");
            parse_type_group(&mut cur, &mut decls.symbols);
        } else if cur.at_keyword("func") {
            cur.eat_keyword("func");
            parse_func(&mut cur, &mut decls.symbols);
        } else if cur.bump().is_none() {
            break;
        }
    }

    decls
}

#[derive(Clone, Copy)]
enum Kind {
    Const,
    Var,
}

fn parse_value_group(cur: &mut Cursor, kind: Kind, out: &mut Vec<Symbol>) {
    cur.skip_ws();
    if cur.peek() == Some('(') {
        let text = match cur.skip_balanced() {
            Some(t) => t,
            None => return,
        };
        let inner = &text[1..text.len().saturating_sub(1)];
        for spec in split_group_specs(inner) {
            emit_value_names(&spec, kind, out);
        }
    } else {
        let start = cur.pos;
        cur.skip_to_top_level_line_end();
        let spec: String = cur.slice_from(start);
        emit_value_names(&spec, kind, out);
    }
}

fn emit_value_names(spec: &str, kind: Kind, out: &mut Vec<Symbol>) {
    let lhs = split_top_level(spec, '=').into_iter().next().unwrap_or_default();
    for item in split_top_level(&lhs, ',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (name, _) = super::lexer::split_first_top_level_ws(item);
        if name == "_" || !is_plain_ident(&name) || !is_exported(&name) {
            continue;
        }
        out.push(match kind {
            Kind::Const => Symbol::Const { name },
            Kind::Var => Symbol::Var { name },
        });
    }
}

fn parse_type_group(cur: &mut Cursor, out: &mut Vec<Symbol>) {
    cur.skip_ws();
    if cur.peek() == Some('(') {
        let text = match cur.skip_balanced() {
            Some(t) => t,
            None => return,
        };
        let inner = &text[1..text.len().saturating_sub(1)];
        for spec in split_group_specs(inner) {
            emit_type_name(&spec, out);
        }
    } else {
        let start = cur.pos;
        cur.skip_to_top_level_line_end();
        let spec: String = cur.slice_from(start);
        emit_type_name(&spec, out);
    }
}

fn emit_type_name(spec: &str, out: &mut Vec<Symbol>) {
    let chars: Vec<char> = spec.trim().chars().collect();
    let mut c = Cursor::new(&chars);
    let name = match c.read_ident() {
        Some(n) => n,
        None => return,
    };
    if is_exported(&name) {
        out.push(Symbol::Type { name });
    }
}

fn parse_func(cur: &mut Cursor, out: &mut Vec<Symbol>) {
    cur.skip_ws();
    let mut is_method = false;
    if cur.peek() == Some('(') {
        // Receiver: methods aren't top-level declarations in the sense this
        // index cares about (they're reached through a value, not the
        // package namespace), so skip over it but remember we saw one.
        cur.skip_balanced();
        cur.skip_ws();
        is_method = true;
    }

    let name = cur.read_ident();
    cur.skip_ws();
    if cur.peek() == Some('[') {
        // Type parameter list on a generic function.
        cur.skip_balanced();
        cur.skip_ws();
    }

    let params = if cur.peek() == Some('(') {
        cur.skip_balanced().map(|t| {
            let inner = t[1..t.len().saturating_sub(1)].to_string();
            parse_params(&inner)
        })
    } else {
        None
    };
    cur.skip_ws();

    let result_count = if cur.peek() == Some('(') {
        let text = cur.skip_balanced().unwrap_or_default();
        let inner = &text[1..text.len().saturating_sub(1)];
        if inner.trim().is_empty() {
            0
        } else {
            parse_params(inner).len()
        }
    } else {
        let span = scan_until_brace_or_top_level_newline(cur);
        single_result_count(&span)
    };

    cur.skip_ws();
    if cur.peek() == Some('{') {
        cur.skip_balanced();
    } else {
        cur.skip_to_top_level_line_end();
    }

    if is_method {
        return;
    }
    if let Some(name) = name {
        if is_exported(&name) {
            out.push(Symbol::Func {
                name,
                result_count: Arity::from_count(result_count),
                params: params.unwrap_or_default(),
            });
        }
    }
}

/// Scans from the current position up to (not including) the next
/// top-level `{` or newline, respecting nested brackets and literals. Used
/// to capture an unparenthesized function result type, which sits between
/// the parameter list and the function body.
fn scan_until_brace_or_top_level_newline(cur: &mut Cursor) -> String {
    let start = cur.pos;
    let mut depth = 0i32;
    loop {
        let c = match cur.peek() {
            Some(c) => c,
            None => break,
        };
        match c {
            '"' | '\'' | '`' => {
                // Reuse skip_balanced's literal handling indirectly: a
                // literal can't start a result type in valid Go, but stay
                // defensive by just stepping past it.
                cur.bump();
            }
            '(' | '[' => {
                depth += 1;
                cur.bump();
            }
            ')' | ']' => {
                depth -= 1;
                cur.bump();
            }
            '{' if depth <= 0 => break,
            '\n' if depth <= 0 => break,
            _ => {
                cur.bump();
            }
        }
    }
    cur.slice_from(start)
}

/// Splits the interior text of a parenthesized `const`/`var`/`type` group
/// into its individual specs, one per top-level line.
fn split_group_specs(inner: &str) -> Vec<String> {
    let chars: Vec<char> = inner.chars().collect();
    let mut cur = Cursor::new(&chars);
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut out = Vec::new();

    loop {
        let c = match cur.peek() {
            Some(c) => c,
            None => break,
        };
        match c {
            '"' | '\'' | '`' => {
                cur.bump();
            }
            '(' | '[' | '{' => {
                depth += 1;
                cur.bump();
            }
            ')' | ']' | '}' => {
                depth -= 1;
                cur.bump();
            }
            '\n' if depth <= 0 => {
                let seg: String = chars[start..cur.pos].iter().collect();
                if !seg.trim().is_empty() {
                    out.push(seg.trim().to_string());
                }
                cur.bump();
                start = cur.pos;
            }
            _ => {
                cur.bump();
            }
        }
    }
    let seg: String = chars[start..].iter().collect();
    if !seg.trim().is_empty() {
        out.push(seg.trim().to_string());
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finds_package_clause() {
        let decls = parse_source("package widget\n\nfunc F() {}\n");
        assert_eq!(decls.package.as_deref(), Some("widget"));
    }

    #[test]
    fn collects_exported_const_and_var() {
        let src = "package p\nconst (\n\tMaxSize = 10\n\tminSize = 1\n)\nvar Enabled = true\n";
        let decls = parse_source(src);
        let names: Vec<_> = decls.symbols.iter().map(Symbol::name).collect();
        assert!(names.contains(&"MaxSize"));
        assert!(names.contains(&"Enabled"));
        assert!(!names.contains(&"minSize"));
    }

    #[test]
    fn collects_exported_type() {
        let decls = parse_source("package p\ntype Widget struct {\n\tName string\n}\n");
        let names: Vec<_> = decls.symbols.iter().map(Symbol::name).collect();
        assert_eq!(names, vec!["Widget"]);
    }

    #[test]
    fn func_with_named_params_and_two_results() {
        let src = "package p\nfunc Parse(src string, strict bool) (*Widget, error) {\n\treturn nil, nil\n}\n";
        let decls = parse_source(src);
        let sym = decls.symbols.iter().find(|s| s.name() == "Parse").unwrap();
        match sym {
            Symbol::Func {
                result_count,
                params,
                ..
            } => {
                assert_eq!(result_count.0, 2);
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name, "src");
                assert_eq!(params[1].ty, "bool");
            }
            _ => panic!("expected Func"),
        }
    }

    #[test]
    fn func_with_single_unparenthesized_result() {
        let decls = parse_source("package p\nfunc Name() string {\n\treturn \"\"\n}\n");
        let sym = decls.symbols.iter().find(|s| s.name() == "Name").unwrap();
        match sym {
            Symbol::Func { result_count, .. } => assert_eq!(result_count.0, 1),
            _ => panic!("expected Func"),
        }
    }

    #[test]
    fn func_with_no_results() {
        let decls = parse_source("package p\nfunc Init() {\n}\n");
        let sym = decls.symbols.iter().find(|s| s.name() == "Init").unwrap();
        match sym {
            Symbol::Func { result_count, .. } => assert_eq!(result_count.0, 0),
            _ => panic!("expected Func"),
        }
    }

    #[test]
    fn methods_are_excluded() {
        let decls = parse_source("package p\nfunc (w *Widget) Name() string { return w.name }\n");
        assert!(decls.symbols.is_empty());
    }

    #[test]
    fn unexported_declarations_are_skipped() {
        let src = "package p\nfunc helper() {}\ntype thing struct{}\n";
        let decls = parse_source(src);
        assert!(decls.symbols.is_empty());
    }

    #[test]
    fn four_or_more_results_saturate_arity() {
        let src = "package p\nfunc Many() (int, int, int, int) { return 0, 0, 0, 0 }\n";
        let decls = parse_source(src);
        let sym = decls.symbols.iter().find(|s| s.name() == "Many").unwrap();
        match sym {
            Symbol::Func { result_count, .. } => assert_eq!(result_count.0, 3),
            _ => panic!("expected Func"),
        }
    }
}
