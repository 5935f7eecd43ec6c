//! Recognizes `//go:build` and legacy `// +build` constraint comments
//! well enough to decide, for a single fixed target platform, whether a
//! source file should be excluded. Anything beyond simple GOOS/GOARCH
//! identifiers joined by `&&`/`||`/`,`/whitespace and `!` negation is
//! treated as unrecognized, and an unrecognized constraint means the file
//! is kept rather than guessed away.

const GOOS: &[&str] = &[
    "linux", "darwin", "windows", "freebsd", "netbsd", "openbsd", "dragonfly", "solaris",
    "android", "ios", "js", "plan9", "aix",
];
const GOARCH: &[&str] = &[
    "amd64", "386", "arm", "arm64", "ppc64", "ppc64le", "mips", "mipsle", "mips64", "mips64le",
    "s390x", "wasm", "riscv64",
];

/// The platform this extractor evaluates build constraints against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Platform {
    pub goos: &'static str,
    pub goarch: &'static str,
}

impl Default for Platform {
    fn default() -> Self {
        Platform {
            goos: "linux",
            goarch: "amd64",
        }
    }
}

/// A single identifier's match against the platform, or `None` if the
/// identifier isn't a recognized GOOS/GOARCH value.
fn term_matches(token: &str, platform: Platform) -> Option<bool> {
    let (neg, ident) = match token.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if ident.is_empty() {
        return None;
    }
    let known = GOOS.contains(&ident) || GOARCH.contains(&ident);
    if !known {
        return None;
    }
    let matched = ident == platform.goos || ident == platform.goarch;
    Some(if neg { !matched } else { matched })
}

/// Evaluates an AND-group (every term must hold). `None` if any term is
/// unrecognized.
fn and_group(terms: &str, sep: &str, platform: Platform) -> Option<bool> {
    let mut result = true;
    let mut any = false;
    for t in terms.split(sep) {
        let t = t.trim();
        if t.is_empty() {
            continue;
        }
        any = true;
        match term_matches(t, platform) {
            Some(true) => {}
            Some(false) => result = false,
            None => return None,
        }
    }
    if !any {
        return None;
    }
    Some(result)
}

/// Evaluates a legacy `// +build` line's expression: space-separated OR
/// groups of comma-separated AND terms.
fn eval_plus_build(expr: &str, platform: Platform) -> Option<bool> {
    let mut any_group = false;
    let mut satisfied = false;
    for group in expr.split_whitespace() {
        any_group = true;
        match and_group(group, ",", platform) {
            Some(true) => satisfied = true,
            Some(false) => {}
            None => return None,
        }
    }
    if !any_group {
        return None;
    }
    Some(satisfied)
}

/// Evaluates a `//go:build` line's expression: `&&`/`||` of identifiers,
/// with `!` negation. Parenthesized or otherwise nested expressions are
/// treated as unrecognized (`None`) rather than guessed at.
fn eval_go_build(expr: &str, platform: Platform) -> Option<bool> {
    if expr.contains('(') || expr.contains(')') {
        return None;
    }
    let mut satisfied = false;
    let mut any_group = false;
    for group in expr.split("||") {
        any_group = true;
        match and_group(group, "&&", platform) {
            Some(true) => satisfied = true,
            Some(false) => {}
            None => return None,
        }
    }
    if !any_group {
        return None;
    }
    Some(satisfied)
}

/// Scans the leading comment block of `src` (the run of blank and `//`
/// comment lines before the first substantive line, which should be the
/// package clause) for build constraint comments, and reports whether the
/// file should be excluded for `platform`.
pub fn is_excluded(src: &str, platform: Platform) -> bool {
    for line in src.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("//go:build") {
            if let Some(false) = eval_go_build(rest.trim(), platform) {
                return true;
            }
            continue;
        }
        if let Some(rest) = trimmed
            .strip_prefix("// +build")
            .or_else(|| trimmed.strip_prefix("//+build"))
        {
            if let Some(false) = eval_plus_build(rest.trim(), platform) {
                return true;
            }
            continue;
        }
        if trimmed.starts_with("//") {
            continue;
        }
        // First non-comment, non-blank line: stop looking.
        break;
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;

    const LINUX_AMD64: Platform = Platform {
        goos: "linux",
        goarch: "amd64",
    };

    #[test]
    fn no_constraint_is_included() {
        assert!(!is_excluded("package p\n", LINUX_AMD64));
    }

    #[test]
    fn legacy_mismatched_goos_is_excluded() {
        let src = "// +build darwin\n\npackage p\n";
        assert!(is_excluded(src, LINUX_AMD64));
    }

    #[test]
    fn legacy_matching_goos_is_included() {
        let src = "// +build linux\n\npackage p\n";
        assert!(!is_excluded(src, LINUX_AMD64));
    }

    #[test]
    fn go_build_or_including_host_is_included() {
        let src = "//go:build darwin || linux\n\npackage p\n";
        assert!(!is_excluded(src, LINUX_AMD64));
    }

    #[test]
    fn go_build_and_excluding_host_is_excluded() {
        let src = "//go:build linux && arm64\n\npackage p\n";
        assert!(is_excluded(src, LINUX_AMD64));
    }

    #[test]
    fn negation_is_honored() {
        let src = "//go:build !windows\n\npackage p\n";
        assert!(!is_excluded(src, LINUX_AMD64));
    }

    #[test]
    fn unrecognized_expression_is_included() {
        let src = "//go:build (linux && cgo) || gofuzz\n\npackage p\n";
        assert!(!is_excluded(src, LINUX_AMD64));
    }
}
