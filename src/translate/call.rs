//! Lexical helpers for finding the extent of a function call in SQL text.
//!
//! Nothing here understands SQL grammar. Parentheses are balanced and
//! single-quoted literals are skipped while splitting arguments, which is
//! enough to pull `expr` out of `DATE_FORMAT(COALESCE(a, b), '%Y')`.

/// Arguments of one call, plus where the call ends.
#[derive(Debug, PartialEq)]
pub(crate) struct CallSpan<'a> {
    /// Trimmed argument texts, left to right.
    pub args: Vec<&'a str>,
    /// Byte offset just past the closing parenthesis.
    pub end: usize,
}

/// Split the argument list whose opening parenthesis sits at byte `open`.
///
/// Returns `None` if `open` is not a `(` or the parentheses never balance.
pub(crate) fn scan_call(sql: &str, open: usize) -> Option<CallSpan<'_>> {
    let bytes = sql.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_literal = false;
    let mut start = open + 1;
    let mut args = Vec::new();

    for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
        if in_literal {
            // A doubled '' closes and reopens, which leaves us inside.
            if b == b'\'' {
                in_literal = false;
            }
            continue;
        }
        match b {
            b'\'' => in_literal = true,
            b'(' => depth += 1,
            b')' if depth == 0 => {
                let last = sql[start..i].trim();
                if !(args.is_empty() && last.is_empty()) {
                    args.push(last);
                }
                return Some(CallSpan { args, end: i + 1 });
            }
            b')' => depth -= 1,
            b',' if depth == 0 => {
                args.push(sql[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    None
}

/// Wrap `expr` in parentheses unless it already binds as a single operand.
///
/// Identifiers, numbers, placeholders, plain function calls and fully
/// parenthesized expressions are returned as-is.
pub(crate) fn parenthesize(expr: &str) -> String {
    let expr = expr.trim();
    if is_single_operand(expr) {
        expr.to_string()
    } else {
        format!("({})", expr)
    }
}

fn is_single_operand(expr: &str) -> bool {
    if expr.is_empty() {
        return false;
    }
    if expr
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'"' | b'?' | b'$'))
    {
        return true;
    }

    // `(...)` or `name(...)` where the first parenthesis closes at the very end.
    let name_len = expr
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.')
        .count();
    match expr[name_len..].find('(') {
        Some(gap) if expr[name_len..name_len + gap].trim().is_empty() => {
            scan_call(expr, name_len + gap).is_some_and(|call| call.end == expr.len())
        }
        _ => false,
    }
}
