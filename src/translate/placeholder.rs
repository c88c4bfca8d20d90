/// Replace every `?` with `$1`, `$2`, ... in left-to-right order.
///
/// This is purely lexical. A `?` inside a quoted literal, or PostgreSQL's
/// jsonb `?` operator, is renumbered too. Run it once, after all rewrite
/// passes.
pub fn renumber_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut next = 0usize;
    for ch in sql.chars() {
        if ch == '?' {
            next += 1;
            out.push('$');
            out.push_str(&next.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Number of positional `?` markers in MySQL-style SQL.
pub fn count_placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renumber_in_order() {
        assert_eq!(
            renumber_placeholders("WHERE user_id = ? AND created_at BETWEEN ? AND ?"),
            "WHERE user_id = $1 AND created_at BETWEEN $2 AND $3"
        );
    }

    #[test]
    fn test_renumber_without_placeholders() {
        let sql = "SELECT 1";
        assert_eq!(renumber_placeholders(sql), sql);
    }

    #[test]
    fn test_renumber_adjacent_and_double_digit() {
        let sql = "?".repeat(11);
        let out = renumber_placeholders(&sql);
        assert!(out.starts_with("$1$2$3"));
        assert!(out.ends_with("$10$11"));
    }

    #[test]
    fn test_renumber_is_literal_unaware() {
        // Known limitation, kept deliberately.
        assert_eq!(
            renumber_placeholders("WHERE note = 'why?' AND id = ?"),
            "WHERE note = 'why$1' AND id = $2"
        );
    }

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("a = ? AND b IN (?, ?)"), 3);
        assert_eq!(count_placeholders("SELECT 1"), 0);
    }

    #[test]
    fn test_non_ascii_text_survives() {
        assert_eq!(
            renumber_placeholders("SELECT '提案' WHERE id = ?"),
            "SELECT '提案' WHERE id = $1"
        );
    }
}
