//! DDL tokenizer and table-block extractor.
//!
//! Reads raw schema text and isolates each `CREATE TABLE name ( ... );`
//! block as a text span, then splits block bodies into column/constraint
//! fragments. The scanner is an explicit character state machine with
//! parenthesis-depth tracking, so commas inside type arguments
//! (`DECIMAL(10,2)`) or inline `CHECK (...)` expressions never split a
//! fragment.
//!
//! Finding zero blocks is an explicit, well-formed result: callers must
//! treat "no tables detected" as a reportable state, never as a
//! single-table schema.

use thiserror::Error;
use tracing::debug;

/// Tokenizer-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DdlError {
    /// A `CREATE TABLE` opened a parenthesis that never closed.
    #[error("unterminated CREATE TABLE block for table '{0}'")]
    UnterminatedBlock(String),
}

/// One extracted `CREATE TABLE` statement: table name plus the raw text
/// between the outermost parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    /// Table name with any backtick/double-quote quoting removed.
    pub name: String,
    /// Raw column body, whitespace-normalized, without the outer parens.
    pub body: String,
}

/// Classification of one comma-separated fragment of a table body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Starts with an identifier followed by a type token.
    Column,
    /// Starts with a table-constraint keyword.
    Constraint,
    /// Neither shape; skipped by the model builder.
    Unknown,
}

/// Table-constraint keyword prefixes that mark a fragment as not-a-column.
const CONSTRAINT_PREFIXES: [&str; 5] =
    ["PRIMARY KEY", "FOREIGN KEY", "UNIQUE", "CHECK", "CONSTRAINT"];

/// Strips SQL comments and collapses whitespace runs to single spaces.
///
/// `--` line comments and `/* */` block comments are removed; content
/// inside single-quote, double-quote, and backtick literals is preserved
/// verbatim, including whitespace.
///
/// # Examples
///
/// ```
/// use schema_lab_core::normalize_sql;
///
/// let sql = "CREATE TABLE t ( -- the id\n  id   INTEGER\n);";
/// assert_eq!(normalize_sql(sql), "CREATE TABLE t ( id INTEGER );");
/// ```
pub fn normalize_sql(sql: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        LineComment,
        BlockComment,
        Quoted(char),
    }

    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut state = State::Normal;

    let push_space = |out: &mut String| {
        if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    };

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                '\'' | '"' | '`' => {
                    out.push(c);
                    state = State::Quoted(c);
                }
                c if c.is_whitespace() => push_space(&mut out),
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    push_space(&mut out);
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    push_space(&mut out);
                    state = State::Normal;
                }
            }
            State::Quoted(quote) => {
                out.push(c);
                if c == quote {
                    state = State::Normal;
                }
            }
        }
    }

    out.trim_end().to_string()
}

/// Extracts every `CREATE TABLE name ( ... )` block from raw schema text.
///
/// Matching is case-insensitive; `IF NOT EXISTS` is tolerated between
/// the keyword and the table name. Blocks are returned in document
/// order. An input with no blocks yields an empty vector, not an error.
///
/// # Errors
///
/// Returns [`DdlError::UnterminatedBlock`] when a table body's opening
/// parenthesis is never balanced.
///
/// # Examples
///
/// ```
/// use schema_lab_core::extract_table_blocks;
///
/// let blocks = extract_table_blocks(
///     "CREATE TABLE users (id INTEGER); CREATE TABLE posts (id INTEGER);",
/// ).unwrap();
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].name, "users");
/// ```
pub fn extract_table_blocks(sql: &str) -> Result<Vec<TableBlock>, DdlError> {
    let (blocks, error) = extract_table_blocks_lossy(sql);
    match error {
        Some(e) => Err(e),
        None => Ok(blocks),
    }
}

/// Like [`extract_table_blocks`], but returns whatever blocks were
/// successfully extracted before the first failure alongside the error.
///
/// Diagram rendering after a parse failure uses the partial result.
pub fn extract_table_blocks_lossy(sql: &str) -> (Vec<TableBlock>, Option<DdlError>) {
    let normalized = normalize_sql(sql);
    // ASCII lowercasing keeps byte offsets aligned with `normalized`.
    let lower = normalized.to_ascii_lowercase();
    let bytes = normalized.as_bytes();

    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find("create table") {
        let start = cursor + found;
        cursor = start + "create table".len();

        // Keyword must sit on identifier boundaries.
        let preceded_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let followed_ok = bytes.get(cursor).is_some_and(|b| b.is_ascii_whitespace());
        if !preceded_ok || !followed_ok {
            continue;
        }

        let mut pos = skip_spaces(bytes, cursor);
        if lower[pos..].starts_with("if not exists ") {
            pos = skip_spaces(bytes, pos + "if not exists".len());
        }

        let Some((name, after_name)) = read_identifier(&normalized, pos) else {
            continue;
        };
        let open = skip_spaces(bytes, after_name);
        if bytes.get(open) != Some(&b'(') {
            continue;
        }

        match read_balanced_body(&normalized, open) {
            Some((body, after_close)) => {
                debug!(table = %name, body_len = body.len(), "extracted CREATE TABLE block");
                blocks.push(TableBlock {
                    name,
                    body: body.trim().to_string(),
                });
                cursor = after_close;
            }
            None => return (blocks, Some(DdlError::UnterminatedBlock(name))),
        }
    }

    (blocks, None)
}

/// Splits a table body into fragments on commas at parenthesis depth 0.
///
/// This is the most failure-prone step of the whole parse: wrong depth
/// tracking corrupts every downstream column. Commas inside nested
/// parens or string literals never split.
///
/// # Examples
///
/// ```
/// use schema_lab_core::split_column_fragments;
///
/// let fragments = split_column_fragments("id INTEGER, price DECIMAL(10,2)");
/// assert_eq!(fragments, vec!["id INTEGER", "price DECIMAL(10,2)"]);
/// ```
pub fn split_column_fragments(body: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut depth: u32 = 0;
    let mut quote: Option<char> = None;

    for c in body.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                let fragment = current.trim();
                if !fragment.is_empty() {
                    fragments.push(fragment.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let fragment = current.trim();
    if !fragment.is_empty() {
        fragments.push(fragment.to_string());
    }
    fragments
}

/// Classifies a body fragment as a column definition, a table-level
/// constraint, or neither.
///
/// # Examples
///
/// ```
/// use schema_lab_core::{classify_fragment, FragmentKind};
///
/// assert_eq!(classify_fragment("id INTEGER PRIMARY KEY"), FragmentKind::Column);
/// assert_eq!(
///     classify_fragment("FOREIGN KEY (user_id) REFERENCES users(id)"),
///     FragmentKind::Constraint
/// );
/// assert_eq!(classify_fragment(")("), FragmentKind::Unknown);
/// ```
pub fn classify_fragment(fragment: &str) -> FragmentKind {
    let upper = fragment.trim().to_ascii_uppercase();
    if CONSTRAINT_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return FragmentKind::Constraint;
    }
    match parse_column_shape(fragment) {
        Some(_) => FragmentKind::Column,
        None => FragmentKind::Unknown,
    }
}

/// Extracts `(name, type_token)` from a column-shaped fragment.
///
/// The name is the leading identifier (quoting stripped); the type is
/// the following whitespace-delimited token, parens included so
/// `DECIMAL(10,2)` survives as one token.
pub(crate) fn parse_column_shape(fragment: &str) -> Option<(String, String)> {
    let trimmed = fragment.trim();
    let (name, after_name) = read_identifier(trimmed, 0)?;
    let rest = trimmed[after_name..].trim_start();
    let type_token: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace())
        .filter(|c| c.is_alphanumeric() || matches!(c, '(' | ')' | ',' | '_'))
        .collect();
    if type_token.is_empty() {
        return None;
    }
    Some((name, type_token))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_spaces(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
        pos += 1;
    }
    pos
}

/// Reads an optionally backtick- or double-quote-quoted identifier at
/// `pos`, returning it unquoted together with the offset just past it.
fn read_identifier(text: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    match bytes.get(pos)? {
        b'`' | b'"' => {
            let quote = bytes[pos] as char;
            let end = text[pos + 1..].find(quote)? + pos + 1;
            let name = text[pos + 1..end].to_string();
            (!name.is_empty()).then_some((name, end + 1))
        }
        b if b.is_ascii_alphabetic() || *b == b'_' => {
            let mut end = pos;
            while bytes.get(end).is_some_and(|b| is_ident_byte(*b)) {
                end += 1;
            }
            Some((text[pos..end].to_string(), end))
        }
        _ => None,
    }
}

/// Returns the text between the paren at `open` and its balanced close,
/// plus the offset just past the close. Quote-aware.
fn read_balanced_body(text: &str, open: usize) -> Option<(&str, usize)> {
    let mut depth: u32 = 0;
    let mut quote: Option<char> = None;
    for (offset, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let start = open + 1;
                    let end = open + offset;
                    return Some((&text[start..end], end + 1));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_comments_and_collapses_whitespace() {
        let sql = "CREATE TABLE t (\n  a INTEGER, -- counter\n  /* doc */ b TEXT\n);";
        assert_eq!(normalize_sql(sql), "CREATE TABLE t ( a INTEGER, b TEXT );");
    }

    #[test]
    fn test_normalize_preserves_string_literals() {
        let sql = "INSERT INTO t VALUES ('a  -- not a comment  b')";
        assert_eq!(normalize_sql(sql), sql);
    }

    #[test]
    fn test_extract_finds_blocks_in_document_order() {
        let sql = "CREATE TABLE users (id INTEGER);\ncreate table posts (id INTEGER);";
        let blocks = extract_table_blocks(sql).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "users");
        assert_eq!(blocks[1].name, "posts");
        assert_eq!(blocks[0].body, "id INTEGER");
    }

    #[test]
    fn test_extract_handles_quoted_names_and_if_not_exists() {
        let sql = r#"CREATE TABLE IF NOT EXISTS "order items" (id INTEGER);"#;
        let blocks = extract_table_blocks(sql).unwrap();
        assert_eq!(blocks[0].name, "order items");
    }

    #[test]
    fn test_extract_empty_input_is_empty_not_error() {
        assert!(extract_table_blocks("").unwrap().is_empty());
        assert!(extract_table_blocks("SELECT 1;").unwrap().is_empty());
    }

    #[test]
    fn test_extract_ignores_keyword_inside_identifier() {
        // "xcreate table" must not match; the real block must.
        let sql = "CREATE TABLE xcreate_tablex (id INTEGER);";
        let blocks = extract_table_blocks(sql).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "xcreate_tablex");
    }

    #[test]
    fn test_extract_unterminated_block_reports_table() {
        let err = extract_table_blocks("CREATE TABLE broken (id INTEGER").unwrap_err();
        assert_eq!(err, DdlError::UnterminatedBlock("broken".to_string()));
    }

    #[test]
    fn test_lossy_extraction_keeps_earlier_blocks() {
        let sql = "CREATE TABLE ok (id INTEGER); CREATE TABLE broken (id INTEGER";
        let (blocks, error) = extract_table_blocks_lossy(sql);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "ok");
        assert!(error.is_some());
    }

    #[test]
    fn test_split_keeps_nested_paren_commas_intact() {
        let fragments =
            split_column_fragments("id INTEGER, price DECIMAL(10,2), CHECK (a IN (1,2,3))");
        assert_eq!(
            fragments,
            vec!["id INTEGER", "price DECIMAL(10,2)", "CHECK (a IN (1,2,3))"]
        );
    }

    #[test]
    fn test_split_ignores_commas_in_string_literals() {
        let fragments = split_column_fragments("label TEXT DEFAULT 'a,b', n INTEGER");
        assert_eq!(fragments, vec!["label TEXT DEFAULT 'a,b'", "n INTEGER"]);
    }

    #[test]
    fn test_split_deeply_nested_parens() {
        let fragments = split_column_fragments("v TEXT CHECK (f(g(1,2),h(3,4))), w INTEGER");
        assert_eq!(
            fragments,
            vec!["v TEXT CHECK (f(g(1,2),h(3,4)))", "w INTEGER"]
        );
    }

    #[test]
    fn test_classify_constraint_prefixes() {
        for fragment in [
            "PRIMARY KEY (id)",
            "foreign key (a) references t(b)",
            "UNIQUE (email)",
            "CHECK (price > 0)",
            "CONSTRAINT fk_user FOREIGN KEY (u) REFERENCES users(id)",
        ] {
            assert_eq!(classify_fragment(fragment), FragmentKind::Constraint);
        }
    }

    #[test]
    fn test_classify_column_and_unknown() {
        assert_eq!(classify_fragment("name TEXT NOT NULL"), FragmentKind::Column);
        assert_eq!(classify_fragment("42"), FragmentKind::Unknown);
        assert_eq!(classify_fragment(""), FragmentKind::Unknown);
    }

    #[test]
    fn test_parse_column_shape_keeps_type_arguments() {
        let (name, ty) = parse_column_shape("price DECIMAL(10,2) NOT NULL").unwrap();
        assert_eq!(name, "price");
        assert_eq!(ty, "DECIMAL(10,2)");
    }
}
