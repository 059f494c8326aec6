//! Hand-written SQL tokenizer primitives shared by the linter.
//!
//! The report SQL dialect is intentionally textual (spec §9: "the contract
//! here is explicitly textual"), so these scanners track just enough state
//! — two string-quote modes with doubled-quote escapes, line comments,
//! block comments, and balanced parentheses — to split statements and find
//! comment-free regions without a full SQL grammar.

/// Split `sql` into its top-level statements on `;`, skipping semicolons
/// that appear inside string literals or comments. Empty statements are
/// dropped.
#[must_use]
pub fn split_top_level_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let length = chars.len();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string: Option<char> = None;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut i = 0;
    while i < length {
        let ch = chars[i];
        let next_ch = chars.get(i + 1).copied();

        if let Some(quote) = in_string {
            current.push(ch);
            if ch == quote {
                if next_ch == Some(quote) {
                    current.push(next_ch.unwrap());
                    i += 1;
                } else {
                    in_string = None;
                }
            }
        } else if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
            }
        } else if in_block_comment {
            if ch == '*' && next_ch == Some('/') {
                i += 1;
                in_block_comment = false;
            }
        } else if ch == '\'' || ch == '"' {
            in_string = Some(ch);
            current.push(ch);
        } else if ch == '-' && next_ch == Some('-') {
            in_line_comment = true;
            i += 1;
        } else if ch == '/' && next_ch == Some('*') {
            in_block_comment = true;
            i += 1;
        } else if ch == ';' {
            let segment = current.trim().to_string();
            if !segment.is_empty() {
                statements.push(segment);
            }
            current.clear();
        } else {
            current.push(ch);
        }

        i += 1;
    }

    let tail = current.trim().to_string();
    if !tail.is_empty() {
        statements.push(tail);
    }

    statements
}

/// Strip `--` line comments and `/* */` block comments from `sql`, leaving
/// string literals untouched. Used before the illegal-keyword and
/// parquet-path scans so a keyword mentioned only in a comment never
/// trips the filter.
#[must_use]
pub fn strip_comments(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let length = chars.len();
    let mut result = String::with_capacity(sql.len());
    let mut in_string: Option<char> = None;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut i = 0;
    while i < length {
        let ch = chars[i];
        let next_ch = chars.get(i + 1).copied();

        if let Some(quote) = in_string {
            result.push(ch);
            if ch == quote {
                if next_ch == Some(quote) {
                    result.push(next_ch.unwrap());
                    i += 1;
                } else {
                    in_string = None;
                }
            }
        } else if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
                result.push(ch);
            }
        } else if in_block_comment {
            if ch == '*' && next_ch == Some('/') {
                i += 1;
                in_block_comment = false;
            }
        } else if ch == '\'' || ch == '"' {
            in_string = Some(ch);
            result.push(ch);
        } else if ch == '-' && next_ch == Some('-') {
            in_line_comment = true;
            i += 1;
        } else if ch == '/' && next_ch == Some('*') {
            in_block_comment = true;
            i += 1;
        } else {
            result.push(ch);
        }

        i += 1;
    }

    result
}

/// Given `sql` and the byte offset just past an opening `(`, return the
/// text up to (not including) the matching `)`, plus the char index of
/// that closing paren. Returns `None` if unbalanced.
#[must_use]
pub fn extract_parenthetical(sql: &str, start_char_index: usize) -> Option<(String, usize)> {
    let chars: Vec<char> = sql.chars().collect();
    let length = chars.len();
    let mut depth: i32 = 1;
    let mut current = String::new();
    let mut in_string: Option<char> = None;

    let mut i = start_char_index;
    while i < length {
        let ch = chars[i];
        let next_ch = chars.get(i + 1).copied();

        if let Some(quote) = in_string {
            current.push(ch);
            if ch == quote {
                if next_ch == Some(quote) {
                    current.push(next_ch.unwrap());
                    i += 1;
                } else {
                    in_string = None;
                }
            }
        } else if ch == '\'' || ch == '"' {
            in_string = Some(ch);
            current.push(ch);
        } else if ch == '(' {
            depth += 1;
            current.push(ch);
        } else if ch == ')' {
            depth -= 1;
            if depth == 0 {
                return Some((current, i));
            }
            current.push(ch);
        } else {
            current.push(ch);
        }

        i += 1;
    }

    None
}

/// The first top-level (depth-0, outside strings) comma-separated argument
/// of a parenthesized argument list.
#[must_use]
pub fn first_argument(body: &str) -> &str {
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let chars: Vec<char> = body.chars().collect();

    for (idx, &ch) in chars.iter().enumerate() {
        let next_ch = chars.get(idx + 1).copied();
        if let Some(quote) = in_string {
            if ch == quote {
                if next_ch == Some(quote) {
                    continue;
                }
                in_string = None;
            }
        } else if ch == '\'' || ch == '"' {
            in_string = Some(ch);
        } else if ch == '(' {
            depth += 1;
        } else if ch == ')' {
            depth -= 1;
        } else if ch == ',' && depth == 0 {
            return char_slice(body, 0, idx);
        }
    }
    body
}

fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let byte_start = s.char_indices().nth(start).map_or(0, |(b, _)| b);
    let byte_end = s.char_indices().nth(end).map_or(s.len(), |(b, _)| b);
    &s[byte_start..byte_end]
}
