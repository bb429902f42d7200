//! Markdown rendering for tool output.

use rusqlite::types::ValueRef;

/// Render a SQLite value as a single markdown-table cell.
pub fn render_value(value: ValueRef<'_>) -> String {
    let text = match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    };
    escape_cell(&text)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

/// Pipe-style markdown table. Cells are expected to be pre-escaped.
pub fn markdown_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(
        &columns
            .iter()
            .map(|c| escape_cell(c))
            .collect::<Vec<_>>()
            .join(" | "),
    );
    out.push_str(" |\n|");
    for _ in columns {
        out.push_str("---|");
    }
    for row in rows {
        out.push_str("\n| ");
        out.push_str(&row.join(" | "));
        out.push_str(" |");
    }
    out
}

/// Markdown bullet list, one item per line.
pub fn bullet_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_separator_and_rows() {
        let table = markdown_table(
            &["id".into(), "name".into()],
            &[vec!["1".into(), "Ann".into()], vec!["2".into(), "Bo".into()]],
        );
        assert_eq!(
            table,
            "| id | name |\n|---|---|\n| 1 | Ann |\n| 2 | Bo |"
        );
    }

    #[test]
    fn empty_result_keeps_header() {
        let table = markdown_table(&["n".into()], &[]);
        assert_eq!(table, "| n |\n|---|");
    }

    #[test]
    fn values_are_flattened_and_escaped() {
        assert_eq!(render_value(ValueRef::Null), "");
        assert_eq!(render_value(ValueRef::Integer(7)), "7");
        assert_eq!(render_value(ValueRef::Real(2.5)), "2.5");
        assert_eq!(render_value(ValueRef::Text(b"a|b\nc")), "a\\|b c");
        assert_eq!(render_value(ValueRef::Blob(&[1, 2, 3])), "<3 bytes>");
    }

    #[test]
    fn bullet_list_prefixes_items() {
        assert_eq!(bullet_list(&["a", "b"]), "- a\n- b");
    }
}
