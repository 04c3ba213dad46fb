//! Common utilities for SQL rendering

/// Quote an identifier with double quotes, doubling any embedded quote.
///
/// # Examples
/// ```
/// use relnest::query_builder::common::quote_identifier;
/// assert_eq!(quote_identifier("author_id"), "\"author_id\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a table name, keeping an optional schema qualifier separate.
///
/// # Examples
/// ```
/// use relnest::query_builder::common::quote_table;
/// assert_eq!(quote_table("books"), "\"books\"");
/// assert_eq!(quote_table("public.books"), "\"public\".\"books\"");
/// ```
pub fn quote_table(table: &str) -> String {
    table
        .split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Format a qualified column reference: "alias"."column"
pub fn qualified_column(table_alias: &str, column_name: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier(table_alias),
        quote_identifier(column_name)
    )
}
