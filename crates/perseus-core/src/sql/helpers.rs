/// Quote a string as a SQL literal, doubling embedded single quotes.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// True when an editor field holds something other than whitespace.
pub(crate) fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}
