//! Target preparation: make sure the destination database and its principal exist.
//!
//! The statements are idempotent, so they run on every migration. The
//! principal shares the database's name and is only granted privileges on
//! that one database.

/// Build the idempotent preparation script for `database`.
pub fn ensure_target_sql(database: &str, principal_password: &str) -> String {
    let ident = quote_identifier(database);
    let password = quote_literal(principal_password);

    format!(
        "CREATE USER IF NOT EXISTS {ident}@'%' IDENTIFIED BY {password}; \
         CREATE DATABASE IF NOT EXISTS {ident}; \
         GRANT ALL PRIVILEGES ON {ident}.* TO {ident}@'%';"
    )
}

/// Quote a MySQL identifier with backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a MySQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_ensure_target_sql() {
        assert_eq!(
            ensure_target_sql("shop", "secret"),
            "CREATE USER IF NOT EXISTS `shop`@'%' IDENTIFIED BY 'secret'; \
             CREATE DATABASE IF NOT EXISTS `shop`; \
             GRANT ALL PRIVILEGES ON `shop`.* TO `shop`@'%';"
        );
    }

    #[test]
    fn test_grant_is_scoped_to_database() {
        let sql = ensure_target_sql("shop", "secret");
        assert!(sql.contains("ON `shop`.*"));
        assert!(!sql.contains("ON *.*"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("table"), "`table`");
        assert_eq!(quote_identifier("has`tick"), "`has``tick`");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("secret"), "'secret'");
        assert_eq!(quote_literal("it's"), r"'it\'s'");
        assert_eq!(quote_literal(r"a\b"), r"'a\\b'");
    }
}
