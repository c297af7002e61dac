//! Naming of pre-migration backups.

use chrono::{DateTime, Local, TimeZone};

/// Timestamp layout used in backup file names.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Backup file name `<database>_backup_<YYYYMMDD_HHMMSS>.sql`.
pub fn backup_file_name<Tz: TimeZone>(database: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_backup_{}.sql",
        database,
        at.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

/// Backup file name for `database` stamped with the current local time.
pub fn backup_file_name_now(database: &str) -> String {
    backup_file_name(database, &Local::now())
}

/// Full path of a backup inside `dir`, or the bare name without one.
pub fn backup_path(dir: Option<&str>, file_name: &str) -> String {
    match dir.map(|d| d.trim_end_matches('/')) {
        Some("") => format!("/{}", file_name),
        Some(dir) => format!("{}/{}", dir, file_name),
        None => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_backup_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(backup_file_name("shop", &at), "shop_backup_20240309_070501.sql");
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(backup_path(None, "a.sql"), "a.sql");
        assert_eq!(backup_path(Some("backups"), "a.sql"), "backups/a.sql");
        assert_eq!(backup_path(Some("/var/backups/"), "a.sql"), "/var/backups/a.sql");
        assert_eq!(backup_path(Some("/"), "a.sql"), "/a.sql");
    }
}
