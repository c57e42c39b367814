use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::FileRecord;
use crate::session::SessionStore;
use chrono::{DateTime, Utc};
use prettytable::{Cell, Row, Table};

/// Client-side search over the user's files.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// Case-insensitive substring of the file name.
    pub search: Option<String>,
    /// Exact type tag, compared case-insensitively.
    pub file_type: Option<String>,
}

impl FileFilter {
    pub fn matches(&self, file: &FileRecord) -> bool {
        let name_ok = match &self.search {
            Some(needle) if !needle.trim().is_empty() => file
                .name
                .to_lowercase()
                .contains(&needle.trim().to_lowercase()),
            _ => true,
        };
        let type_ok = match &self.file_type {
            Some(tag) if !tag.trim().is_empty() => file.file_type.eq_ignore_ascii_case(tag.trim()),
            _ => true,
        };
        name_ok && type_ok
    }

    pub fn apply<'a>(&self, files: &'a [FileRecord]) -> Vec<&'a FileRecord> {
        files.iter().filter(|f| self.matches(f)).collect()
    }
}

/// Fetch the signed-in user's files. Requires a session; a 401 clears it.
pub async fn fetch_files(api: &ApiClient, sessions: &SessionStore) -> Result<Vec<FileRecord>> {
    let session = sessions.require()?;
    let response = api
        .list_files(&session)
        .await
        .map_err(|e| sessions.on_error(e))?;
    Ok(response.files)
}

/// The record's own presigned URL if the listing carried one, otherwise a
/// fresh one from the lookup endpoint.
pub async fn presigned_url(
    api: &ApiClient,
    sessions: &SessionStore,
    file: &FileRecord,
) -> Result<String> {
    if let Some(url) = file.presigned_url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(url.to_string());
    }
    let lookup = api
        .get_file(&file.id)
        .await
        .map_err(|e| sessions.on_error(e))?;
    Ok(lookup.presigned_url)
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn render_table(files: &[&FileRecord], config: &Config) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("File Name"),
        Cell::new("Type"),
        Cell::new("Created"),
        Cell::new("Expires"),
        Cell::new("Share URL"),
    ]));

    for file in files {
        table.add_row(Row::new(vec![
            Cell::new(&file.name),
            Cell::new(&file.file_type.to_uppercase()),
            Cell::new(&format_date(&file.created_at)),
            Cell::new(&format_date(&file.expiration_time)),
            Cell::new(&config.share_url(&file.id)),
        ]));
    }

    table
}
