/// Google Sheets implementation of the [`Spreadsheet`] seam.
///
/// Talks to the Sheets v4 and Drive v3 REST APIs with the synchronous `ureq`
/// client. Authentication is a bearer access token obtained out of band,
/// read from `TAGBOARD_SHEETS_TOKEN` or from the credential file named in
/// `[mirror] credentials_path`. The file may be a bare token or the JSON
/// written by common OAuth helpers (`token` or `access_token` field).
///
/// Every request carries the configured timeout.
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{MirrorError, Spreadsheet};
use crate::config::schema::MirrorConfig;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Credential file payload.
#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(alias = "access_token")]
    token: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A connected worksheet inside one spreadsheet.
#[derive(Debug)]
pub struct SheetsClient {
    sheets_url: String,
    token: String,
    timeout: Duration,
    spreadsheet_id: String,
    worksheet: String,
}

impl SheetsClient {
    /// Resolve credentials, then find the spreadsheet by title or create it.
    pub fn connect(config: &MirrorConfig) -> Result<Self, MirrorError> {
        if !config.enabled {
            return Err(MirrorError::Disabled);
        }
        let token = load_token(config)?;
        let timeout = Duration::from_millis(config.timeout_ms);

        let spreadsheet_id = match find_spreadsheet(config, &token, timeout)? {
            Some(id) => id,
            None => create_spreadsheet(config, &token, timeout)?,
        };
        log::debug!(
            "mirror target: spreadsheet {spreadsheet_id}, worksheet {}",
            config.worksheet
        );

        Ok(Self {
            sheets_url: config.sheets_url.trim_end_matches('/').to_string(),
            token,
            timeout,
            spreadsheet_id,
            worksheet: config.worksheet.clone(),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `…/v4/spreadsheets/{id}/values/{last}`, with `last` percent-encoded.
    fn values_url(&self, last: &str) -> Result<Url, MirrorError> {
        segment_url(
            &self.sheets_url,
            &["v4", "spreadsheets", &self.spreadsheet_id, "values", last],
        )
    }
}

impl Spreadsheet for SheetsClient {
    fn clear(&mut self) -> Result<(), MirrorError> {
        let url = self.values_url(&format!("{}:clear", self.worksheet))?;
        ureq::post(url.as_str())
            .set("Authorization", &bearer(&self.token))
            .timeout(self.timeout)
            .send_json(json!({}))
            .map_err(api_error)?;
        Ok(())
    }

    fn write_rows(&mut self, rows: &[Vec<String>]) -> Result<(), MirrorError> {
        let range = format!("{}!A1", self.worksheet);
        let url = self.values_url(&range)?;
        ureq::put(url.as_str())
            .set("Authorization", &bearer(&self.token))
            .query("valueInputOption", "RAW")
            .timeout(self.timeout)
            .send_json(json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": rows,
            }))
            .map_err(api_error)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet lookup
// ---------------------------------------------------------------------------

fn find_spreadsheet(
    config: &MirrorConfig,
    token: &str,
    timeout: Duration,
) -> Result<Option<String>, MirrorError> {
    let url = segment_url(&config.drive_url, &["drive", "v3", "files"])?;
    let query = format!(
        "name = '{}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false",
        escape_query(&config.spreadsheet_title)
    );
    let list: FileList = ureq::get(url.as_str())
        .set("Authorization", &bearer(token))
        .query("q", &query)
        .query("fields", "files(id)")
        .timeout(timeout)
        .call()
        .map_err(api_error)?
        .into_json()?;
    Ok(list.files.into_iter().next().map(|f| f.id))
}

fn create_spreadsheet(
    config: &MirrorConfig,
    token: &str,
    timeout: Duration,
) -> Result<String, MirrorError> {
    let url = segment_url(&config.sheets_url, &["v4", "spreadsheets"])?;
    let created: CreatedSpreadsheet = ureq::post(url.as_str())
        .set("Authorization", &bearer(token))
        .timeout(timeout)
        .send_json(json!({
            "properties": { "title": config.spreadsheet_title },
            "sheets": [{ "properties": { "title": config.worksheet } }],
        }))
        .map_err(api_error)?
        .into_json()?;
    log::info!(
        "created spreadsheet '{}' ({})",
        config.spreadsheet_title,
        created.spreadsheet_id
    );
    Ok(created.spreadsheet_id)
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Access token from `TAGBOARD_SHEETS_TOKEN`, falling back to the credential
/// file.
fn load_token(config: &MirrorConfig) -> Result<String, MirrorError> {
    if let Ok(token) = std::env::var("TAGBOARD_SHEETS_TOKEN")
        && !token.trim().is_empty()
    {
        return Ok(token.trim().to_string());
    }
    let path = config.credentials_path().ok_or_else(|| {
        MirrorError::InvalidCredentials("could not determine home directory".into())
    })?;
    read_token_file(&path)
}

/// Read a credential file: JSON with a `token`/`access_token` field, or the
/// raw token text.
pub(crate) fn read_token_file(path: &Path) -> Result<String, MirrorError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MirrorError::CredentialsNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let trimmed = content.trim();

    let token = if trimmed.starts_with('{') {
        serde_json::from_str::<TokenFile>(trimmed)
            .map_err(|e| MirrorError::InvalidCredentials(format!("{}: {e}", path.display())))?
            .token
    } else {
        trimmed.to_string()
    };

    if token.is_empty() {
        return Err(MirrorError::InvalidCredentials(format!(
            "{}: empty token",
            path.display()
        )));
    }
    Ok(token)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Append percent-encoded path segments to a base URL.
fn segment_url(base: &str, segments: &[&str]) -> Result<Url, MirrorError> {
    let mut url = Url::parse(base)
        .map_err(|e| MirrorError::Transport(format!("invalid API URL '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| MirrorError::Transport(format!("API URL '{base}' cannot have a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Escape a literal for a Drive `q` expression.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn api_error(err: ureq::Error) -> MirrorError {
    match err {
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            MirrorError::Api { status, message }
        }
        ureq::Error::Transport(t) => MirrorError::Transport(t.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_file_accepts_both_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        fs::write(&a, r#"{"token":"abc","refresh_token":"r"}"#).unwrap();
        fs::write(&b, r#"{"access_token":"xyz"}"#).unwrap();
        assert_eq!(read_token_file(&a).unwrap(), "abc");
        assert_eq!(read_token_file(&b).unwrap(), "xyz");
    }

    #[test]
    fn token_file_may_be_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "ya29.raw\n").unwrap();
        assert_eq!(read_token_file(&path).unwrap(), "ya29.raw");
    }

    #[test]
    fn missing_or_empty_token_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            read_token_file(&missing),
            Err(MirrorError::CredentialsNotFound(_))
        ));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "  \n").unwrap();
        assert!(matches!(
            read_token_file(&empty),
            Err(MirrorError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn disabled_config_does_not_connect() {
        let config = MirrorConfig::default();
        assert!(matches!(
            SheetsClient::connect(&config),
            Err(MirrorError::Disabled)
        ));
    }

    #[test]
    fn segment_url_encodes_worksheet_names() {
        let url = segment_url(
            "https://sheets.example.com/",
            &["v4", "spreadsheets", "id1", "values", "My Sheet!A1"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/id1/values/My%20Sheet!A1"
        );
    }

    #[test]
    fn query_literals_are_escaped() {
        assert_eq!(escape_query("Bob's tags"), "Bob\\'s tags");
    }
}
