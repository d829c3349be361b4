//! Object key layout for evidence files.

/// Extension used when the uploaded file name has none.
const FALLBACK_EXTENSION: &str = "bin";

/// Build the object key for an evidence upload:
/// `"{prefix}/{item_id}-{millis}.{ext}"`.
///
/// The extension comes from the original file name, reduced to ASCII
/// alphanumerics; `bin` when there is none.
#[must_use]
pub fn evidence_path(prefix: &str, item_id: &str, file_name: &str, millis: i64) -> String {
    let ext = extension_of(file_name).unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{item_id}-{millis}.{ext}")
    } else {
        format!("{prefix}/{item_id}-{millis}.{ext}")
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext: String = ext.chars().filter(char::is_ascii_alphanumeric).collect();
    (!ext.is_empty()).then_some(ext)
}

/// Last segment of a stored object path.
#[must_use]
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Best-effort MIME type from a file name, for the evidence record.
#[must_use]
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = extension_of(file_name)?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(mime)
}
