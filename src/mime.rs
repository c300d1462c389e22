//! MIME type <-> extension tag helpers

use std::collections::HashMap;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const ZIP: &str = "application/zip";

lazy_static::lazy_static! {
    // (mime, extension tag); the first entry for a mime wins for mime -> tag
    static ref MIME_TABLE: Vec<(&'static str, &'static str)> = vec![
        ("image/jpeg", "jpg"),
        ("image/jpeg", "jpeg"),
        ("image/png", "png"),
        ("image/gif", "gif"),
        ("image/webp", "webp"),
        ("image/svg+xml", "svg"),
        ("image/bmp", "bmp"),
        ("video/mp4", "mp4"),
        ("video/quicktime", "mov"),
        ("video/webm", "webm"),
        ("audio/mpeg", "mp3"),
        ("audio/wav", "wav"),
        ("application/pdf", "pdf"),
        ("application/zip", "zip"),
        ("application/json", "json"),
        ("application/msword", "doc"),
        ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", "docx"),
        ("application/vnd.ms-excel", "xls"),
        ("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", "xlsx"),
        ("application/vnd.ms-powerpoint", "ppt"),
        ("application/vnd.openxmlformats-officedocument.presentationml.presentation", "pptx"),
        ("text/plain", "txt"),
        ("text/csv", "csv"),
        ("text/html", "html"),
    ];
    static ref EXTENSION_BY_MIME: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for (mime, ext) in MIME_TABLE.iter() {
            map.entry(*mime).or_insert(*ext);
        }
        map
    };
    static ref MIME_BY_EXTENSION: HashMap<&'static str, &'static str> =
        MIME_TABLE.iter().map(|(mime, ext)| (*ext, *mime)).collect();
}

/// Short extension tag committed alongside an object, derived from its MIME type.
///
/// Unknown types fall back to the subtype with any `x-` prefix or `+suffix`
/// stripped; an empty or malformed type yields `"file"`.
pub fn format_mimetype(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if let Some(ext) = EXTENSION_BY_MIME.get(essence.as_str()) {
        return ext.to_string();
    }
    match essence.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => {
            let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);
            subtype.split('+').next().unwrap_or(subtype).to_string()
        }
        _ => "file".to_string(),
    }
}

/// Best-effort content type for a file name, used when enqueueing from disk.
pub fn guess_from_name(name: &str) -> &'static str {
    name.rsplit_once('.')
        .and_then(|(_, ext)| MIME_BY_EXTENSION.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(OCTET_STREAM)
}
