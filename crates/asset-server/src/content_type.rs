//! Content-type lookup by filename extension

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const PDF: &str = "application/pdf";

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
];

/// Infer a MIME type from a filename, defaulting to octet-stream
pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        return PDF;
    }

    let extension = lower.rsplit('.').next().unwrap_or_default();
    IMAGE_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Characters `urlencoding` escapes that URI components may carry verbatim
const URI_MARKS: &[(&str, &str)] = &[
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

/// Percent-encode a filename, leaving unreserved characters and `!'()*` as is
fn encode_component(value: &str) -> String {
    URI_MARKS
        .iter()
        .fold(urlencoding::encode(value).into_owned(), |acc, (escaped, mark)| {
            acc.replace(escaped, mark)
        })
}

/// `Content-Disposition` value that asks the client to display the asset inline
pub fn inline_disposition(filename: &str) -> String {
    format!("inline; filename=\"{}\"", encode_component(filename))
}
