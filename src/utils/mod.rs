use regex::Regex;
use std::sync::LazyLock;

static PATH_WRAPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\s"'`]+|[\s"'`]+$"#).expect("path wrapping pattern is valid")
});

/// Returns the text between the first `<tag>` and the last `</tag>`.
///
/// A response missing either tag, or with the closing tag before the opening
/// one, yields an empty string.
pub fn extract_tagged(text: &str, tag: &str) -> String {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let Some(start) = text.find(&open).map(|idx| idx + open.len()) else {
        return String::new();
    };
    match text.rfind(&close) {
        Some(end) if end >= start => text[start..end].to_string(),
        _ => String::new(),
    }
}

pub fn has_extension(path: &str, extension: &str) -> bool {
    !extension.is_empty() && path.ends_with(extension)
}

/// Takes the first non-empty line of a model answer as a file path, without
/// surrounding quotes or backticks. Spaces inside the path are kept.
pub fn clean_file_path(answer: &str) -> Option<String> {
    let line = answer.lines().map(str::trim).find(|line| !line.is_empty())?;
    let path = PATH_WRAPPING.replace_all(line, "");
    let path = path.trim_start_matches("./");
    (!path.is_empty()).then(|| path.to_string())
}

/// Directory part of a `/`-separated path, empty for a bare file name.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}
