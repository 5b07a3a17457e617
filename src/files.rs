//! Reading files that are supplied as question context.

use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Extensions (lowercase, without the dot) accepted as text.
const TEXT_EXTENSIONS: &[&str] = &[
    // code
    "go", "py", "js", "ts", "java", "c", "cpp", "h", "hpp", "cs", "php", "rb", "swift", "kt",
    "rs", "scala", "sh", "bash", "pl", "r",
    // markup
    "html", "htm", "xml", "json", "yaml", "yml", "md", "rst", "tex", "css", "scss", "sass",
    "less",
    // configuration
    "conf", "config", "ini", "toml", "env",
    // plain text
    "txt", "log", "csv", "tsv",
];

/// Everything after the last `.` of the file name, lowercased.
///
/// A leading dot counts, so `.env` has the extension `env`.
fn extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// True if `path` has an extension known to hold text.
pub fn is_text_file(path: impl AsRef<Path>) -> bool {
    extension(path.as_ref()).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// Read a text file for use as context.
///
/// Files with an unrecognized extension are refused with [`Error::Validation`] before the
/// filesystem is touched; a missing file yields [`Error::NotFound`].
pub fn read_text_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let display = path.display().to_string();
    if !is_text_file(path) {
        return Err(Error::validation(
            format!("unsupported file type: {display}"),
            Some("file".to_string()),
        ));
    }
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(Error::not_found(display, Some("file".to_string()), None))
        }
        Err(err) => Err(Error::io(format!("failed to read {display}"), err)),
    }
}

/// Display name for the language of `path`, `Text` when unknown.
pub fn detect_language(path: impl AsRef<Path>) -> &'static str {
    let Some(ext) = extension(path.as_ref()) else {
        return "Text";
    };
    match ext.as_str() {
        "go" => "Go",
        "py" => "Python",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "java" => "Java",
        "c" => "C",
        "cpp" => "C++",
        "cs" => "C#",
        "php" => "PHP",
        "rb" => "Ruby",
        "html" => "HTML",
        "css" => "CSS",
        "rs" => "Rust",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "scala" => "Scala",
        "r" => "R",
        "sh" => "Shell",
        "bash" => "Bash",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "md" => "Markdown",
        "xml" => "XML",
        "sql" => "SQL",
        "pl" => "Perl",
        _ => "Text",
    }
}
