use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Anything that is not a letter, combining mark, digit, underscore or hyphen.
    /// Thai vowels and tone marks are combining marks, so Thai names survive intact.
    pub static ref UNSAFE_FILE_NAME_CHARS: Regex = Regex::new(r"[^\p{L}\p{M}\p{N}_\-]+").unwrap();
}

/// File systems cap a name at 255 bytes. This leaves room for `_<uuid>.<ext>`.
pub const MAX_STEM_BYTES: usize = 150;
const FALLBACK_STEM: &str = "file";

/// Reduce a user supplied file name stem to something safe on disk
pub fn sanitize_file_stem(stem: &str) -> String {
    let replaced = UNSAFE_FILE_NAME_CHARS.replace_all(stem.trim(), "_");
    let trimmed = truncate_to_bytes(replaced.trim_matches('_'), MAX_STEM_BYTES);

    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Longest prefix of `s` within `max` bytes, cut on a char boundary
pub fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Lowercase extension without the dot, if the name has one
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// File name without its extension
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_thai() {
        assert_eq!(sanitize_file_stem("บันทึกข้อความ"), "บันทึกข้อความ");
        assert_eq!(sanitize_file_stem("สัญญา จ้าง/2569"), "สัญญา_จ้าง_2569");
    }

    #[test]
    fn test_sanitize_strips_path_tricks() {
        assert_eq!(sanitize_file_stem("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_file_stem("..."), "file");
        assert_eq!(sanitize_file_stem(""), "file");
    }

    #[test]
    fn test_sanitize_truncates_by_bytes() {
        let long = "ก".repeat(200);
        let stem = sanitize_file_stem(&long);
        assert_eq!(stem.len(), MAX_STEM_BYTES);
        assert_eq!(stem.chars().count(), 50);

        let ascii = "a".repeat(400);
        assert_eq!(sanitize_file_stem(&ascii).len(), MAX_STEM_BYTES);
    }

    #[test]
    fn test_truncate_to_bytes_keeps_char_boundary() {
        assert_eq!(truncate_to_bytes("กขค", 7), "กข");
        assert_eq!(truncate_to_bytes("กขค", 2), "");
        assert_eq!(truncate_to_bytes("abc", 10), "abc");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".env"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("สัญญา.docx"), "สัญญา");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }
}
