use regex::Regex;
use std::path::Path;

use crate::error::Result;

/// Reads source files with legacy-encoding tolerance (C1).
///
/// Decoding never fails the pipeline: UTF-8 is tried first, then EUC-KR
/// (covering the CP949 superset), then a lossy UTF-8 interpretation of the
/// raw bytes. Java sources have their comments removed before any other
/// stage sees the text, so downstream regexes cannot be fooled by tokens
/// inside comments. Mapper XML passes through untouched.
pub struct SourceReader {
    block_comment: Regex,
    line_comment: Regex,
}

impl SourceReader {
    pub fn new() -> Self {
        Self {
            block_comment: Regex::new(r"(?s)/\*.*?\*/").expect("invalid block comment regex"),
            line_comment: Regex::new(r"//.*").expect("invalid line comment regex"),
        }
    }

    /// Read and decode a file, stripping comments for Java sources
    pub fn read_file(&self, path: &Path) -> Result<String> {
        let raw = std::fs::read(path)?;
        let content = decode_bytes(&raw);

        if is_java_file(path) {
            Ok(self.strip_comments(&content))
        } else {
            Ok(content)
        }
    }

    /// Remove block comments (including `/** ... */`) and line comments
    pub fn strip_comments(&self, content: &str) -> String {
        let without_blocks = self.block_comment.replace_all(content, "");
        self.line_comment.replace_all(&without_blocks, "").into_owned()
    }
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode bytes as UTF-8, falling back to EUC-KR, then lossy UTF-8
pub fn decode_bytes(raw: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(raw) {
        return text.to_string();
    }

    let (decoded, _, had_errors) = encoding_rs::EUC_KR.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }

    String::from_utf8_lossy(raw).into_owned()
}

pub fn is_java_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("java"))
        .unwrap_or(false)
}

pub fn is_xml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn utf8_bytes_pass_through() {
        let text = "public class A { String s = \"안녕하세요\"; }";
        assert_eq!(decode_bytes(text.as_bytes()), text);
    }

    #[test]
    fn euc_kr_bytes_are_decoded() {
        // "한글" encoded as EUC-KR
        let raw: &[u8] = &[0xC7, 0xD1, 0xB1, 0xDB];
        assert_eq!(decode_bytes(raw), "한글");
    }

    #[test]
    fn invalid_bytes_fall_back_to_lossy() {
        let raw: &[u8] = &[0x61, 0xFF, 0xFE, 0xFF, 0x62];
        let decoded = decode_bytes(raw);
        assert!(decoded.starts_with('a'));
        assert!(decoded.ends_with('b'));
    }

    #[test]
    fn strips_block_and_line_comments() {
        let reader = SourceReader::new();
        let source = r#"
/**
 * JavaDoc with a fake call userService.fake()
 */
public class A {
    /* block */ int x = 1; // trailing
    // if (noise) {
    int y = 2;
}
"#;
        let stripped = reader.strip_comments(source);
        assert!(!stripped.contains("fake()"));
        assert!(!stripped.contains("block"));
        assert!(!stripped.contains("trailing"));
        assert!(!stripped.contains("noise"));
        assert!(stripped.contains("int x = 1;"));
        assert!(stripped.contains("int y = 2;"));
    }

    #[test]
    fn block_comment_strip_is_non_greedy() {
        let reader = SourceReader::new();
        let source = "/* one */ keep /* two */ also";
        let stripped = reader.strip_comments(source);
        assert!(stripped.contains("keep"));
        assert!(stripped.contains("also"));
    }

    #[test]
    fn file_kind_predicates() {
        assert!(is_java_file(&PathBuf::from("A.java")));
        assert!(is_java_file(&PathBuf::from("B.JAVA")));
        assert!(is_xml_file(&PathBuf::from("UserMapper.xml")));
        assert!(!is_java_file(&PathBuf::from("notes.txt")));
    }
}
