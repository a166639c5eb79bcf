use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, SpecReconError};

/// A Java annotation with its attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JavaAnnotation {
    /// e.g., "RequestMapping", "Autowired"
    pub name: String,
    /// e.g., {"value": "/users", "method": "GET"}
    pub attributes: HashMap<String, String>,
    /// Original annotation text
    pub raw: String,
}

/// A class field (for dependency-injection detection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaField {
    /// e.g., "userService"
    pub name: String,
    /// e.g., "UserService", "List<String>" (generics preserved)
    pub type_name: String,
    pub annotations: Vec<JavaAnnotation>,
}

/// A Java method with signature and body text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaMethod {
    /// e.g., "login"
    pub name: String,
    /// e.g., "String username, String password"
    pub params: String,
    /// Parameters split on commas outside generic brackets
    pub params_list: Vec<String>,
    /// e.g., "ModelAndView", "ResponseEntity<String>"
    pub return_type: String,
    pub annotations: Vec<JavaAnnotation>,
    /// Doc comment immediately preceding the signature, if any survived
    pub javadoc: Option<String>,
    /// Method body (for call tracing); empty for abstract/interface methods
    pub body: String,
    /// 1-based line of the signature
    pub line: usize,
}

/// A parsed Java class or interface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JavaClass {
    /// e.g., "com.company.legacy"
    pub package: String,
    /// e.g., "UserController"
    pub name: String,
    pub imports: Vec<String>,
    /// Class-level annotations
    pub annotations: Vec<JavaAnnotation>,
    pub fields: Vec<JavaField>,
    pub methods: Vec<JavaMethod>,
}

/// Regex-based Java source parser (C2).
///
/// Deliberately approximate: the input is treated as text, not grammar, so
/// stylistically unusual or mildly malformed sources still yield signatures.
/// The only place real lexical care is required is the brace matcher, which
/// must not be confused by braces inside strings, chars, or comments.
pub struct JavaParser {
    package_re: Regex,
    class_re: Regex,
    import_re: Regex,
    annotation_re: Regex,
    field_re: Regex,
    method_re: Regex,
}

impl JavaParser {
    pub fn new() -> Self {
        Self {
            package_re: Regex::new(r"package\s+([\w.]+)\s*;").expect("invalid package regex"),
            class_re: Regex::new(r"(?:public\s+)?(?:class|interface)\s+(\w+)")
                .expect("invalid class regex"),
            import_re: Regex::new(r"import\s+([\w.]+)\s*;").expect("invalid import regex"),
            annotation_re: Regex::new(r"@(\w+)(?:\s*\(([^)]*)\))?")
                .expect("invalid annotation regex"),
            // @Annotation? modifiers Type name (= ...)? ;
            field_re: Regex::new(
                r"(?s)(@\w+(?:\([^)]*\))?\s+)?(?:private|public|protected)(?:\s+(?:static|final|transient|volatile))*\s+([\w<>,\s?\[\]]+)\s+(\w+)\s*(?:=.*?)?;",
            )
            .expect("invalid field regex"),
            // annotations? modifier? returnType name(params) throws? then '{' or ';'
            method_re: Regex::new(
                r"(?s)((?:@\w+(?:\([^)]*\))?\s+)*)(?:public|private|protected)?\s*([\w<>,\[\]\s]+)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w,\s]+)?\s*(\{|;)",
            )
            .expect("invalid method regex"),
        }
    }

    /// Parse a (comment-stripped) Java source file
    pub fn parse(&self, content: &str) -> Result<JavaClass> {
        let name = self.extract_class_name(content);
        if name.is_empty() {
            return Err(SpecReconError::Parser(
                "no class or interface declaration found".to_string(),
            ));
        }

        Ok(JavaClass {
            package: self.extract_package(content),
            name,
            imports: self.extract_imports(content),
            annotations: self.extract_class_annotations(content),
            fields: self.extract_fields(content),
            methods: self.extract_methods(content),
        })
    }

    fn extract_package(&self, content: &str) -> String {
        self.package_re
            .captures(content)
            .map(|c| c[1].to_string())
            .unwrap_or_default()
    }

    fn extract_class_name(&self, content: &str) -> String {
        self.class_re
            .captures(content)
            .map(|c| c[1].to_string())
            .unwrap_or_default()
    }

    fn extract_imports(&self, content: &str) -> Vec<String> {
        self.import_re
            .captures_iter(content)
            .map(|c| c[1].to_string())
            .collect()
    }

    /// Class-level annotations are everything annotation-shaped before the
    /// class declaration.
    fn extract_class_annotations(&self, content: &str) -> Vec<JavaAnnotation> {
        let class_start = match self.class_re.find(content) {
            Some(m) => m.start(),
            None => return Vec::new(),
        };

        self.parse_annotations(&content[..class_start])
    }

    fn parse_annotations(&self, text: &str) -> Vec<JavaAnnotation> {
        self.annotation_re
            .captures_iter(text)
            .map(|cap| {
                let mut annotation = JavaAnnotation {
                    name: cap[1].to_string(),
                    attributes: HashMap::new(),
                    raw: cap[0].to_string(),
                };
                if let Some(args) = cap.get(2) {
                    if !args.as_str().is_empty() {
                        parse_annotation_attributes(&mut annotation, args.as_str());
                    }
                }
                annotation
            })
            .collect()
    }

    fn extract_fields(&self, content: &str) -> Vec<JavaField> {
        self.field_re
            .captures_iter(content)
            .map(|cap| {
                let raw_type = cap[2].trim().to_string();
                let name = cap[3].to_string();

                let mut annotations = Vec::new();
                if let Some(ann) = cap.get(1) {
                    let text = ann.as_str().trim();
                    if text.starts_with('@') {
                        let ann_name = text
                            .split('(')
                            .next()
                            .unwrap_or(text)
                            .trim_start_matches('@')
                            .trim()
                            .to_string();
                        annotations.push(JavaAnnotation {
                            name: ann_name,
                            attributes: HashMap::new(),
                            raw: text.to_string(),
                        });
                    }
                }

                JavaField {
                    name,
                    type_name: raw_type,
                    annotations,
                }
            })
            .collect()
    }

    fn extract_methods(&self, content: &str) -> Vec<JavaMethod> {
        let mut methods = Vec::new();

        for cap in self.method_re.captures_iter(content) {
            let annotations_text = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            // The loose match can pull access/storage modifiers into the
            // type group when no annotation anchors the signature
            let return_type = strip_leading_modifiers(cap[2].trim()).to_string();
            let name = cap[3].to_string();
            let params = cap[4].trim().to_string();
            let terminator = match cap.get(5) {
                Some(m) => m,
                None => continue,
            };

            let mut body = String::new();
            if terminator.as_str() == "{" {
                let body_start = terminator.end();
                let body_end = find_closing_brace(content, body_start);
                if body_end > body_start {
                    body = content
                        .get(body_start..body_end - 1)
                        .unwrap_or("")
                        .to_string();
                }
            }

            let match_start = cap.get(0).map(|m| m.start()).unwrap_or(0);
            let line = content[..match_start].matches('\n').count() + 1;

            let mut method = JavaMethod {
                name,
                params: params.clone(),
                params_list: Vec::new(),
                return_type,
                annotations: Vec::new(),
                javadoc: extract_javadoc_before(content, match_start),
                body,
                line,
            };

            if !method.params.is_empty() {
                method.params_list = split_params(&method.params);
            }

            if !annotations_text.is_empty() {
                method.annotations = self.parse_annotations(annotations_text);
            }

            methods.push(method);
        }

        methods
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the matching closing brace for an opening brace at `start`.
///
/// Tracks nesting through double-quoted strings (with `\"` escapes),
/// character literals, line comments, and block comments. Returns the index
/// just past the closing brace, or the content length if unbalanced.
pub fn find_closing_brace(content: &str, start: usize) -> usize {
    let bytes = content.as_bytes();
    let mut depth = 1usize;
    let mut in_string = false;
    let mut in_char = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    let mut escaped = false;

    let mut i = start;
    while i < bytes.len() {
        let ch = bytes[i];

        if in_line_comment {
            if ch == b'\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }

        if in_block_comment {
            if ch == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                in_block_comment = false;
                i += 1;
            }
            i += 1;
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if in_char {
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == b'\'' {
                in_char = false;
            }
            i += 1;
            continue;
        }

        if ch == b'/' && i + 1 < bytes.len() {
            if bytes[i + 1] == b'/' {
                in_line_comment = true;
                i += 2;
                continue;
            }
            if bytes[i + 1] == b'*' {
                in_block_comment = true;
                i += 2;
                continue;
            }
        }

        match ch {
            b'"' => {
                in_string = true;
                escaped = false;
            }
            b'\'' => {
                in_char = true;
                escaped = false;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }

        i += 1;
    }

    content.len()
}

const METHOD_MODIFIERS: [&str; 9] = [
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "synchronized",
    "native",
    "default",
];

/// Drop modifier keywords from the front of a captured return type
fn strip_leading_modifiers(mut type_text: &str) -> &str {
    'outer: loop {
        for modifier in METHOD_MODIFIERS {
            if let Some(rest) = type_text.strip_prefix(modifier) {
                if rest.starts_with(char::is_whitespace) {
                    type_text = rest.trim_start();
                    continue 'outer;
                }
            }
        }
        return type_text;
    }
}

/// Extract the `/** ... */` block immediately preceding a signature, if any
fn extract_javadoc_before(content: &str, signature_start: usize) -> Option<String> {
    let before = content[..signature_start].trim_end();
    if !before.ends_with("*/") {
        return None;
    }

    let open = before.rfind("/**")?;
    let block = &before[open..];

    let mut lines = Vec::new();
    for line in block.lines() {
        let cleaned = line
            .trim()
            .trim_start_matches("/**")
            .trim_end_matches("*/")
            .trim_start_matches('*')
            .trim();
        if !cleaned.is_empty() {
            lines.push(cleaned.to_string());
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

fn parse_annotation_attributes(annotation: &mut JavaAnnotation, attributes_text: &str) {
    let text = attributes_text.trim();

    // Simple value form: @Annotation("value")
    if text.starts_with('"') || text.starts_with('\'') {
        annotation
            .attributes
            .insert("value".to_string(), trim_quotes(text));
        return;
    }

    // key = value pairs: value = "/users", method = RequestMethod.POST
    let attr_re = Regex::new(r"(\w+)\s*=\s*([^,]+)").expect("invalid attribute regex");
    for cap in attr_re.captures_iter(text) {
        let key = cap[1].to_string();
        let value = trim_quotes(cap[2].trim());
        annotation.attributes.insert(key, value);
    }
}

pub fn trim_quotes(s: &str) -> String {
    let trimmed = s.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

/// Split a parameter string on commas, respecting generic-bracket depth
pub fn split_params(params: &str) -> Vec<String> {
    let params = params.trim();
    if params.is_empty() {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;

    for ch in params.chars() {
        match ch {
            '<' => {
                depth += 1;
                current.push(ch);
            }
            '>' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                result.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        result.push(current.trim().to_string());
    }

    result
}

/// Extract the URL value from a mapping annotation's raw text
pub fn extract_annotation_value(annotation: &str) -> String {
    let patterns = [
        r#"@\w+\s*\(\s*"([^"]+)"\s*\)"#,
        r#"value\s*=\s*"([^"]+)""#,
        r#"path\s*=\s*"([^"]+)""#,
    ];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(cap) = re.captures(annotation) {
                return cap[1].to_string();
            }
        }
    }

    String::new()
}

/// Join class-level and method-level mapping paths with exactly one slash
pub fn combine_url_paths(class_path: &str, method_path: &str) -> String {
    let class_path = class_path.trim();
    let method_path = method_path.trim();

    if class_path.is_empty() {
        return method_path.to_string();
    }
    if method_path.is_empty() {
        return class_path.to_string();
    }

    format!(
        "{}/{}",
        class_path.trim_end_matches('/'),
        method_path.trim_start_matches('/')
    )
}

const INJECTION_ANNOTATIONS: [&str; 3] = ["Autowired", "Resource", "Inject"];

impl JavaClass {
    /// Class-level URL from @RequestMapping
    pub fn class_level_url(&self) -> String {
        for ann in &self.annotations {
            if ann.name == "RequestMapping" {
                if let Some(value) = ann.attributes.get("value") {
                    return value.clone();
                }
                return extract_annotation_value(&ann.raw);
            }
        }
        String::new()
    }

    pub fn is_controller(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| a.name == "Controller" || a.name == "RestController")
            || self.name.ends_with("Controller")
    }

    pub fn is_rest_controller(&self) -> bool {
        self.annotations.iter().any(|a| a.name == "RestController")
    }

    pub fn is_service(&self) -> bool {
        self.annotations.iter().any(|a| a.name == "Service") || self.name.ends_with("Service")
    }

    /// Names of fields bearing an injection annotation
    pub fn injected_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| {
                field
                    .annotations
                    .iter()
                    .any(|a| INJECTION_ANNOTATIONS.contains(&a.name.as_str()))
            })
            .map(|field| field.name.clone())
            .collect()
    }
}

impl JavaMethod {
    /// Full URL for this method: class path joined with the mapping path
    pub fn method_url(&self, class_path: &str) -> String {
        let mut method_path = String::new();

        for ann in &self.annotations {
            if ann.name.ends_with("Mapping") {
                if let Some(value) = ann.attributes.get("value") {
                    method_path = value.clone();
                    break;
                }
                method_path = extract_annotation_value(&ann.raw);
                if !method_path.is_empty() {
                    break;
                }
            }
        }

        combine_url_paths(class_path, &method_path)
    }

    /// HTTP verb from mapping annotations; empty when none apply
    pub fn http_method(&self) -> String {
        for ann in &self.annotations {
            match ann.name.as_str() {
                "GetMapping" => return "GET".to_string(),
                "PostMapping" => return "POST".to_string(),
                "PutMapping" => return "PUT".to_string(),
                "DeleteMapping" => return "DELETE".to_string(),
                "PatchMapping" => return "PATCH".to_string(),
                "RequestMapping" => {
                    if let Some(method) = ann.attributes.get("method") {
                        // Strip the "RequestMethod." enum prefix
                        let verb = method.rsplit('.').next().unwrap_or(method);
                        return verb.to_uppercase();
                    }
                    return "GET".to_string();
                }
                _ => {}
            }
        }
        String::new()
    }

    pub fn has_response_body(&self) -> bool {
        self.annotations.iter().any(|a| a.name == "ResponseBody")
    }
}
