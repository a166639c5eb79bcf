use quick_xml::de::from_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Statement kind inside a MyBatis mapper document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl SqlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlKind::Select => "select",
            SqlKind::Insert => "insert",
            SqlKind::Update => "update",
            SqlKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for SqlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single SQL statement in a mapper document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlStatement {
    /// Statement id (e.g., "selectUserCount")
    pub id: String,
    pub kind: SqlKind,
    /// Whitespace-normalized query text
    pub content: String,
}

/// A parsed MyBatis XML mapper document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperXml {
    /// Mapper namespace (matches the Java interface's fully-qualified name)
    pub namespace: String,
    pub statements: Vec<SqlStatement>,
}

// Mirror structs for XML deserialization
#[derive(Debug, Deserialize)]
struct RawMapper {
    #[serde(rename = "@namespace", default)]
    namespace: String,
    #[serde(rename = "select", default)]
    selects: Vec<RawStatement>,
    #[serde(rename = "insert", default)]
    inserts: Vec<RawStatement>,
    #[serde(rename = "update", default)]
    updates: Vec<RawStatement>,
    #[serde(rename = "delete", default)]
    deletes: Vec<RawStatement>,
}

#[derive(Debug, Deserialize)]
struct RawStatement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "$text", default)]
    content: String,
}

/// Parse a MyBatis mapper XML document (C3).
///
/// Only `<mapper namespace="...">` and its `select|insert|update|delete`
/// children are interpreted; everything else is ignored.
pub fn parse_mapper_xml(content: &str) -> Result<MapperXml> {
    let raw: RawMapper = from_str(content)?;

    let mut mapper = MapperXml {
        namespace: raw.namespace,
        statements: Vec::new(),
    };

    let groups = [
        (SqlKind::Select, raw.selects),
        (SqlKind::Insert, raw.inserts),
        (SqlKind::Update, raw.updates),
        (SqlKind::Delete, raw.deletes),
    ];

    for (kind, statements) in groups {
        for stmt in statements {
            mapper.statements.push(SqlStatement {
                id: stmt.id,
                kind,
                content: normalize_whitespace(&stmt.content),
            });
        }
    }

    Ok(mapper)
}

/// Collapse runs of whitespace to single spaces and trim
pub fn normalize_whitespace(s: &str) -> String {
    let ws = Regex::new(r"\s+").expect("invalid whitespace regex");
    ws.replace_all(s.trim(), " ").into_owned()
}

impl MapperXml {
    /// Simple class name of the namespace
    /// ("com.company.legacy.UserMapper" -> "UserMapper")
    pub fn namespace_name(&self) -> &str {
        self.namespace.rsplit('.').next().unwrap_or(&self.namespace)
    }

    pub fn statement_by_id(&self, id: &str) -> Option<&SqlStatement> {
        self.statements.iter().find(|s| s.id == id)
    }

    pub fn matches_java_interface(&self, class_name: &str) -> bool {
        self.namespace_name().eq_ignore_ascii_case(class_name)
    }
}
