use serde::{Deserialize, Serialize};

/// Layer a node belongs to in the call chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Controller,
    Service,
    Mapper,
    Sql,
    Util,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Controller => "CONTROLLER",
            NodeKind::Service => "SERVICE",
            NodeKind::Mapper => "MAPPER",
            NodeKind::Sql => "SQL",
            NodeKind::Util => "UTIL",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a node in the pool's arena
pub type NodeId = usize;

/// Unified code element: controller/service/mapper method, class, or SQL statement.
///
/// Nodes live in the `ComponentPool` arena; `children` and `parent` are arena
/// indices, never owning references, so call graphs with cycles stay safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier: "package.ClassName.methodName" or "namespace.sqlId"
    pub id: String,

    /// Node kind (CONTROLLER, SERVICE, MAPPER, SQL, UTIL)
    pub kind: NodeKind,

    /// Java package name (SQL nodes carry the mapper namespace)
    pub package: String,

    /// Source file relative to the analysis root
    pub file: String,

    /// Line where the method/query is declared
    pub line: usize,

    /// Method name, SQL statement id, or simple class name for class nodes
    pub method: String,

    /// Input parameters, verbatim
    pub params: String,

    /// Declared return type, verbatim
    pub return_detail: String,

    /// Method body text (for call tracing and return inference)
    pub body: String,

    /// JavaDoc summary or SQL statement text
    pub comment: String,

    /// Primary decorator: HTTP verb for methods, statement kind for SQL
    pub annotation: String,

    /// Resolved request mapping URL (controller methods)
    pub url: String,

    /// Method carried @ResponseBody (or the class was @RestController)
    pub has_response_body: bool,

    /// Direct downstream nodes
    pub children: Vec<NodeId>,

    /// Direct upstream node
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: String::new(),
            kind,
            package: String::new(),
            file: String::new(),
            line: 0,
            method: String::new(),
            params: String::new(),
            return_detail: String::new(),
            body: String::new(),
            comment: String::new(),
            annotation: String::new(),
            url: String::new(),
            has_response_body: false,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn is_controller(&self) -> bool {
        self.kind == NodeKind::Controller
    }

    pub fn is_mapper(&self) -> bool {
        self.kind == NodeKind::Mapper
    }

    pub fn is_util(&self) -> bool {
        self.kind == NodeKind::Util
    }
}

/// Suffixes that mark a class as a data carrier rather than business logic
const MODEL_SUFFIXES: [&str; 7] = [
    "dto",
    "vo",
    "entity",
    "request",
    "response",
    "projection",
    "exception",
];

/// Check whether an id names a DTO/VO/Entity-style data class.
///
/// Looks at the trailing segments of "package.ClassName.methodName" so both
/// class ids and method ids are covered.
pub fn is_model_class(id: &str) -> bool {
    let parts: Vec<&str> = id.split('.').collect();
    if parts.is_empty() {
        return false;
    }

    let candidates: Vec<&str> = if parts.len() >= 2 {
        vec![parts[parts.len() - 2], parts[parts.len() - 1]]
    } else {
        vec![parts[0]]
    };

    candidates.iter().any(|name| {
        let lower = name.to_lowercase();
        MODEL_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
    })
}

/// REST API endpoint definition optimized for documentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDef {
    /// HTTP method (GET, POST, PUT, DELETE, ...)
    pub method: String,

    /// Full URL path (e.g., "/api/v1/users")
    pub path: String,

    /// Controller class name
    pub controller_name: String,

    /// Method name in the controller
    pub method_name: String,

    /// Summary from JavaDoc
    pub summary: String,

    /// Detailed description from comments
    pub description: String,

    /// Request parameters
    pub params: Vec<ParamDef>,

    /// Response definition
    pub response: ResponseDef,
}

/// Where a request parameter comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Body,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Query => "Query",
            ParamLocation::Path => "Path",
            ParamLocation::Header => "Header",
            ParamLocation::Body => "Body",
        }
    }
}

impl std::fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter in the API request, or one field of a flattened schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(rename = "in")]
    pub location: ParamLocation,

    pub required: bool,

    pub description: String,

    /// Nesting depth: 0 = direct parameter, 1+ = nested field.
    /// Schemas are stored flattened in depth-first order, not as a tree,
    /// because emitters prefer linear iteration.
    pub depth: usize,

    /// Nested fields for complex types
    pub fields: Vec<ParamDef>,
}

impl ParamDef {
    pub fn field(name: impl Into<String>, type_name: impl Into<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            location: ParamLocation::Query,
            required: false,
            description: String::new(),
            depth,
            fields: Vec::new(),
        }
    }
}

/// The API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDef {
    #[serde(rename = "type")]
    pub type_name: String,

    pub description: String,

    pub status_code: u16,

    /// Flattened schema of complex response types
    pub fields: Vec<ParamDef>,
}

impl Default for ResponseDef {
    fn default() -> Self {
        Self {
            type_name: String::new(),
            description: String::new(),
            status_code: 200,
            fields: Vec::new(),
        }
    }
}

/// System-level statistics for report headers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_controllers: usize,
    pub total_services: usize,
    pub total_mappers: usize,
    pub total_sqls: usize,
    pub total_utils: usize,
    pub analysis_date: String,
}
