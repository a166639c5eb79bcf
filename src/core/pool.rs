use std::collections::HashMap;
use tracing::debug;

use super::java::JavaClass;
use super::mapper_xml::MapperXml;
use super::model::{is_model_class, Node, NodeId, NodeKind};

/// Uniform indexed registry of everything the parsers produced (C4).
///
/// Owns every `Node` in a contiguous arena; the five lookup tables and all
/// parent/child edges refer to nodes by arena index. The pool is mutated
/// during the scan and link phases only, then read by the extractor and the
/// exporters.
pub struct ComponentPool {
    nodes: Vec<Node>,

    /// Fully-qualified class name -> class node
    classes: HashMap<String, NodeId>,

    /// "FullClassName.methodName" -> method node
    methods: HashMap<String, NodeId>,

    /// Same key as `methods` -> raw body text
    method_bodies: HashMap<String, String>,

    /// "namespace.statementId" -> SQL node
    sql: HashMap<String, NodeId>,

    /// Fully-qualified class name -> field name/type pairs, declaration order.
    /// Types keep their generics; consumers strip them at resolution time.
    field_types: HashMap<String, Vec<(String, String)>>,
}

impl ComponentPool {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            classes: HashMap::new(),
            methods: HashMap::new(),
            method_bodies: HashMap::new(),
            sql: HashMap::new(),
            field_types: HashMap::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Register a parsed Java class and its methods.
    ///
    /// Controller/service classes whose name carries a data-class suffix are
    /// dropped outright; their id would otherwise leak DTO-shaped entries
    /// into the call graph roots.
    pub fn add_java_class(&mut self, class: &JavaClass, file: &str) {
        if class.name.is_empty() {
            return;
        }

        let fqcn = if class.package.is_empty() {
            class.name.clone()
        } else {
            format!("{}.{}", class.package, class.name)
        };

        let kind = determine_node_kind(class);

        if matches!(kind, NodeKind::Controller | NodeKind::Service) && is_model_class(&fqcn) {
            debug!(class = %fqcn, "dropping data-class at registration");
            return;
        }

        let mut class_node = Node::new(kind);
        class_node.id = fqcn.clone();
        class_node.package = class.package.clone();
        class_node.file = file.to_string();
        class_node.method = class.name.clone();
        let class_id = self.alloc(class_node);
        self.classes.insert(fqcn.clone(), class_id);

        // Field type bindings, declaration order, later duplicates win
        let mut entries: Vec<(String, String)> = Vec::new();
        for field in &class.fields {
            let simple_type = simple_type_name(&field.type_name);
            if let Some(existing) = entries.iter_mut().find(|(name, _)| name == &field.name) {
                existing.1 = simple_type.to_string();
            } else {
                entries.push((field.name.clone(), simple_type.to_string()));
            }
        }
        self.field_types.insert(fqcn.clone(), entries);

        let class_url = class.class_level_url();
        let rest_controller = class.is_rest_controller();

        for method in &class.methods {
            let method_key = format!("{}.{}", fqcn, method.name);

            let mut node = Node::new(kind);
            node.id = method_key.clone();
            node.package = class.package.clone();
            node.file = file.to_string();
            node.line = method.line;
            node.method = method.name.clone();
            node.params = method.params.clone();
            node.return_detail = method.return_type.clone();
            node.body = method.body.clone();
            node.comment = method.javadoc.clone().unwrap_or_default();
            node.url = method.method_url(&class_url);
            node.annotation = method.http_method();
            node.has_response_body = rest_controller || method.has_response_body();
            node.parent = Some(class_id);

            let method_id = self.alloc(node);
            self.methods.insert(method_key.clone(), method_id);
            self.method_bodies.insert(method_key, method.body.clone());
            self.nodes[class_id].children.push(method_id);
        }
    }

    /// Register a parsed mapper XML document's SQL statements
    pub fn add_mapper_xml(&mut self, mapper: &MapperXml, file: &str) {
        for stmt in &mapper.statements {
            if stmt.id.trim().is_empty() {
                debug!(namespace = %mapper.namespace, "skipping statement without id");
                continue;
            }

            let key = format!("{}.{}", mapper.namespace, stmt.id);

            let mut node = Node::new(NodeKind::Sql);
            node.id = key.clone();
            node.package = mapper.namespace.clone();
            node.file = file.to_string();
            node.method = stmt.id.clone();
            node.annotation = stmt.kind.to_string();
            node.comment = stmt.content.clone();

            let sql_id = self.alloc(node);
            self.sql.insert(key, sql_id);
        }
    }

    pub fn get_class(&self, fqcn: &str) -> Option<NodeId> {
        self.classes.get(fqcn).copied()
    }

    pub fn get_method(&self, key: &str) -> Option<NodeId> {
        self.methods.get(key).copied()
    }

    pub fn get_sql(&self, namespace: &str, id: &str) -> Option<NodeId> {
        self.sql.get(&format!("{}.{}", namespace, id)).copied()
    }

    pub fn method_body(&self, key: &str) -> Option<&str> {
        self.method_bodies.get(key).map(String::as_str)
    }

    /// Raw declared type of a field (generics preserved)
    pub fn field_type(&self, fqcn: &str, field: &str) -> Option<&str> {
        self.field_types.get(fqcn).and_then(|entries| {
            entries
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, ty)| ty.as_str())
        })
    }

    /// Field name/type pairs for a class, exact key
    pub fn field_entries(&self, fqcn: &str) -> Option<&[(String, String)]> {
        self.field_types.get(fqcn).map(Vec::as_slice)
    }

    /// Field name/type pairs, exact key first, then trailing-segment match
    pub fn field_entries_fuzzy(&self, simple_or_full: &str) -> Option<&[(String, String)]> {
        if let Some(entries) = self.field_types.get(simple_or_full) {
            return Some(entries);
        }

        let suffix = format!(".{}", simple_or_full);
        let mut keys: Vec<&String> = self.field_types.keys().collect();
        keys.sort();
        keys.iter()
            .find(|key| key.ends_with(&suffix))
            .and_then(|key| self.field_types.get(*key))
            .map(Vec::as_slice)
    }

    /// Resolve a field to the fully-qualified class name of its declared type.
    ///
    /// Strips generics, tries the declaring class's own package, then scans
    /// all class keys for one whose trailing segment matches the simple type.
    pub fn resolve_field_type(&self, fqcn: &str, field: &str) -> Option<String> {
        let raw_type = self.field_type(fqcn, field)?;

        let search_type = match raw_type.find('<') {
            Some(idx) => &raw_type[..idx],
            None => raw_type,
        };

        let pkg = package_of(fqcn);
        if !pkg.is_empty() {
            let candidate = format!("{}.{}", pkg, search_type);
            if self.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }

        let mut keys: Vec<&String> = self.classes.keys().collect();
        keys.sort();
        keys.into_iter()
            .find(|full_name| simple_type_name(full_name) == search_type)
            .cloned()
    }

    /// Find methods by simple name within a class, tolerating overloads
    pub fn find_methods_by_name(&self, fqcn: &str, method_name: &str) -> Vec<NodeId> {
        let exact_key = format!("{}.{}", fqcn, method_name);
        if let Some(&id) = self.methods.get(&exact_key) {
            return vec![id];
        }

        let prefix = format!("{}.", fqcn);
        let mut keys: Vec<&String> = self.methods.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter(|key| key.starts_with(&prefix) && key.contains(method_name))
            .filter_map(|key| self.methods.get(key).copied())
            .collect()
    }

    /// Resolve a simple class name ("StringUtil") to its fully-qualified key
    pub fn find_class_by_simple_name(&self, simple_name: &str) -> Option<String> {
        if self.classes.contains_key(simple_name) {
            return Some(simple_name.to_string());
        }

        let mut keys: Vec<&String> = self.classes.keys().collect();
        keys.sort();
        keys.into_iter()
            .find(|full_name| simple_type_name(full_name) == simple_name)
            .cloned()
    }

    /// Class key lookup for schema resolution: exact, then trailing segment
    pub fn lookup_class_key(&self, type_name: &str) -> Option<String> {
        if self.classes.contains_key(type_name) {
            return Some(type_name.to_string());
        }

        let suffix = format!(".{}", type_name);
        let mut keys: Vec<&String> = self.classes.keys().collect();
        keys.sort();
        keys.into_iter().find(|key| key.ends_with(&suffix)).cloned()
    }

    /// Attach a call edge. Rejects children with empty names and duplicate
    /// ids under the same parent; sets the child's back-pointer.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.nodes[child].method.trim().is_empty() {
            debug!(
                parent = %self.nodes[parent].id,
                "rejecting child with empty name"
            );
            return false;
        }

        let child_key = self.nodes[child].id.clone();
        let duplicate = self.nodes[parent]
            .children
            .iter()
            .any(|&c| self.nodes[c].id == child_key);
        if duplicate {
            return false;
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        true
    }

    /// All class node ids, sorted by class key for deterministic traversal
    pub fn class_ids(&self) -> Vec<NodeId> {
        let mut keys: Vec<&String> = self.classes.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| self.classes.get(key).copied())
            .collect()
    }

    /// All method keys, sorted
    pub fn method_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.methods.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn sql_count(&self) -> usize {
        self.sql.len()
    }
}

impl Default for ComponentPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the node kind from annotations first, then class-name suffix
pub fn determine_node_kind(class: &JavaClass) -> NodeKind {
    for ann in &class.annotations {
        match ann.name.as_str() {
            "Controller" | "RestController" => return NodeKind::Controller,
            "Service" => return NodeKind::Service,
            "Repository" | "Mapper" => return NodeKind::Mapper,
            _ => {}
        }
    }

    if class.name.ends_with("Mapper") || class.name.ends_with("Repository") {
        NodeKind::Mapper
    } else if class.is_controller() {
        NodeKind::Controller
    } else if class.is_service() {
        NodeKind::Service
    } else {
        NodeKind::Util
    }
}

/// Last dot-separated segment; generics survive ("a.b.List<String>" -> "List<String>")
pub fn simple_type_name(full_type: &str) -> &str {
    full_type.rsplit('.').next().unwrap_or(full_type).trim()
}

/// Everything before the last dot
pub fn package_of(fqcn: &str) -> &str {
    match fqcn.rfind('.') {
        Some(idx) => &fqcn[..idx],
        None => "",
    }
}
