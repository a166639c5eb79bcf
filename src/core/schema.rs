use std::collections::HashSet;
use tracing::debug;

use super::model::ParamDef;
use super::pool::ComponentPool;

const MAX_DEPTH: usize = 5;

const PRIMITIVES: [&str; 13] = [
    "String",
    "int",
    "Integer",
    "long",
    "Long",
    "double",
    "Double",
    "float",
    "Float",
    "boolean",
    "Boolean",
    "char",
    "Character",
];

const SYSTEM_TYPES: [&str; 24] = [
    // Primitives
    "void",
    "int",
    "long",
    "double",
    "float",
    "boolean",
    "char",
    // Wrapper classes
    "String",
    "Integer",
    "Long",
    "Double",
    "Float",
    "Boolean",
    "Character",
    // Bare collections after cleaning
    "List",
    "Set",
    "Map",
    "Optional",
    // Servlet and framework types
    "HttpServletRequest",
    "HttpServletResponse",
    "Model",
    "ModelAndView",
    "ResponseEntity",
    "Object",
];

/// A type whose schema can be read from field declarations
pub fn is_complex_type(type_name: &str) -> bool {
    let base = match type_name.find('<') {
        Some(idx) => &type_name[..idx],
        None => type_name,
    };
    !PRIMITIVES.contains(&base)
}

/// Framework/primitive types that carry no meaningful schema
pub fn is_system_type(type_name: &str) -> bool {
    SYSTEM_TYPES.contains(&type_name)
}

/// A return type whose schema cannot be read from a declaration:
/// Object, wildcards, single-letter type variables, and every Map flavor
pub fn is_dynamic_type(type_name: &str) -> bool {
    if type_name.is_empty() {
        return false;
    }

    if matches!(type_name, "?" | "T" | "E" | "K" | "V") {
        return true;
    }

    if type_name == "Object" || type_name == "java.lang.Object" {
        return true;
    }

    let lower = type_name.to_lowercase();
    ["map", "hashmap", "linkedhashmap", "treemap", "concurrenthashmap"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// A collection wrapper that should be unwrapped to its element type
pub fn is_collection_type(type_name: &str) -> bool {
    if type_name.is_empty() {
        return false;
    }
    let lower = type_name.to_lowercase();

    if matches!(lower.as_str(), "list" | "set" | "collection" | "iterable" | "page") {
        return true;
    }

    let prefixes = [
        "list<",
        "arraylist<",
        "linkedlist<",
        "set<",
        "hashset<",
        "treeset<",
        "collection<",
        "iterable<",
        "page<",
        "slice<",
    ];
    if prefixes.iter().any(|p| lower.starts_with(p)) {
        return true;
    }

    // Fully-qualified spellings like java.util.List
    lower.contains(".list") || lower.contains(".set")
}

/// Text inside the outermost generic brackets ("List<MemberDto>" -> "MemberDto")
pub fn inner_generic_type(type_name: &str) -> Option<&str> {
    let start = type_name.find('<')?;
    let end = type_name.rfind('>')?;
    if end > start {
        Some(type_name[start + 1..end].trim())
    } else {
        None
    }
}

/// Strip generic wrappers and array notation down to the core type.
///
/// `List<ProductDTO>` -> `ProductDTO`; `Map<String, ProductDTO>` takes the
/// rightmost type argument; `ResponseEntity<List<ProductDTO>>` keeps
/// unwrapping until no generics remain.
pub fn clean_type_name(raw: &str) -> String {
    let mut cleaned = raw.trim().replace("[]", "");

    while let (Some(start), Some(end)) = (cleaned.find('<'), cleaned.rfind('>')) {
        if end <= start {
            break;
        }
        let inner = cleaned[start + 1..end].to_string();
        match inner.split(',').last() {
            Some(last) => cleaned = last.trim().to_string(),
            None => break,
        }
    }

    cleaned
}

/// Too vague to be useful without a body scan: void, Object, Map,
/// `<Object>`/`<?>` generics, and raw collections
pub fn is_ambiguous_type(type_name: &str) -> bool {
    if type_name.is_empty() || type_name == "void" {
        return true;
    }

    if is_dynamic_type(type_name) {
        return true;
    }

    if type_name.contains("<Object>") || type_name.contains("<?>") {
        return true;
    }

    is_collection_type(type_name) && !type_name.contains('<')
}

/// Force primitive types for well-known pagination keys
pub fn apply_type_heuristics(key: &str, current_type: &str) -> String {
    let lower_key = key.to_lowercase();
    match lower_key.as_str() {
        "totalelements" | "totalpages" | "totalcount" => "long".to_string(),
        "size" | "page" | "number" | "numberofelements" => "int".to_string(),
        _ => current_type.to_string(),
    }
}

/// Deduplicate fields by name, preferring concrete types over vague ones.
/// First writer wins among equally-concrete entries.
pub fn dedupe_fields(fields: Vec<ParamDef>) -> Vec<ParamDef> {
    if fields.is_empty() {
        return fields;
    }

    let mut unique: Vec<ParamDef> = Vec::new();

    for field in fields {
        match unique.iter().position(|f| f.name == field.name) {
            Some(idx) => {
                let existing = &unique[idx];
                let existing_vague = matches!(
                    existing.type_name.as_str(),
                    "Object" | "java.lang.Object" | "Map"
                );
                let new_concrete = !matches!(
                    field.type_name.as_str(),
                    "Object" | "java.lang.Object" | "Map"
                );
                if existing_vague && new_concrete {
                    unique[idx] = field;
                }
            }
            None => unique.push(field),
        }
    }

    unique
}

/// Resolve the flattened, depth-labelled schema of a complex type.
pub fn resolve_schema(type_name: &str, pool: &ComponentPool) -> Vec<ParamDef> {
    let mut visited = HashSet::new();
    let fields = resolve_schema_recursive(type_name, pool, 1, &mut visited);
    dedupe_fields(fields)
}

/// Recursive schema resolution with cycle guard and depth cap.
///
/// Collections unwrap to their element type at the *same* depth; dynamic
/// types emit a single sentinel field; unknown types yield nothing.
pub fn resolve_schema_recursive(
    type_name: &str,
    pool: &ComponentPool,
    depth: usize,
    visited: &mut HashSet<String>,
) -> Vec<ParamDef> {
    let mut results = Vec::new();

    if depth > MAX_DEPTH {
        debug!(type_name, depth, "max schema depth reached");
        return results;
    }

    if is_collection_type(type_name) {
        if let Some(inner) = inner_generic_type(type_name) {
            // The wrapper itself is not a data level
            return resolve_schema_recursive(inner, pool, depth, visited);
        }
    }

    let clean_type = clean_type_name(type_name);

    if visited.contains(&clean_type) {
        debug!(type_name = %clean_type, depth, "circular schema reference");
        return results;
    }
    visited.insert(clean_type.clone());

    let fields = collect_type_fields(&clean_type, pool, depth, visited);

    visited.remove(&clean_type);
    fields
}

fn collect_type_fields(
    clean_type: &str,
    pool: &ComponentPool,
    depth: usize,
    visited: &mut HashSet<String>,
) -> Vec<ParamDef> {
    let mut results = Vec::new();

    if is_dynamic_type(clean_type) {
        let mut sentinel = ParamDef::field("(Dynamic)", "Map / JSON Object", depth);
        sentinel.description = "Structure varies dynamically (Key-Value pairs).".to_string();
        return vec![sentinel];
    }

    if is_system_type(clean_type) {
        return results;
    }

    let matched_key = match pool.lookup_class_key(clean_type) {
        Some(key) => key,
        None => {
            debug!(type_name = %clean_type, depth, "schema resolution miss");
            return results;
        }
    };

    let entries: Vec<(String, String)> = pool
        .field_entries(&matched_key)
        .or_else(|| pool.field_entries_fuzzy(clean_type))
        .map(|slice| slice.to_vec())
        .unwrap_or_default();

    for (field_name, field_type) in entries {
        let mut param = ParamDef::field(field_name, field_type.clone(), depth);
        param.description = format!("Field of {}", clean_type);
        results.push(param);

        if is_complex_type(&field_type) {
            let children = resolve_schema_recursive(&field_type, pool, depth + 1, visited);
            results.extend(children);
        }
    }

    results
}
