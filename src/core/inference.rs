use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use super::model::{Node, NodeId, ParamDef};
use super::pool::ComponentPool;
use super::schema::{
    apply_type_heuristics, clean_type_name, dedupe_fields, is_ambiguous_type, is_complex_type,
    is_system_type, resolve_schema, resolve_schema_recursive,
};

/// Infer a concrete return type from the method body when the declared type
/// is a generic wrapper.
///
/// Patterns, in priority order: `return new T(...)`, a wrapper around
/// `new T(...)`, `return T.builder(...)`, back-tracing the variable inside
/// `return new Wrapper(var)`, and a getter-naming fallback
/// (`getSchoolList` -> `SchoolListResponseDto` when present in the pool).
pub fn infer_return_type(node: &Node, pool: &ComponentPool) -> Option<String> {
    if node.body.is_empty() {
        return None;
    }

    let re_new = Regex::new(r"return\s+new\s+([a-zA-Z0-9_<>,\s.]+)\s*\(")
        .expect("invalid return-new regex");
    if let Some(cap) = re_new.captures(&node.body) {
        return Some(cap[1].to_string());
    }

    let re_wrapper = Regex::new(r"new\s+[a-zA-Z0-9_<>]+(?:\(.*\))?\(\s*new\s+([a-zA-Z0-9_<>,\s.]+)\s*\(")
        .expect("invalid wrapped-new regex");
    if let Some(cap) = re_wrapper.captures(&node.body) {
        return Some(cap[1].to_string());
    }

    let re_builder = Regex::new(r"return\s+([a-zA-Z0-9_<>,\s.]+)\.builder\s*\(")
        .expect("invalid builder regex");
    if let Some(cap) = re_builder.captures(&node.body) {
        return Some(cap[1].to_string());
    }

    let re_return_var =
        Regex::new(r"return\s+new\s+[a-zA-Z0-9_<>]+(?:\(.*\))?\s*\(\s*([a-zA-Z0-9_]+)\s*(?:,|\))")
            .expect("invalid return-var regex");
    if let Some(cap) = re_return_var.captures(&node.body) {
        let var_name = &cap[1];
        if !matches!(var_name, "null" | "true" | "false") {
            let decl_pattern = format!(
                r"(?:^|[;{{}}])\s*([A-Z][a-zA-Z0-9_<>]*)\s+{}\s*=",
                regex::escape(var_name)
            );
            if let Ok(re_decl) = Regex::new(&decl_pattern) {
                if let Some(decl) = re_decl.captures(&node.body) {
                    return Some(decl[1].to_string());
                }
            }
        }
    }

    // Naming-convention fallback for getter-style methods
    if let Some(base_name) = node.method.strip_prefix("get") {
        if !base_name.is_empty() {
            let candidates = [
                format!("{}ResponseDto", base_name),
                format!("{}Response", base_name),
                format!("{}Dto", base_name),
            ];
            for candidate in &candidates {
                if pool.lookup_class_key(candidate).is_some() {
                    return Some(candidate.clone());
                }
            }
        }
    }

    None
}

/// Recover the schema of a dynamically-typed return value from the method
/// body. Four strategies run in priority order, stopping at the first that
/// yields fields: local map synthesis, service hop, blind map scan, and
/// return-variable trace.
pub fn infer_map_schema(node: &Node, pool: &ComponentPool) -> Vec<ParamDef> {
    let mut results = Vec::new();
    if node.body.is_empty() {
        return results;
    }

    // Strategy 1: local map synthesis
    if let Some(target_var) = find_return_variable(&node.body) {
        if !matches!(target_var.as_str(), "null" | "true" | "false") {
            let decl_pattern = format!(
                r"\b(?:Map|HashMap|LinkedHashMap|ModelMap)(?:<.*?>)?\s+\b{}\b\s*=",
                regex::escape(&target_var)
            );
            let is_map = Regex::new(&decl_pattern)
                .map(|re| re.is_match(&node.body))
                .unwrap_or(false);

            if is_map {
                results = scan_put_calls(&target_var, &node.body, pool, false, "inferred map key");
            }
        }

        if !results.is_empty() {
            debug!(method = %node.method, var = %target_var, "inferred map schema from local puts");
            return dedupe_fields(results);
        }
    }

    // Strategy 2: service hop through the return expression
    if let Some(fields) = service_hop(node, pool) {
        if !fields.is_empty() {
            return fields;
        }
    }

    // Strategy 3: blind map scan over any map-typed local
    if results.is_empty() {
        let re_map_blind =
            Regex::new(r"(\w+)\s*=\s*new\s+(?:[\w.]+\.)?(?:Hash|LinkedHash|Tree|Model|ConcurrentHash)Map")
                .expect("invalid blind map regex");

        let mut candidate_vars: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for cap in re_map_blind.captures_iter(&node.body) {
            let var = cap[1].to_string();
            if seen.insert(var.clone()) {
                candidate_vars.push(var);
            }
        }

        // Conventional variable names as a last resort
        if candidate_vars.is_empty() {
            for name in ["map", "result", "data", "res", "response"] {
                if node.body.contains(&format!("{}.put", name)) && seen.insert(name.to_string()) {
                    candidate_vars.push(name.to_string());
                }
            }
        }

        for var in &candidate_vars {
            debug!(method = %node.method, var = %var, "scavenging orphaned map variable");
            results.extend(scan_put_calls(var, &node.body, pool, true, "scavenged map key"));
        }
    }

    // Strategy 4: trace the returned variable's declared type
    if results.is_empty() {
        let mut return_var = String::new();

        let re_simple =
            Regex::new(r"return\s+([a-zA-Z0-9_]+)\s*;").expect("invalid simple return regex");
        if let Some(cap) = re_simple.captures(&node.body) {
            return_var = cap[1].to_string();
        }

        if return_var.is_empty() {
            let re_wrapped = Regex::new(r"return\s+[^;]*\(\s*([a-zA-Z0-9_]+)\s*\)")
                .expect("invalid wrapped return regex");
            if let Some(cap) = re_wrapped.captures(&node.body) {
                return_var = cap[1].to_string();
            }
        }

        if !return_var.is_empty() && !matches!(return_var.as_str(), "null" | "true" | "false") {
            let decl_pattern = format!(
                r"([a-zA-Z0-9_<>\[\]]+)\s+\b{}\b\s*[:=;]",
                regex::escape(&return_var)
            );
            if let Ok(re_decl) = Regex::new(&decl_pattern) {
                if let Some(cap) = re_decl.captures(&node.body) {
                    let decl_type = cap[1].to_string();
                    debug!(method = %node.method, var = %return_var, decl_type = %decl_type, "tracing return variable");

                    let resolved = if is_system_type(&decl_type) {
                        let mut field = ParamDef::field("result", decl_type, 0);
                        field.description = format!("Return value ({})", return_var);
                        vec![field]
                    } else {
                        resolve_schema(&decl_type, pool)
                    };

                    if !resolved.is_empty() {
                        return resolved;
                    }
                }
            }
        }
    }

    dedupe_fields(results)
}

/// Identify the returned variable: `return X;`, `return new Wrapper(X)`,
/// or `return Cls.factory(X)`
fn find_return_variable(body: &str) -> Option<String> {
    let re_direct = Regex::new(r"return\s+(\w+)\s*;").expect("invalid direct return regex");
    if let Some(cap) = re_direct.captures(body) {
        return Some(cap[1].to_string());
    }

    let re_wrapped =
        Regex::new(r"return\s+new\s+[a-zA-Z0-9_<>]+(?:\(.*\))?\s*\(\s*(\w+)\s*(?:,|\))")
            .expect("invalid wrapped return regex");
    if let Some(cap) = re_wrapped.captures(body) {
        return Some(cap[1].to_string());
    }

    let re_factory =
        Regex::new(r"return\s+[a-zA-Z0-9_]+\.[a-zA-Z0-9_]+\s*\(\s*(\w+)\s*(?:,|\))")
            .expect("invalid factory return regex");
    if let Some(cap) = re_factory.captures(body) {
        return Some(cap[1].to_string());
    }

    None
}

/// Collect `var.put("key", expr)` occurrences into ParamDefs, inferring the
/// value type of each expression. Complex values recurse into schema
/// resolution at depth 2.
fn scan_put_calls(
    var: &str,
    body: &str,
    pool: &ComponentPool,
    multiline: bool,
    description: &str,
) -> Vec<ParamDef> {
    let mut results = Vec::new();

    let pattern = if multiline {
        format!(r#"(?s)\b{}\.put\(\s*"([^"]+)"\s*,\s*(.*?)\s*\);"#, regex::escape(var))
    } else {
        format!(r#"\b{}\.put\(\s*"([^"]+)"\s*,\s*(.*?)\s*\);"#, regex::escape(var))
    };
    let re_put = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return results,
    };

    for cap in re_put.captures_iter(body) {
        let key = cap[1].to_string();
        let value_expr = cap[2].trim().to_string();

        let value_type = infer_value_type(&value_expr, body);
        let value_type = apply_type_heuristics(&key, &value_type);

        let mut param = ParamDef::field(key, value_type.clone(), 1);
        param.description = description.to_string();
        results.push(param);

        if is_complex_type(&value_type) {
            let mut visited = HashSet::new();
            let children = resolve_schema_recursive(&value_type, pool, 2, &mut visited);
            results.extend(children);
        }
    }

    results
}

/// Infer the type of a map-value expression: constructor, string literal,
/// boolean literal, integer literal, or the declared type of a local
fn infer_value_type(value_expr: &str, body: &str) -> String {
    let re_constructor =
        Regex::new(r"new\s+([a-zA-Z0-9_<>,\s.]+)\s*\(").expect("invalid constructor regex");
    if let Some(cap) = re_constructor.captures(value_expr) {
        return cap[1].to_string();
    }

    if value_expr.starts_with('"') {
        return "String".to_string();
    }

    if value_expr == "true" || value_expr == "false" {
        return "boolean".to_string();
    }

    if !value_expr.is_empty() && value_expr.chars().all(|c| c.is_ascii_digit()) {
        return "int".to_string();
    }

    // Back-trace the declared type of the expression variable
    let decl_pattern = format!(
        r"(?:^|[;{{}}])\s*([A-Z][a-zA-Z0-9_<>]*)\s+{}\s*=",
        regex::escape(value_expr)
    );
    if let Ok(re_decl) = Regex::new(&decl_pattern) {
        if let Some(cap) = re_decl.captures(body) {
            return cap[1].to_string();
        }
    }

    "Object".to_string()
}

/// Strategy 2: follow `receiver.callee(...)` in the return expression into
/// the service implementation and read the schema there.
fn service_hop(node: &Node, pool: &ComponentPool) -> Option<Vec<ParamDef>> {
    let re_return = Regex::new(r"(?s)return\s+(.*?);").expect("invalid return regex");
    let return_stmt = re_return.captures(&node.body)?.get(1)?.as_str().to_string();

    let re_call = Regex::new(r"(\w+)\.(\w+)\(").expect("invalid call regex");

    let parent_id = node.parent?;
    let parent_key = pool.node(parent_id).id.clone();

    for cap in re_call.captures_iter(&return_stmt) {
        let var_name = &cap[1];
        let method_name = &cap[2];
        debug!(method = %node.method, receiver = %var_name, callee = %method_name, "service hop candidate");

        let service_type = match pool
            .field_entries(&parent_key)
            .and_then(|entries| entries.iter().find(|(name, _)| name == var_name))
        {
            Some((_, field_type)) => clean_type_name(field_type),
            None => continue,
        };

        let service_class = match resolve_implementation_class(pool, &service_type) {
            Some(id) => id,
            None => {
                debug!(service_type = %service_type, "service hop could not resolve implementation");
                continue;
            }
        };

        let children: Vec<NodeId> = pool.node(service_class).children.clone();
        for child_id in children {
            let child = pool.node(child_id);
            if child.method != *method_name {
                continue;
            }
            debug!(from = %node.method, to = %child.id, "hopping into service method");

            // A concrete declared type needs no body scan
            if !child.return_detail.is_empty() && !is_ambiguous_type(&child.return_detail) {
                return Some(resolve_schema(&child.return_detail, pool));
            }

            return Some(infer_map_schema(child, pool));
        }
    }

    None
}

/// Find the concrete implementation class for an interface or class name:
/// exact match, `<Name>Impl`, then fuzzy trailing-segment match with Impl
/// preferred.
pub fn resolve_implementation_class(pool: &ComponentPool, target_type: &str) -> Option<NodeId> {
    if let Some(exact) = pool.get_class(target_type) {
        if target_type.ends_with("Impl") {
            return Some(exact);
        }
        if let Some(impl_node) = pool.get_class(&format!("{}Impl", target_type)) {
            return Some(impl_node);
        }
        return Some(exact);
    }

    if let Some(impl_node) = pool.get_class(&format!("{}Impl", target_type)) {
        return Some(impl_node);
    }

    let impl_key = pool.lookup_class_key(&format!("{}Impl", target_type));
    if let Some(key) = impl_key {
        return pool.get_class(&key);
    }

    pool.lookup_class_key(target_type)
        .and_then(|key| pool.get_class(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::java::JavaParser;
    use crate::core::model::{Node, NodeKind};

    fn pool_with(sources: &[&str]) -> ComponentPool {
        let parser = JavaParser::new();
        let mut pool = ComponentPool::new();
        for source in sources {
            pool.add_java_class(&parser.parse(source).unwrap(), "test.java");
        }
        pool
    }

    fn method_node(name: &str, body: &str) -> Node {
        let mut node = Node::new(NodeKind::Service);
        node.method = name.to_string();
        node.body = body.to_string();
        node
    }

    #[test]
    fn local_map_synthesis_reads_put_calls() {
        let pool = ComponentPool::new();
        let node = method_node(
            "getUserInfo",
            r#"
        Map<String, Object> resultMap = new HashMap<>();
        resultMap.put("userInfo", new UserDto());
        resultMap.put("isSuccess", true);
        return resultMap;
"#,
        );

        let fields = infer_map_schema(&node, &pool);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "userInfo");
        assert_eq!(fields[0].type_name, "UserDto");
        assert_eq!(fields[0].depth, 1);
        assert_eq!(fields[1].name, "isSuccess");
        assert_eq!(fields[1].type_name, "boolean");
    }

    #[test]
    fn local_map_fields_recurse_into_known_dtos() {
        let pool = pool_with(&[
            r#"
package com.test;
public class UserDto {
    private String userName;
    private int age;
}
"#,
        ]);
        let node = method_node(
            "getUserInfo",
            r#"
        Map<String, Object> m = new HashMap<>();
        m.put("userInfo", new UserDto());
        return m;
"#,
        );

        let fields = infer_map_schema(&node, &pool);
        assert!(fields.iter().any(|f| f.name == "userInfo" && f.depth == 1));
        assert!(fields.iter().any(|f| f.name == "userName" && f.depth == 2));
        assert!(fields.iter().any(|f| f.name == "age" && f.depth == 2));
    }

    #[test]
    fn wrapped_return_finds_the_map_variable() {
        let pool = ComponentPool::new();
        let node = method_node(
            "getSchoolList",
            r#"
        Map<String, Object> data = new HashMap<>();
        data.put("schoolList", new ArrayList<SchoolDto>());
        return new ResponseDto(data);
"#,
        );

        let fields = infer_map_schema(&node, &pool);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "schoolList");
        assert!(fields[0].type_name.contains("ArrayList"));
    }

    #[test]
    fn static_factory_return_finds_the_map_variable() {
        let pool = ComponentPool::new();
        let node = method_node(
            "getId",
            r#"
        Map<String, Object> map = new HashMap<>();
        map.put("id", 123);
        return Response.ok(map);
"#,
        );

        let fields = infer_map_schema(&node, &pool);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].type_name, "int");
    }

    #[test]
    fn pagination_keys_get_forced_primitives() {
        let pool = ComponentPool::new();
        let node = method_node(
            "getPage",
            r#"
        Map<String, Object> m = new HashMap<>();
        m.put("totalElements", countResult);
        m.put("page", pageHolder);
        return m;
"#,
        );

        let fields = infer_map_schema(&node, &pool);
        let total = fields.iter().find(|f| f.name == "totalElements").unwrap();
        assert_eq!(total.type_name, "long");
        let page = fields.iter().find(|f| f.name == "page").unwrap();
        assert_eq!(page.type_name, "int");
    }

    #[test]
    fn service_hop_recovers_schema_from_target_body() {
        let mut pool = pool_with(&[
            r#"
package com.example;
@Service
public class MyService {
    public Map<String, Object> getData() {
        Map<String, Object> map = new HashMap<>();
        map.put("serviceKey", "serviceValue");
        return map;
    }
}
"#,
        ]);

        // Controller class holding the injected field
        let parser = JavaParser::new();
        let controller = parser
            .parse(
                r#"
package com.example;
@Controller
public class MyController {
    @Autowired
    private MyService myService;

    public ResponseDto endpoint() {
        return new ResponseDto(myService.getData());
    }
}
"#,
            )
            .unwrap();
        pool.add_java_class(&controller, "MyController.java");

        let method_id = pool.get_method("com.example.MyController.endpoint").unwrap();
        let node = pool.node(method_id).clone();

        let fields = infer_map_schema(&node, &pool);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "serviceKey");
        assert_eq!(fields[0].type_name, "String");
        assert_eq!(fields[0].depth, 1);
    }

    #[test]
    fn service_hop_prefers_concrete_declared_types() {
        let mut pool = pool_with(&[
            r#"
package com.example;
@Service
public class CatalogService {
    public ProductDto getProduct() {
        return loadProduct();
    }
}
"#,
            r#"
package com.example;
public class ProductDto {
    private Long productId;
    private String productName;
}
"#,
        ]);

        let parser = JavaParser::new();
        let controller = parser
            .parse(
                r#"
package com.example;
@Controller
public class CatalogController {
    @Autowired
    private CatalogService catalogService;

    public Map<String, Object> endpoint() {
        return new ResponseDto(catalogService.getProduct());
    }
}
"#,
            )
            .unwrap();
        pool.add_java_class(&controller, "CatalogController.java");

        let method_id = pool
            .get_method("com.example.CatalogController.endpoint")
            .unwrap();
        let node = pool.node(method_id).clone();

        let fields = infer_map_schema(&node, &pool);
        assert!(fields.iter().any(|f| f.name == "productId"));
        assert!(fields.iter().any(|f| f.name == "productName"));
    }

    #[test]
    fn blind_scan_scavenges_orphaned_maps() {
        let pool = ComponentPool::new();
        // The returned expression hides the variable, so the blind scan kicks in
        let node = method_node(
            "buildPayload",
            r#"
        Map<String, Object> payload = new HashMap<>();
        payload.put("status", "OK");
        payload.put("count", 42);
        return wrap(payload, extra);
"#,
        );

        let fields = infer_map_schema(&node, &pool);
        assert!(fields.iter().any(|f| f.name == "status" && f.type_name == "String"));
        assert!(fields.iter().any(|f| f.name == "count" && f.type_name == "int"));
    }

    #[test]
    fn return_variable_trace_resolves_declared_type() {
        let pool = pool_with(&[
            r#"
package com.test;
public class ResultDto {
    private String message;
}
"#,
        ]);
        let node = method_node(
            "fetch",
            r#"
        ResultDto outcome = buildOutcome();
        outcome.refresh();
        return outcome;
"#,
        );

        let fields = infer_map_schema(&node, &pool);
        assert!(fields.iter().any(|f| f.name == "message"));
    }

    #[test]
    fn infer_return_type_patterns() {
        let pool = ComponentPool::new();

        let direct = method_node("a", "return new UserDTO(name);");
        assert_eq!(infer_return_type(&direct, &pool).as_deref(), Some("UserDTO"));

        let builder = method_node("b", "return UserDTO.builder().name(n).build();");
        assert_eq!(infer_return_type(&builder, &pool).as_deref(), Some("UserDTO"));

        // The first pattern wins even for wrappers; the variable inside is
        // recovered later by the map-rescue strategies, not here
        let wrapped = method_node(
            "c",
            "{ SchoolDto dto = load(); return new ResponseEntity(dto); }",
        );
        assert_eq!(
            infer_return_type(&wrapped, &pool).as_deref(),
            Some("ResponseEntity")
        );

        let nothing = method_node("d", "return null;");
        assert_eq!(infer_return_type(&nothing, &pool), None);
    }

    #[test]
    fn getter_naming_fallback_consults_the_pool() {
        let pool = pool_with(&[
            r#"
package com.test;
public class SchoolListResponseDto {
    private int total;
}
"#,
        ]);

        let node = method_node("getSchoolList", "return service.fetch();");
        assert_eq!(
            infer_return_type(&node, &pool).as_deref(),
            Some("SchoolListResponseDto")
        );
    }

    #[test]
    fn implementation_resolution_prefers_impl_suffix() {
        let pool = pool_with(&[
            r#"
package com.test;
public interface OrderService {
    OrderDto find(Long id);
}
"#,
            r#"
package com.test;
@Service
public class OrderServiceImpl {
    public OrderDto find(Long id) { return orderMapper.select(id); }
}
"#,
        ]);

        let resolved = resolve_implementation_class(&pool, "OrderService").unwrap();
        assert_eq!(pool.node(resolved).id, "com.test.OrderServiceImpl");
    }
}
