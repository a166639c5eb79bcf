use tracing::debug;

use super::inference::{infer_map_schema, infer_return_type};
use super::model::{EndpointDef, Node, NodeKind, ParamDef, ParamLocation, ResponseDef};
use super::pool::ComponentPool;
use super::schema::{is_complex_type, is_dynamic_type, resolve_schema};

/// Java keywords and view types that must never surface as endpoint names.
/// Double defense: the linker filters these too, but the extractor cannot
/// assume upstream filtering happened.
const ENDPOINT_KEYWORDS: [&str; 47] = [
    "if",
    "else",
    "for",
    "while",
    "do",
    "switch",
    "case",
    "default",
    "return",
    "throw",
    "throws",
    "new",
    "try",
    "catch",
    "finally",
    "synchronized",
    "assert",
    "break",
    "continue",
    "goto",
    "instanceof",
    "this",
    "super",
    "null",
    "true",
    "false",
    "void",
    "class",
    "interface",
    "enum",
    "extends",
    "implements",
    "import",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "final",
    "abstract",
    "native",
    "strictfp",
    "transient",
    "volatile",
    "modelandview",
    "model",
    "view",
];

const VIEW_TYPES: [&str; 5] = ["ModelAndView", "Model", "View", "RedirectView", "ModelMap"];

/// Extract API endpoint definitions from controller nodes (C6).
///
/// Only the public API surface is derived here; internal call chains stay in
/// the pool for the tabular report. The result is sorted by path.
pub fn extract_endpoints(pool: &ComponentPool) -> Vec<EndpointDef> {
    let mut endpoints = Vec::new();

    for class_id in pool.class_ids() {
        let class_node = pool.node(class_id);
        if !class_node.is_controller() {
            continue;
        }

        for &method_id in &class_node.children {
            let method = pool.node(method_id);
            if method.kind != NodeKind::Controller {
                continue;
            }

            if is_endpoint_keyword(&method.method) {
                debug!(name = %method.method, "blocked keyword as endpoint");
                continue;
            }

            if method.method == "new" || method.method.starts_with("new ") {
                debug!(name = %method.method, "blocked constructor as endpoint");
                continue;
            }

            let endpoint = extract_endpoint_from_method(class_node, method, pool);

            if is_view_endpoint(&endpoint, method) {
                debug!(path = %endpoint.path, response = %endpoint.response.type_name, "excluded view endpoint");
                continue;
            }

            endpoints.push(endpoint);
        }
    }

    endpoints.sort_by(|a, b| a.path.cmp(&b.path));
    endpoints
}

fn extract_endpoint_from_method(
    controller: &Node,
    method: &Node,
    pool: &ComponentPool,
) -> EndpointDef {
    let mut http_method = extract_http_method(method);
    if http_method.is_empty() {
        http_method = "GET".to_string();
    }

    let path = if method.url.is_empty() {
        format!("/{}", method.method)
    } else {
        method.url.clone()
    };

    EndpointDef {
        method: http_method,
        path,
        controller_name: simple_name(&controller.id).to_string(),
        method_name: method.method.clone(),
        summary: extract_summary(&method.comment),
        description: method.comment.clone(),
        params: extract_parameters(method, pool),
        response: extract_response(method, pool),
    }
}

/// HTTP verb: the stored annotation verb, else a method-name heuristic
fn extract_http_method(method: &Node) -> String {
    if !method.annotation.is_empty() {
        return method.annotation.to_uppercase();
    }

    let name = method.method.to_lowercase();
    if name.starts_with("get") || name.starts_with("list") || name.starts_with("find") {
        "GET".to_string()
    } else if name.starts_with("create") || name.starts_with("add") || name.starts_with("insert") {
        "POST".to_string()
    } else if name.starts_with("update") || name.starts_with("modify") {
        "PUT".to_string()
    } else if name.starts_with("delete") || name.starts_with("remove") {
        "DELETE".to_string()
    } else {
        "GET".to_string()
    }
}

fn extract_parameters(method: &Node, pool: &ComponentPool) -> Vec<ParamDef> {
    let mut params = Vec::new();

    if method.params.is_empty() {
        return params;
    }

    for part in method.params.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some(param) = parse_parameter(part, pool) {
            params.push(param);
        }
    }

    params
}

/// Parse one "Type name" or "@Annotation Type name" token
fn parse_parameter(param_str: &str, pool: &ComponentPool) -> Option<ParamDef> {
    let parts: Vec<&str> = param_str.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    let mut location: Option<ParamLocation> = None;
    let mut description = String::new();
    let mut start_idx = 0;

    for (i, part) in parts.iter().enumerate() {
        if part.starts_with('@') {
            let annotation = part.to_lowercase();
            if annotation.contains("requestbody") {
                location = Some(ParamLocation::Body);
                description = "Request body".to_string();
            } else if annotation.contains("pathvariable") {
                location = Some(ParamLocation::Path);
                description = "Path variable".to_string();
            } else if annotation.contains("requestparam") {
                location = Some(ParamLocation::Query);
                description = "Query parameter".to_string();
            } else if annotation.contains("requestheader") {
                location = Some(ParamLocation::Header);
                description = "Header parameter".to_string();
            }
            start_idx = i + 1;
        }
    }

    let remaining = &parts[start_idx..];
    let (type_name, name) = match remaining.len() {
        0 => return None,
        1 => (remaining[0].to_string(), "param".to_string()),
        _ => (remaining[0].to_string(), remaining[1].to_string()),
    };

    // No annotation carried a location: complex types default to Body,
    // primitives and wrappers to Query
    let location = location.unwrap_or_else(|| {
        if is_complex_type(&type_name) {
            ParamLocation::Body
        } else {
            ParamLocation::Query
        }
    });

    if description.is_empty() || (description == "Request body" && is_complex_type(&type_name)) {
        description = if location == ParamLocation::Body && is_complex_type(&type_name) {
            if type_name.ends_with("DTO") || type_name.ends_with("Dto") {
                format!("{} (Data Transfer Object)", type_name)
            } else {
                format!("{} (Object)", type_name)
            }
        } else if description.is_empty() {
            format!("Query parameter ({})", type_name)
        } else {
            description
        };
    }

    let fields = if is_complex_type(&type_name) {
        resolve_schema(&type_name, pool)
    } else {
        Vec::new()
    };

    Some(ParamDef {
        name,
        type_name,
        location,
        required: true,
        description,
        depth: 0,
        fields,
    })
}

fn extract_response(method: &Node, pool: &ComponentPool) -> ResponseDef {
    let mut response = ResponseDef {
        type_name: if method.return_detail.is_empty() {
            "void".to_string()
        } else {
            method.return_detail.clone()
        },
        description: "Successful response".to_string(),
        status_code: 200,
        fields: Vec::new(),
    };

    // Generic wrappers get a shot at concrete-type substitution, then at
    // body-based schema recovery
    if is_dynamic_type(&response.type_name)
        || response.type_name.contains("Response")
        || response.type_name.contains('?')
        || response.type_name.contains("Map")
    {
        if let Some(inferred) = infer_return_type(method, pool) {
            debug!(method = %method.method, old = %response.type_name, new = %inferred, "inferred concrete return type");
            response.type_name = inferred;
        }

        if is_dynamic_type(&response.type_name)
            || response.type_name.contains("Map")
            || response.type_name.contains("Response")
        {
            let virtual_fields = infer_map_schema(method, pool);
            if !virtual_fields.is_empty() {
                debug!(method = %method.method, "constructed virtual schema from body");
                response.fields = virtual_fields;
            }
        }
    }

    let lower = response.type_name.to_lowercase();
    if lower.contains("modelandview") {
        response.description = "Returns a view".to_string();
    } else if lower.contains("responseentity") {
        response.description = "Returns response entity".to_string();
    } else if lower.contains("list") {
        response.description = "Returns a list of items".to_string();
    } else if lower.contains("void") {
        response.description = "No content".to_string();
        response.status_code = 204;
    }

    if is_complex_type(&response.type_name) && response.fields.is_empty() {
        response.fields = resolve_schema(&response.type_name, pool);
    }

    response
}

/// First sentence (or first non-marker line) of a doc comment
pub fn extract_summary(comment: &str) -> String {
    if comment.is_empty() {
        return String::new();
    }

    let first_line = comment
        .lines()
        .next()
        .unwrap_or(comment)
        .trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_start_matches('*')
        .trim();

    match first_line.find('.') {
        Some(idx) if idx > 0 => first_line[..=idx].to_string(),
        _ => first_line.to_string(),
    }
}

fn simple_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

/// A controller method that renders a page rather than returning data.
///
/// Explicit view return types are always suppressed; a bare `String` return
/// is a view name unless the method carried a response-body annotation.
fn is_view_endpoint(endpoint: &EndpointDef, method: &Node) -> bool {
    let return_type = &endpoint.response.type_name;

    if VIEW_TYPES.iter().any(|view| return_type.contains(view)) {
        return true;
    }

    if return_type == "String" && !method.has_response_body {
        return true;
    }

    false
}

fn is_endpoint_keyword(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let lower = name.to_lowercase();
    ENDPOINT_KEYWORDS.contains(&lower.as_str()) || lower == "redirectview"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::java::JavaParser;
    use crate::core::linker::Linker;

    fn analyzed_pool(sources: &[&str]) -> ComponentPool {
        let parser = JavaParser::new();
        let mut pool = ComponentPool::new();
        for source in sources {
            pool.add_java_class(&parser.parse(source).unwrap(), "test.java");
        }
        Linker::new(&mut pool).link();
        pool
    }

    const LEGACY_VIEW_CONTROLLER: &str = r#"
package com.company.legacy;
@Controller
@RequestMapping("/user")
public class UserController {
    @Autowired
    private UserService userService;

    @RequestMapping(value = "/login", method = RequestMethod.POST)
    public ModelAndView login(HttpServletRequest request) {
        UserVO user = userService.authenticateUser(request);
        return new ModelAndView("home");
    }
}
"#;

    const LEGACY_SERVICE: &str = r#"
package com.company.legacy;
@Service
public class UserService {
    public UserVO authenticateUser(HttpServletRequest request) { return null; }
}
"#;

    const MODERN_CONTROLLER: &str = r#"
package com.company.modern;
@RestController
@RequestMapping("/api/v1/product")
public class ProductApiController {
    @Autowired
    private ProductService productService;

    @PostMapping("/register")
    public ResponseEntity<ProductDTO> registerProduct(@RequestBody ProductDTO product) {
        ProductDTO result = productService.createProduct(product);
        return ResponseEntity.status(HttpStatus.CREATED).body(result);
    }
}
"#;

    const PRODUCT_DTO: &str = r#"
package com.company.common;
public class ProductDTO {
    private Long productId;
    private String productName;
    private int price;
}
"#;

    #[test]
    fn view_endpoints_are_suppressed_but_graph_remains() {
        let pool = analyzed_pool(&[LEGACY_VIEW_CONTROLLER, LEGACY_SERVICE]);

        // Call graph still contains the chain
        let login = pool
            .get_method("com.company.legacy.UserController.login")
            .unwrap();
        assert!(pool
            .node(login)
            .children
            .iter()
            .any(|&c| pool.node(c).id.contains("UserService.authenticateUser")));

        // But the endpoint list has no /user/login entry
        let endpoints = extract_endpoints(&pool);
        assert!(endpoints.iter().all(|e| e.path != "/user/login"));
    }

    #[test]
    fn modern_rest_endpoint_is_extracted() {
        let pool = analyzed_pool(&[MODERN_CONTROLLER, PRODUCT_DTO]);
        let endpoints = extract_endpoints(&pool);

        let register = endpoints
            .iter()
            .find(|e| e.path == "/api/v1/product/register")
            .expect("register endpoint");

        assert_eq!(register.method, "POST");
        assert_eq!(register.controller_name, "ProductApiController");
        assert_eq!(register.method_name, "registerProduct");

        assert_eq!(register.params.len(), 1);
        let param = &register.params[0];
        assert_eq!(param.location, ParamLocation::Body);
        assert_eq!(param.type_name, "ProductDTO");
        assert_eq!(param.name, "product");
        assert!(param.fields.iter().any(|f| f.name == "productId"));

        assert_eq!(register.response.type_name, "ResponseEntity<ProductDTO>");
        assert_eq!(register.response.status_code, 200);
        // Strategy 4 back-traces `result` to ProductDTO
        assert!(register.response.fields.iter().any(|f| f.name == "productName"));
    }

    #[test]
    fn string_return_without_response_body_is_a_view() {
        let pool = analyzed_pool(&[r#"
package com.test;
@Controller
public class PageController {
    @RequestMapping("/page")
    public String page() { return "index"; }
}
"#]);
        assert!(extract_endpoints(&pool).is_empty());
    }

    #[test]
    fn string_return_on_rest_controller_is_kept() {
        let pool = analyzed_pool(&[r#"
package com.test;
@RestController
public class PingController {
    @GetMapping("/ping")
    public String ping() { return "pong"; }
}
"#]);
        let endpoints = extract_endpoints(&pool);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].path, "/ping");
        assert_eq!(endpoints[0].method, "GET");
    }

    #[test]
    fn void_returns_use_204() {
        let pool = analyzed_pool(&[r#"
package com.test;
@RestController
public class JobController {
    @DeleteMapping("/jobs")
    public void clearJobs() { jobStore.clear(); }
}
"#]);
        let endpoints = extract_endpoints(&pool);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].response.status_code, 204);
        assert_eq!(endpoints[0].response.description, "No content");
    }

    #[test]
    fn verb_falls_back_to_method_name_heuristics() {
        let pool = analyzed_pool(&[r#"
package com.test;
@RestController
public class ShopController {
    public ShopDto createShop(ShopDto shop) { return shop; }
    public ShopDto updateShop(ShopDto shop) { return shop; }
    public void removeShop(Long id) { }
    public ShopDto findShop(Long id) { return null; }
}
"#]);
        let endpoints = extract_endpoints(&pool);
        let verb_of = |name: &str| {
            endpoints
                .iter()
                .find(|e| e.method_name == name)
                .map(|e| e.method.clone())
                .unwrap()
        };
        assert_eq!(verb_of("createShop"), "POST");
        assert_eq!(verb_of("updateShop"), "PUT");
        assert_eq!(verb_of("removeShop"), "DELETE");
        assert_eq!(verb_of("findShop"), "GET");
    }

    #[test]
    fn missing_url_falls_back_to_method_name() {
        let pool = analyzed_pool(&[r#"
package com.test;
@RestController
public class BareController {
    public StatusDto health() { return new StatusDto(); }
}
"#]);
        let endpoints = extract_endpoints(&pool);
        assert_eq!(endpoints[0].path, "/health");
    }

    #[test]
    fn dynamic_map_response_gets_rescued_schema() {
        let pool = analyzed_pool(&[r#"
package com.test;
@RestController
public class InfoController {
    @GetMapping("/info")
    public Map<String, Object> getInfo() {
        Map<String, Object> m = new HashMap<>();
        m.put("version", "1.0");
        m.put("healthy", true);
        return m;
    }
}
"#]);
        let endpoints = extract_endpoints(&pool);
        let info = &endpoints[0];
        assert!(info.response.fields.iter().any(|f| f.name == "version" && f.type_name == "String"));
        assert!(info.response.fields.iter().any(|f| f.name == "healthy" && f.type_name == "boolean"));
    }

    #[test]
    fn summary_takes_the_first_sentence() {
        assert_eq!(
            extract_summary("Registers a product. Validates the payload first."),
            "Registers a product."
        );
        assert_eq!(extract_summary("* One liner"), "One liner");
        assert_eq!(extract_summary(""), "");
    }

    #[test]
    fn query_parameters_default_for_primitives() {
        let pool = analyzed_pool(&[r#"
package com.test;
@RestController
public class SearchController {
    @GetMapping("/search")
    public ResultDto search(String keyword, int limit) { return null; }
}
"#]);
        let endpoints = extract_endpoints(&pool);
        let search = &endpoints[0];
        assert_eq!(search.params.len(), 2);
        assert!(search
            .params
            .iter()
            .all(|p| p.location == ParamLocation::Query));
        assert_eq!(search.params[0].name, "keyword");
        assert_eq!(search.params[1].type_name, "int");
    }

    #[test]
    fn annotated_path_variable_is_detected() {
        let pool = analyzed_pool(&[r#"
package com.test;
@RestController
public class OrderController {
    @GetMapping("/orders/detail")
    public OrderDto detail(@PathVariable Long orderId, @RequestHeader String tenant) { return null; }
}
"#]);
        let endpoints = extract_endpoints(&pool);
        let detail = &endpoints[0];
        assert_eq!(detail.params[0].location, ParamLocation::Path);
        assert_eq!(detail.params[0].name, "orderId");
        assert_eq!(detail.params[1].location, ParamLocation::Header);
    }
}
