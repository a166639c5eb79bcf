use regex::Regex;
use tracing::debug;

use super::model::NodeId;
use super::pool::ComponentPool;

/// A method invocation found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    /// Variable name or class name on the left of the dot
    pub receiver: String,
    pub method_name: String,
    /// Matched by the class-name-leading pattern
    pub is_static: bool,
}

/// Blocklist of keywords and common constructs that must never be traced
/// as method calls
const IGNORED_TOKENS: [&str; 53] = [
    // Java keywords
    "if",
    "else",
    "for",
    "while",
    "switch",
    "case",
    "try",
    "catch",
    "finally",
    "synchronized",
    "return",
    "throw",
    "throws",
    "assert",
    "break",
    "continue",
    "do",
    // Constructors and object creation
    "new",
    "this",
    "super",
    // Logging and I/O builtins
    "println",
    "print",
    "printf",
    "info",
    "debug",
    "warn",
    "error",
    "trace",
    "log",
    "out",
    "err",
    // Common Java classes that are usually noise
    "System",
    "String",
    "Integer",
    "Long",
    "Double",
    "Boolean",
    "Object",
    "Class",
    "Exception",
    // Framework/view/container types
    "ModelAndView",
    "Model",
    "View",
    "RedirectView",
    "ResponseEntity",
    "HttpEntity",
    "ArrayList",
    "HashMap",
    "HashSet",
    "LinkedList",
    "TreeMap",
    "TreeSet",
    "Date",
];

/// Keywords that must never appear as a receiver or method name, matched
/// case-insensitively
const STRICT_KEYWORDS: [&str; 26] = [
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
];

/// Prefixes that catch glued tokens like "if(" slipping through the regex
const KEYWORD_PREFIXES: [&str; 11] = [
    "if",
    "for",
    "while",
    "switch",
    "catch",
    "synchronized",
    "return",
    "throw",
    "assert",
    "new",
    "instanceof",
];

/// Framework classes whose calls are constructor noise, not business logic
const CONSTRUCTOR_TYPES: [&str; 12] = [
    "ResponseEntity",
    "HttpEntity",
    "ArrayList",
    "HashMap",
    "HashSet",
    "LinkedList",
    "TreeMap",
    "TreeSet",
    "Date",
    "SimpleDateFormat",
    "StringBuilder",
    "StringBuffer",
];

/// Package markers of data-carrier classes, excluded from the call graph
const DATA_PACKAGES: [&str; 6] = [".model", ".vo", ".dto", ".domain", ".entity", ".bean"];

/// Extract potential call sites from a method body.
///
/// Both regex families run over the same text, so a capitalized receiver
/// produces an instance record and a static record for the same site; the
/// noise filters see both interpretations, and the pool's add-child dedup
/// keeps the graph clean.
pub fn find_method_calls(source: &str) -> Vec<MethodCall> {
    let mut calls = Vec::new();

    let instance_re = Regex::new(r"(\w+)\.(\w+)\s*\(").expect("invalid instance call regex");
    for cap in instance_re.captures_iter(source) {
        calls.push(MethodCall {
            receiver: cap[1].to_string(),
            method_name: cap[2].to_string(),
            is_static: false,
        });
    }

    let static_re = Regex::new(r"([A-Z]\w+)\.(\w+)\s*\(").expect("invalid static call regex");
    for cap in static_re.captures_iter(source) {
        calls.push(MethodCall {
            receiver: cap[1].to_string(),
            method_name: cap[2].to_string(),
            is_static: true,
        });
    }

    calls
}

/// Lexically valid Java identifier: rejects tokens the loose call regex
/// produces from control-flow text
pub fn is_valid_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

/// Prefix-based keyword detection: catches "if", glued "if(" remnants,
/// and Exception/Error constructors
pub fn is_invalid_token(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }

    let lower = name.to_lowercase();

    if STRICT_KEYWORDS.contains(&lower.as_str()) {
        debug!(token = %name, "dropping keyword");
        return true;
    }

    for prefix in KEYWORD_PREFIXES {
        if lower.starts_with(prefix) {
            let rest = &lower[prefix.len()..];
            let glued = rest
                .chars()
                .next()
                .map(|ch| !ch.is_ascii_alphabetic())
                .unwrap_or(true);
            if glued {
                debug!(token = %name, prefix, "dropping keyword prefix");
                return true;
            }
        }
    }

    if name.ends_with("Exception") || name.ends_with("Error") {
        debug!(token = %name, "dropping exception/error constructor");
        return true;
    }

    false
}

/// Strict method-call validation, the last line of defense
pub fn is_valid_method_call(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    if STRICT_KEYWORDS.contains(&name) {
        return false;
    }

    if name.ends_with("Exception") || name.ends_with("Error") {
        return false;
    }

    true
}

/// Receiver names that are framework constructors rather than components
pub fn is_constructor_call(receiver: &str) -> bool {
    IGNORED_TOKENS.contains(&receiver) || CONSTRUCTOR_TYPES.contains(&receiver)
}

/// A fully-qualified name inside a data-carrier package
pub fn is_data_class(fqcn: &str) -> bool {
    if fqcn.is_empty() {
        return false;
    }
    let lower = fqcn.to_lowercase();
    DATA_PACKAGES.iter().any(|marker| lower.contains(marker))
}

/// Builds the call graph over the pool (C5).
///
/// Single pass over method bodies: children are only appended, traversal
/// indexes method keys rather than edges, so no fixpoint is needed and the
/// linker never recurses through the graph it builds.
pub struct Linker<'a> {
    pool: &'a mut ComponentPool,
}

impl<'a> Linker<'a> {
    pub fn new(pool: &'a mut ComponentPool) -> Self {
        Self { pool }
    }

    pub fn link(&mut self) {
        self.link_java_methods();
        self.link_mappers_to_sql();
    }

    /// Trace calls in every method body and attach resolved targets
    fn link_java_methods(&mut self) {
        for method_key in self.pool.method_keys() {
            let body = match self.pool.method_body(&method_key) {
                Some(body) if !body.is_empty() => body.to_string(),
                // No body: interface or abstract method, nothing to trace
                _ => continue,
            };

            let full_class_name = match method_key.rfind('.') {
                Some(idx) => method_key[..idx].to_string(),
                None => continue,
            };

            let method_id = match self.pool.get_method(&method_key) {
                Some(id) => id,
                None => continue,
            };
            let caller_return = self.pool.node(method_id).return_detail.clone();

            for call in find_method_calls(&body) {
                if !is_valid_java_identifier(&call.receiver)
                    || !is_valid_java_identifier(&call.method_name)
                {
                    continue;
                }

                if is_invalid_token(&call.receiver) || is_invalid_token(&call.method_name) {
                    continue;
                }

                if IGNORED_TOKENS.contains(&call.receiver.as_str())
                    || IGNORED_TOKENS.contains(&call.method_name.as_str())
                {
                    continue;
                }

                if !is_valid_method_call(&call.receiver) || !is_valid_method_call(&call.method_name)
                {
                    continue;
                }

                if call.is_static && is_constructor_call(&call.receiver) {
                    continue;
                }

                // A static receiver matching the caller's return type is a
                // constructor in a `return new ReturnType(...)` expression
                if call.is_static && !caller_return.is_empty() {
                    let mut return_type = caller_return.as_str();
                    if let Some(idx) = return_type.find('<') {
                        return_type = &return_type[..idx];
                    }
                    if let Some(idx) = return_type.rfind('.') {
                        return_type = &return_type[idx + 1..];
                    }
                    if call.receiver == return_type {
                        debug!(receiver = %call.receiver, "dropping constructor matching return type");
                        continue;
                    }
                }

                let targets: Vec<NodeId> = if call.is_static {
                    match self.pool.find_class_by_simple_name(&call.receiver) {
                        Some(target_class) => {
                            if is_data_class(&target_class) {
                                debug!(class = %target_class, "skipping data class");
                                continue;
                            }
                            self.pool.find_methods_by_name(&target_class, &call.method_name)
                        }
                        None => Vec::new(),
                    }
                } else {
                    match self.pool.resolve_field_type(&full_class_name, &call.receiver) {
                        Some(receiver_type) => {
                            if is_data_class(&receiver_type) {
                                debug!(class = %receiver_type, "skipping data class");
                                continue;
                            }
                            self.pool.find_methods_by_name(&receiver_type, &call.method_name)
                        }
                        // Resolution miss: omit the edge, never fabricate
                        None => Vec::new(),
                    }
                };

                for target in targets {
                    self.pool.add_child(method_id, target);
                }
            }
        }
    }

    /// Attach SQL nodes to mapper methods by "namespace.statementId" key
    fn link_mappers_to_sql(&mut self) {
        for method_key in self.pool.method_keys() {
            let full_class_name = match method_key.rfind('.') {
                Some(idx) => method_key[..idx].to_string(),
                None => continue,
            };

            let class_is_mapper = self
                .pool
                .get_class(&full_class_name)
                .map(|id| self.pool.node(id).is_mapper())
                .unwrap_or(false);
            if !class_is_mapper {
                continue;
            }

            let method_id = match self.pool.get_method(&method_key) {
                Some(id) => id,
                None => continue,
            };
            let method_name = self.pool.node(method_id).method.clone();

            if let Some(sql_id) = self.pool.get_sql(&full_class_name, &method_name) {
                self.pool.add_child(method_id, sql_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::java::JavaParser;
    use crate::core::mapper_xml::parse_mapper_xml;
    use crate::core::model::NodeKind;

    fn build_pool(sources: &[&str], xmls: &[&str]) -> ComponentPool {
        let parser = JavaParser::new();
        let mut pool = ComponentPool::new();
        for source in sources {
            let class = parser.parse(source).unwrap();
            pool.add_java_class(&class, "test.java");
        }
        for xml in xmls {
            let mapper = parse_mapper_xml(xml).unwrap();
            pool.add_mapper_xml(&mapper, "test.xml");
        }
        pool
    }

    #[test]
    fn identifier_validation() {
        assert!(is_valid_java_identifier("userService"));
        assert!(is_valid_java_identifier("_private"));
        assert!(is_valid_java_identifier("$gen"));
        assert!(!is_valid_java_identifier("if (user"));
        assert!(!is_valid_java_identifier("9lives"));
        assert!(!is_valid_java_identifier(""));
    }

    #[test]
    fn invalid_token_catches_keywords_and_glued_prefixes() {
        assert!(is_invalid_token("if"));
        assert!(is_invalid_token("Return"));
        assert!(is_invalid_token("new"));
        // prefix followed by a non-letter
        assert!(is_invalid_token("if2"));
        // prefix followed by a letter is a legitimate name
        assert!(!is_invalid_token("iterate"));
        assert!(!is_invalid_token("forecast"));
        assert!(!is_invalid_token("newsletterService"));
        // exception and error constructors
        assert!(is_invalid_token("NotFoundException"));
        assert!(is_invalid_token("OutOfMemoryError"));
    }

    #[test]
    fn constructor_receivers_are_noise() {
        assert!(is_constructor_call("ModelAndView"));
        assert!(is_constructor_call("ResponseEntity"));
        assert!(is_constructor_call("HashMap"));
        assert!(is_constructor_call("SimpleDateFormat"));
        assert!(!is_constructor_call("UserService"));
        assert!(!is_constructor_call("ProductMapper"));
    }

    #[test]
    fn data_class_packages() {
        assert!(is_data_class("com.company.dto.UserInfo"));
        assert!(is_data_class("com.company.model.Order"));
        assert!(is_data_class("com.company.domain.Account"));
        assert!(!is_data_class("com.company.service.UserService"));
        assert!(!is_data_class(""));
    }

    #[test]
    fn capitalized_receiver_produces_both_interpretations() {
        let calls = find_method_calls("StringUtil.isEmpty(name);");
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().any(|c| !c.is_static));
        assert!(calls.iter().any(|c| c.is_static));

        let lower = find_method_calls("userService.findUser(id);");
        assert_eq!(lower.len(), 1);
        assert!(!lower[0].is_static);
    }

    #[test]
    fn noise_is_filtered_from_controller_bodies() {
        let controller = r#"
package com.test;
@Controller
public class TestController {
    @Autowired
    private UserService userService;

    public String testMethod(User user) {
        if (user != null) {
            ModelAndView mav = new ModelAndView("home");
            String r = userService.processUser(user);
            System.out.println("x");
            return r;
        }
        return null;
    }
}
"#;
        let service = r#"
package com.test;
@Service
public class UserService {
    public String processUser(User user) { return user.getName(); }
}
"#;
        let mut pool = build_pool(&[controller, service], &[]);
        Linker::new(&mut pool).link();

        let method_id = pool.get_method("com.test.TestController.testMethod").unwrap();
        let children = &pool.node(method_id).children;

        assert_eq!(children.len(), 1, "expected exactly one edge, got {:?}",
            children.iter().map(|&c| pool.node(c).id.clone()).collect::<Vec<_>>());
        let child = pool.node(children[0]);
        assert_eq!(child.method, "processUser");
        assert_eq!(child.kind, NodeKind::Service);
    }

    #[test]
    fn legacy_chain_links_controller_to_sql() {
        let controller = r#"
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
        let service = r#"
package com.company.legacy;
@Service
public class UserService {
    @Autowired
    private UserMapper userMapper;

    public UserVO authenticateUser(HttpServletRequest request) {
        return userMapper.selectUserByCredentials(request);
    }
}
"#;
        let mapper = r#"
package com.company.legacy;
@Mapper
public interface UserMapper {
    UserVO selectUserByCredentials(HttpServletRequest request);
}
"#;
        let xml = r#"<mapper namespace="com.company.legacy.UserMapper">
    <select id="selectUserByCredentials">SELECT * FROM tb_user WHERE id = #{userId}</select>
</mapper>"#;

        let mut pool = build_pool(&[controller, service, mapper], &[xml]);
        Linker::new(&mut pool).link();

        let login = pool.get_method("com.company.legacy.UserController.login").unwrap();
        let login_children = &pool.node(login).children;
        assert!(login_children
            .iter()
            .any(|&c| pool.node(c).id.contains("UserService.authenticateUser")));

        let auth = pool
            .get_method("com.company.legacy.UserService.authenticateUser")
            .unwrap();
        assert!(pool
            .node(auth)
            .children
            .iter()
            .any(|&c| pool.node(c).id.contains("UserMapper.selectUserByCredentials")));

        let select = pool
            .get_method("com.company.legacy.UserMapper.selectUserByCredentials")
            .unwrap();
        let sql_child = pool
            .node(select)
            .children
            .iter()
            .map(|&c| pool.node(c))
            .find(|n| n.kind == NodeKind::Sql)
            .expect("mapper method should link to its SQL node");
        assert_eq!(sql_child.id, "com.company.legacy.UserMapper.selectUserByCredentials");
    }

    #[test]
    fn return_type_constructor_is_dropped() {
        let controller = r#"
package com.test;
@Controller
public class PageController {
    public CustomPage render() {
        return CustomPage.create("home");
    }
}
"#;
        let page = r#"
package com.test;
public class CustomPage {
    public static CustomPage create(String name) { return null; }
}
"#;
        let mut pool = build_pool(&[controller, page], &[]);
        Linker::new(&mut pool).link();

        let render = pool.get_method("com.test.PageController.render").unwrap();
        assert!(pool.node(render).children.is_empty());
    }

    #[test]
    fn unresolvable_receivers_produce_no_edges() {
        let controller = r#"
package com.test;
@Controller
public class LoneController {
    public String act() {
        return ghostService.doWork();
    }
}
"#;
        let mut pool = build_pool(&[controller], &[]);
        Linker::new(&mut pool).link();

        let act = pool.get_method("com.test.LoneController.act").unwrap();
        assert!(pool.node(act).children.is_empty());
    }
}
