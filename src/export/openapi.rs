use serde_json::{json, Map, Value};
use std::path::PathBuf;

use crate::config::Config;
use crate::core::{ComponentPool, EndpointDef, ParamDef, ParamLocation, Summary};
use crate::error::Result;

/// Emits an OpenAPI 3.0 JSON document from the extracted endpoint list.
///
/// The nested response schema is rebuilt from the flattened depth-labelled
/// field list: depth 0 is the root object, each item attaches to the last
/// schema seen one level up, and array-typed parents attach children under
/// `items`.
pub struct OpenApiExporter;

impl super::Exporter for OpenApiExporter {
    fn format_name(&self) -> &'static str {
        "openapi"
    }

    fn export(
        &self,
        _summary: &Summary,
        _pool: &ComponentPool,
        endpoints: &[EndpointDef],
        config: &Config,
    ) -> Result<PathBuf> {
        let document = build_document(endpoints);

        let output_path = config.output.dir.join("openapi.json");
        let file = std::fs::File::create(&output_path)?;
        serde_json::to_writer_pretty(file, &document)?;

        Ok(output_path)
    }
}

pub fn build_document(endpoints: &[EndpointDef]) -> Value {
    let mut paths = Map::new();

    for endpoint in endpoints {
        if endpoint.path.is_empty() {
            continue;
        }

        let full_path = if endpoint.path.starts_with('/') {
            endpoint.path.clone()
        } else {
            format!("/{}", endpoint.path)
        };

        let method = if endpoint.method.is_empty() {
            "get".to_string()
        } else {
            endpoint.method.to_lowercase()
        };

        let operation = build_operation(endpoint);

        paths
            .entry(full_path)
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .expect("path item is always an object")
            .insert(method, operation);
    }

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Spec Recon API",
            "version": "1.0.0"
        },
        "paths": Value::Object(paths)
    })
}

fn build_operation(endpoint: &EndpointDef) -> Value {
    let mut operation = Map::new();

    let summary = if endpoint.summary.is_empty() {
        endpoint.method_name.clone()
    } else {
        endpoint.summary.clone()
    };
    operation.insert("summary".to_string(), json!(summary));

    if !endpoint.description.is_empty() {
        operation.insert("description".to_string(), json!(endpoint.description));
    }

    operation.insert(
        "operationId".to_string(),
        json!(format!("{}_{}", endpoint.controller_name, endpoint.method_name)),
    );

    let mut parameters = Vec::new();
    for param in &endpoint.params {
        if param.location == ParamLocation::Body {
            let schema = if param.fields.is_empty() {
                json!({
                    "type": map_type(&param.type_name),
                    "description": param.description
                })
            } else {
                build_complex_schema(&param.fields)
            };

            operation.insert(
                "requestBody".to_string(),
                json!({
                    "content": { "application/json": { "schema": schema } },
                    "required": param.required
                }),
            );
        } else {
            let in_type = match param.location {
                ParamLocation::Path => "path",
                ParamLocation::Header => "header",
                _ => "query",
            };
            parameters.push(json!({
                "name": param.name,
                "in": in_type,
                "required": param.required,
                "schema": { "type": map_type(&param.type_name) },
                "description": param.description
            }));
        }
    }
    if !parameters.is_empty() {
        operation.insert("parameters".to_string(), Value::Array(parameters));
    }

    let description = if endpoint.response.description.is_empty() {
        "Successful response".to_string()
    } else {
        endpoint.response.description.clone()
    };
    let mut response = Map::new();
    response.insert("description".to_string(), json!(description));

    if !endpoint.response.fields.is_empty() {
        response.insert(
            "content".to_string(),
            json!({ "application/json": { "schema": build_complex_schema(&endpoint.response.fields) } }),
        );
    } else if endpoint.response.type_name != "void" {
        response.insert(
            "content".to_string(),
            json!({ "application/json": { "schema": { "type": map_type(&endpoint.response.type_name) } } }),
        );
    }

    let status_code = if endpoint.response.status_code == 204 {
        "204"
    } else {
        "200"
    };
    let mut responses = Map::new();
    responses.insert(status_code.to_string(), Value::Object(response));
    operation.insert("responses".to_string(), Value::Object(responses));

    Value::Object(operation)
}

/// Rebuild a nested JSON schema from a flattened depth-labelled field list
pub fn build_complex_schema(fields: &[ParamDef]) -> Value {
    let mut root = json!({ "type": "object", "properties": {} });

    // The last schema seen at each depth is the attachment point for the
    // next deeper field. Mutating nested serde_json values by reference is
    // awkward, so each entry records (depth, key path to the node) instead.
    let mut pointers: Vec<(usize, Vec<String>)> = vec![(0, Vec::new())];

    for field in fields {
        if field.depth < 1 {
            continue;
        }

        let parent_pointer = pointers
            .iter()
            .rev()
            .find(|(depth, _)| *depth == field.depth - 1)
            .map(|(_, pointer)| pointer.clone())
            .unwrap_or_default();

        let parent = resolve_pointer(&mut root, &parent_pointer);

        let parent_is_array = parent
            .get("type")
            .and_then(Value::as_str)
            .map(|t| t == "array")
            .unwrap_or(false);

        let mut field_pointer = parent_pointer.clone();

        let target = if parent_is_array {
            // Array parents hold their children under items.properties
            let items = parent
                .as_object_mut()
                .expect("schema nodes are objects")
                .entry("items")
                .or_insert_with(|| json!({ "type": "object", "properties": {} }));
            if items.get("type").and_then(Value::as_str) != Some("object") {
                *items = json!({ "type": "object", "properties": {} });
            }
            field_pointer.push("items".to_string());
            field_pointer.push("properties".to_string());
            items
                .as_object_mut()
                .expect("items is an object")
                .entry("properties")
                .or_insert_with(|| json!({}))
        } else {
            field_pointer.push("properties".to_string());
            parent
                .as_object_mut()
                .expect("schema nodes are objects")
                .entry("properties")
                .or_insert_with(|| json!({}))
        };

        let field_type = map_type(&field.type_name);
        let mut field_schema = Map::new();
        field_schema.insert("type".to_string(), json!(field_type));
        if !field.description.is_empty() {
            field_schema.insert("description".to_string(), json!(field.description));
        }
        if field_type == "array" {
            field_schema.insert("items".to_string(), json!({ "type": "string" }));
        }

        target
            .as_object_mut()
            .expect("properties is an object")
            .insert(field.name.clone(), Value::Object(field_schema));

        field_pointer.push(field.name.clone());
        pointers.push((field.depth, field_pointer));
    }

    root
}

fn resolve_pointer<'a>(root: &'a mut Value, pointer: &[String]) -> &'a mut Value {
    let mut current = root;
    for key in pointer {
        current = current
            .as_object_mut()
            .expect("schema pointer segments are objects")
            .entry(key.clone())
            .or_insert_with(|| json!({}));
    }
    current
}

/// Map Java types onto JSON Schema primitive names
pub fn map_type(java_type: &str) -> &'static str {
    let lower = java_type.to_lowercase();

    if lower.contains("int")
        || lower.contains("long")
        || lower.contains("double")
        || lower.contains("float")
    {
        return "integer";
    }
    if lower.contains("boolean") {
        return "boolean";
    }
    if lower.contains("list") || lower.contains("set") || lower.contains("[]") {
        return "array";
    }
    if lower.contains("map")
        || lower.contains("dto")
        || lower.contains("vo")
        || lower.contains("entity")
        || lower.contains("object")
    {
        return "object";
    }
    if lower.contains("date") || lower.contains("time") {
        return "string";
    }

    "string"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ParamDef, ParamLocation, ResponseDef};

    fn sample_endpoint() -> EndpointDef {
        let mut body_param = ParamDef::field("product", "ProductDTO", 0);
        body_param.location = ParamLocation::Body;
        body_param.required = true;
        body_param.description = "ProductDTO (Data Transfer Object)".to_string();
        body_param.fields = vec![
            ParamDef::field("productId", "Long", 1),
            ParamDef::field("productName", "String", 1),
        ];

        EndpointDef {
            method: "POST".to_string(),
            path: "/api/v1/product/register".to_string(),
            controller_name: "ProductApiController".to_string(),
            method_name: "registerProduct".to_string(),
            summary: String::new(),
            description: String::new(),
            params: vec![body_param],
            response: ResponseDef {
                type_name: "ResponseEntity<ProductDTO>".to_string(),
                description: "Returns response entity".to_string(),
                status_code: 200,
                fields: vec![
                    ParamDef::field("productId", "Long", 1),
                    ParamDef::field("productName", "String", 1),
                ],
            },
        }
    }

    #[test]
    fn document_shape_for_body_endpoint() {
        let doc = build_document(&[sample_endpoint()]);

        assert_eq!(doc["openapi"], "3.0.0");

        let op = &doc["paths"]["/api/v1/product/register"]["post"];
        assert_eq!(op["operationId"], "ProductApiController_registerProduct");
        // Summary falls back to the method name
        assert_eq!(op["summary"], "registerProduct");

        let body_schema = &op["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(body_schema["type"], "object");
        assert_eq!(body_schema["properties"]["productId"]["type"], "integer");
        assert_eq!(body_schema["properties"]["productName"]["type"], "string");

        let response = &op["responses"]["200"];
        assert_eq!(response["description"], "Returns response entity");
        let response_schema = &response["content"]["application/json"]["schema"];
        assert_eq!(response_schema["properties"]["productId"]["type"], "integer");
    }

    #[test]
    fn nested_depths_attach_to_parent_properties() {
        let fields = vec![
            ParamDef::field("customer", "CustomerDTO", 1),
            ParamDef::field("name", "String", 2),
            ParamDef::field("active", "boolean", 2),
            ParamDef::field("total", "long", 1),
        ];
        let schema = build_complex_schema(&fields);

        assert_eq!(schema["properties"]["customer"]["type"], "object");
        assert_eq!(
            schema["properties"]["customer"]["properties"]["name"]["type"],
            "string"
        );
        assert_eq!(
            schema["properties"]["customer"]["properties"]["active"]["type"],
            "boolean"
        );
        assert_eq!(schema["properties"]["total"]["type"], "integer");
    }

    #[test]
    fn array_parents_attach_children_under_items() {
        let fields = vec![
            ParamDef::field("members", "List<MemberDTO>", 1),
            ParamDef::field("name", "String", 2),
        ];
        let schema = build_complex_schema(&fields);

        let members = &schema["properties"]["members"];
        assert_eq!(members["type"], "array");
        assert_eq!(members["items"]["properties"]["name"]["type"], "string");
    }

    #[test]
    fn status_204_for_void_endpoints() {
        let mut endpoint = sample_endpoint();
        endpoint.response = ResponseDef {
            type_name: "void".to_string(),
            description: "No content".to_string(),
            status_code: 204,
            fields: Vec::new(),
        };

        let doc = build_document(&[endpoint]);
        let responses = &doc["paths"]["/api/v1/product/register"]["post"]["responses"];
        assert!(responses.get("204").is_some());
        assert!(responses["204"].get("content").is_none());
    }

    #[test]
    fn type_mapping_table() {
        assert_eq!(map_type("Integer"), "integer");
        assert_eq!(map_type("long"), "integer");
        assert_eq!(map_type("boolean"), "boolean");
        assert_eq!(map_type("List<ProductDTO>"), "array");
        assert_eq!(map_type("ProductDTO"), "object");
        assert_eq!(map_type("Map<String, Object>"), "object");
        assert_eq!(map_type("Date"), "string");
        assert_eq!(map_type("String"), "string");
    }
}
