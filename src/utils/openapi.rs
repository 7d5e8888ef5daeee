//! Builder for the per-module OpenAPI fragments merged by the HTTP layer.

use serde_json::{json, Map, Value};
use utoipa::ToSchema;

/// Request or response payload of an operation.
#[derive(Debug, Clone, Copy)]
pub enum Body {
    Empty,
    Json(&'static str),
    JsonList(&'static str),
    /// A `{items, total, page, per_page}` page of the named schema
    Paged(&'static str),
    Raw(&'static str),
}

impl Body {
    fn content(self) -> Option<Value> {
        let (content_type, schema) = match self {
            Body::Empty => return None,
            Body::Json(name) => ("application/json", schema_ref(name)),
            Body::JsonList(name) => (
                "application/json",
                json!({"type": "array", "items": schema_ref(name)}),
            ),
            Body::Paged(name) => (
                "application/json",
                json!({
                    "type": "object",
                    "properties": {
                        "items": {"type": "array", "items": schema_ref(name)},
                        "total": {"type": "integer"},
                        "page": {"type": "integer"},
                        "per_page": {"type": "integer"}
                    },
                    "required": ["items", "total", "page", "per_page"]
                }),
            ),
            Body::Raw(content_type) => (
                content_type,
                json!({"type": "string", "format": "binary"}),
            ),
        };
        Some(json!({ content_type: { "schema": schema } }))
    }
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema_ref("ErrorResponse") }
        }
    })
}

pub struct ApiDoc {
    tag: &'static str,
    paths: Map<String, Value>,
    schemas: Map<String, Value>,
}

impl ApiDoc {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            paths: Map::new(),
            schemas: Map::new(),
        }
    }

    /// Register `T` and every schema it references.
    pub fn schema<T: ToSchema>(mut self) -> Self {
        let mut nested = Vec::new();
        T::schemas(&mut nested);
        for (name, schema) in nested {
            self.schemas
                .insert(name, serde_json::to_value(schema).unwrap_or_default());
        }
        self.schemas.insert(
            T::name().into_owned(),
            serde_json::to_value(T::schema()).unwrap_or_default(),
        );
        self
    }

    pub fn public(self, method: &str, path: &str, summary: &str, request: Body, response: Body) -> Self {
        self.operation(method, path, summary, request, response, false)
    }

    pub fn secured(self, method: &str, path: &str, summary: &str, request: Body, response: Body) -> Self {
        self.operation(method, path, summary, request, response, true)
    }

    fn operation(
        mut self,
        method: &str,
        path: &str,
        summary: &str,
        request: Body,
        response: Body,
        secured: bool,
    ) -> Self {
        let mut success = json!({ "description": "OK" });
        if let Some(content) = response.content() {
            success["content"] = content;
        }

        let mut responses = json!({
            "200": success,
            "422": error_response("Validation error"),
            "500": error_response("Internal server error")
        });
        if path.contains('{') {
            responses["404"] = error_response("Not found");
        }
        if secured {
            responses["401"] = error_response("Missing or invalid token");
            responses["403"] = error_response("Insufficient permissions");
        }

        let mut operation = json!({
            "summary": summary,
            "tags": [self.tag],
            "responses": responses
        });

        let parameters = path_parameters(path);
        if !parameters.is_empty() {
            operation["parameters"] = Value::Array(parameters);
        }
        if let Some(content) = request.content() {
            operation["requestBody"] = json!({ "required": true, "content": content });
        }
        if secured {
            operation["security"] = json!([{ "bearer": [] }]);
        }

        let item = self
            .paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        item[method] = operation;
        self
    }

    pub fn build(self) -> Value {
        json!({
            "paths": self.paths,
            "components": { "schemas": self.schemas }
        })
    }
}

fn path_parameters(path: &str) -> Vec<Value> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, utoipa::ToSchema)]
    struct Widget {
        name: String,
    }

    #[test]
    fn builds_paths_with_parameters_and_schemas() {
        let doc = ApiDoc::new("Widgets")
            .schema::<Widget>()
            .public("get", "/", "List widgets", Body::Empty, Body::Paged("Widget"))
            .secured("delete", "/{id}", "Delete widget", Body::Empty, Body::Empty)
            .build();

        assert!(doc["components"]["schemas"]["Widget"].is_object());
        assert_eq!(doc["paths"]["/{id}"]["delete"]["parameters"][0]["name"], "id");
        assert!(doc["paths"]["/{id}"]["delete"]["responses"]["401"].is_object());
        assert!(doc["paths"]["/"]["get"].get("security").is_none());
    }
}
