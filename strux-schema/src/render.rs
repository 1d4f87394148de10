//! JSON-schema rendering.
//!
//! Providers that support tool definitions or structured response formats
//! want a JSON-schema view of the descriptor. The rendering is deliberately
//! plain: `type`, `properties`, `required`, `items`, `anyOf`, and `nullable`
//! for optionals.

use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::field::{FieldKind, FieldSpec, SchemaDescriptor};

/// Render a descriptor as a JSON schema object.
#[must_use]
pub fn to_json_schema(schema: &SchemaDescriptor) -> JsonValue {
    let mut rendered = match schema.fields() {
        Some(fields) => render_object(fields),
        None => {
            let item = schema
                .item_spec()
                .expect("schema root is either an object or a collection");
            json!({
                "type": "array",
                "items": render_spec(item),
            })
        }
    };
    if let Some(description) = &schema.description {
        rendered["description"] = json!(description);
    }
    rendered["title"] = json!(schema.name);
    rendered
}

fn render_object(fields: &indexmap::IndexMap<String, FieldSpec>) -> JsonValue {
    let mut properties = JsonMap::new();
    let mut required = Vec::new();
    for (name, spec) in fields {
        properties.insert(name.clone(), render_spec(spec));
        if !spec.is_optional() {
            required.push(JsonValue::from(name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn render_spec(spec: &FieldSpec) -> JsonValue {
    let mut rendered = match &spec.kind {
        FieldKind::Scalar(scalar) => json!({"type": scalar.type_name()}),
        FieldKind::Object(descriptor) => match descriptor.fields() {
            Some(fields) => render_object(fields),
            None => {
                let item = descriptor
                    .item_spec()
                    .expect("schema root is either an object or a collection");
                json!({"type": "array", "items": render_spec(item)})
            }
        },
        FieldKind::List(item) => json!({
            "type": "array",
            "items": render_spec(item),
        }),
        FieldKind::Union(variants) => json!({
            "anyOf": variants.iter().map(render_spec).collect::<Vec<_>>(),
        }),
        FieldKind::Optional(inner) => {
            let mut rendered = render_spec(inner);
            rendered["nullable"] = json!(true);
            return with_description(rendered, spec);
        }
    };
    if let Some(description) = &spec.description {
        rendered["description"] = json!(description);
    }
    rendered
}

fn with_description(mut rendered: JsonValue, spec: &FieldSpec) -> JsonValue {
    if let Some(description) = &spec.description {
        rendered["description"] = json!(description);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_object_schema_rendering() {
        let schema = SchemaDescriptor::object("Person")
            .describe("A person record")
            .field("name", FieldSpec::string().describe("Full name"))
            .field("age", FieldSpec::integer())
            .field("email", FieldSpec::optional(FieldSpec::string()))
            .build();

        let rendered = to_json_schema(&schema);
        assert_eq!(rendered["title"], "Person");
        assert_eq!(rendered["description"], "A person record");
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["properties"]["name"]["type"], "string");
        assert_eq!(rendered["properties"]["name"]["description"], "Full name");
        assert_eq!(rendered["properties"]["email"]["nullable"], true);
        assert_eq!(rendered["required"], json!(["name", "age"]));
        assert_eq!(rendered["additionalProperties"], false);
    }

    #[test]
    fn test_collection_root_rendering() {
        let item = SchemaDescriptor::object("Item")
            .field("id", FieldSpec::integer())
            .build();
        let schema = SchemaDescriptor::list_of("Items", FieldSpec::object(item));

        let rendered = to_json_schema(&schema);
        assert_eq!(rendered["type"], "array");
        assert_eq!(rendered["items"]["type"], "object");
        assert_eq!(rendered["items"]["properties"]["id"]["type"], "integer");
    }

    #[test]
    fn test_union_renders_any_of() {
        let schema = SchemaDescriptor::object("Doc")
            .field(
                "value",
                FieldSpec::union(vec![FieldSpec::integer(), FieldSpec::string()]),
            )
            .build();

        let rendered = to_json_schema(&schema);
        let any_of = &rendered["properties"]["value"]["anyOf"];
        assert_eq!(any_of[0]["type"], "integer");
        assert_eq!(any_of[1]["type"], "string");
    }

    #[test]
    fn test_nested_list_rendering() {
        let schema = SchemaDescriptor::object("Doc")
            .field("tags", FieldSpec::list(FieldSpec::string()))
            .build();

        let rendered = to_json_schema(&schema);
        assert_eq!(rendered["properties"]["tags"]["type"], "array");
        assert_eq!(rendered["properties"]["tags"]["items"]["type"], "string");
    }
}
