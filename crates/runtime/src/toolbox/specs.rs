//! Tool specifications exposed to the model.

use crate::model::ToolSpec;
use serde_json::json;

fn spec(name: &str, description: &str, schema: serde_json::Value) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        description: description.to_string(),
        schema,
    }
}

fn products_param() -> serde_json::Value {
    json!({
        "type": "array",
        "description": "array of product records from a previous search",
        "items": { "type": "object" }
    })
}

/// The full, fixed tool list. Built once at toolbox construction.
pub fn all() -> Vec<ToolSpec> {
    vec![
        spec(
            "search_products",
            "Semantic product search. Returns products matching a natural-language \
             query, ranked by similarity, each with id, title, vendor, price, tags, \
             description and url.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural language description of the desired product"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of products to return (default 5)"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        ),
        spec(
            "filter_products",
            "Filter an already-retrieved product list by price range and/or color. \
             Use after search_products to narrow results by budget or color.",
            json!({
                "type": "object",
                "properties": {
                    "products": products_param(),
                    "min_price": { "type": "number", "description": "Minimum acceptable price" },
                    "max_price": { "type": "number", "description": "Maximum acceptable price" },
                    "color": { "type": "string", "description": "Desired color, matched against tags" }
                },
                "required": ["products"],
                "additionalProperties": false
            }),
        ),
        spec(
            "filter_by_color",
            "Keep only products of a given color (matched against tags).",
            json!({
                "type": "object",
                "properties": {
                    "products": products_param(),
                    "color": { "type": "string", "description": "Desired color, e.g. red, blue, black" }
                },
                "required": ["products", "color"],
                "additionalProperties": false
            }),
        ),
        spec(
            "filter_by_type",
            "Keep only products of a given type or category, e.g. shoes or jackets.",
            json!({
                "type": "object",
                "properties": {
                    "products": products_param(),
                    "product_type": { "type": "string", "description": "Desired product category" }
                },
                "required": ["products", "product_type"],
                "additionalProperties": false
            }),
        ),
        spec(
            "get_product_details",
            "Retrieve full details for one product by id.",
            json!({
                "type": "object",
                "properties": {
                    "product_id": { "type": "integer", "description": "Product id" }
                },
                "required": ["product_id"],
                "additionalProperties": false
            }),
        ),
        spec(
            "compare_products",
            "Compare several products side by side by id. Missing products are \
             reported per item rather than failing the comparison.",
            json!({
                "type": "object",
                "properties": {
                    "product_ids": {
                        "type": "array",
                        "items": { "type": "integer" },
                        "description": "Ids of the products to compare"
                    }
                },
                "required": ["product_ids"],
                "additionalProperties": false
            }),
        ),
        spec(
            "add_to_cart",
            "Add a product to the shopping cart.",
            json!({
                "type": "object",
                "properties": {
                    "product_id": { "type": "integer", "description": "Product id" },
                    "quantity": { "type": "integer", "description": "Units to add (default 1)" }
                },
                "required": ["product_id"],
                "additionalProperties": false
            }),
        ),
        spec(
            "view_cart",
            "View the current contents of the shopping cart.",
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        ),
        spec(
            "checkout_cart",
            "Check out: snapshot the cart and return the checkout link.",
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tool_names_are_unique() {
        let specs = all();
        let names: HashSet<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn every_schema_rejects_unknown_fields() {
        for spec in all() {
            assert_eq!(
                spec.schema["additionalProperties"],
                serde_json::json!(false),
                "{} schema must close its property set",
                spec.name
            );
        }
    }
}
