//! The shopping tool registry.
//!
//! [`ShopToolbox`] owns explicitly injected handles to the embedding
//! provider and the vector index (never ambient globals) and exposes
//! the fixed tool set to the conversation loop through [`ToolHost`].
//! Dispatch is a closed match on tool name; every tool decodes its
//! arguments against a closed schema before running.

mod args;
mod cart;
mod filters;
mod specs;

pub use cart::CartLine;

use crate::model::{ToolCall, ToolSpec};
use crate::tools::{ToolError, ToolHost};
use args::{
    AddToCartArgs, ColorArgs, CompareArgs, DetailArgs, EmptyArgs, FilterArgs, SearchArgs,
    TypeArgs, decode,
};
use cart::Cart;
use catalog::{Embedder, Product, VectorIndex};
use serde::Serialize;
use serde_json::{Value, json};

/// Hard cap on the search result limit; the schema declares no upper
/// bound, so the host enforces one.
const MAX_SEARCH_LIMIT: usize = 25;

/// The fixed shopping tool set, backed by injected catalog clients.
pub struct ShopToolbox<E, I> {
    embedder: E,
    index: I,
    store_base_url: String,
    specs: Vec<ToolSpec>,
    cart: Cart,
}

impl<E: Embedder, I: VectorIndex> ShopToolbox<E, I> {
    /// Create a toolbox over the given service handles.
    /// `store_base_url` is the store host used to derive product and
    /// checkout URLs, e.g. `cool-shoes.myshopify.com`.
    pub fn new(embedder: E, index: I, store_base_url: impl Into<String>) -> Self {
        Self {
            embedder,
            index,
            store_base_url: store_base_url.into(),
            specs: specs::all(),
            cart: Cart::default(),
        }
    }

    async fn search(&self, args: SearchArgs) -> Result<Value, ToolError> {
        let limit = args.limit.clamp(1, MAX_SEARCH_LIMIT);
        let vector = self
            .embedder
            .embed(&args.query)
            .await
            .map_err(|e| ToolError::Execution(format!("embedding failed: {e}")))?;
        let hits = self
            .index
            .query(&vector, limit)
            .await
            .map_err(|e| ToolError::Execution(format!("index query failed: {e}")))?;

        let products: Vec<Product> = hits
            .into_iter()
            .map(|hit| Product::from_payload(hit.id, hit.payload, &self.store_base_url))
            .collect();
        to_json(&products)
    }

    async fn details(&self, product_id: u64) -> Result<Value, ToolError> {
        let points = self
            .index
            .retrieve(&[product_id])
            .await
            .map_err(|e| ToolError::Execution(format!("index retrieve failed: {e}")))?;
        let point = points
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::NotFound(format!("product {product_id}")))?;
        to_json(&Product::from_payload(
            point.id,
            point.payload,
            &self.store_base_url,
        ))
    }

    async fn compare(&self, args: CompareArgs) -> Result<Value, ToolError> {
        let mut comparison = Vec::with_capacity(args.product_ids.len());
        for product_id in args.product_ids {
            match self.details(product_id).await {
                Ok(product) => comparison.push(product),
                // Missing products get a per-item placeholder; only an
                // external-service failure aborts the comparison.
                Err(ToolError::NotFound(_)) => comparison.push(json!({
                    "product_id": product_id,
                    "error": "not found",
                })),
                Err(e) => return Err(e),
            }
        }
        Ok(json!({ "comparison": comparison }))
    }

    fn add_to_cart(&self, args: AddToCartArgs) -> Value {
        let items = self.cart.add(args.product_id, args.quantity);
        json!({
            "status": "added",
            "product_id": args.product_id,
            "quantity": args.quantity,
            "items": items,
        })
    }

    fn view_cart(&self) -> Value {
        json!({ "items": self.cart.lines() })
    }

    fn checkout_cart(&self) -> Value {
        let items = self.cart.checkout();
        json!({
            "checkout_url": format!("https://{}/checkout", self.store_base_url),
            "items": items,
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Execution(e.to_string()))
}

impl<E: Embedder, I: VectorIndex> ToolHost for ShopToolbox<E, I> {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        match call.name.as_str() {
            "search_products" => self.search(decode(&call.input)?).await,
            "filter_products" => {
                let args: FilterArgs = decode(&call.input)?;
                let kept = filters::filter_products(
                    args.products,
                    args.min_price,
                    args.max_price,
                    args.color.as_deref(),
                )?;
                to_json(&kept)
            }
            "filter_by_color" => {
                let args: ColorArgs = decode(&call.input)?;
                to_json(&filters::filter_by_color(args.products, &args.color))
            }
            "filter_by_type" => {
                let args: TypeArgs = decode(&call.input)?;
                to_json(&filters::filter_by_type(args.products, &args.product_type))
            }
            "get_product_details" => {
                let args: DetailArgs = decode(&call.input)?;
                self.details(args.product_id).await
            }
            "compare_products" => self.compare(decode(&call.input)?).await,
            "add_to_cart" => Ok(self.add_to_cart(decode(&call.input)?)),
            "view_cart" => {
                let EmptyArgs {} = decode(&call.input)?;
                Ok(self.view_cart())
            }
            "checkout_cart" => {
                let EmptyArgs {} = decode(&call.input)?;
                Ok(self.checkout_cart())
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}
