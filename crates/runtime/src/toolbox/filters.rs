//! Pure, stateless product filters.
//!
//! Filters operate on a product list the model already obtained from
//! a search call; they never re-query the index. Each returns a new
//! list preserving the relative order of the surviving records, so
//! re-applying a filter with the same bounds is a no-op.

use crate::tools::ToolError;
use catalog::Product;

/// Parse a record's decimal price string.
///
/// A malformed price is an [`ToolError::InvalidRecord`] for the whole
/// call; silently dropping the record would mask bad data.
fn parse_price(product: &Product) -> Result<f64, ToolError> {
    product.price.trim().parse().map_err(|_| {
        ToolError::InvalidRecord(format!(
            "product {}: unparseable price {:?}",
            product.product_id, product.price
        ))
    })
}

fn tags_contain(product: &Product, token: &str) -> bool {
    product.tags.to_lowercase().contains(&token.to_lowercase())
}

/// Keep products whose price lies within `[min_price, max_price]`
/// (absent bound = unconstrained side) and, when `color` is given,
/// whose tags contain the color token case-insensitively.
pub fn filter_products(
    products: Vec<Product>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    color: Option<&str>,
) -> Result<Vec<Product>, ToolError> {
    let mut kept = Vec::with_capacity(products.len());
    for product in products {
        let price = parse_price(&product)?;
        if min_price.is_some_and(|min| price < min) {
            continue;
        }
        if max_price.is_some_and(|max| price > max) {
            continue;
        }
        if let Some(color) = color
            && !tags_contain(&product, color)
        {
            continue;
        }
        kept.push(product);
    }
    Ok(kept)
}

/// Keep products whose tags contain the color token, case-insensitively.
pub fn filter_by_color(products: Vec<Product>, color: &str) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| tags_contain(p, color))
        .collect()
}

/// Keep products matching a type/category token, case-insensitively.
/// Matches the record's product_type when present, falling back to
/// tags for records that carry no type.
pub fn filter_by_type(products: Vec<Product>, product_type: &str) -> Vec<Product> {
    let token = product_type.to_lowercase();
    products
        .into_iter()
        .filter(|p| match &p.product_type {
            Some(kind) => kind.to_lowercase().contains(&token),
            None => tags_contain(p, product_type),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, price: &str, tags: &str, product_type: Option<&str>) -> Product {
        Product {
            product_id: id,
            title: format!("Product {id}"),
            vendor: "Vendor".into(),
            price: price.into(),
            tags: tags.into(),
            product_type: product_type.map(Into::into),
            description: String::new(),
            url: format!("https://shop.example.com/products/p{id}"),
        }
    }

    #[test]
    fn price_band_keeps_order() {
        let products = vec![
            product(1, "10", "", None),
            product(2, "25", "", None),
            product(3, "60", "", None),
            product(4, "49.99", "", None),
        ];
        let kept = filter_products(products, Some(20.0), Some(50.0), None).unwrap();
        let ids: Vec<_> = kept.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn absent_bound_is_unconstrained() {
        let products = vec![product(1, "10", "", None), product(2, "500", "", None)];
        let kept = filter_products(products.clone(), None, None, None).unwrap();
        assert_eq!(kept.len(), 2);

        let kept = filter_products(products, Some(100.0), None, None).unwrap();
        assert_eq!(kept[0].product_id, 2);
    }

    #[test]
    fn malformed_price_fails_the_call() {
        let products = vec![product(1, "free!", "", None)];
        let result = filter_products(products, Some(1.0), None, None);
        assert!(matches!(result, Err(ToolError::InvalidRecord(_))));
    }

    #[test]
    fn color_match_is_case_insensitive_substring() {
        let products = vec![
            product(1, "10", "Red, running", None),
            product(2, "10", "blue, casual", None),
        ];
        let kept = filter_by_color(products, "RED");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].product_id, 1);
    }

    #[test]
    fn filters_are_idempotent() {
        let products = vec![
            product(1, "30", "red", None),
            product(2, "40", "red", None),
            product(3, "90", "red", None),
        ];
        let once = filter_products(products, Some(20.0), Some(50.0), Some("red")).unwrap();
        let twice = filter_products(once.clone(), Some(20.0), Some(50.0), Some("red")).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn type_filter_prefers_declared_type_over_tags() {
        let products = vec![
            product(1, "10", "shoes", Some("Jackets")),
            product(2, "10", "warm", Some("Shoes")),
            product(3, "10", "trail shoes", None),
        ];
        let kept = filter_by_type(products, "shoes");
        let ids: Vec<_> = kept.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
