//! Revenue/quantity aggregation for order-style track events.

use adtag_core::types::{numeric, Properties};

/// Totals carried on a track pixel request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSummary {
    pub sale_amount: f64,
    pub order_quantity: u64,
}

impl OrderSummary {
    pub const ZERO: OrderSummary = OrderSummary {
        sale_amount: 0.0,
        order_quantity: 0,
    };
}

/// Compute the totals for a track event's properties.
///
/// `revenue` wins over `total`; a non-numeric value falls through to the
/// next candidate, and both absent means 0. Quantity is summed over
/// `products`, counting an item with a missing or non-numeric `quantity`
/// as 1; without a products list it is 0.
pub fn summarize(properties: &Properties) -> OrderSummary {
    let sale_amount = properties
        .get("revenue")
        .and_then(numeric)
        .or_else(|| properties.get("total").and_then(numeric))
        .unwrap_or(0.0);

    let order_quantity = match properties.get("products").and_then(|p| p.as_array()) {
        Some(products) => products
            .iter()
            .map(|item| item.get("quantity").and_then(numeric).unwrap_or(1.0))
            .sum::<f64>() as u64,
        None => 0,
    };

    OrderSummary {
        sale_amount,
        order_quantity,
    }
}
