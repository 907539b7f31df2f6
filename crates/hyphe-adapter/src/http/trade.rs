/*
[INPUT]:  Order payloads and API key
[OUTPUT]: Orders updated with venue-assigned id and status
[POS]:    HTTP layer - trading endpoints (require bearer auth)
[UPDATE]: When adding new trading endpoints or changing order flow
*/

use serde_json::Value;
use tracing::info;

use crate::http::{HypheClient, Result};
use crate::types::Order;

const ORDER_ENDPOINT: &str = "/orders";

impl HypheClient {
    /// Place an order
    ///
    /// POST /orders
    /// Fields present in the venue's echo overwrite those of `order`; the rest
    /// are kept. On any error `order` is left untouched.
    pub async fn place_order(&self, order: &mut Order) -> Result<()> {
        let bytes = self.post(ORDER_ENDPOINT, &*order).await?;
        *order = merge_echo(order, &bytes)?;

        info!(
            order_id = order.id.as_deref().unwrap_or_default(),
            crypto_asset = %order.crypto_asset,
            side = ?order.side,
            status = ?order.status,
            "order placed"
        );
        Ok(())
    }
}

fn merge_echo(order: &Order, echo: &[u8]) -> Result<Order> {
    let echo: Value = serde_json::from_slice(echo)?;
    let merged = match (serde_json::to_value(order)?, echo) {
        (Value::Object(mut fields), Value::Object(updates)) => {
            fields.extend(updates);
            Value::Object(fields)
        }
        (_, other) => other,
    };
    Ok(serde_json::from_value(merged)?)
}
