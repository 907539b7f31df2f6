/*
[INPUT]:  Adapter clients, command arguments, cancellation token
[OUTPUT]: Pretty JSON results for stdout
[POS]:    Command layer - one handler per subcommand
[UPDATE]: When adding subcommands or changing output shape
*/

use anyhow::{Context, Result};
use hyphe_adapter::{HypheClient, HypheWebSocket, Order, Side};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Current indicative prices
pub async fn prices(client: &HypheClient) -> Result<String> {
    let prices = client.prices().await.context("fetch prices")?;
    info!(
        currency = %prices.currency,
        assets = prices.crypto_assets.len(),
        "prices fetched"
    );
    render(&prices)
}

/// One order-book snapshot for `BASE-QUOTE`
pub async fn book_snapshot(
    ws: &HypheWebSocket,
    base: &str,
    quote: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let snapshot = ws
        .get_price_event_with_cancel(base, quote, cancel)
        .await
        .with_context(|| format!("fetch {base}-{quote} book"))?;
    render(&snapshot)
}

/// Order parameters as given on the command line
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub asset: String,
    pub side: Side,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub fiat_amount: Option<Decimal>,
    pub price: Option<Decimal>,
    pub quote_id: Option<String>,
    pub ref_id: Option<String>,
}

impl OrderRequest {
    /// Quote order when a quote id is given, market order otherwise
    pub fn build(&self) -> Order {
        let mut order = match &self.quote_id {
            Some(quote_id) => Order::quote(&self.asset, self.side, quote_id),
            None => Order::market(&self.asset, self.side),
        };
        order.currency = self.currency.clone();
        order.amount = self.amount;
        order.fiat_amount = self.fiat_amount;
        order.price = self.price;
        match &self.ref_id {
            Some(ref_id) => order.with_ref_id(ref_id),
            None => order.with_generated_ref_id(),
        }
    }
}

/// Place an order; with `dry_run` the order is rendered but not sent
pub async fn place_order(client: &HypheClient, request: &OrderRequest, dry_run: bool) -> Result<String> {
    let mut order = request.build();
    if dry_run {
        info!(ref_id = ?order.ref_id, "dry-run requested; order not sent");
        return render(&order);
    }

    client.place_order(&mut order).await.context("place order")?;
    render(&order)
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("render json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyphe_adapter::OrderType;

    fn request() -> OrderRequest {
        OrderRequest {
            asset: "BTC".into(),
            side: Side::Buy,
            currency: Some("EUR".into()),
            amount: Some(Decimal::new(25, 2)),
            fiat_amount: None,
            price: None,
            quote_id: None,
            ref_id: None,
        }
    }

    #[test]
    fn market_order_gets_generated_ref() {
        let order = request().build();
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.amount, Some(Decimal::new(25, 2)));
        assert!(order.ref_id.is_some());
    }

    #[test]
    fn quote_id_selects_quote_order() {
        let mut request = request();
        request.quote_id = Some("q-1".into());
        request.ref_id = Some("mine".into());

        let order = request.build();
        assert_eq!(order.order_type, OrderType::Quote);
        assert_eq!(order.quote_id.as_deref(), Some("q-1"));
        assert_eq!(order.ref_id.as_deref(), Some("mine"));
    }
}
