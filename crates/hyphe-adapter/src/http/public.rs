/*
[INPUT]:  API key
[OUTPUT]: Indicative prices per crypto asset
[POS]:    HTTP layer - price snapshot endpoint
[UPDATE]: When adding new market data endpoints or changing response format
*/

use reqwest::Method;

use crate::http::{HypheClient, Result};
use crate::types::CurrencyPrices;

const PRICES_ENDPOINT: &str = "/prices";

impl HypheClient {
    /// Query current bid/ask for every tradable crypto asset
    ///
    /// GET /prices
    pub async fn prices(&self) -> Result<CurrencyPrices> {
        let builder = self.authorized_request(Method::GET, PRICES_ENDPOINT)?;
        self.send_json(builder).await
    }
}
