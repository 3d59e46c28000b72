//! Orders sub-client: place, cancel, modify, positions, open orders.
//!
//! Every call checks the auth flag first and fails with
//! [`SdkError::AuthRequired`] without touching the transport. Arguments are
//! validated next, also before any I/O. Responses are returned verbatim;
//! trading error codes are for the caller to interpret.

use crate::client::DeribitClient;
use crate::error::SdkResult;
use crate::rpc::{
    CancelParams, CurrencyParams, EditParams, EmptyParams, OrderParams, ResponseEnvelope,
    RpcMethod,
};
use crate::shared::{require_finite, require_non_empty, require_positive, Side};

pub struct Orders<'a> {
    pub(crate) client: &'a DeribitClient,
}

impl<'a> Orders<'a> {
    /// Limit buy via `private/buy`.
    pub async fn place_buy_order(
        &self,
        instrument_name: &str,
        amount: f64,
        price: f64,
    ) -> SdkResult<ResponseEnvelope> {
        self.place(Side::Buy, instrument_name, amount, price).await
    }

    /// Limit sell via `private/sell`.
    pub async fn place_sell_order(
        &self,
        instrument_name: &str,
        amount: f64,
        price: f64,
    ) -> SdkResult<ResponseEnvelope> {
        self.place(Side::Sell, instrument_name, amount, price).await
    }

    /// Limit order with the side given as text (`"buy"` or `"sell"`, any case).
    pub async fn place_order(
        &self,
        instrument_name: &str,
        amount: f64,
        price: f64,
        side: &str,
    ) -> SdkResult<ResponseEnvelope> {
        self.client.ensure_authenticated()?;
        let side: Side = side.parse()?;
        self.place(side, instrument_name, amount, price).await
    }

    async fn place(
        &self,
        side: Side,
        instrument_name: &str,
        amount: f64,
        price: f64,
    ) -> SdkResult<ResponseEnvelope> {
        self.client.ensure_authenticated()?;
        require_non_empty("instrument_name", instrument_name)?;
        require_positive("amount", amount)?;
        require_finite("price", price)?;

        let method = match side {
            Side::Buy => RpcMethod::Buy,
            Side::Sell => RpcMethod::Sell,
        };
        tracing::info!("Placing {} {} {} @ {}", side, amount, instrument_name, price);
        self.client
            .request(method, &OrderParams::limit(instrument_name, amount, price))
            .await
    }

    /// `private/cancel`
    pub async fn cancel_order(&self, order_id: &str) -> SdkResult<ResponseEnvelope> {
        self.client.ensure_authenticated()?;
        require_non_empty("order_id", order_id)?;

        let params = CancelParams {
            order_id: order_id.to_string(),
        };
        self.client.request(RpcMethod::Cancel, &params).await
    }

    /// `private/edit`. The new amount is sent as both `new_amount` and
    /// `contracts`.
    pub async fn modify_order(
        &self,
        order_id: &str,
        new_price: f64,
        new_amount: f64,
    ) -> SdkResult<ResponseEnvelope> {
        self.client.ensure_authenticated()?;
        require_non_empty("order_id", order_id)?;
        require_finite("new_price", new_price)?;
        require_positive("new_amount", new_amount)?;

        self.client
            .request(RpcMethod::Edit, &EditParams::new(order_id, new_price, new_amount))
            .await
    }

    /// `private/get_positions`
    pub async fn get_positions(&self) -> SdkResult<ResponseEnvelope> {
        self.client.ensure_authenticated()?;
        self.client
            .request(RpcMethod::GetPositions, &EmptyParams::default())
            .await
    }

    /// `private/get_open_orders_by_currency`
    pub async fn view_open_orders(&self, currency: &str) -> SdkResult<ResponseEnvelope> {
        self.client.ensure_authenticated()?;
        require_non_empty("currency", currency)?;

        let params = CurrencyParams {
            currency: currency.to_string(),
        };
        self.client
            .request(RpcMethod::GetOpenOrdersByCurrency, &params)
            .await
    }
}
