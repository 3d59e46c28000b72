//! Market sub-client: instruments, ticker, order book, channel subscriptions.
//!
//! None of these need an authenticated connection.

use crate::client::DeribitClient;
use crate::error::{SdkError, SdkResult};
use crate::rpc::{ChannelsParams, InstrumentParams, InstrumentsParams, ResponseEnvelope, RpcMethod};
use crate::shared::require_non_empty;

pub struct Market<'a> {
    pub(crate) client: &'a DeribitClient,
}

impl<'a> Market<'a> {
    /// `public/get_instruments`
    pub async fn get_instruments(
        &self,
        currency: &str,
        kind: &str,
        expired: bool,
    ) -> SdkResult<ResponseEnvelope> {
        require_non_empty("currency", currency)?;
        require_non_empty("kind", kind)?;

        let params = InstrumentsParams {
            currency: currency.to_string(),
            kind: kind.to_string(),
            expired,
        };
        self.client.request(RpcMethod::GetInstruments, &params).await
    }

    /// `public/ticker`
    pub async fn get_ticker(&self, instrument_name: &str) -> SdkResult<ResponseEnvelope> {
        require_non_empty("instrument_name", instrument_name)?;
        self.client
            .request(RpcMethod::Ticker, &InstrumentParams::new(instrument_name))
            .await
    }

    /// `public/get_order_book`
    pub async fn get_order_book(&self, instrument_name: &str) -> SdkResult<ResponseEnvelope> {
        require_non_empty("instrument_name", instrument_name)?;
        self.client
            .request(RpcMethod::GetOrderBook, &InstrumentParams::new(instrument_name))
            .await
    }

    /// `public/subscribe`. Notifications on these channels arrive as pushes
    /// and are routed to subscribers by instrument name.
    pub async fn subscribe<I, S>(&self, channels: I) -> SdkResult<ResponseEnvelope>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params = channels_params(channels)?;
        self.client.request(RpcMethod::Subscribe, &params).await
    }

    /// `public/unsubscribe`
    pub async fn unsubscribe<I, S>(&self, channels: I) -> SdkResult<ResponseEnvelope>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params = channels_params(channels)?;
        self.client.request(RpcMethod::Unsubscribe, &params).await
    }
}

fn channels_params<I, S>(channels: I) -> SdkResult<ChannelsParams>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let channels: Vec<String> = channels.into_iter().map(Into::into).collect();
    if channels.is_empty() {
        return Err(SdkError::InvalidArgument(
            "At least one channel is required".to_string(),
        ));
    }
    for channel in &channels {
        require_non_empty("channel", channel)?;
    }
    Ok(ChannelsParams { channels })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_params() {
        let params = channels_params(["ticker.BTC-PERPETUAL.raw", "book.ETH-PERPETUAL.100ms"]).unwrap();
        assert_eq!(params.channels.len(), 2);
        assert_eq!(params.channels[0], "ticker.BTC-PERPETUAL.raw");
    }

    #[test]
    fn test_channels_params_rejects_empty() {
        assert!(matches!(
            channels_params(Vec::<String>::new()),
            Err(SdkError::InvalidArgument(_))
        ));
        assert!(matches!(
            channels_params(["ticker.BTC-PERPETUAL.raw", " "]),
            Err(SdkError::InvalidArgument(_))
        ));
    }
}
