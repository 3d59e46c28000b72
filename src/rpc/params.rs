//! Request parameter objects, one per method family.

use serde::{Deserialize, Serialize};

/// Order type sent with every placement. Only limit orders are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Limit,
}

/// `public/get_instruments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentsParams {
    pub currency: String,
    pub kind: String,
    pub expired: bool,
}

/// `public/ticker`, `public/get_order_book`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentParams {
    pub instrument_name: String,
}

impl InstrumentParams {
    pub fn new(instrument_name: impl Into<String>) -> Self {
        Self {
            instrument_name: instrument_name.into(),
        }
    }
}

/// `private/buy`, `private/sell`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderParams {
    pub instrument_name: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: f64,
}

impl OrderParams {
    pub fn limit(instrument_name: impl Into<String>, amount: f64, price: f64) -> Self {
        Self {
            instrument_name: instrument_name.into(),
            amount,
            order_type: OrderType::Limit,
            price,
        }
    }
}

/// `private/cancel`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelParams {
    pub order_id: String,
}

/// `private/edit`
///
/// The exchange reads the size from either `new_amount` or `contracts`, so
/// both always carry the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditParams {
    pub order_id: String,
    pub new_price: f64,
    pub new_amount: f64,
    pub contracts: f64,
}

impl EditParams {
    pub fn new(order_id: impl Into<String>, new_price: f64, new_amount: f64) -> Self {
        Self {
            order_id: order_id.into(),
            new_price,
            new_amount,
            contracts: new_amount,
        }
    }
}

/// `private/get_open_orders_by_currency`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyParams {
    pub currency: String,
}

/// `public/subscribe`, `public/unsubscribe`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelsParams {
    pub channels: Vec<String>,
}

/// Methods without parameters still send `"params": {}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyParams {}
