use serde::{Deserialize, Serialize};

pub const MIN_QTY: u32 = 1;
pub const MAX_QTY: u32 = 999;

/// Local-currency units (FCFA) per one foreign-currency unit (¥).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    pub const DEFAULT: ExchangeRate = ExchangeRate(100.0);
    pub const FLOOR: f64 = 1.0;

    /// Anything below the floor (non-finite input included) becomes the floor.
    pub fn new(value: f64) -> Self {
        if value.is_finite() && value >= Self::FLOOR { ExchangeRate(value) } else { ExchangeRate(Self::FLOOR) }
    }

    pub fn get(self) -> f64 { self.0 }
}

impl Default for ExchangeRate {
    fn default() -> Self { Self::DEFAULT }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub image_url: String,
    pub source_price: f64, // ¥, 2 decimals
    pub local_price: i64,  // FCFA, whole units
    pub quantity: u32,
    pub note: String,
}

impl LineItem {
    pub fn new(image_url: impl Into<String>) -> Self {
        LineItem { image_url: image_url.into(), source_price: 0.0, local_price: 0, quantity: MIN_QTY, note: String::new() }
    }

    pub fn line_total(&self) -> i64 {
        self.local_price.saturating_mul(i64::from(crate::clamp_quantity(i64::from(self.quantity))))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Pending,
    Paid,
    Ordered,
    Shipped,
    Delivered,
}

impl Status {
    pub const ALL: [Status; 5] = [Status::Pending, Status::Paid, Status::Ordered, Status::Shipped, Status::Delivered];

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "🟡 Pending",
            Status::Paid => "✅ Paid",
            Status::Ordered => "🛒 Ordered",
            Status::Shipped => "🚚 Shipped",
            Status::Delivered => "📦 Delivered",
        }
    }

    pub fn parse(raw: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.wire_name().eq_ignore_ascii_case(raw.trim()))
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Paid => "PAID",
            Status::Ordered => "ORDERED",
            Status::Shipped => "SHIPPED",
            Status::Delivered => "DELIVERED",
        }
    }
}

/// Box dimensions in centimetres.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl Dimensions {
    pub fn new(length_cm: f64, width_cm: f64, height_cm: f64) -> Self {
        Dimensions { length_cm, width_cm, height_cm }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub cartons: u32,
    pub dimensions: Dimensions,
    pub weight_kg: f64,
    pub transport_fee: Option<i64>,
    pub note: String,
}

impl Default for Shipment {
    fn default() -> Self {
        Shipment { cartons: MIN_QTY, dimensions: Dimensions::default(), weight_kg: 0.0, transport_fee: None, note: String::new() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    pub phone: String,
}

/// Settlement received through Wave.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount_received: i64,
    pub reference: String,
}

/// Everything stored for one order id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderState {
    pub client: ClientInfo,
    pub rate: ExchangeRate,
    pub shipping_fee: i64,
    pub status: Status,
    pub payment: Payment,
    pub dimensions: Dimensions,
    pub items: Vec<LineItem>,
    pub shipment: Shipment,
}

impl OrderState {
    pub fn with_images<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OrderState { items: urls.into_iter().map(LineItem::new).collect(), ..Default::default() }
    }
}
