//! WhatsApp message bodies.
//!
//! Every link and every field goes on its own line: the receiving client only
//! turns a URL into a tap target when nothing else shares its line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format;
use crate::volume::ShipmentMetrics;
use crate::{summary, OrderState, Quote};

pub const MIN_PHONE_DIGITS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("add the client's WhatsApp number (e.g. 2250788655341)")]
    InvalidRecipient,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient(String);

impl Recipient {
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        let digits = normalize_phone(raw);
        if digits.len() < MIN_PHONE_DIGITS {
            return Err(MessageError::InvalidRecipient);
        }
        Ok(Recipient(digits))
    }

    pub fn digits(&self) -> &str { &self.0 }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundMessage {
    pub phone: String,
    pub text: String,
}

/// Public page links for one order.
#[derive(Debug, Clone)]
pub struct Links {
    base: String,
}

impl Links {
    pub fn new(base_url: &str) -> Self {
        Links { base: base_url.trim_end_matches('/').to_string() }
    }

    pub fn quote(&self, id: &str) -> String { format!("{}/quotes/{}", self.base, id) }
    pub fn transport(&self, id: &str) -> String { format!("{}/transport/{}", self.base, id) }
    pub fn gallery(&self, id: &str) -> String { format!("{}/u/{}", self.base, id) }
}

/// A new customer request, sent to the shop's own number.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: String,
    pub phone: String,
    pub city: String,
    #[serde(default)]
    pub details: String,
    pub gallery_id: String,
}

impl CustomerRequest {
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.name.trim().is_empty() { return Err(MessageError::MissingField("name")); }
        if self.phone.trim().is_empty() { return Err(MessageError::MissingField("phone")); }
        if self.city.trim().is_empty() { return Err(MessageError::MissingField("city")); }
        Ok(())
    }
}

pub struct Composer {
    shop_name: String,
    links: Links,
}

fn greeting(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() { "Hello 👋".to_string() } else { format!("Hello {} 👋", name) }
}

fn finish(lines: Vec<String>) -> String {
    lines.join("\n").trim().to_string()
}

impl Composer {
    pub fn new(shop_name: impl Into<String>, base_url: &str) -> Self {
        Composer { shop_name: shop_name.into(), links: Links::new(base_url) }
    }

    pub fn links(&self) -> &Links { &self.links }

    pub fn quote(&self, id: &str, state: &OrderState) -> Result<OutboundMessage, MessageError> {
        let to = Recipient::parse(&state.client.phone)?;
        let quote = Quote::for_order(state);
        let mut lines = vec![
            greeting(&state.client.name),
            format!("Here is your {} quote.", self.shop_name),
            String::new(),
        ];
        lines.extend(summary::quote_lines(&quote));
        lines.extend([
            String::new(),
            format!("Status: {}", state.status.label()),
            "Quote link:".to_string(),
            self.links.quote(id),
            String::new(),
            "Payment via Wave ✅".to_string(),
        ]);
        Ok(OutboundMessage { phone: to.digits().to_string(), text: finish(lines) })
    }

    pub fn payment_reminder(&self, state: &OrderState) -> Result<OutboundMessage, MessageError> {
        let to = Recipient::parse(&state.client.phone)?;
        let quote = Quote::for_order(state);
        let lines = vec![
            greeting(&state.client.name),
            format!("A quick reminder to complete your {} order.", self.shop_name),
            String::new(),
            format!("Amount to pay: {}", format::money(quote.total)),
            "Payment via Wave ✅".to_string(),
            String::new(),
            "Once paid, please send me the Wave reference.".to_string(),
        ];
        Ok(OutboundMessage { phone: to.digits().to_string(), text: finish(lines) })
    }

    pub fn transport_update(&self, id: &str, state: &OrderState) -> Result<OutboundMessage, MessageError> {
        let to = Recipient::parse(&state.client.phone)?;
        let s = &state.shipment;
        let m = ShipmentMetrics::of(s);
        let mut lines = vec![
            greeting(&state.client.name),
            String::new(),
            "Shipping update (after purchase):".to_string(),
            String::new(),
            format!("📦 Order: {}", id),
            format!("📦 Cartons: {}", m.cartons),
            String::new(),
            "📐 Dimensions (cm):".to_string(),
            format!("- Length: {}", format::dimension(s.dimensions.length_cm)),
            format!("- Width: {}", format::dimension(s.dimensions.width_cm)),
            format!("- Height: {}", format::dimension(s.dimensions.height_cm)),
            String::new(),
            "📏 CBM:".to_string(),
            format!("- 1 carton: {}", format::volume(m.unit_m3)),
            format!("- Total: {}", format::volume(m.total_m3)),
            String::new(),
            format!("⚖️ Total weight: {}", format::weight(m.weight_kg)),
        ];
        if let Some(fee) = m.transport_fee {
            lines.push(String::new());
            lines.push(format!("💰 Transport fee: {}", format::money(fee)));
        }
        let note = s.note.trim();
        if !note.is_empty() {
            lines.push(String::new());
            lines.push(format!("📝 Note: {}", note));
        }
        lines.extend([
            String::new(),
            "Quote link:".to_string(),
            self.links.quote(id),
            String::new(),
            "Transport link:".to_string(),
            self.links.transport(id),
        ]);
        Ok(OutboundMessage { phone: to.digits().to_string(), text: finish(lines) })
    }

    /// Request forwarded to `shop_phone` after the customer's photos are stored.
    pub fn customer_request(&self, shop_phone: &str, req: &CustomerRequest) -> Result<OutboundMessage, MessageError> {
        req.validate()?;
        let to = Recipient::parse(shop_phone)?;
        let details = req.details.trim();
        let lines = vec![
            format!("Hello {} 👋", self.shop_name),
            "New quote request.".to_string(),
            String::new(),
            format!("Name: {}", req.name.trim()),
            format!("Phone: {}", req.phone.trim()),
            format!("City: {}", req.city.trim()),
            String::new(),
            "Details:".to_string(),
            if details.is_empty() { format::NONE.to_string() } else { details.to_string() },
            String::new(),
            self.links.gallery(&req.gallery_id),
            self.links.quote(&req.gallery_id),
        ];
        Ok(OutboundMessage { phone: to.digits().to_string(), text: finish(lines) })
    }
}
