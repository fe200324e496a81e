//! Plain-text summaries. One fact per line, items in insertion order.

use crate::format::{self, FOREIGN_SYMBOL, LOCAL_CURRENCY};
use crate::volume::{CbmEstimate, ShipmentMetrics};
use crate::{clamp_quantity, LineItem, Quote, Shipment};

pub fn item_line(index: usize, item: &LineItem) -> String {
    let qty = clamp_quantity(i64::from(item.quantity));
    let mut line = format!("Item {}: {}", index + 1, format::money(item.local_price));
    if item.source_price > 0.0 {
        line.push_str(&format!(" ({} {})", format::decimal(item.source_price), FOREIGN_SYMBOL));
    }
    line.push_str(&format!(" x{} = {}", qty, format::money(item.line_total())));
    let note = item.note.trim();
    if !note.is_empty() {
        line.push_str(" - ");
        line.push_str(note);
    }
    line
}

pub fn quote_lines(quote: &Quote) -> Vec<String> {
    let mut lines: Vec<String> = quote.items.iter().enumerate().map(|(i, it)| item_line(i, it)).collect();
    lines.push(String::new());
    lines.push(format!("Rate: 1 {} = {} {}", FOREIGN_SYMBOL, format::decimal(quote.rate.get()), LOCAL_CURRENCY));
    if quote.volume_m3 > 0.0 {
        lines.push(format!("CBM: {}", format::volume(quote.volume_m3)));
    }
    lines.push(format!("Subtotal: {}", format::money(quote.subtotal)));
    lines.push(format!("Commission ({}%): {}", quote.commission_percent, format::money(quote.commission)));
    lines.push(format!("Fees (optional): {}", format::money(quote.shipping_fee)));
    lines.push(format!("TOTAL: {}", format::money(quote.total)));
    lines
}

pub fn quote_text(quote: &Quote) -> String {
    quote_lines(quote).join("\n")
}

pub fn shipment_text(order_id: &str, shipment: &Shipment) -> String {
    let m = ShipmentMetrics::of(shipment);
    let d = &shipment.dimensions;
    [
        format!("Order: {}", order_id),
        format!("Cartons: {}", m.cartons),
        format!(
            "Dimensions (cm): {} x {} x {}",
            format::dimension(d.length_cm),
            format::dimension(d.width_cm),
            format::dimension(d.height_cm)
        ),
        format!("CBM total: {}", format::volume(m.total_m3)),
        format!("Weight: {}", format::weight(m.weight_kg)),
        format!("Transport fee: {}", m.transport_fee.map(format::money).unwrap_or_else(|| format::NONE.to_string())),
    ]
    .join("\n")
}

pub fn cbm_text(est: &CbmEstimate) -> String {
    let mut lines = vec![
        format!("CBM (unit): {}", format::volume_digits(est.unit_m3)),
        format!("Quantity: {}", est.quantity),
        format!("CBM total: {}", format::volume_digits(est.total_m3)),
    ];
    if let Some(freight) = est.freight {
        lines.push(format!(
            "Freight estimate: {} (tariff {} {}/CBM)",
            format::money(freight),
            format::decimal(est.tariff_per_m3),
            LOCAL_CURRENCY
        ));
    }
    lines.join("\n")
}
