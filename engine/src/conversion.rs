//! Price conversion between the foreign side (¥) and the local side (FCFA).

use crate::{ExchangeRate, LineItem, MAX_QTY, MIN_QTY};

/// Form input coercion: blank, malformed or non-finite text is 0.
pub fn coerce_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

pub fn clamp_quantity(raw: i64) -> u32 {
    raw.clamp(i64::from(MIN_QTY), i64::from(MAX_QTY)) as u32
}

/// Fractions are floored; the cast saturates before the clamp.
pub fn quantity_from_value(v: f64) -> u32 {
    clamp_quantity(v.floor() as i64)
}

pub fn round_source(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn round_local(v: f64) -> i64 {
    v.round() as i64
}

/// Which side drives the bulk recompute when the rate changes.
///
/// `ForeignFirst` is the shop's rule: an item priced in ¥ keeps its ¥ price
/// and gets a new FCFA price; an item priced only in FCFA keeps its FCFA
/// price and gets a new ¥ price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecomputePolicy {
    #[default]
    ForeignFirst,
}

pub fn set_from_foreign(item: &mut LineItem, value: f64, rate: ExchangeRate) {
    let y = non_negative(value);
    item.source_price = round_source(y);
    item.local_price = if y > 0.0 { round_local(y * rate.get()) } else { 0 };
}

pub fn set_from_local(item: &mut LineItem, value: f64, rate: ExchangeRate) {
    let f = non_negative(value);
    item.local_price = round_local(f);
    item.source_price = if f > 0.0 { round_source(f / rate.get()) } else { 0.0 };
}

pub fn recompute_items(items: &mut [LineItem], rate: ExchangeRate, policy: RecomputePolicy) {
    match policy {
        RecomputePolicy::ForeignFirst => {
            for it in items.iter_mut() {
                if it.source_price > 0.0 {
                    it.local_price = round_local(it.source_price * rate.get());
                } else if it.local_price > 0 {
                    it.source_price = round_source(it.local_price as f64 / rate.get());
                }
            }
        }
    }
}
