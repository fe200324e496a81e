use serde::{Deserialize, Serialize};

use crate::{volume, Dimensions, ExchangeRate, LineItem, OrderState};

/// Subtotal at or above which the reduced commission applies.
pub const COMMISSION_THRESHOLD: i64 = 100_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CommissionTier {
    Standard, // 15%
    Reduced,  // 10%
}

impl CommissionTier {
    pub fn for_subtotal(subtotal: i64) -> Self {
        if subtotal < COMMISSION_THRESHOLD { CommissionTier::Standard } else { CommissionTier::Reduced }
    }

    pub fn percent(self) -> i64 {
        match self {
            CommissionTier::Standard => 15,
            CommissionTier::Reduced => 10,
        }
    }

    pub fn rate(self) -> f64 {
        self.percent() as f64 / 100.0
    }

    /// Rounded half up, in whole local units.
    pub fn commission_on(self, subtotal: i64) -> i64 {
        let scaled = i128::from(subtotal.max(0)) * i128::from(self.percent());
        // at most 15% of i64::MAX, always fits
        ((scaled + 50) / 100) as i64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Settlement {
    Settled,
    Outstanding,
    Overpaid,
}

impl Settlement {
    pub fn from_delta(delta: i64) -> Self {
        match delta {
            0 => Settlement::Settled,
            d if d < 0 => Settlement::Outstanding,
            _ => Settlement::Overpaid,
        }
    }
}

pub fn subtotal(items: &[LineItem]) -> i64 {
    items.iter().map(LineItem::line_total).fold(0i64, i64::saturating_add)
}

pub fn commission_rate(subtotal: i64) -> f64 {
    CommissionTier::for_subtotal(subtotal).rate()
}

pub fn total(subtotal: i64, shipping_fee: i64) -> i64 {
    let tier = CommissionTier::for_subtotal(subtotal);
    subtotal.saturating_add(tier.commission_on(subtotal)).saturating_add(shipping_fee.max(0))
}

pub fn payment_delta(amount_received: i64, total: i64) -> i64 {
    amount_received.saturating_sub(total)
}

/// Priced breakdown of an order as shown to the customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub items: Vec<LineItem>,
    pub rate: ExchangeRate,
    pub shipping_fee: i64,
    pub subtotal: i64,
    pub tier: CommissionTier,
    pub commission_percent: i64,
    pub commission: i64,
    pub total: i64,
    pub volume_m3: f64,
}

impl Quote {
    pub fn compute(items: &[LineItem], rate: ExchangeRate, shipping_fee: i64, dims: &Dimensions) -> Self {
        let sub = subtotal(items);
        let tier = CommissionTier::for_subtotal(sub);
        let shipping_fee = shipping_fee.max(0);
        let commission = tier.commission_on(sub);
        Quote {
            items: items.to_vec(),
            rate,
            shipping_fee,
            subtotal: sub,
            tier,
            commission_percent: tier.percent(),
            commission,
            total: total(sub, shipping_fee),
            volume_m3: volume::unit_volume(dims),
        }
    }

    pub fn for_order(state: &OrderState) -> Self {
        Quote::compute(&state.items, state.rate, state.shipping_fee, &state.dimensions)
    }

    pub fn payment_delta(&self, amount_received: i64) -> i64 {
        payment_delta(amount_received, self.total)
    }
}
