//! Shipment volume (CBM) from carton dimensions in centimetres.

use serde::{Deserialize, Serialize};

use crate::conversion::{clamp_quantity, non_negative, round_local};
use crate::{Dimensions, Shipment};

pub fn unit_volume(dims: &Dimensions) -> f64 {
    let l = non_negative(dims.length_cm);
    let w = non_negative(dims.width_cm);
    let h = non_negative(dims.height_cm);
    (l / 100.0) * (w / 100.0) * (h / 100.0)
}

pub fn total_volume(dims: &Dimensions, cartons: i64) -> f64 {
    unit_volume(dims) * f64::from(clamp_quantity(cartons))
}

/// Freight cost from a per-m³ tariff; `None` when no tariff is set.
pub fn freight_estimate(total_m3: f64, tariff_per_m3: f64) -> Option<i64> {
    let tariff = non_negative(tariff_per_m3);
    (tariff > 0.0).then(|| round_local(total_m3 * tariff))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentMetrics {
    pub cartons: u32,
    pub unit_m3: f64,
    pub total_m3: f64,
    pub weight_kg: f64,
    pub transport_fee: Option<i64>,
}

impl ShipmentMetrics {
    pub fn of(shipment: &Shipment) -> Self {
        let cartons = clamp_quantity(i64::from(shipment.cartons));
        let fee = shipment.transport_fee.map(|f| f.max(0)).filter(|f| *f > 0);
        ShipmentMetrics {
            cartons,
            unit_m3: unit_volume(&shipment.dimensions),
            total_m3: total_volume(&shipment.dimensions, i64::from(cartons)),
            weight_kg: non_negative(shipment.weight_kg),
            transport_fee: fee,
        }
    }
}

/// Stand-alone calculator input (no order attached).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CbmRequest {
    pub dimensions: Dimensions,
    pub quantity: i64,
    #[serde(default)]
    pub tariff_per_m3: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CbmEstimate {
    pub quantity: u32,
    pub unit_m3: f64,
    pub total_m3: f64,
    pub tariff_per_m3: f64,
    pub freight: Option<i64>,
}

impl CbmEstimate {
    pub fn compute(req: &CbmRequest) -> Self {
        let quantity = clamp_quantity(req.quantity);
        let total_m3 = total_volume(&req.dimensions, i64::from(quantity));
        let tariff = non_negative(req.tariff_per_m3);
        CbmEstimate {
            quantity,
            unit_m3: unit_volume(&req.dimensions),
            total_m3,
            tariff_per_m3: tariff,
            freight: freight_estimate(total_m3, tariff),
        }
    }
}
