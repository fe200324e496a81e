use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversion::{self, coerce_number, non_negative, quantity_from_value, round_local, RecomputePolicy};
use crate::{ExchangeRate, LineItem, OrderState, Status, MAX_QTY, MIN_QTY};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no item at index {index} (order has {len})")]
    NoSuchItem { index: usize, len: usize },
}

/// A numeric form field: either a JSON number or the raw text typed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn value(&self) -> f64 {
        match self {
            FieldValue::Number(n) if n.is_finite() => *n,
            FieldValue::Number(_) => 0.0,
            FieldValue::Text(s) => coerce_number(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self { FieldValue::Number(v) }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { FieldValue::Text(v.to_string()) }
}

/// One user input event on an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Edit {
    SetClientName { value: String },
    SetClientPhone { value: String },
    SetRate { value: FieldValue },
    SetForeignPrice { index: usize, value: FieldValue },
    SetLocalPrice { index: usize, value: FieldValue },
    SetQuantity { index: usize, value: FieldValue },
    IncrementQuantity { index: usize },
    DecrementQuantity { index: usize },
    SetNote { index: usize, value: String },
    SetShipping { value: FieldValue },
    SetStatus { status: Status },
    SetAmountReceived { value: FieldValue },
    SetPaymentRef { value: String },
    SetDimensions { length: FieldValue, width: FieldValue, height: FieldValue },
    SetCartons { value: FieldValue },
    SetShipmentDimensions { length: FieldValue, width: FieldValue, height: FieldValue },
    SetWeight { value: FieldValue },
    SetTransportFee { value: FieldValue },
    SetShipmentNote { value: String },
}

fn item_mut(items: &mut [LineItem], index: usize) -> Result<&mut LineItem, EditError> {
    let len = items.len();
    items.get_mut(index).ok_or(EditError::NoSuchItem { index, len })
}

fn cm(v: &FieldValue) -> f64 { non_negative(v.value()) }

impl OrderState {
    pub fn apply(&mut self, edit: Edit) -> Result<(), EditError> {
        let rate = self.rate;
        match edit {
            Edit::SetClientName { value } => self.client.name = value,
            Edit::SetClientPhone { value } => self.client.phone = value,
            Edit::SetRate { value } => {
                let next = ExchangeRate::new(value.value());
                if next != self.rate {
                    self.rate = next;
                    conversion::recompute_items(&mut self.items, next, RecomputePolicy::ForeignFirst);
                }
            }
            Edit::SetForeignPrice { index, value } => {
                conversion::set_from_foreign(item_mut(&mut self.items, index)?, value.value(), rate)
            }
            Edit::SetLocalPrice { index, value } => {
                conversion::set_from_local(item_mut(&mut self.items, index)?, value.value(), rate)
            }
            Edit::SetQuantity { index, value } => {
                item_mut(&mut self.items, index)?.quantity = quantity_from_value(value.value())
            }
            Edit::IncrementQuantity { index } => {
                let it = item_mut(&mut self.items, index)?;
                it.quantity = (it.quantity.max(MIN_QTY) + 1).min(MAX_QTY);
            }
            Edit::DecrementQuantity { index } => {
                let it = item_mut(&mut self.items, index)?;
                it.quantity = it.quantity.min(MAX_QTY).saturating_sub(1).max(MIN_QTY);
            }
            Edit::SetNote { index, value } => item_mut(&mut self.items, index)?.note = value,
            Edit::SetShipping { value } => self.shipping_fee = round_local(non_negative(value.value())),
            Edit::SetStatus { status } => self.status = status,
            Edit::SetAmountReceived { value } => {
                self.payment.amount_received = round_local(non_negative(value.value()))
            }
            Edit::SetPaymentRef { value } => self.payment.reference = value,
            Edit::SetDimensions { length, width, height } => {
                self.dimensions.length_cm = cm(&length);
                self.dimensions.width_cm = cm(&width);
                self.dimensions.height_cm = cm(&height);
            }
            Edit::SetCartons { value } => self.shipment.cartons = quantity_from_value(value.value()),
            Edit::SetShipmentDimensions { length, width, height } => {
                let d = &mut self.shipment.dimensions;
                d.length_cm = cm(&length);
                d.width_cm = cm(&width);
                d.height_cm = cm(&height);
            }
            Edit::SetWeight { value } => self.shipment.weight_kg = non_negative(value.value()),
            Edit::SetTransportFee { value } => {
                let fee = round_local(non_negative(value.value()));
                self.shipment.transport_fee = (fee > 0).then_some(fee);
            }
            Edit::SetShipmentNote { value } => self.shipment.note = value,
        }
        Ok(())
    }
}
