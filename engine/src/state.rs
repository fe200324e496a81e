//! Strict decoding of a persisted [`OrderState`].
//!
//! Missing or `null` fields take their default. A field that is present with
//! the wrong shape makes the whole record corrupt; nothing is silently dropped.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::conversion::{non_negative, quantity_from_value, round_local, round_source};
use crate::{ClientInfo, Dimensions, ExchangeRate, LineItem, OrderState, Payment, Shipment, Status};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("corrupt state at `{field}`: expected {expected}")]
    Corrupt { field: String, expected: &'static str },
}

impl StateError {
    fn corrupt(field: &str, expected: &'static str) -> Self {
        StateError::Corrupt { field: field.to_string(), expected }
    }
}

struct Fields<'a> {
    path: String,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn root(v: &'a Value) -> Result<Self, StateError> {
        match v {
            Value::Object(map) => Ok(Fields { path: String::new(), map }),
            _ => Err(StateError::corrupt("$", "an object")),
        }
    }

    fn name(&self, key: &str) -> String {
        if self.path.is_empty() { key.to_string() } else { format!("{}.{}", self.path, key) }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn nested(&self, key: &str) -> Result<Option<Fields<'a>>, StateError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Fields { path: self.name(key), map })),
            Some(_) => Err(StateError::corrupt(&self.name(key), "an object")),
        }
    }

    fn string(&self, key: &str) -> Result<String, StateError> {
        match self.get(key) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(StateError::corrupt(&self.name(key), "a string")),
        }
    }

    fn number(&self, key: &str) -> Result<f64, StateError> {
        match self.get(key) {
            None => Ok(0.0),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| StateError::corrupt(&self.name(key), "a number")),
            Some(_) => Err(StateError::corrupt(&self.name(key), "a number")),
        }
    }

    fn amount(&self, key: &str) -> Result<i64, StateError> {
        Ok(round_local(non_negative(self.number(key)?)))
    }

    fn optional_amount(&self, key: &str) -> Result<Option<i64>, StateError> {
        if self.get(key).is_none() { return Ok(None); }
        self.amount(key).map(Some)
    }

    fn count(&self, key: &str) -> Result<u32, StateError> {
        if self.get(key).is_none() { return Ok(1); }
        Ok(quantity_from_value(self.number(key)?))
    }
}

fn dimensions(f: Option<Fields<'_>>) -> Result<Dimensions, StateError> {
    let Some(f) = f else { return Ok(Dimensions::default()) };
    Ok(Dimensions {
        length_cm: non_negative(f.number("lengthCm")?),
        width_cm: non_negative(f.number("widthCm")?),
        height_cm: non_negative(f.number("heightCm")?),
    })
}

fn line_item(f: &Fields<'_>) -> Result<LineItem, StateError> {
    Ok(LineItem {
        image_url: f.string("imageUrl")?,
        source_price: round_source(non_negative(f.number("sourcePrice")?)),
        local_price: f.amount("localPrice")?,
        quantity: f.count("quantity")?,
        note: f.string("note")?,
    })
}

fn items(root: &Fields<'_>) -> Result<Vec<LineItem>, StateError> {
    let arr = match root.get("items") {
        None => return Ok(Vec::new()),
        Some(Value::Array(arr)) => arr,
        Some(_) => return Err(StateError::corrupt("items", "an array")),
    };
    arr.iter()
        .enumerate()
        .map(|(i, v)| {
            let path = format!("items[{}]", i);
            match v {
                Value::Object(map) => line_item(&Fields { path, map }),
                _ => Err(StateError::corrupt(&path, "an object")),
            }
        })
        .collect()
}

fn status(root: &Fields<'_>) -> Result<Status, StateError> {
    match root.get("status") {
        None => Ok(Status::default()),
        Some(Value::String(s)) => Status::parse(s).ok_or_else(|| StateError::corrupt("status", "a known status")),
        Some(_) => Err(StateError::corrupt("status", "a string")),
    }
}

pub fn decode_value(v: &Value) -> Result<OrderState, StateError> {
    let root = Fields::root(v)?;

    let client = match root.nested("client")? {
        Some(c) => ClientInfo { name: c.string("name")?, phone: c.string("phone")? },
        None => ClientInfo::default(),
    };
    let payment = match root.nested("payment")? {
        Some(p) => Payment { amount_received: p.amount("amountReceived")?, reference: p.string("reference")? },
        None => Payment::default(),
    };
    let rate = match root.get("rate") {
        None => ExchangeRate::default(),
        Some(_) => ExchangeRate::new(root.number("rate")?),
    };
    let shipment = match root.nested("shipment")? {
        Some(s) => Shipment {
            cartons: s.count("cartons")?,
            dimensions: dimensions(s.nested("dimensions")?)?,
            weight_kg: non_negative(s.number("weightKg")?),
            transport_fee: s.optional_amount("transportFee")?,
            note: s.string("note")?,
        },
        None => Shipment::default(),
    };

    Ok(OrderState {
        client,
        rate,
        shipping_fee: root.amount("shippingFee")?,
        status: status(&root)?,
        payment,
        dimensions: dimensions(root.nested("dimensions")?)?,
        items: items(&root)?,
        shipment,
    })
}

pub fn decode(raw: &str) -> Result<OrderState, StateError> {
    let v: Value = serde_json::from_str(raw)?;
    decode_value(&v)
}

pub fn encode(state: &OrderState) -> Result<String, StateError> {
    Ok(serde_json::to_string_pretty(state)?)
}
