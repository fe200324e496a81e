//! Display helpers for amounts, rates and measurements.
//!
//! Money is shown in whole units with a space as thousands separator
//! (`1 234 567`). Measurements that are zero render as [`NONE`] so a blank
//! field never reads like a real measurement.

pub const LOCAL_CURRENCY: &str = "FCFA";
pub const FOREIGN_SYMBOL: &str = "¥";
pub const NONE: &str = "-";

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

pub fn amount(v: i64) -> String {
    let grouped = group_thousands(&v.unsigned_abs().to_string());
    if v < 0 { format!("-{}", grouped) } else { grouped }
}

/// `1 234 FCFA`
pub fn money(v: i64) -> String {
    format!("{} {}", amount(v), LOCAL_CURRENCY)
}

/// Up to two decimals, trailing zeros trimmed.
pub fn decimal(v: f64) -> String {
    let formatted = format!("{:.2}", v);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    let (int_part, frac) = match trimmed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (trimmed, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int_part),
    };
    let sign = if digits == "0" && frac.is_none() { "" } else { sign };
    match frac {
        Some(f) => format!("{}{}.{}", sign, group_thousands(digits), f),
        None => format!("{}{}", sign, group_thousands(digits)),
    }
}

pub fn volume(m3: f64) -> String {
    if m3 > 0.0 { format!("{:.4} m³", m3) } else { NONE.to_string() }
}

pub fn volume_digits(m3: f64) -> String {
    if m3 > 0.0 { format!("{:.4}", m3) } else { NONE.to_string() }
}

pub fn weight(kg: f64) -> String {
    if kg > 0.0 { format!("{:.2} kg", kg) } else { NONE.to_string() }
}

/// Raw dimension as typed; zero reads as not measured.
pub fn dimension(cm: f64) -> String {
    if cm > 0.0 { decimal(cm) } else { NONE.to_string() }
}
