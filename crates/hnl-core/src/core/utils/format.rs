/// Renders `value` in C-style scientific notation (`%.{precision}e`).
///
/// Unlike Rust's `{:e}`, the exponent always carries a sign and at least two digits, so
/// `format_scientific(0.02, 2)` yields `"2.00e-02"`. Output file names and scan logs depend
/// on this exact rendering.
pub fn format_scientific(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let rendered = format!("{:.*e}", precision, value);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => rendered,
    }
}
