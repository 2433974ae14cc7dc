/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// Non-finite values are written as `"inf"`, `"-inf"` or `"nan"`.
///
/// # Examples
///
/// ```
/// use cgp_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// assert_eq!(format_number(f64::INFINITY, 1), "inf");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let fixed = format!("{:.*}", decimals as usize, value.abs());
    let mut out = match fixed.split_once('.') {
        Some((integer, fraction)) => format!("{}.{}", group_thousands(integer), fraction),
        None => group_thousands(&fixed),
    };

    // No sign when the value rounds to zero.
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.insert(0, '-');
    }
    out
}

/// Format an elapsed time in seconds.
///
/// * `< 60` seconds → `"4.2s"`
/// * `< 1` hour → `"3m 05s"`
/// * otherwise → `"2h 07m"`
///
/// # Examples
///
/// ```
/// use cgp_core::formatting::format_duration;
///
/// assert_eq!(format_duration(4.23), "4.2s");
/// assert_eq!(format_duration(185.0), "3m 05s");
/// assert_eq!(format_duration(7620.0), "2h 07m");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() / 10.0;
    if tenths < 60.0 {
        return format!("{:.1}s", tenths);
    }
    let total = seconds.round() as u64;
    if total < 3600 {
        format!("{}m {:02}s", total / 60, total % 60)
    } else {
        format!("{}h {:02}m", total / 3600, (total % 3600) / 60)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use cgp_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let scale = 10_f64.powi(decimal_places as i32);
    (part * 100.0 / whole * scale).round() / scale
}

/// Insert a comma between every group of three digits.
fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut groups: Vec<&str> = bytes
        .rchunks(3)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect();
    groups.reverse();
    groups.join(",")
}
