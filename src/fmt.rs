/// Group the integer digits of a non-negative number with commas.
fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a whole number with thousands separators: 1,234,567
pub fn number(val: f64) -> String {
    let rounded = format!("{:.0}", val.abs());
    if val < 0.0 && rounded != "0" {
        format!("-{}", group_thousands(&rounded))
    } else {
        group_thousands(&rounded)
    }
}

/// Format a won amount with thousands separators and no decimals: ₩1,234
pub fn won(val: f64) -> String {
    let rounded = format!("{:.0}", val.abs());
    if val < 0.0 && rounded != "0" {
        format!("-₩{}", group_thousands(&rounded))
    } else {
        format!("₩{}", group_thousands(&rounded))
    }
}

/// Compact axis label: 950, 1.2k, 3.4M.
pub fn format_k(val: f64) -> String {
    let abs = val.abs();
    let sign = if val < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        format!("{sign}{:.1}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}{:.1}k", abs / 1_000.0)
    } else {
        format!("{sign}{abs:.0}")
    }
}
