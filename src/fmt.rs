use rust_decimal::Decimal;

/// Format an amount the way statements print it: 1.234,56
pub fn money(val: Decimal) -> String {
    let val = val.round_dp(2);
    let negative = val.is_sign_negative() && !val.is_zero();
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-{with_dots},{dec_part}")
    } else {
        format!("{with_dots},{dec_part}")
    }
}

pub fn opt_money(val: Option<Decimal>) -> String {
    val.map(money).unwrap_or_default()
}
