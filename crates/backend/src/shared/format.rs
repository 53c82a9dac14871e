/// Форматирует число с разделителями тысяч (точками)
///
/// # Примеры
/// ```ignore
/// assert_eq!(format_number(1234567), "1.234.567");
/// ```
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Rupee amount with Indian digit grouping: 1234567.5 -> "₹12,34,567.50"
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut parts = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            parts.push(t.to_string());
            rest = h;
        }
        parts.push(rest.to_string());
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    format!("{}₹{}.{:02}", if negative { "-" } else { "" }, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1.000");
        assert_eq!(format_number(1234567), "1.234.567");
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(500.0), "₹500.00");
        assert_eq!(format_inr(1500.5), "₹1,500.50");
        assert_eq!(format_inr(1234567.5), "₹12,34,567.50");
        assert_eq!(format_inr(-40.0), "-₹40.00");
    }
}
