//! Pairwise ordering checks for product listings.
//!
//! Verification compares adjacent entries and reports the index of the
//! first element that is out of order, so a failing assertion can name
//! the offending row. Names compare case-insensitively; prices compare
//! numerically after stripping the currency symbol.

use tracing::error;

/// Index of the first adjacent pair violating `in_order`, or `None`
/// when the slice is sorted.
pub fn first_unsorted_by<T>(items: &[T], in_order: impl Fn(&T, &T) -> bool) -> Option<usize> {
    items
        .windows(2)
        .position(|pair| !in_order(&pair[0], &pair[1]))
}

pub fn first_unsorted_name_ascending(names: &[String]) -> Option<usize> {
    first_unsorted_by(names, |a, b| a.to_lowercase() <= b.to_lowercase())
}

pub fn first_unsorted_name_descending(names: &[String]) -> Option<usize> {
    first_unsorted_by(names, |a, b| a.to_lowercase() >= b.to_lowercase())
}

pub fn first_unsorted_price_ascending(prices: &[f64]) -> Option<usize> {
    first_unsorted_by(prices, |a, b| a <= b)
}

pub fn first_unsorted_price_descending(prices: &[f64]) -> Option<usize> {
    first_unsorted_by(prices, |a, b| a >= b)
}

/// Parse a displayed price like `"$29.99"`.
pub fn parse_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let numeric = trimmed.strip_prefix('$').unwrap_or(trimmed);
    numeric.parse().ok()
}

/// Parse every displayed price, skipping (and logging) any that do not
/// parse; mirrors how listing reads tolerate a garbled row.
pub fn parse_prices(texts: &[String]) -> Vec<f64> {
    texts
        .iter()
        .filter_map(|text| {
            let price = parse_price(text);
            if price.is_none() {
                error!("failed to parse price: {text}");
            }
            price
        })
        .collect()
}

/// Sum of displayed prices. Unlike [`parse_prices`], a total over a
/// garbled price would be silently wrong, so the first unparsable entry
/// is an error.
pub fn total(texts: &[String]) -> Result<f64, String> {
    let mut sum = 0.0;
    for text in texts {
        sum += parse_price(text).ok_or_else(|| text.clone())?;
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorted_prices_pass_ascending() {
        assert_eq!(first_unsorted_price_ascending(&[7.99, 9.99, 15.99]), None);
    }

    #[test]
    fn unsorted_prices_report_the_first_violating_index() {
        // 15.99 -> 7.99 is the first out-of-order adjacent pair.
        assert_eq!(
            first_unsorted_price_ascending(&[9.99, 15.99, 7.99]),
            Some(1)
        );
        assert_eq!(
            first_unsorted_price_descending(&[15.99, 7.99, 9.99]),
            Some(1)
        );
    }

    #[test]
    fn name_ordering_is_case_insensitive() {
        assert_eq!(
            first_unsorted_name_ascending(&names(&["apple", "Banana", "cherry"])),
            None
        );
        assert_eq!(
            first_unsorted_name_descending(&names(&["cherry", "Banana", "apple"])),
            None
        );
        assert_eq!(
            first_unsorted_name_ascending(&names(&["Banana", "apple"])),
            Some(0)
        );
    }

    #[test]
    fn empty_and_singleton_lists_are_sorted() {
        assert_eq!(first_unsorted_price_ascending(&[]), None);
        assert_eq!(first_unsorted_price_ascending(&[1.0]), None);
    }

    #[test]
    fn parse_price_strips_the_currency_symbol() {
        assert_eq!(parse_price("$29.99"), Some(29.99));
        assert_eq!(parse_price(" 9.99 "), Some(9.99));
        assert_eq!(parse_price("$free"), None);
    }

    #[test]
    fn total_sums_displayed_prices() {
        let prices = names(&["$9.99", "$15.99"]);
        assert!((total(&prices).unwrap() - 25.98).abs() < 1e-9);
    }

    #[test]
    fn total_rejects_garbled_prices() {
        let prices = names(&["$9.99", "$oops"]);
        assert_eq!(total(&prices).unwrap_err(), "$oops");
    }

    #[test]
    fn parse_prices_skips_garbled_entries() {
        let prices = parse_prices(&names(&["$9.99", "n/a", "$15.99"]));
        assert_eq!(prices, vec![9.99, 15.99]);
    }
}
