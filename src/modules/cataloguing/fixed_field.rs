//! Extraction helpers for fixed-length control fields and free-text years
//!
//! Positions are MARC character positions: zero-based, inclusive on both ends.
//! A window that does not fit in the field yields no signal.

/// Characters `start..=end` of `value`, or `None` when the field is too short.
pub fn window(value: &str, start: usize, end: usize) -> Option<&str> {
    let begin = value.char_indices().nth(start).map(|(i, _)| i)?;
    let finish = value
        .char_indices()
        .nth(end + 1)
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    if value[begin..].chars().count() < end - start + 1 {
        return None;
    }
    Some(&value[begin..finish])
}

/// Four-character date window with every non-digit replaced by `0`.
///
/// `19uu` reads as 1900; an all-zero result means the field carries no date.
pub fn zero_filled_year(value: &str, start: usize) -> Option<i32> {
    let raw = window(value, start, start + 3)?;
    let digits: String = raw
        .chars()
        .map(|c| if c.is_ascii_digit() { c } else { '0' })
        .collect();
    match digits.parse::<i32>() {
        Ok(0) | Err(_) => None,
        Ok(year) => Some(year),
    }
}

/// Every maximal run of exactly four ASCII digits in `text`.
pub fn year_tokens(text: &str) -> Vec<i32> {
    let mut years = Vec::new();
    let mut run = String::new();

    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            run.push(c);
            continue;
        }
        if run.len() == 4
            && let Ok(year) = run.parse::<i32>()
        {
            years.push(year);
        }
        run.clear();
    }

    years
}

/// A 2–3 letter code from a fixed-field window, lowercased.
///
/// Blanks and MARC fill characters (`|`, `#`, `^`) are not part of a code.
pub fn code_in_window(value: &str, start: usize, end: usize) -> Option<String> {
    let raw = window(value, start, end)?;
    let code = raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '|' | '#' | '^'));
    let len = code.chars().count();
    if (2..=3).contains(&len) && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIB_008: &str = "790618s19680000xxu           000 0 eng d";

    #[test]
    fn date_windows_follow_marc_positions() {
        assert_eq!(zero_filled_year(BIB_008, 7), Some(1968));
        // Date 2 is "0000": no date
        assert_eq!(zero_filled_year(BIB_008, 11), None);
    }

    #[test]
    fn unknown_digits_become_zero() {
        assert_eq!(zero_filled_year("790618s19uu    xxu", 7), Some(1900));
        assert_eq!(zero_filled_year("790618suuuu    xxu", 7), None);
    }

    #[test]
    fn short_field_gives_no_signal() {
        assert_eq!(zero_filled_year("790618s19", 7), None);
        assert_eq!(window("abc", 1, 5), None);
        assert_eq!(code_in_window("790618s1968", 35, 37), None);
    }

    #[test]
    fn language_code_at_35() {
        assert_eq!(code_in_window(BIB_008, 35, 37), Some("eng".to_string()));
        assert_eq!(code_in_window("x".repeat(35).as_str(), 35, 37), None);
    }

    #[test]
    fn code_allows_two_letters_and_rejects_fill() {
        let mut field = "x".repeat(35);
        field.push_str("fr ");
        assert_eq!(code_in_window(&field, 35, 37), Some("fr".to_string()));

        let mut filled = "x".repeat(35);
        filled.push_str("|||");
        assert_eq!(code_in_window(&filled, 35, 37), None);
    }

    #[test]
    fn truncated_code_window_gives_no_code() {
        // Bib 008 cut at 37 characters: only two of the three language positions
        let mut bib = "x".repeat(35);
        bib.push_str("en");
        assert_eq!(bib.chars().count(), 37);
        assert_eq!(code_in_window(&bib, 35, 37), None);

        // Holding 008 cut at 24 characters
        let mut holding = "0".repeat(22);
        holding.push_str("zz");
        assert_eq!(code_in_window(&holding, 22, 24), None);
    }

    #[test]
    fn year_tokens_take_exact_four_digit_runs() {
        assert_eq!(year_tokens("Printed c1790, reissued [1801?]"), vec![1790, 1801]);
        assert_eq!(year_tokens("1968-1970"), vec![1968, 1970]);
        assert!(year_tokens("ISBN 9780140449136, 12 v.").is_empty());
    }
}
