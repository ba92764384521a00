/// Strips separators and validates the check digit. Returns the bare
/// 10- or 13-character form.
pub fn normalize_isbn(value: &str) -> Option<String> {
    let cleaned = value
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == 'X' || *ch == 'x')
        .map(|ch| ch.to_ascii_uppercase())
        .collect::<String>();
    if cleaned.len() == 10 && is_valid_isbn10(&cleaned) {
        return Some(cleaned);
    }
    if cleaned.len() == 13 && is_valid_isbn13(&cleaned) {
        return Some(cleaned);
    }
    None
}

fn is_valid_isbn10(value: &str) -> bool {
    let mut sum = 0u32;
    for (index, ch) in value.chars().enumerate() {
        let digit = match (index, ch) {
            (9, 'X') => 10,
            (_, ch) => match ch.to_digit(10) {
                Some(digit) => digit,
                None => return false,
            },
        };
        sum += digit * (10 - index as u32);
    }
    sum % 11 == 0
}

fn is_valid_isbn13(value: &str) -> bool {
    let mut sum = 0u32;
    for (index, ch) in value.chars().enumerate() {
        let digit = match ch.to_digit(10) {
            Some(digit) => digit,
            None => return false,
        };
        sum += if index % 2 == 0 { digit } else { digit * 3 };
    }
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_isbn13() {
        assert_eq!(
            normalize_isbn("978-0-261-10357-3").as_deref(),
            Some("9780261103573")
        );
    }

    #[test]
    fn accepts_isbn10_with_x_check_digit() {
        assert_eq!(normalize_isbn("0-8044-2957-x").as_deref(), Some("080442957X"));
        assert_eq!(normalize_isbn("0306406152").as_deref(), Some("0306406152"));
    }

    #[test]
    fn rejects_bad_checksums_and_lengths() {
        assert_eq!(normalize_isbn("9780261103574"), None);
        assert_eq!(normalize_isbn("0306406153"), None);
        assert_eq!(normalize_isbn("12345"), None);
        assert_eq!(normalize_isbn(""), None);
        assert_eq!(normalize_isbn("X306406152"), None);
    }
}
