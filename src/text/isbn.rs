/// Validates an ISBN-10 or ISBN-13 and returns it in compact form
///
/// Hyphens, spaces and any other separators are dropped before the checksum
/// is verified. A trailing `x` on an ISBN-10 is accepted and uppercased.
///
/// # Examples
///
/// ```
/// use shelfari_metadata::text::check_isbn;
///
/// assert_eq!(check_isbn("978-0-385-34058-8"), Some("9780385340588".to_string()));
/// assert_eq!(check_isbn("9780385340589"), None);
/// ```
pub fn check_isbn(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'x' || *c == 'X')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    match compact.len() {
        10 if is_valid_isbn10(&compact) => Some(compact),
        13 if is_valid_isbn13(&compact) => Some(compact),
        _ => None,
    }
}

fn is_valid_isbn10(isbn: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in isbn.chars().enumerate() {
        let value = match c {
            'X' if i == 9 => 10,
            d if d.is_ascii_digit() => d as u32 - '0' as u32,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn is_valid_isbn13(isbn: &str) -> bool {
    if !(isbn.starts_with("978") || isbn.starts_with("979")) {
        return false;
    }

    let mut sum = 0u32;
    for (i, c) in isbn.chars().enumerate() {
        let Some(value) = c.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { value } else { value * 3 };
    }
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_isbn13() {
        assert_eq!(
            check_isbn("9780385340588"),
            Some("9780385340588".to_string())
        );
    }

    #[test]
    fn test_isbn13_with_separators() {
        assert_eq!(
            check_isbn(" 978-0 385-34058-8 "),
            Some("9780385340588".to_string())
        );
    }

    #[test]
    fn test_valid_isbn10() {
        assert_eq!(check_isbn("0-385-34058-3"), Some("0385340583".to_string()));
    }

    #[test]
    fn test_isbn10_with_x_check_digit() {
        assert_eq!(check_isbn("0-8044-2957-x"), Some("080442957X".to_string()));
    }

    #[test]
    fn test_bad_checksum() {
        assert_eq!(check_isbn("9780385340589"), None);
        assert_eq!(check_isbn("0385340584"), None);
    }

    #[test]
    fn test_wrong_length_or_prefix() {
        assert_eq!(check_isbn(""), None);
        assert_eq!(check_isbn("12345"), None);
        assert_eq!(check_isbn("1230385340588"), None);
    }

    #[test]
    fn test_x_only_allowed_last_in_isbn10() {
        assert_eq!(check_isbn("X385340583"), None);
    }
}
