//! ISBN cleaning and validation.

/// Strips separators and anything that cannot be part of an ISBN.
///
/// Digits are kept, as is an `X` check character in last position.
pub fn clean(input: &str) -> String {
    let upper: Vec<char> = input
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == 'x' || *ch == 'X')
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    let last = upper.len().saturating_sub(1);
    upper
        .iter()
        .enumerate()
        .filter(|(idx, ch)| ch.is_ascii_digit() || *idx == last)
        .map(|(_, ch)| *ch)
        .collect()
}

fn digits(s: &str) -> Option<Vec<u32>> {
    s.chars()
        .enumerate()
        .map(|(idx, ch)| match ch {
            'X' if idx == 9 => Some(10),
            _ => ch.to_digit(10),
        })
        .collect()
}

pub fn is_isbn10(s: &str) -> bool {
    if s.len() != 10 {
        return false;
    }
    match digits(s) {
        Some(d) => {
            let sum: u32 = d
                .iter()
                .enumerate()
                .map(|(idx, value)| (10 - idx as u32) * value)
                .sum();
            sum % 11 == 0
        }
        None => false,
    }
}

pub fn is_isbn13(s: &str) -> bool {
    if s.len() != 13 || !s.chars().all(|ch| ch.is_ascii_digit()) {
        return false;
    }
    checksum13(s) % 10 == 0
}

fn checksum13(s: &str) -> u32 {
    s.chars()
        .filter_map(|ch| ch.to_digit(10))
        .enumerate()
        .map(|(idx, value)| if idx % 2 == 0 { value } else { value * 3 })
        .sum()
}

/// Converts a valid ISBN-10 into its ISBN-13 form.
pub fn to_isbn13(isbn10: &str) -> Option<String> {
    if !is_isbn10(isbn10) {
        return None;
    }
    let body = format!("978{}", &isbn10[..9]);
    let check = (10 - checksum13(&body) % 10) % 10;
    Some(format!("{body}{check}"))
}

/// Cleans `input` and returns its canonical ISBN-13, if it is a valid ISBN.
pub fn canonical(input: &str) -> Option<String> {
    let cleaned = clean(input);
    if is_isbn13(&cleaned) {
        Some(cleaned)
    } else {
        to_isbn13(&cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_removes_separators() {
        assert_eq!(clean("978-0-306-40615-7"), "9780306406157");
        assert_eq!(clean("ISBN 0-07-462542-x"), "007462542X");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn validates_both_lengths() {
        assert!(is_isbn13("9780306406157"));
        assert!(!is_isbn13("9780306406158"));
        assert!(is_isbn10("0306406152"));
        assert!(is_isbn10("007462542X"));
        assert!(!is_isbn10("0306406153"));
    }

    #[test]
    fn converts_isbn10() {
        assert_eq!(to_isbn13("0306406152").as_deref(), Some("9780306406157"));
        assert_eq!(canonical("0-306-40615-2").as_deref(), Some("9780306406157"));
        assert_eq!(canonical("not an isbn"), None);
    }
}
