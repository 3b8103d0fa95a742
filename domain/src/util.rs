//! Shared utility functions.

/// Truncate a string to at most `max_chars` characters.
///
/// Returns a sub-slice of the original string. If the string has
/// `max_chars` characters or fewer, it is returned unchanged.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Used for log previews where a byte budget is what matters.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_ascii() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }

    #[test]
    fn truncate_chars_no_op_when_short() {
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("hi", 2), "hi");
    }

    #[test]
    fn truncate_chars_multibyte() {
        assert_eq!(truncate_chars("あのね", 2), "あの");
    }

    #[test]
    fn truncate_chars_zero() {
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn truncate_str_multibyte_boundary() {
        // 'の' is 3 bytes; cutting at byte 4 backs up to 3
        let s = "あのね";
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str(s, 6), "あの");
    }

    #[test]
    fn truncate_str_empty() {
        assert_eq!(truncate_str("", 10), "");
    }
}
