// src/util.rs — Shared utility functions

/// Truncate a string to at most `max_len` bytes without splitting a
/// UTF-8 character.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// First line of `s`, shortened for log output.
pub fn preview(s: &str, max_len: usize) -> String {
    let line = s.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    let cut = truncate_str(line, max_len);
    if cut.len() < line.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "café" is 5 bytes; cutting at 4 must not split é
        assert_eq!(truncate_str("café", 4), "caf");
    }

    #[test]
    fn test_preview_first_nonblank_line() {
        assert_eq!(preview("\n  # Weekly notebook\nbody", 40), "# Weekly notebook");
    }

    #[test]
    fn test_preview_ellipsis() {
        assert_eq!(preview("abcdefgh", 3), "abc...");
    }
}
