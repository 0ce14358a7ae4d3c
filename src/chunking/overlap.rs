/// Sliding character windows of `size` chars; each window starts
/// `size - overlap` chars after the previous one. Whitespace-only windows
/// are dropped.
pub fn split_with_overlap(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if size == 0 || text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            chunks.push(window);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(split_with_overlap("hola mundo", 1000, 200), vec!["hola mundo"]);
    }

    #[test]
    fn test_windows_overlap() {
        let text = "abcdefghij";
        let chunks = split_with_overlap(text, 4, 1);
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_last_window_may_be_short() {
        let chunks = split_with_overlap("abcdefg", 4, 0);
        assert_eq!(chunks, vec!["abcd", "efg"]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let chunks = split_with_overlap("ññññññ", 3, 0);
        assert_eq!(chunks, vec!["ñññ", "ñññ"]);
    }

    #[test]
    fn test_whitespace_windows_dropped() {
        assert!(split_with_overlap("   \n\t ", 2, 0).is_empty());
        let chunks = split_with_overlap("ab      ", 2, 0);
        assert_eq!(chunks, vec!["ab"]);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_still_advances() {
        let chunks = split_with_overlap("abc", 2, 5);
        assert_eq!(chunks, vec!["ab", "bc"]);
    }
}
