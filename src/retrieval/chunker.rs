use crate::core::errors::ApiError;

/// Split text into overlapping character windows.
///
/// Window `i` starts at `i * (size - overlap)` and covers up to `size`
/// characters, clipped at the end of the text. The same input always
/// produces the same chunk sequence.
pub fn split_into_chunks(
    text: &str,
    size: usize,
    overlap: usize,
) -> Result<Vec<String>, ApiError> {
    if size == 0 {
        return Err(ApiError::InvalidParameter(
            "chunk size must be positive".to_string(),
        ));
    }
    if overlap >= size {
        return Err(ApiError::InvalidParameter(format!(
            "chunk overlap {} must be smaller than chunk size {}",
            overlap, size
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let step = size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + size).min(total);
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = split_into_chunks("", 1000, 200).expect("valid parameters");
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = split_into_chunks("hello", 1000, 200).expect("valid parameters");
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn stride_arithmetic_matches_window_formula() {
        let text = "A".repeat(2500);
        let chunks = split_into_chunks(&text, 1000, 200).expect("valid parameters");

        // Starts at 0, 800, 1600, 2400; the last two clip at 2500.
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[1].len(), 1000);
        assert_eq!(chunks[2].len(), 900);
        assert_eq!(chunks[3].len(), 100);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap() {
        let text: String = ('a'..='z').cycle().take(120).collect();
        let chunks = split_into_chunks(&text, 50, 10).expect("valid parameters");

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(pair[0].chars().count() - 10).collect();
            let head: String = pair[1].chars().take(10).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let first = split_into_chunks(&text, 100, 30).expect("valid parameters");
        let second = split_into_chunks(&text, 100, 30).expect("valid parameters");
        assert_eq!(first, second);
    }

    #[test]
    fn overlap_not_below_size_is_rejected() {
        assert!(matches!(
            split_into_chunks("text", 100, 100),
            Err(ApiError::InvalidParameter(_))
        ));
        assert!(matches!(
            split_into_chunks("text", 100, 150),
            Err(ApiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            split_into_chunks("text", 0, 0),
            Err(ApiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn chunk_count_follows_ceil_formula() {
        for (len, size, overlap) in [(2500, 1000, 200), (999, 100, 0), (1000, 100, 50)] {
            let text = "x".repeat(len);
            let chunks = split_into_chunks(&text, size, overlap).expect("valid parameters");
            let step = size - overlap;
            assert_eq!(chunks.len(), len.div_ceil(step), "len={len} size={size} overlap={overlap}");
        }
    }
}
