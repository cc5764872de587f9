//! Edit-distance string similarity used by the line matcher

/// Classic Levenshtein distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two rolling rows are enough
    let mut previous: Vec<usize> = (0..=n).collect();
    let mut current = vec![0usize; n + 1];

    for i in 1..=m {
        current[0] = i;
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[n]
}

/// Similarity in `0.0..=1.0`: `1 - distance / longer_length`.
///
/// No case folding happens here; callers lowercase first. An empty string on
/// either side carries no evidence and scores 0.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / longer as f64
}
