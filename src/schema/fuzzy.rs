//! Approximate name matching between schema sources.

/// Default minimum score for `best_match`.
pub const DEFAULT_THRESHOLD: u8 = 80;

/// Similarity score in `0..=100`, based on the longest common subsequence.
///
/// `round(100 * 2 * lcs / (len(a) + len(b)))`; 0 when either side is empty.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // single-row LCS table
    let mut row = vec![0usize; b.len() + 1];
    for &ca in &a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    let lcs = row[b.len()];

    (200.0 * lcs as f64 / (a.len() + b.len()) as f64).round() as u8
}

/// Best case-insensitive match for `name` among `choices`.
///
/// Returns the highest-scoring choice with score at least `threshold`;
/// ties go to the earliest choice.
pub fn best_match<'a, I>(name: &str, choices: I, threshold: u8) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let name = name.to_lowercase();
    let mut best: Option<(&str, u8)> = None;

    for choice in choices {
        let score = ratio(&name, &choice.to_lowercase());
        if score >= threshold && best.map_or(true, |(_, s)| score > s) {
            best = Some((choice, score));
        }
    }
    best.map(|(choice, _)| choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_values() {
        assert_eq!(ratio("player", "player"), 100);
        assert_eq!(ratio("", "player"), 0);
        assert_eq!(ratio("abc", "xyz"), 0);
        // lcs("players", "player") = 6 -> 2*6/13
        assert_eq!(ratio("players", "player"), 92);
    }

    #[test]
    fn test_best_match_case_insensitive() {
        let choices = ["team", "Players", "games"];
        assert_eq!(best_match("PLAYER", choices, DEFAULT_THRESHOLD), Some("Players"));
    }

    #[test]
    fn test_best_match_threshold() {
        assert_eq!(best_match("player", ["team"], DEFAULT_THRESHOLD), None);
        assert_eq!(best_match("anything", Vec::<&str>::new(), 0), None);
    }

    #[test]
    fn test_best_match_first_wins_ties() {
        assert_eq!(best_match("ab", ["abx", "aby"], 50), Some("abx"));
    }
}
