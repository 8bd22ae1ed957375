//! Token-bag similarity between SQL strings.

use crate::types::Result;
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::collections::HashMap;

/// Token text (lower-cased) to occurrence count.
pub type TokenCounts = HashMap<String, usize>;

/// Tokenize SQL and count each distinct token.
///
/// Whitespace and comments are dropped; quoted strings and identifiers
/// contribute their inner text.
pub fn tokenize_sql(sql: &str) -> Result<TokenCounts> {
    let tokens = Tokenizer::new(&GenericDialect {}, sql).tokenize()?;

    let mut counts = TokenCounts::new();
    for token in tokens {
        let text = match token {
            Token::Whitespace(_) | Token::EOF => continue,
            Token::Word(word) => word.value,
            Token::Number(number, _) => number,
            Token::SingleQuotedString(s)
            | Token::DoubleQuotedString(s)
            | Token::NationalStringLiteral(s)
            | Token::EscapedStringLiteral(s)
            | Token::HexStringLiteral(s) => s,
            other => other.to_string(),
        };
        *counts.entry(text.to_lowercase()).or_default() += 1;
    }
    Ok(counts)
}

/// Cosine similarity between the token-count vectors of two SQL strings.
///
/// Returns 0.0 when either side has no tokens.
///
/// # Examples
///
/// ```
/// use sqleval::eval::cosine_similarity;
///
/// let same = cosine_similarity("SELECT a FROM t", "select A from T").unwrap();
/// assert!((same - 1.0).abs() < 1e-9);
/// ```
pub fn cosine_similarity(sql_1: &str, sql_2: &str) -> Result<f64> {
    let tokens_1 = tokenize_sql(sql_1)?;
    let tokens_2 = tokenize_sql(sql_2)?;
    Ok(counts_cosine(&tokens_1, &tokens_2))
}

/// Cosine similarity between two token-count vectors.
pub fn counts_cosine(tokens_1: &TokenCounts, tokens_2: &TokenCounts) -> f64 {
    if tokens_1.is_empty() || tokens_2.is_empty() {
        return 0.0;
    }

    let dot_product: f64 = tokens_1
        .iter()
        .filter_map(|(token, &c1)| tokens_2.get(token).map(|&c2| (c1 * c2) as f64))
        .sum();

    let magnitude = |counts: &TokenCounts| {
        counts
            .values()
            .map(|&c| (c * c) as f64)
            .sum::<f64>()
            .sqrt()
    };

    // clamp float noise so identical bags score exactly 1
    (dot_product / (magnitude(tokens_1) * magnitude(tokens_2))).min(1.0)
}
