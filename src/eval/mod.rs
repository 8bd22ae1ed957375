//! SQL comparison: normalization, tree edit distance and token similarity.

pub mod distance;
pub mod evaluator;
pub mod normalize;
pub mod tokens;
pub mod tree;

pub use distance::{ast_distance, diff, tree_distance, Edit};
pub use evaluator::{evaluate_all, evaluate_query};
pub use normalize::{normalize_sql, normalize_statement, parse_statement};
pub use tokens::{cosine_similarity, tokenize_sql};
pub use tree::SqlTree;
