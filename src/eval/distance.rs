//! Tree edit distance between SQL statements.
//!
//! Change distilling in the style of Fluri et al.:
//!
//! 1. Find a matching between nodes of the two trees (identical subtrees
//!    first, then similar leaves, then inner nodes sharing enough matched
//!    leaves).
//! 2. Derive an edit script from the matching: unmatched source nodes are
//!    removed, unmatched target nodes inserted, matched leaves with changed
//!    values updated, and matched nodes whose parents are not matched to
//!    each other moved.
//!
//! The distance is the edit count divided by the total number of nodes in
//! both trees.

use crate::eval::tree::SqlTree;
use crate::types::Result;
use std::collections::HashMap;

/// Minimum bigram similarity for two leaves to match.
pub const LEAF_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Minimum share of common matched leaves for two inner nodes to match.
pub const INNER_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Relaxed inner threshold for small subtrees.
pub const SMALL_SUBTREE_THRESHOLD: f64 = 0.4;

/// Subtrees with at most this many leaves use the relaxed threshold.
pub const SMALL_SUBTREE_LEAVES: usize = 4;

/// One step of an edit script. Ids index into the source or target tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert { target: usize },
    Remove { source: usize },
    Update { source: usize, target: usize },
    Move { source: usize, target: usize },
}

/// Bidirectional node matching.
#[derive(Debug, Default)]
struct Matching {
    source_to_target: HashMap<usize, usize>,
    target_to_source: HashMap<usize, usize>,
}

impl Matching {
    fn add(&mut self, source: usize, target: usize) {
        self.source_to_target.insert(source, target);
        self.target_to_source.insert(target, source);
    }

    fn has_source(&self, source: usize) -> bool {
        self.source_to_target.contains_key(&source)
    }

    fn has_target(&self, target: usize) -> bool {
        self.target_to_source.contains_key(&target)
    }

    fn target_of(&self, source: usize) -> Option<usize> {
        self.source_to_target.get(&source).copied()
    }
}

/// Compute the edit script turning `source` into `target`.
pub fn diff(source: &SqlTree, target: &SqlTree) -> Vec<Edit> {
    let source_hashes = source.subtree_hashes();
    let target_hashes = target.subtree_hashes();

    if let (Some(s), Some(t)) = (source.root(), target.root()) {
        if source_hashes[s] == target_hashes[t] {
            return Vec::new();
        }
    }

    let mut matching = Matching::default();
    match_identical_subtrees(source, target, &source_hashes, &target_hashes, &mut matching);
    match_leaves(source, target, &mut matching);
    match_inner_nodes(source, target, &mut matching);

    if let (Some(s), Some(t)) = (source.root(), target.root()) {
        if !matching.has_source(s)
            && !matching.has_target(t)
            && source.node(s).label == target.node(t).label
        {
            matching.add(s, t);
        }
    }

    edit_script(source, target, &matching)
}

/// Normalized edit distance between two SQL strings.
///
/// # Errors
///
/// Returns `EvalError::SqlParse` if either string does not parse.
///
/// # Examples
///
/// ```
/// use sqleval::eval::ast_distance;
///
/// assert_eq!(ast_distance("SELECT a FROM t", "select a from t").unwrap(), 0.0);
/// assert!(ast_distance("SELECT a FROM t", "SELECT b FROM u WHERE c > 1").unwrap() > 0.0);
/// ```
pub fn ast_distance(sql_1: &str, sql_2: &str) -> Result<f64> {
    let source = SqlTree::parse(sql_1)?;
    let target = SqlTree::parse(sql_2)?;
    Ok(tree_distance(&source, &target))
}

/// Normalized edit distance between two trees.
pub fn tree_distance(source: &SqlTree, target: &SqlTree) -> f64 {
    let total_nodes = source.len() + target.len();
    if total_nodes == 0 {
        return 0.0;
    }
    diff(source, target).len() as f64 / total_nodes as f64
}

/// Match subtrees whose structural hash occurs exactly once in each tree.
fn match_identical_subtrees(
    source: &SqlTree,
    target: &SqlTree,
    source_hashes: &[u64],
    target_hashes: &[u64],
    matching: &mut Matching,
) {
    let count = |hashes: &[u64]| {
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for &h in hashes {
            *counts.entry(h).or_default() += 1;
        }
        counts
    };
    let source_counts = count(source_hashes);
    let target_counts = count(target_hashes);

    let mut source_by_hash: HashMap<u64, usize> = HashMap::new();
    for (id, &h) in source_hashes.iter().enumerate() {
        if source_counts.get(&h) == Some(&1) {
            source_by_hash.insert(h, id);
        }
    }

    // pre-order over the target so the largest shared subtrees win
    let mut stack: Vec<usize> = target.root().into_iter().collect();
    while let Some(t) = stack.pop() {
        let h = target_hashes[t];
        let unique_pair = if target_counts.get(&h) == Some(&1) {
            source_by_hash.get(&h).copied()
        } else {
            None
        };

        match unique_pair {
            Some(s) if !matching.has_source(s) && !matching.has_target(t) => {
                match_subtree(source, target, s, t, matching);
            }
            _ => stack.extend(target.node(t).children.iter().rev()),
        }
    }
}

fn match_subtree(source: &SqlTree, target: &SqlTree, s: usize, t: usize, matching: &mut Matching) {
    matching.add(s, t);
    let pairs = source.node(s).children.iter().zip(&target.node(t).children);
    for (&sc, &tc) in pairs {
        match_subtree(source, target, sc, tc, matching);
    }
}

/// Greedy leaf matching by descending bigram similarity.
fn match_leaves(source: &SqlTree, target: &SqlTree, matching: &mut Matching) {
    let unmatched_leaves = |tree: &SqlTree, matched: &dyn Fn(usize) -> bool| {
        tree.nodes()
            .filter(|(id, node)| node.is_leaf() && !matched(*id))
            .map(|(id, _)| id)
            .collect::<Vec<_>>()
    };
    let source_leaves = unmatched_leaves(source, &|id| matching.has_source(id));
    let target_leaves = unmatched_leaves(target, &|id| matching.has_target(id));

    let mut candidates = Vec::new();
    for &s in &source_leaves {
        let s_node = source.node(s);
        for &t in &target_leaves {
            let t_node = target.node(t);
            if s_node.label != t_node.label {
                continue;
            }
            let similarity = dice_coefficient(
                s_node.value.as_deref().unwrap_or(""),
                t_node.value.as_deref().unwrap_or(""),
            );
            if similarity >= LEAF_SIMILARITY_THRESHOLD {
                candidates.push((similarity, s, t));
            }
        }
    }

    // stable sort keeps tree order among equally similar pairs
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    for (_, s, t) in candidates {
        if !matching.has_source(s) && !matching.has_target(t) {
            matching.add(s, t);
        }
    }
}

/// Match inner nodes by the share of matched leaves they have in common.
fn match_inner_nodes(source: &SqlTree, target: &SqlTree, matching: &mut Matching) {
    let target_inner: Vec<usize> = target
        .post_order()
        .into_iter()
        .filter(|&t| !target.node(t).is_leaf())
        .collect();
    let target_leaves: HashMap<usize, Vec<usize>> =
        target_inner.iter().map(|&t| (t, target.leaves(t))).collect();

    for s in source.post_order() {
        let s_node = source.node(s);
        if s_node.is_leaf() || matching.has_source(s) {
            continue;
        }
        let s_leaves = source.leaves(s);

        let mut best: Option<(f64, usize)> = None;
        for &t in &target_inner {
            if matching.has_target(t) || target.node(t).label != s_node.label {
                continue;
            }
            let t_leaves = &target_leaves[&t];

            let common = s_leaves
                .iter()
                .filter_map(|&leaf| matching.target_of(leaf))
                .filter(|&mapped| target.is_descendant(mapped, t))
                .count();
            let max_leaves = s_leaves.len().max(t_leaves.len());
            if max_leaves == 0 {
                continue;
            }

            let similarity = common as f64 / max_leaves as f64;
            let threshold = if max_leaves <= SMALL_SUBTREE_LEAVES {
                SMALL_SUBTREE_THRESHOLD
            } else {
                INNER_SIMILARITY_THRESHOLD
            };

            if similarity >= threshold && best.map_or(true, |(b, _)| similarity > b) {
                best = Some((similarity, t));
            }
        }

        if let Some((_, t)) = best {
            matching.add(s, t);
        }
    }
}

fn edit_script(source: &SqlTree, target: &SqlTree, matching: &Matching) -> Vec<Edit> {
    let mut edits = Vec::new();

    for (s, _) in source.nodes() {
        if !matching.has_source(s) {
            edits.push(Edit::Remove { source: s });
        }
    }

    for (t, t_node) in target.nodes() {
        let Some(&s) = matching.target_to_source.get(&t) else {
            edits.push(Edit::Insert { target: t });
            continue;
        };
        let s_node = source.node(s);

        if s_node.is_leaf() && t_node.is_leaf() && s_node.value != t_node.value {
            edits.push(Edit::Update { source: s, target: t });
        }

        if let (Some(sp), Some(tp)) = (s_node.parent, t_node.parent) {
            if matching.target_of(sp) != Some(tp) {
                edits.push(Edit::Move { source: s, target: t });
            }
        }
    }

    edits
}

/// Dice coefficient over character bigrams.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let bigrams = |s: &str| {
        let chars: Vec<char> = s.chars().collect();
        let mut counts: HashMap<(char, char), usize> = HashMap::new();
        for pair in chars.windows(2) {
            *counts.entry((pair[0], pair[1])).or_default() += 1;
        }
        counts
    };

    let a_bigrams = bigrams(a);
    let b_bigrams = bigrams(b);
    let total: usize = a_bigrams.values().sum::<usize>() + b_bigrams.values().sum::<usize>();
    if total == 0 {
        return 0.0;
    }

    let overlap: usize = a_bigrams
        .iter()
        .map(|(bigram, &count)| count.min(b_bigrams.get(bigram).copied().unwrap_or(0)))
        .sum();

    2.0 * overlap as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dice_coefficient() {
        assert_eq!(dice_coefficient("night", "night"), 1.0);
        assert!((dice_coefficient("night", "nacht") - 0.25).abs() < 1e-12);
        assert_eq!(dice_coefficient("a", "b"), 0.0);
        assert_eq!(dice_coefficient("", "x"), 0.0);
    }

    #[test]
    fn test_identical_trees_have_no_edits() {
        let a = SqlTree::parse("SELECT name FROM player WHERE id = 1").unwrap();
        let b = SqlTree::parse("select name from player where id = 1").unwrap();
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_single_value_change_is_update() {
        let a = SqlTree::from_json("root", &json!({"left": "player_name", "right": 1}));
        let b = SqlTree::from_json("root", &json!({"left": "player_names", "right": 1}));

        let edits = diff(&a, &b);
        assert_eq!(edits.len(), 1);
        assert!(matches!(edits[0], Edit::Update { .. }));
    }

    #[test]
    fn test_added_leaf_is_insert() {
        let a = SqlTree::from_json("root", &json!({"x": "alpha"}));
        let b = SqlTree::from_json("root", &json!({"x": "alpha", "y": "beta"}));

        let edits = diff(&a, &b);
        assert_eq!(edits, vec![Edit::Insert { target: 2 }]);
    }

    #[test]
    fn test_removed_leaf_is_remove() {
        let a = SqlTree::from_json("root", &json!({"x": "alpha", "y": "beta"}));
        let b = SqlTree::from_json("root", &json!({"x": "alpha"}));

        let edits = diff(&a, &b);
        assert_eq!(edits, vec![Edit::Remove { source: 2 }]);
    }

    #[test]
    fn test_moved_subtree_is_move() {
        let a = SqlTree::from_json("root", &json!({"p": {"x": "alpha_value"}, "q": {"z": 1}}));
        let b = SqlTree::from_json("root", &json!({"p": {"w": 2}, "q": {"x": "alpha_value", "z": 1}}));

        let edits = diff(&a, &b);
        assert!(edits.iter().any(|e| matches!(e, Edit::Move { .. })), "{:?}", edits);
    }

    #[test]
    fn test_distance_bounds() {
        assert_eq!(ast_distance("SELECT 1", "SELECT 1").unwrap(), 0.0);

        let d = ast_distance(
            "SELECT name FROM player WHERE id = 1",
            "SELECT team, COUNT(*) FROM match GROUP BY team ORDER BY 2 DESC",
        )
        .unwrap();
        assert!(d > 0.0 && d <= 1.0, "{}", d);
    }

    #[test]
    fn test_closer_query_has_smaller_distance() {
        let reference = "SELECT name FROM player WHERE height > 180";
        let near = ast_distance("SELECT name FROM player WHERE height > 185", reference).unwrap();
        let far = ast_distance("SELECT COUNT(*) FROM team", reference).unwrap();
        assert!(near < far, "near={} far={}", near, far);
    }

    #[test]
    fn test_empty_trees() {
        assert_eq!(tree_distance(&SqlTree::default(), &SqlTree::default()), 0.0);
    }
}
