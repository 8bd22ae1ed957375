//! Metric bounds over generated inputs.

use proptest::prelude::*;
use sqleval::eval::{ast_distance, cosine_similarity};
use sqleval::schema::ratio;

/// Simple but varied SELECT statements.
fn select_sql() -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z][a-z0-9_]{0,6}", 1..4),
        "[a-z][a-z0-9_]{0,6}",
        prop::option::of(("[a-z][a-z0-9_]{0,6}", 0i64..1000)),
        prop::option::of(("[a-z][a-z0-9_]{0,6}", 0i64..1000)),
    )
        .prop_map(|(columns, table, first, second)| {
            let mut sql = format!("SELECT c_{} FROM t_{}", columns.join(", c_"), table);
            let conditions: Vec<String> = [first, second]
                .into_iter()
                .flatten()
                .map(|(column, value)| format!("w_{} = {}", column, value))
                .collect();
            if !conditions.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&conditions.join(" OR "));
            }
            sql
        })
}

proptest! {
    #[test]
    fn prop_cosine_bounded(a in select_sql(), b in select_sql()) {
        let similarity = cosine_similarity(&a, &b).unwrap();
        prop_assert!((0.0..=1.0).contains(&similarity));
    }

    #[test]
    fn prop_cosine_symmetric(a in select_sql(), b in select_sql()) {
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn prop_self_cosine_is_one(a in select_sql()) {
        prop_assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_self_distance_is_zero(a in select_sql()) {
        prop_assert_eq!(ast_distance(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn prop_distance_bounded(a in select_sql(), b in select_sql()) {
        let distance = ast_distance(&a, &b).unwrap();
        prop_assert!((0.0..=1.0).contains(&distance));
    }

    #[test]
    fn prop_fuzzy_ratio_symmetric_and_bounded(a in "[a-zA-Z_]{0,12}", b in "[a-zA-Z_]{0,12}") {
        let score = ratio(&a, &b);
        prop_assert!(score <= 100);
        prop_assert_eq!(score, ratio(&b, &a));
        if !a.is_empty() {
            prop_assert_eq!(ratio(&a, &a), 100);
        }
    }
}
