//! Generic labelled tree over a parsed SQL statement.
//!
//! The statement is serialized to JSON and walked: enum variants become
//! node labels, struct fields become labelled children, scalars become
//! leaves carrying a value. Nulls and empty lists are omitted, so optional
//! clauses that are absent do not count as nodes.

use crate::eval::normalize::parse_statement;
use crate::types::Result;
use serde_json::Value;
use sqlparser::ast::Statement;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Label for list elements that carry no variant name.
const ITEM_LABEL: &str = "item";

/// One node of a `SqlTree`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,

    /// Scalar text for leaves
    pub value: Option<String>,

    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-allocated tree; node 0 is the root when the tree is non-empty.
#[derive(Debug, Clone, Default)]
pub struct SqlTree {
    nodes: Vec<TreeNode>,
}

impl SqlTree {
    /// Parse `sql` (first statement) and build its tree.
    pub fn parse(sql: &str) -> Result<Self> {
        Self::from_statement(&parse_statement(sql)?)
    }

    pub fn from_statement(statement: &Statement) -> Result<Self> {
        let value = serde_json::to_value(statement)?;
        Ok(Self::from_json("Statement", &value))
    }

    /// Build a tree from any JSON value.
    pub fn from_json(root_label: &str, value: &Value) -> Self {
        let mut tree = Self::default();
        tree.build(root_label, value, None);
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<usize> {
        (!self.nodes.is_empty()).then_some(0)
    }

    pub fn node(&self, id: usize) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (usize, &TreeNode)> {
        self.nodes.iter().enumerate()
    }

    /// Node ids in post-order (children before parents).
    pub fn post_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if let Some(root) = self.root() {
            self.collect_post_order(root, &mut order);
        }
        order
    }

    fn collect_post_order(&self, id: usize, order: &mut Vec<usize>) {
        for &child in &self.nodes[id].children {
            self.collect_post_order(child, order);
        }
        order.push(id);
    }

    /// Leaf ids below (or equal to) `id`.
    pub fn leaves(&self, id: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.is_leaf() {
                leaves.push(current);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        leaves
    }

    /// Whether `id` lies in the subtree rooted at `ancestor`.
    pub fn is_descendant(&self, mut id: usize, ancestor: usize) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes[id].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Structural hash of every subtree, indexed by node id.
    pub fn subtree_hashes(&self) -> Vec<u64> {
        let mut hashes = vec![0u64; self.nodes.len()];
        for id in self.post_order() {
            let node = &self.nodes[id];
            let mut hasher = DefaultHasher::new();
            node.label.hash(&mut hasher);
            node.value.hash(&mut hasher);
            for &child in &node.children {
                hashes[child].hash(&mut hasher);
            }
            hashes[id] = hasher.finish();
        }
        hashes
    }

    fn push(&mut self, label: &str, value: Option<String>, parent: Option<usize>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            label: label.to_string(),
            value,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn build(&mut self, label: &str, value: &Value, parent: Option<usize>) {
        match value {
            Value::Null => {}
            Value::Array(items) if items.is_empty() => {}
            Value::Object(map) if map.is_empty() => {}
            Value::Bool(b) => {
                self.push(label, Some(b.to_string()), parent);
            }
            Value::Number(n) => {
                self.push(label, Some(n.to_string()), parent);
            }
            Value::String(s) => {
                self.push(label, Some(s.clone()), parent);
            }
            Value::Array(_) => {
                let id = self.push(label, None, parent);
                self.build_children(value, id);
            }
            Value::Object(map) => {
                // externally tagged enum variant: {"Variant": content}
                if map.len() == 1 {
                    if let Some((variant, content)) = map.iter().next() {
                        if is_variant_name(variant) {
                            let id = self.push(variant, None, parent);
                            self.build_children(content, id);
                            return;
                        }
                    }
                }
                let id = self.push(label, None, parent);
                self.build_children(value, id);
            }
        }
    }

    fn build_children(&mut self, value: &Value, id: usize) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.build(key, child, Some(id));
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.build(ITEM_LABEL, item, Some(id));
                }
            }
            Value::Null => {}
            scalar => self.build("value", scalar, Some(id)),
        }
    }
}

fn is_variant_name(key: &str) -> bool {
    key.chars().next().map_or(false, |c| c.is_ascii_uppercase())
}
