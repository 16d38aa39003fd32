use crate::error::ModelError;
use crate::models::xgboost::json::TreeDef;

/// One regression tree in array-of-nodes form.
///
/// A node is a leaf when its left child is `-1`; leaves keep their value in
/// `split_condition`, as the JSON format does.
#[derive(Debug, Clone)]
pub struct RegTree {
    left: Vec<i32>,
    right: Vec<i32>,
    split_index: Vec<usize>,
    split_condition: Vec<f32>,
    default_left: Vec<bool>,
    cover: Vec<f64>,
    mean_value: Vec<f64>,
    depth: usize,
}

impl RegTree {
    pub fn from_def(def: TreeDef) -> Result<Self, ModelError> {
        let n = def.tree_param.num_nodes.max(0) as usize;
        let lengths = [
            ("left_children", def.left_children.len()),
            ("right_children", def.right_children.len()),
            ("split_indices", def.split_indices.len()),
            ("split_conditions", def.split_conditions.len()),
            ("default_left", def.default_left.len()),
            ("sum_hessian", def.sum_hessian.len()),
        ];
        if n == 0 {
            return Err(ModelError::Malformed("tree has no nodes".to_string()));
        }
        if let Some((field, len)) = lengths.iter().find(|(_, len)| *len != n) {
            return Err(ModelError::Malformed(format!(
                "tree field {} has {} entries for {} nodes",
                field, len, n
            )));
        }
        if def.split_type.iter().any(|&t| t != 0) {
            return Err(ModelError::Unsupported(
                "categorical splits are not supported".to_string(),
            ));
        }
        for node in 0..n {
            let (l, r) = (def.left_children[node], def.right_children[node]);
            let is_leaf = l == -1;
            let in_range = |c: i32| c > node as i32 && (c as usize) < n;
            if !is_leaf && !(in_range(l) && in_range(r)) {
                return Err(ModelError::Malformed(format!(
                    "node {} has invalid children ({}, {})",
                    node, l, r
                )));
            }
            if !is_leaf && def.split_indices[node] < 0 {
                return Err(ModelError::Malformed(format!(
                    "node {} splits on negative feature {}",
                    node, def.split_indices[node]
                )));
            }
        }

        let mut tree = RegTree {
            left: def.left_children,
            right: def.right_children,
            split_index: def.split_indices.into_iter().map(|i| i.max(0) as usize).collect(),
            split_condition: def.split_conditions,
            default_left: def.default_left,
            cover: def.sum_hessian,
            mean_value: vec![0.0; n],
            depth: 0,
        };
        tree.fill_mean_value(0);
        tree.depth = tree.node_depth(0);
        Ok(tree)
    }

    #[inline]
    pub fn is_leaf(&self, node: usize) -> bool {
        self.left[node] == -1
    }

    #[inline]
    pub fn left_child(&self, node: usize) -> usize {
        self.left[node] as usize
    }

    #[inline]
    pub fn right_child(&self, node: usize) -> usize {
        self.right[node] as usize
    }

    #[inline]
    pub fn split_index(&self, node: usize) -> usize {
        self.split_index[node]
    }

    #[inline]
    pub fn leaf_value(&self, node: usize) -> f32 {
        self.split_condition[node]
    }

    /// Hessian sum of the training rows that reached the node.
    #[inline]
    pub fn cover(&self, node: usize) -> f64 {
        self.cover[node]
    }

    /// Cover-weighted mean of the leaf values below the node.
    #[inline]
    pub fn mean_value(&self, node: usize) -> f64 {
        self.mean_value[node]
    }

    /// Number of split levels on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Child taken by a row at an internal node; `NaN` or absent features
    /// follow the default direction.
    #[inline]
    pub fn next(&self, node: usize, row: &[f32]) -> usize {
        let fvalue = row.get(self.split_index[node]).copied().unwrap_or(f32::NAN);
        let go_left = if fvalue.is_nan() {
            self.default_left[node]
        } else {
            fvalue < self.split_condition[node]
        };
        if go_left {
            self.left_child(node)
        } else {
            self.right_child(node)
        }
    }

    /// Leaf value reached by a row.
    pub fn predict(&self, row: &[f32]) -> f32 {
        let mut node = 0;
        while !self.is_leaf(node) {
            node = self.next(node, row);
        }
        self.leaf_value(node)
    }

    fn fill_mean_value(&mut self, node: usize) -> f64 {
        let value = if self.is_leaf(node) {
            self.leaf_value(node) as f64
        } else {
            let (l, r) = (self.left_child(node), self.right_child(node));
            let lv = self.fill_mean_value(l) * self.cover[l];
            let rv = self.fill_mean_value(r) * self.cover[r];
            (lv + rv) / self.cover[node]
        };
        self.mean_value[node] = value;
        value
    }

    fn node_depth(&self, node: usize) -> usize {
        if self.is_leaf(node) {
            0
        } else {
            1 + self
                .node_depth(self.left_child(node))
                .max(self.node_depth(self.right_child(node)))
        }
    }
}
