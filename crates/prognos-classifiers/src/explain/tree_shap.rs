//! TreeSHAP for a single tree.
//!
//! Exact path-dependent SHAP values in polynomial time, from Lundberg et al.
//! "Consistent Individualized Feature Attribution for Tree Ensembles". This
//! is the same recursion XGBoost runs for `pred_contribs=True`, so the sum of
//! the contributions plus the bias term equals the tree's raw output.

use crate::models::xgboost::RegTree;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: i64,
    zero_fraction: f64,
    one_fraction: f64,
    pweight: f64,
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: i64) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let d = depth as f64;
    for i in (0..depth).rev() {
        let fi = i as f64;
        path[i + 1].pweight += one_fraction * path[i].pweight * (fi + 1.0) / (d + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (d - fi) / (d + 1.0);
    }
}

fn unwind_path(path: &mut Vec<PathElement>, path_index: usize) {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (d - fi) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero_fraction * (d - fi));
        }
    }

    for i in path_index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

fn unwound_path_sum(path: &[PathElement], path_index: usize) -> f64 {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * ((d - fi) / (d + 1.0));
        } else if zero_fraction != 0.0 {
            total += (path[i].pweight / zero_fraction) / ((d - fi) / (d + 1.0));
        }
    }
    total
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &RegTree,
    row: &[f32],
    phi: &mut [f64],
    node: usize,
    mut path: Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: i64,
    scale: f64,
) {
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    if tree.is_leaf(node) {
        let leaf = tree.leaf_value(node) as f64 * scale;
        for i in 1..path.len() {
            let w = unwound_path_sum(&path, i);
            let el = path[i];
            phi[el.feature as usize] += w * (el.one_fraction - el.zero_fraction) * leaf;
        }
        return;
    }

    let split = tree.split_index(node);
    let hot = tree.next(node, row);
    let cold = if hot == tree.left_child(node) {
        tree.right_child(node)
    } else {
        tree.left_child(node)
    };
    let cover = tree.cover(node);
    let hot_zero_fraction = tree.cover(hot) / cover;
    let cold_zero_fraction = tree.cover(cold) / cover;

    // a feature split on twice along the path is undone and redone here
    let mut incoming_zero_fraction = 1.0;
    let mut incoming_one_fraction = 1.0;
    if let Some(idx) = path.iter().position(|el| el.feature == split as i64) {
        incoming_zero_fraction = path[idx].zero_fraction;
        incoming_one_fraction = path[idx].one_fraction;
        unwind_path(&mut path, idx);
    }

    recurse(
        tree,
        row,
        phi,
        hot,
        path.clone(),
        hot_zero_fraction * incoming_zero_fraction,
        incoming_one_fraction,
        split as i64,
        scale,
    );
    recurse(
        tree,
        row,
        phi,
        cold,
        path,
        cold_zero_fraction * incoming_zero_fraction,
        0.0,
        split as i64,
        scale,
    );
}

/// Add one tree's contributions for `row` into `phi`.
///
/// `phi` holds one slot per feature followed by the bias slot; the bias
/// receives the tree's expected value. `scale` multiplies every leaf (tree
/// weights in DART ensembles, `1.0` otherwise).
pub fn tree_contributions(tree: &RegTree, row: &[f32], phi: &mut [f64], scale: f64) {
    let bias = phi.len() - 1;
    phi[bias] += tree.mean_value(0) * scale;
    if tree.depth() == 0 {
        return;
    }
    let path = Vec::with_capacity(tree.depth() + 2);
    recurse(tree, row, phi, 0, path, 1.0, 1.0, -1, scale);
}
