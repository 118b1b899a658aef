//! Call-tree aggregation for flame graphs.
//!
//! Entries are folded into a tree keyed by call-chain labels. Each entry's
//! weight lands on the *leaf* of its chain only; a separate rollup pass then
//! makes every node's value the sum of its own weight and all descendants.
//! The rollup cannot happen during insertion because the same node can be an
//! inner segment for one entry and the leaf for another.
//!
//! ```text
//! main -> update -> draw   (40)          root 100
//! main -> update           (10)   ==>    └─ main 100
//! main -> idle             (50)             ├─ idle 50
//!                                           └─ update 50
//!                                              └─ draw 40
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use crate::domain::Metric;
use crate::profile::SampleEntry;

/// Label of the synthetic root node
pub const ROOT_LABEL: &str = "root";

/// Height of one flame bar
pub const BAR_HEIGHT: f64 = 18.0;

/// Vertical gap between stacked levels
pub const LEVEL_PAD: f64 = 2.0;

/// Canvas width that the root's total is scaled to
pub const CANVAS_WIDTH: f64 = 1200.0;

/// A node of the aggregated call tree
///
/// Children keep insertion order so that equal-valued siblings are laid out
/// in the order they were first encountered.
#[derive(Debug, Clone)]
pub struct FlameNode {
    pub name: String,
    pub value: f64,
    pub children: IndexMap<String, FlameNode>,
}

impl FlameNode {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), value: 0.0, children: IndexMap::new() }
    }

    /// Children ordered by value, largest first; ties keep encounter order
    #[must_use]
    pub fn sorted_children(&self) -> Vec<&FlameNode> {
        let mut children: Vec<&FlameNode> = self.children.values().collect();
        children.sort_by(|a, b| b.value.total_cmp(&a.value));
        children
    }

    /// Serializable `{name, value, children}` view with sorted children
    #[must_use]
    pub fn to_json(&self) -> FlameJson {
        FlameJson {
            name: self.name.clone(),
            value: self.value,
            children: self.sorted_children().into_iter().map(FlameNode::to_json).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlameJson {
    pub name: String,
    pub value: f64,
    pub children: Vec<FlameJson>,
}

/// Fold entries into a rolled-up call tree weighted by `metric`
///
/// Entries with zero weight are skipped.
// Weights are reported as floats, matching the rendered widths
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn build_flame_tree(entries: &[SampleEntry], metric: Metric) -> FlameNode {
    let mut root = FlameNode::new(ROOT_LABEL);

    for entry in entries {
        let weight = entry.weight(metric) as f64;
        if weight <= 0.0 {
            continue;
        }

        let mut cur = &mut root;
        for label in entry.chain_labels() {
            cur = cur.children.entry(label.clone()).or_insert_with(|| FlameNode::new(&label));
        }
        cur.value += weight;
    }

    rollup(&mut root);
    root
}

fn rollup(node: &mut FlameNode) -> f64 {
    let descendants: f64 = node.children.values_mut().map(rollup).sum();
    node.value += descendants;
    node.value
}

/// One laid-out bar of the flame graph
#[derive(Debug, Clone, Serialize)]
pub struct FlameRect {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub value: f64,
    pub depth: usize,
}

/// Horizontal strips stacked top-down, one per tree level
#[derive(Debug, Clone, Serialize)]
pub struct FlameLayout {
    pub width: f64,
    pub height: f64,
    pub rects: Vec<FlameRect>,
}

/// Lay out a rolled-up tree; `None` when there is no positive weight
// Depth counts are small and converted to canvas units
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn layout(root: &FlameNode) -> Option<FlameLayout> {
    let total = root.value;
    if total <= 0.0 {
        return None;
    }

    let mut rects = Vec::new();
    let mut depth_max = 0;
    layout_level(root, 0.0, 0, CANVAS_WIDTH / total, &mut rects, &mut depth_max);

    Some(FlameLayout {
        width: CANVAS_WIDTH,
        height: (depth_max + 1) as f64 * (BAR_HEIGHT + LEVEL_PAD),
        rects,
    })
}

// Level counts are small, the float conversion is exact
#[allow(clippy::cast_precision_loss)]
fn layout_level(
    node: &FlameNode,
    x0: f64,
    depth: usize,
    scale: f64,
    rects: &mut Vec<FlameRect>,
    depth_max: &mut usize,
) {
    *depth_max = (*depth_max).max(depth);
    let y = depth as f64 * (BAR_HEIGHT + LEVEL_PAD);

    let mut x = x0;
    for child in node.sorted_children() {
        let w = child.value * scale;
        if w <= 0.0 {
            continue;
        }
        rects.push(FlameRect {
            name: child.name.clone(),
            x,
            y,
            w,
            h: BAR_HEIGHT,
            value: child.value,
            depth,
        });
        layout_level(child, x, depth + 1, scale, rects, depth_max);
        x += w;
    }
}

/// Deterministic fill color for a label
///
/// Order-dependent accumulation over the characters, so the same label
/// always gets the same hue across runs.
#[must_use]
pub fn label_color(label: &str) -> String {
    let hash = label
        .chars()
        .fold(0u32, |h, ch| h.wrapping_mul(131).wrapping_add(u32::from(ch)));
    format!("hsl({} 65% 55%)", hash % 360)
}
