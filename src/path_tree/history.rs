//! Recently used documents and the background shading derived from them
//!
//! Two bounded rings record which documents were activated and edited most
//! recently. Documents near the front of the rings get a stronger tint, with
//! the edit shade blended in for documents that were also edited.

use super::node::NodeId;
use crate::config::Rgb;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Most recent first, bounded, without duplicates
#[derive(Debug, Clone)]
pub struct RecentRing {
    entries: VecDeque<NodeId>,
    limit: usize,
}

impl RecentRing {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    /// Move `id` to the front, dropping the oldest entry past the limit
    pub fn touch(&mut self, id: NodeId) {
        self.forget(id);
        self.entries.push_front(id);
        self.entries.truncate(self.limit);
    }

    pub fn forget(&mut self, id: NodeId) {
        self.entries.retain(|&entry| entry != id);
    }

    /// 1-based position from the front
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.entries.iter().position(|&entry| entry == id).map(|p| p + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().copied()
    }
}

/// Colors used to compute shading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadePalette {
    pub base: Rgb,
    pub view: Rgb,
    pub edit: Rgb,
}

/// View and edit history plus the shades computed from them
#[derive(Debug, Clone)]
pub struct Recency {
    view: RecentRing,
    edit: RecentRing,
    palette: ShadePalette,
    shades: HashMap<NodeId, Rgb>,
}

impl Recency {
    pub fn new(limit: usize, palette: ShadePalette) -> Self {
        Self {
            view: RecentRing::new(limit),
            edit: RecentRing::new(limit),
            palette,
            shades: HashMap::new(),
        }
    }

    pub fn activated(&mut self, id: NodeId) {
        self.view.touch(id);
    }

    pub fn edited(&mut self, id: NodeId) {
        self.edit.touch(id);
    }

    /// Drop a node from both rings and from the shade table
    pub fn forget(&mut self, id: NodeId) {
        self.view.forget(id);
        self.edit.forget(id);
        self.shades.remove(&id);
    }

    pub fn clear(&mut self) {
        self.view.clear();
        self.edit.clear();
        self.shades.clear();
    }

    pub fn palette(&self) -> ShadePalette {
        self.palette
    }

    /// Swap the colors; shades are stale until the next `recompute`
    pub fn set_palette(&mut self, palette: ShadePalette) {
        self.palette = palette;
    }

    pub fn view_history(&self) -> &RecentRing {
        &self.view
    }

    pub fn edit_history(&self) -> &RecentRing {
        &self.edit
    }

    pub fn shade(&self, id: NodeId) -> Option<Rgb> {
        self.shades.get(&id).copied()
    }

    /// Recompute all shades, returning every node whose shade was added,
    /// changed or dropped.
    pub fn recompute(&mut self) -> Vec<NodeId> {
        let shades = compute_shades(&self.view, &self.edit, &self.palette);

        let mut touched: Vec<NodeId> = shades
            .iter()
            .filter(|&(id, shade)| self.shades.get(id) != Some(shade))
            .map(|(&id, _)| id)
            .chain(self.shades.keys().filter(|id| !shades.contains_key(*id)).copied())
            .collect();
        touched.sort_unstable();

        self.shades = shades;
        touched
    }

    /// Drop all shades without touching the history, returning the nodes
    /// that lost one
    pub fn clear_shades(&mut self) -> Vec<NodeId> {
        let mut touched: Vec<NodeId> = self.shades.drain().map(|(id, _)| id).collect();
        touched.sort_unstable();
        touched
    }
}

fn compute_shades(view: &RecentRing, edit: &RecentRing, palette: &ShadePalette) -> HashMap<NodeId, Rgb> {
    // (view position, edit position), 0 when absent
    let mut positions: BTreeMap<NodeId, (usize, usize)> = BTreeMap::new();
    for (i, id) in view.iter().enumerate() {
        positions.entry(id).or_default().0 = i + 1;
    }
    for (i, id) in edit.iter().enumerate() {
        positions.entry(id).or_default().1 = i + 1;
    }

    let hc = view.len();
    let ec = edit.len();

    positions
        .into_iter()
        .map(|(id, (view_pos, edit_pos))| {
            let mut shade = palette.view;

            if edit_pos > 0 {
                let v = (hc - view_pos.min(hc)) as u64;
                let e = (ec - edit_pos + 1) as u64;
                let e = e.saturating_mul(e);
                let n = v.saturating_add(e).max(1);
                shade = weighted(palette.view, v, palette.edit, e, n);
            }

            let t = if hc == 0 {
                1.0
            } else {
                ((hc + 1 - view_pos) as f64 / hc as f64).clamp(0.0, 1.0)
            };

            (id, mix(palette.base, shade, t))
        })
        .collect()
}

fn weighted(a: Rgb, wa: u64, b: Rgb, wb: u64, n: u64) -> Rgb {
    let channel = |x: u8, y: u8| {
        let sum = (x as u128 * wa as u128) + (y as u128 * wb as u128);
        (sum / n as u128).min(255) as u8
    };
    (channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
}

/// Linear blend from `base` (t = 0) to `shade` (t = 1)
pub fn mix(base: Rgb, shade: Rgb, t: f64) -> Rgb {
    let channel = |b: u8, s: u8| (b as f64 + (s as f64 - b as f64) * t).round().clamp(0.0, 255.0) as u8;
    (channel(base.0, shade.0), channel(base.1, shade.1), channel(base.2, shade.2))
}
