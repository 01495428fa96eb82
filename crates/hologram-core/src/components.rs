use ndarray::Array2;

use crate::frame::BBox;

/// Statistics for a single connected component.
#[derive(Clone, Debug)]
pub struct ComponentStats {
    pub label: u32,
    pub area: usize,
    /// Bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

impl ComponentStats {
    pub fn to_bbox(&self) -> BBox {
        let (min_row, max_row, min_col, max_col) = self.bbox;
        BBox::new(
            min_col as u32,
            min_row as u32,
            (max_col - min_col + 1) as u32,
            (max_row - min_row + 1) as u32,
        )
    }
}

/// Connected component analysis on a binary mask, two-pass labeling with
/// union-find, 8-connectivity (matches `cv2.connectedComponentsWithStats`'s
/// default).
///
/// Returns component statistics sorted by area descending (largest first).
pub fn connected_components(mask: &Array2<bool>) -> Vec<ComponentStats> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return Vec::new();
    }

    let mut labels = Array2::<u32>::zeros((h, w));
    let mut next_label: u32 = 1;
    let mut parent: Vec<u32> = vec![0; h * w / 2 + 2];

    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }

            // Already-visited neighbors under raster order with 8-connectivity:
            // up, up-left, up-right, left.
            let up = if row > 0 { labels[[row - 1, col]] } else { 0 };
            let up_left = if row > 0 && col > 0 {
                labels[[row - 1, col - 1]]
            } else {
                0
            };
            let up_right = if row > 0 && col + 1 < w {
                labels[[row - 1, col + 1]]
            } else {
                0
            };
            let left = if col > 0 { labels[[row, col - 1]] } else { 0 };

            let neighbors = [up, up_left, up_right, left];
            let existing: Vec<u32> = neighbors.iter().copied().filter(|&l| l > 0).collect();

            if existing.is_empty() {
                if next_label as usize >= parent.len() {
                    parent.resize(parent.len() * 2, 0);
                }
                parent[next_label as usize] = next_label;
                labels[[row, col]] = next_label;
                next_label += 1;
            } else {
                let smallest = *existing.iter().min().unwrap();
                labels[[row, col]] = smallest;
                for &other in &existing {
                    if other != smallest {
                        union(&mut parent, smallest, other);
                    }
                }
            }
        }
    }

    for i in 1..next_label as usize {
        parent[i] = find(&parent, i as u32);
    }

    let mut stats_map = std::collections::HashMap::<u32, ComponentStats>::new();

    for row in 0..h {
        for col in 0..w {
            let lbl = labels[[row, col]];
            if lbl == 0 {
                continue;
            }
            let root = parent[lbl as usize];

            let entry = stats_map.entry(root).or_insert(ComponentStats {
                label: root,
                area: 0,
                bbox: (row, row, col, col),
            });

            entry.area += 1;
            entry.bbox.0 = entry.bbox.0.min(row);
            entry.bbox.1 = entry.bbox.1.max(row);
            entry.bbox.2 = entry.bbox.2.min(col);
            entry.bbox.3 = entry.bbox.3.max(col);
        }
    }

    let mut components: Vec<ComponentStats> = stats_map.into_values().collect();
    components.sort_unstable_by(|a, b| b.area.cmp(&a.area));
    components
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_square_is_one_component() {
        let mut mask = Array2::from_elem((10, 10), false);
        for r in 2..5 {
            for c in 2..5 {
                mask[[r, c]] = true;
            }
        }
        let comps = connected_components(&mask);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].area, 9);
        assert_eq!(comps[0].bbox, (2, 4, 2, 4));
    }

    #[test]
    fn diagonal_touch_merges_under_8_connectivity() {
        let mut mask = Array2::from_elem((10, 10), false);
        mask[[2, 2]] = true;
        mask[[3, 3]] = true;
        let comps = connected_components(&mask);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].area, 2);
    }

    #[test]
    fn disjoint_blocks_are_separate_components() {
        let mut mask = Array2::from_elem((10, 10), false);
        mask[[1, 1]] = true;
        mask[[8, 8]] = true;
        let comps = connected_components(&mask);
        assert_eq!(comps.len(), 2);
    }
}
