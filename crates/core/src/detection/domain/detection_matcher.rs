use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::DEFAULT_MATCH_DISTANCE;

/// Pairs boxes from the previous detection round with boxes from the new one.
///
/// Greedy per-new-box assignment on center distance: every new box picks its
/// nearest old box within `max_distance`; when two new boxes pick the same
/// old box, the closer one keeps it and the other stays unmatched. This is
/// not a globally optimal assignment, and the cost is O(n·m).
#[derive(Clone, Copy, Debug)]
pub struct DetectionMatcher {
    max_distance: f64,
}

impl DetectionMatcher {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Returns `(old_index, new_index)` pairs. Each index appears at most once.
    pub fn match_boxes(
        &self,
        old_boxes: &[BoundingBox],
        new_boxes: &[BoundingBox],
    ) -> Vec<(usize, usize)> {
        if old_boxes.is_empty() || new_boxes.is_empty() {
            return Vec::new();
        }

        // claims[old] = (new, distance), first_claim keeps insertion order.
        let mut claims: Vec<Option<(usize, f64)>> = vec![None; old_boxes.len()];
        let mut first_claim: Vec<usize> = Vec::new();

        for (new_ix, new_box) in new_boxes.iter().enumerate() {
            let Some((old_ix, distance)) = self.nearest(old_boxes, new_box) else {
                continue;
            };
            match claims[old_ix] {
                None => {
                    claims[old_ix] = Some((new_ix, distance));
                    first_claim.push(old_ix);
                }
                Some((_, theirs)) if distance < theirs => {
                    claims[old_ix] = Some((new_ix, distance));
                }
                Some(_) => {}
            }
        }

        first_claim
            .into_iter()
            .filter_map(|old_ix| claims[old_ix].map(|(new_ix, _)| (old_ix, new_ix)))
            .collect()
    }

    /// Nearest old box within range; ties resolve to the lowest index.
    fn nearest(&self, old_boxes: &[BoundingBox], new_box: &BoundingBox) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (old_ix, old_box) in old_boxes.iter().enumerate() {
            let d = old_box.center_distance(new_box);
            if d > self.max_distance {
                continue;
            }
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((old_ix, d));
            }
        }
        best
    }
}

impl Default for DetectionMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_DISTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn bx(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(DetectionMatcher::default().max_distance(), 200.0);
    }

    #[test]
    fn test_empty_old_returns_empty() {
        let m = DetectionMatcher::default();
        assert!(m.match_boxes(&[], &[bx(0.0, 0.0, 10.0, 10.0)]).is_empty());
    }

    #[test]
    fn test_empty_new_returns_empty() {
        let m = DetectionMatcher::default();
        assert!(m.match_boxes(&[bx(0.0, 0.0, 10.0, 10.0)], &[]).is_empty());
    }

    #[test]
    fn test_far_boxes_never_match() {
        let m = DetectionMatcher::default();
        let matches = m.match_boxes(&[bx(0.0, 0.0, 10.0, 10.0)], &[bx(500.0, 500.0, 510.0, 510.0)]);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_distance_equal_to_threshold_matches() {
        let m = DetectionMatcher::new(200.0);
        let matches = m.match_boxes(&[bx(0.0, 0.0, 10.0, 10.0)], &[bx(200.0, 0.0, 210.0, 10.0)]);
        assert_eq!(matches, vec![(0, 0)]);
    }

    #[test]
    fn test_tie_break_keeps_closer_new_box() {
        let m = DetectionMatcher::default();
        let old = [bx(0.0, 0.0, 10.0, 10.0)];
        let new = [bx(1.0, 1.0, 11.0, 11.0), bx(3.0, 3.0, 13.0, 13.0)];
        assert_eq!(m.match_boxes(&old, &new), vec![(0, 0)]);
    }

    #[test]
    fn test_tie_break_closer_box_arriving_second_wins() {
        let m = DetectionMatcher::default();
        let old = [bx(0.0, 0.0, 10.0, 10.0)];
        let new = [bx(3.0, 3.0, 13.0, 13.0), bx(1.0, 1.0, 11.0, 11.0)];
        assert_eq!(m.match_boxes(&old, &new), vec![(0, 1)]);
    }

    #[test]
    fn test_each_new_box_picks_its_nearest_old_box() {
        let m = DetectionMatcher::default();
        let old = [bx(0.0, 0.0, 10.0, 10.0), bx(100.0, 100.0, 110.0, 110.0)];
        let new = [bx(102.0, 98.0, 112.0, 108.0), bx(-2.0, 1.0, 8.0, 11.0)];
        let mut matches = m.match_boxes(&old, &new);
        matches.sort();
        assert_eq!(matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_greedy_not_global_optimum() {
        // Both new boxes prefer old 0; new 1 loses and is left unmatched even
        // though old 1 is within range of it.
        let m = DetectionMatcher::new(50.0);
        let old = [bx(0.0, 0.0, 10.0, 10.0), bx(40.0, 0.0, 50.0, 10.0)];
        let new = [bx(1.0, 0.0, 11.0, 10.0), bx(15.0, 0.0, 25.0, 10.0)];
        assert_eq!(m.match_boxes(&old, &new), vec![(0, 0)]);
    }

    #[test]
    fn test_matching_is_partial_bijection() {
        let m = DetectionMatcher::default();
        let old: Vec<BoundingBox> = (0..6)
            .map(|i| bx(i as f64 * 30.0, 0.0, i as f64 * 30.0 + 20.0, 20.0))
            .collect();
        let new: Vec<BoundingBox> = (0..9)
            .map(|i| bx(i as f64 * 17.0, 5.0, i as f64 * 17.0 + 20.0, 25.0))
            .collect();
        let matches = m.match_boxes(&old, &new);
        let olds: HashSet<usize> = matches.iter().map(|(o, _)| *o).collect();
        let news: HashSet<usize> = matches.iter().map(|(_, n)| *n).collect();
        assert_eq!(olds.len(), matches.len());
        assert_eq!(news.len(), matches.len());
    }
}
