use ndarray::{s, Array2, ArrayView2, Zip};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::domain::box_tracker::{
    BoxTracker, BoxTrackerFactory, TrackAdvance, TrackerAlgorithm,
};

/// Max per-frame displacement searched, in tracking-resolution pixels.
pub const DEFAULT_SEARCH_RADIUS: usize = 8;

/// Templates smaller than this on either side cannot be tracked reliably.
const MIN_TEMPLATE_SIDE: usize = 4;

/// Mean absolute luma difference above which a SAD match counts as lost.
const MAX_MEAN_ABS_DIFF: f32 = 40.0;

/// Correlation below which an NCC match counts as lost.
const MIN_CORRELATION: f32 = 0.5;

const EPSILON: f32 = 1e-6;

struct Track {
    bbox: BoundingBox,
    x: usize,
    y: usize,
    template: Array2<f32>,
    centered: Array2<f32>,
    norm: f32,
}

impl Track {
    fn seed(gray: &Array2<f32>, bbox: &BoundingBox) -> Option<Track> {
        let (h, w) = gray.dim();
        let clamped = bbox.clamped(w as u32, h as u32)?;
        let (x, y, tw, th) = clamped.to_pixel_rect();
        let (x, y, tw, th) = (x.max(0) as usize, y.max(0) as usize, tw as usize, th as usize);
        let tw = tw.min(w.saturating_sub(x));
        let th = th.min(h.saturating_sub(y));
        if tw < MIN_TEMPLATE_SIDE || th < MIN_TEMPLATE_SIDE {
            return None;
        }

        let template = gray.slice(s![y..y + th, x..x + tw]).to_owned();
        let mean = template.mean().unwrap_or(0.0);
        let centered = template.mapv(|v| v - mean);
        let norm = centered.iter().map(|v| v * v).sum::<f32>().sqrt();
        Some(Track {
            bbox: *bbox,
            x,
            y,
            template,
            centered,
            norm,
        })
    }
}

/// Template-matching tracker: each box keeps the patch it was seeded with
/// and is re-located every frame by exhaustive search in a small window
/// around its last position.
pub struct TemplateTracker {
    algorithm: TrackerAlgorithm,
    search_radius: usize,
    tracks: Vec<Option<Track>>,
}

impl TemplateTracker {
    pub fn new(
        algorithm: TrackerAlgorithm,
        search_radius: usize,
        frame: &Frame,
        boxes: &[BoundingBox],
    ) -> Self {
        let gray = frame.to_grayscale();
        let tracks: Vec<Option<Track>> = boxes.iter().map(|b| Track::seed(&gray, b)).collect();
        let unusable = tracks.iter().filter(|t| t.is_none()).count();
        if unusable > 0 {
            log::debug!("{unusable} of {} boxes too small or off-frame to track", boxes.len());
        }
        Self {
            algorithm,
            search_radius,
            tracks,
        }
    }
}

impl BoxTracker for TemplateTracker {
    fn advance(&mut self, frame: &Frame) -> TrackAdvance {
        if self.tracks.is_empty() {
            return TrackAdvance::empty();
        }
        let gray = frame.to_grayscale();

        let (algorithm, radius) = (self.algorithm, self.search_radius);
        let mut boxes = Vec::with_capacity(self.tracks.len());
        for slot in &mut self.tracks {
            let moved = slot
                .as_ref()
                .and_then(|track| locate(algorithm, radius, &gray, track));
            let updated = match (slot.as_mut(), moved) {
                (Some(track), Some((x, y))) => {
                    let dx = x as f64 - track.x as f64;
                    let dy = y as f64 - track.y as f64;
                    track.bbox = track.bbox.translated(dx, dy);
                    track.x = x;
                    track.y = y;
                    Some(track.bbox)
                }
                _ => None,
            };
            if updated.is_none() {
                *slot = None;
            }
            boxes.push(updated);
        }
        self.tracks.retain(Option::is_some);

        TrackAdvance {
            ok: boxes.iter().all(Option::is_some),
            boxes,
        }
    }

    fn len(&self) -> usize {
        self.tracks.len()
    }
}

/// Best window position for `track`, or `None` if the match is too poor.
fn locate(
    algorithm: TrackerAlgorithm,
    search_radius: usize,
    gray: &Array2<f32>,
    track: &Track,
) -> Option<(usize, usize)> {
    let (h, w) = gray.dim();
    let (th, tw) = track.template.dim();
    if th > h || tw > w {
        return None;
    }

    let r = search_radius as isize;
    let mut best: Option<(usize, usize, f32, isize)> = None;
    for dy in -r..=r {
        for dx in -r..=r {
            let nx = track.x as isize + dx;
            let ny = track.y as isize + dy;
            if nx < 0 || ny < 0 || nx as usize + tw > w || ny as usize + th > h {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            let window = gray.slice(s![ny..ny + th, nx..nx + tw]);
            let score = match_score(algorithm, window, track);
            let displacement = dx.abs() + dy.abs();
            let better = match best {
                None => true,
                Some((_, _, bs, bd)) => score > bs || (score == bs && displacement < bd),
            };
            if better {
                best = Some((nx, ny, score, displacement));
            }
        }
    }

    let (x, y, score, _) = best?;
    let accepted = match algorithm {
        TrackerAlgorithm::Template => -score <= MAX_MEAN_ABS_DIFF,
        TrackerAlgorithm::Correlation => score >= MIN_CORRELATION,
    };
    accepted.then_some((x, y))
}

/// Higher is better for both algorithms.
fn match_score(algorithm: TrackerAlgorithm, window: ArrayView2<'_, f32>, track: &Track) -> f32 {
    match algorithm {
        TrackerAlgorithm::Template => -mean_abs_diff(window, &track.template),
        TrackerAlgorithm::Correlation => correlation(window, &track.centered, track.norm),
    }
}

fn mean_abs_diff(window: ArrayView2<'_, f32>, template: &Array2<f32>) -> f32 {
    let mut total = 0.0f32;
    Zip::from(window).and(template).for_each(|&a, &t| total += (a - t).abs());
    total / template.len().max(1) as f32
}

fn correlation(window: ArrayView2<'_, f32>, centered: &Array2<f32>, norm: f32) -> f32 {
    let mean = window.mean().unwrap_or(0.0);
    let mut num = 0.0f32;
    let mut den = 0.0f32;
    Zip::from(window).and(centered).for_each(|&a, &t| {
        let d = a - mean;
        num += d * t;
        den += d * d;
    });
    if den <= EPSILON || norm <= EPSILON {
        return 0.0;
    }
    num / (den.sqrt() * norm)
}

/// Creates [`TemplateTracker`]s for the configured algorithm.
#[derive(Clone, Copy, Debug)]
pub struct TemplateTrackerFactory {
    algorithm: TrackerAlgorithm,
    search_radius: usize,
}

impl TemplateTrackerFactory {
    pub fn new(algorithm: TrackerAlgorithm) -> Self {
        Self {
            algorithm,
            search_radius: DEFAULT_SEARCH_RADIUS,
        }
    }

    pub fn with_search_radius(mut self, search_radius: usize) -> Self {
        self.search_radius = search_radius;
        self
    }
}

impl BoxTrackerFactory for TemplateTrackerFactory {
    fn create(&self, frame: &Frame, boxes: &[BoundingBox]) -> Box<dyn BoxTracker> {
        Box::new(TemplateTracker::new(
            self.algorithm,
            self.search_radius,
            frame,
            boxes,
        ))
    }
}
