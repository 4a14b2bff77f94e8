//! Raster output: the difference-matrix heat map and the Motion Tree
//! dendrogram.
//!
//! Both artefacts are drawn into a `tiny-skia` pixmap and written as PNG.
//! The renderings are deliberately plain rasters without axis text; they
//! mirror what the interactive shells show and what lands next to the
//! numeric artefacts on disk.

use std::io;
use std::path::Path;

use tiny_skia::{
    Color, ColorU8, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::dendrogram::Dendrogram;
use crate::error::{Error, Result};
use crate::float::Float;
use crate::matrix::SquareMatrix;

const MARGIN: f32 = 24.0;
const PLOT_HEIGHT: f32 = 432.0;
const SLOT_WIDTH: f32 = 48.0;

/// Render the distance-difference matrix as a heat map and write it as PNG.
///
/// Cells are coloured on a perceptual dark-to-bright ramp scaled to the
/// largest finite entry, one or more pixels per cell depending on the
/// matrix order.
pub fn save_heat_map<T: Float>(diff: &SquareMatrix<T>, path: &Path) -> Result<()> {
    let n = diff.order();
    let scale = if n == 0 { 1 } else { (720 / n).clamp(1, 12) };
    let size = (n.max(1) * scale) as u32;
    let mut pixmap = new_pixmap(size, size, path)?;

    let mut vmax = 0.0f64;
    for &v in diff.as_slice() {
        if v.is_finite() && v.to_f64() > vmax {
            vmax = v.to_f64();
        }
    }
    if vmax <= 0.0 {
        vmax = 1.0;
    }

    let width = pixmap.width() as usize;
    let pixels = pixmap.pixels_mut();
    for i in 0..n {
        for j in 0..n {
            let v = diff[[i, j]];
            let t = if v.is_finite() { (v.to_f64() / vmax) as f32 } else { 1.0 };
            let color = ramp(t).premultiply();
            for dy in 0..scale {
                for dx in 0..scale {
                    pixels[(i * scale + dy) * width + j * scale + dx] = color;
                }
            }
        }
    }
    save(&pixmap, path)
}

/// Render the dendrogram truncated to the `max_merges` deepest merges and
/// write it as PNG, with a horizontal threshold line at the effective-node
/// magnitude.
///
/// The spatial proximity filter can produce inversions (a child drawn above
/// its parent); they are drawn as-is.
pub fn save_dendrogram<T: Float>(
    dend: &Dendrogram<T>,
    threshold: f64,
    max_merges: usize,
    path: &Path,
) -> Result<()> {
    let total = dend.len();
    let lo = total.saturating_sub(max_merges.max(1));
    let shown = total - lo;
    let leaves = shown + 1;

    let width = leaves as f32 * SLOT_WIDTH + 2.0 * MARGIN;
    let height = PLOT_HEIGHT + 2.0 * MARGIN;
    let mut pixmap = new_pixmap(width as u32, height as u32, path)?;
    pixmap.fill(Color::WHITE);

    let mut vmax = threshold;
    for step in &dend.steps()[lo..] {
        vmax = vmax.max(step.magnitude.to_f64());
    }
    vmax = if vmax > 0.0 { vmax * 1.05 } else { 1.0 };
    let y_of = |v: f64| MARGIN + PLOT_HEIGHT * (1.0 - (v / vmax) as f32);
    let x_of = |slot: f32| MARGIN + SLOT_WIDTH / 2.0 + slot * SLOT_WIDTH;

    if shown > 0 {
        let mut layout =
            Layout { dend, lo, child_xs: vec![[0.0; 2]; shown], next_slot: 0.0 };
        layout.place(total - 1);

        let mut low_links = PathBuilder::new();
        let mut high_links = PathBuilder::new();
        for idx in lo..total {
            let step = &dend[idx];
            let v = step.magnitude.to_f64();
            let links = if v >= threshold { &mut high_links } else { &mut low_links };
            let child_x = layout.child_xs[idx - lo];
            for (k, &label) in [step.cluster1, step.cluster2].iter().enumerate() {
                let child_v = match internal(dend, lo, label) {
                    Some(child) => dend[child].magnitude.to_f64(),
                    None => 0.0,
                };
                links.move_to(x_of(child_x[k]), y_of(child_v));
                links.line_to(x_of(child_x[k]), y_of(v));
            }
            links.move_to(x_of(child_x[0]), y_of(v));
            links.line_to(x_of(child_x[1]), y_of(v));
        }
        stroke(&mut pixmap, low_links, (106, 137, 204), 2.0);
        stroke(&mut pixmap, high_links, (60, 60, 72), 2.0);
    }

    // Threshold line across the full width.
    let mut cut = PathBuilder::new();
    cut.move_to(MARGIN / 2.0, y_of(threshold));
    cut.line_to(width - MARGIN / 2.0, y_of(threshold));
    stroke(&mut pixmap, cut, (0, 0, 0), 1.0);

    save(&pixmap, path)
}

/// Slot assignment for the truncated tree. Leaves receive consecutive
/// slots in traversal order, first cluster first; every shown merge stores
/// its two child positions and sits at their midpoint.
struct Layout<'a, T> {
    dend: &'a Dendrogram<T>,
    lo: usize,
    child_xs: Vec<[f32; 2]>,
    next_slot: f32,
}

impl<'a, T: Float> Layout<'a, T> {
    fn place(&mut self, idx: usize) -> f32 {
        let step = &self.dend[idx];
        let mut child_x = [0.0f32; 2];
        for (k, &label) in [step.cluster1, step.cluster2].iter().enumerate() {
            child_x[k] = match internal(self.dend, self.lo, label) {
                Some(child) => self.place(child),
                None => {
                    let x = self.next_slot;
                    self.next_slot += 1.0;
                    x
                }
            };
        }
        self.child_xs[idx - self.lo] = child_x;
        (child_x[0] + child_x[1]) / 2.0
    }
}

fn internal<T>(dend: &Dendrogram<T>, lo: usize, label: usize) -> Option<usize> {
    let n = dend.observations();
    if label >= n && label - n >= lo {
        Some(label - n)
    } else {
        None
    }
}

fn ramp(t: f32) -> ColorU8 {
    const ANCHORS: [[f32; 3]; 5] = [
        [68.0, 1.0, 84.0],
        [59.0, 82.0, 139.0],
        [33.0, 145.0, 140.0],
        [94.0, 201.0, 98.0],
        [253.0, 231.0, 37.0],
    ];
    let t = t.clamp(0.0, 1.0) * (ANCHORS.len() - 1) as f32;
    let i = (t.floor() as usize).min(ANCHORS.len() - 2);
    let f = t - i as f32;
    let mix = |a: f32, b: f32| (a + (b - a) * f) as u8;
    ColorU8::from_rgba(
        mix(ANCHORS[i][0], ANCHORS[i + 1][0]),
        mix(ANCHORS[i][1], ANCHORS[i + 1][1]),
        mix(ANCHORS[i][2], ANCHORS[i + 1][2]),
        255,
    )
}

fn new_pixmap(width: u32, height: u32, path: &Path) -> Result<Pixmap> {
    Pixmap::new(width.max(1), height.max(1)).ok_or_else(|| Error::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, "pixmap allocation failed"),
    })
}

fn stroke(pixmap: &mut Pixmap, links: PathBuilder, rgb: (u8, u8, u8), width: f32) {
    if let Some(path) = links.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgb.0, rgb.1, rgb.2, 255);
        paint.anti_alias = true;
        let stroke = Stroke { width, ..Stroke::default() };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

fn save(pixmap: &Pixmap, path: &Path) -> Result<()> {
    pixmap.save_png(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, e),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{ramp, save_dendrogram, save_heat_map};
    use crate::dendrogram::{Dendrogram, Step};
    use crate::matrix::SquareMatrix;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("motion-tree-{}-{}", std::process::id(), name))
    }

    #[test]
    fn ramp_covers_both_ends() {
        let low = ramp(0.0);
        let high = ramp(1.0);
        assert_eq!((low.red(), low.green(), low.blue()), (68, 1, 84));
        assert_eq!((high.red(), high.green(), high.blue()), (253, 231, 37));
    }

    #[test]
    fn heat_map_is_written() {
        let mut diff = SquareMatrix::new(4, 0.0f64);
        diff[[0, 3]] = 2.0;
        diff[[3, 0]] = 2.0;
        let path = scratch("heatmap.png");
        save_heat_map(&diff, &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn dendrogram_is_written_even_with_inversions() {
        let mut dend = Dendrogram::new(4);
        dend.push(Step::new(0, 1, 3.0f64, 2));
        // Inversion: later merge at a smaller magnitude.
        dend.push(Step::new(2, 4, 1.5, 3));
        dend.push(Step::new(3, 5, 6.0, 4));
        let path = scratch("dendrogram.png");
        save_dendrogram(&dend, 5.0, 12, &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_dendrogram_still_renders_the_threshold() {
        let dend: Dendrogram<f64> = Dendrogram::new(0);
        let path = scratch("empty-dendrogram.png");
        save_dendrogram(&dend, 5.0, 12, &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        fs::remove_file(&path).unwrap();
    }
}
