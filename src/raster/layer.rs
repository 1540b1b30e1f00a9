//! Raster containers: per-object patches, the class layer stack and the
//! final composite mask.

use std::collections::BTreeMap;
use std::path::Path;

use crate::annotation::ClassId;
use crate::error::LogmaskError;

/// The occupancy of one decoded object, already clipped to the image.
///
/// A patch covers the rectangle `[top, top + height) x [left, left + width)`
/// of the image; set cells are the pixels the object claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    class: ClassId,
    top: usize,
    left: usize,
    height: usize,
    width: usize,
    cells: Vec<bool>,
}

impl Patch {
    /// Creates an all-clear patch over the given image rectangle.
    pub fn new(class: ClassId, top: usize, left: usize, height: usize, width: usize) -> Self {
        Self {
            class,
            top,
            left,
            height,
            width,
            cells: vec![false; height * width],
        }
    }

    /// A patch that claims nothing.
    pub fn empty(class: ClassId) -> Self {
        Self::new(class, 0, 0, 0, 0)
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Marks the image pixel `(row, col)`. Pixels outside the patch are ignored.
    #[inline]
    pub fn mark(&mut self, row: usize, col: usize) {
        if let Some(i) = self.local_index(row, col) {
            self.cells[i] = true;
        }
    }

    /// True if the image pixel `(row, col)` is claimed.
    #[inline]
    pub fn is_marked(&self, row: usize, col: usize) -> bool {
        self.local_index(row, col).is_some_and(|i| self.cells[i])
    }

    #[inline]
    fn local_index(&self, row: usize, col: usize) -> Option<usize> {
        let r = row.checked_sub(self.top)?;
        let c = col.checked_sub(self.left)?;
        (r < self.height && c < self.width).then(|| r * self.width + c)
    }

    /// Number of claimed pixels.
    pub fn area(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Iterates claimed pixels as image `(row, col)`.
    pub fn marked(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c)
            .map(move |(i, _)| (self.top + i / width, self.left + i % width))
    }
}

/// Per-class occupancy volume indexed `[class, row, column]`.
///
/// Each cell is 0 or the owning class id.
#[derive(Clone, Debug)]
pub struct ClassLayerStack {
    layers: usize,
    height: usize,
    width: usize,
    cells: Vec<u8>,
}

impl ClassLayerStack {
    /// Allocates an all-clear stack.
    ///
    /// Sizes taken from a document should first go through
    /// [`check_image_size`](crate::pipeline::check_image_size).
    pub fn new(layers: usize, height: usize, width: usize) -> Self {
        Self {
            layers,
            height,
            width,
            cells: vec![0; layers * height * width],
        }
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// The full layer of `class`, row-major. Empty if the class has no layer.
    pub fn layer(&self, class: ClassId) -> &[u8] {
        let plane = self.height * self.width;
        let start = class.index() * plane;
        self.cells.get(start..start + plane).unwrap_or(&[])
    }

    /// One row of the layer of `class`.
    pub fn layer_row(&self, class: ClassId, row: usize) -> &[u8] {
        let layer = self.layer(class);
        let start = row * self.width;
        layer.get(start..start + self.width).unwrap_or(&[])
    }

    /// Value at `(class, row, col)`; 0 when out of range.
    pub fn get(&self, class: ClassId, row: usize, col: usize) -> u8 {
        if row >= self.height || col >= self.width {
            return 0;
        }
        self.layer(class)
            .get(row * self.width + col)
            .copied()
            .unwrap_or(0)
    }

    /// True if any pixel of `class` is set.
    pub fn is_claimed(&self, class: ClassId) -> bool {
        self.layer(class).iter().any(|&v| v > 0)
    }

    /// Merges a patch into its class layer: claimed pixels take the class id,
    /// every other pixel keeps its value.
    pub fn merge_patch(&mut self, patch: &Patch) {
        let value = patch.class.as_u8();
        if value == 0 || patch.class.index() >= self.layers {
            return;
        }
        let base = patch.class.index() * self.height * self.width;
        for (row, col) in patch.marked() {
            if row < self.height && col < self.width {
                self.cells[base + row * self.width + col] = value;
            }
        }
    }
}

/// The single-channel label image produced by compositing.
#[derive(Clone, PartialEq, Eq)]
pub struct CompositeMask {
    height: usize,
    width: usize,
    labels: Vec<u8>,
}

impl CompositeMask {
    pub(crate) fn from_labels(height: usize, width: usize, labels: Vec<u8>) -> Self {
        debug_assert_eq!(labels.len(), height * width);
        Self {
            height,
            width,
            labels,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Label at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the pixel is outside the mask.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        assert!(row < self.height && col < self.width, "pixel out of bounds");
        self.labels[row * self.width + col]
    }

    /// Row-major labels.
    pub fn as_slice(&self) -> &[u8] {
        &self.labels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.labels
    }

    /// True if every pixel is background.
    pub fn is_background(&self) -> bool {
        self.labels.iter().all(|&v| v == 0)
    }

    /// Pixel count per label present in the mask.
    pub fn histogram(&self) -> BTreeMap<u8, usize> {
        let mut counts = [0usize; 256];
        for &v in &self.labels {
            counts[v as usize] += 1;
        }
        counts
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(v, &n)| (v as u8, n))
            .collect()
    }

    /// Converts the mask to an 8-bit grayscale image.
    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([self.labels[y as usize * self.width + x as usize]])
        })
    }

    /// Writes the mask as an 8-bit grayscale PNG.
    pub fn write_png(&self, path: &Path) -> Result<(), LogmaskError> {
        self.to_gray_image()
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| LogmaskError::MaskWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl std::fmt::Debug for CompositeMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMask")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("histogram", &self.histogram())
            .finish()
    }
}
