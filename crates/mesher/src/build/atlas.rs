//! UV atlas packing.
//!
//! Every UV-bearing face contributes one box sized by the world-space arclength
//! of its iso-curves. Boxes are packed into a single growing square with the
//! potpack shelf heuristic and each face's normalized UVs are remapped into the
//! shared `[0,1]²` atlas.

use shared::FaceRecord;

/// Packing rectangle for one face. `face` indexes the face record list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvBox {
    pub face: usize,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

impl UvBox {
    pub fn new(face: usize, width: f64, height: f64) -> Self {
        Self {
            face,
            width,
            height,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn overlaps(&self, other: &UvBox) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Extent of a finished packing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PackStats {
    pub width: f64,
    pub height: f64,
    /// Box area over packed area
    pub fill: f64,
}

impl PackStats {
    /// Side of the square the atlas is normalized by
    pub fn side(&self) -> f64 {
        self.width.max(self.height)
    }
}

#[derive(Debug, Clone, Copy)]
struct Space {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Places every box without overlap, writing `x`/`y` only.
///
/// Boxes are visited tallest first, but the slice order is left untouched.
pub fn potpack(boxes: &mut [UvBox]) -> PackStats {
    let mut area = 0.0;
    let mut max_width: f64 = 0.0;
    for b in boxes.iter() {
        area += b.width * b.height;
        max_width = max_width.max(b.width);
    }

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| boxes[b].height.total_cmp(&boxes[a].height));

    // Aim for a squarish result
    let start_width = (area / 0.95).sqrt().ceil().max(max_width);
    let mut spaces = vec![Space {
        x: 0.0,
        y: 0.0,
        w: start_width,
        h: f64::INFINITY,
    }];

    let mut width: f64 = 0.0;
    let mut height: f64 = 0.0;

    for &idx in &order {
        let b = &mut boxes[idx];
        // Smaller spaces sit at the end
        for i in (0..spaces.len()).rev() {
            let space = spaces[i];
            if b.width > space.w || b.height > space.h {
                continue;
            }

            b.x = space.x;
            b.y = space.y;
            height = height.max(b.y + b.height);
            width = width.max(b.x + b.width);

            if b.width == space.w && b.height == space.h {
                spaces.swap_remove(i);
            } else if b.height == space.h {
                spaces[i].x += b.width;
                spaces[i].w -= b.width;
            } else if b.width == space.w {
                spaces[i].y += b.height;
                spaces[i].h -= b.height;
            } else {
                spaces.push(Space {
                    x: space.x + b.width,
                    y: space.y,
                    w: space.w - b.width,
                    h: b.height,
                });
                spaces[i].y += b.height;
                spaces[i].h -= b.height;
            }
            break;
        }
    }

    let fill = if width * height > 0.0 { area / (width * height) } else { 0.0 };
    PackStats { width, height, fill }
}

/// Pads, packs and remaps face UVs in place.
///
/// `boxes` arrive sized by raw arclength; `padding` is added to both sides
/// here and a half margin surrounds every island. No-op without boxes.
pub fn pack_faces(faces: &mut [FaceRecord], boxes: &mut [UvBox], padding: f64) -> PackStats {
    if boxes.is_empty() {
        return PackStats::default();
    }

    for b in boxes.iter_mut() {
        b.width += padding;
        b.height += padding;
    }
    let stats = potpack(boxes);
    let side = stats.side();
    if side <= 0.0 {
        tracing::warn!("atlas packing produced an empty square, UVs left normalized");
        return stats;
    }

    for b in boxes.iter() {
        let Some(face) = faces.get_mut(b.face) else {
            continue;
        };
        for uv in face.uv_coord.chunks_exact_mut(2) {
            uv[0] = (uv[0] * (b.width - padding) + b.x + padding * 0.5) / side;
            uv[1] = (uv[1] * (b.height - padding) + b.y + padding * 0.5) / side;
        }
    }

    tracing::debug!(
        "pack_faces: {} islands in {:.3} x {:.3} (fill {:.2})",
        boxes.len(),
        stats.width,
        stats.height,
        stats.fill
    );
    stats
}
