use image::{Rgba, RgbaImage};
use std::collections::{HashMap, VecDeque};

/// Tolerance (0-100) used when keying out a backdrop without a model.
pub const DEFAULT_TOLERANCE: f32 = 18.0;
/// Fringe width in pixels over which removal fades out.
pub const DEFAULT_SMOOTHNESS: u32 = 2;

/// Background keying without a model:
///
/// 1. **Seed colour**: the dominant colour along the image border.
/// 2. **Flood fill** (BFS) inwards from every border pixel that matches the
///    seed within `tolerance`, giving a binary core mask.
/// 3. **Mask dilation** by `smoothness` pixels.
/// 4. **Colour-to-alpha** on the dilated mask with RGB recovery, fading
///    linearly across the fringe.
///
/// Returns a new image of the same size. An image whose border is already
/// transparent comes back unchanged.
pub fn remove_edge_background(pixels: &RgbaImage, tolerance: f32, smoothness: u32) -> RgbaImage {
    let mut out = pixels.clone();
    let Some(seed) = dominant_border_color(pixels) else {
        return out;
    };
    let (w, h) = pixels.dimensions();
    let seed_rgb = [seed[0] as f32, seed[1] as f32, seed[2] as f32];
    let tol = tolerance.clamp(0.0, 100.0) * 2.55;
    let tol_sq = tol * tol;

    // ------------------------------------------------------------------------
    // Core mask: flood from the border
    // ------------------------------------------------------------------------
    let mut core_mask = vec![false; (w * h) as usize];
    let mut queue = VecDeque::with_capacity(((w + h) * 2) as usize);
    let matches = |p: &Rgba<u8>| p[3] == 0 || color_dist_sq(p, &seed_rgb) <= tol_sq;

    for (x, y) in border_coords(w, h) {
        let idx = (y * w + x) as usize;
        if !core_mask[idx] && matches(pixels.get_pixel(x, y)) {
            core_mask[idx] = true;
            queue.push_back((x, y));
        }
    }
    while let Some((px, py)) = queue.pop_front() {
        for (nx, ny) in neighbors(px, py) {
            if nx >= w || ny >= h {
                continue;
            }
            let idx = (ny * w + nx) as usize;
            if core_mask[idx] {
                continue;
            }
            if matches(pixels.get_pixel(nx, ny)) {
                core_mask[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Dilation: distance in rings from the core edge (0 = core)
    // ------------------------------------------------------------------------
    let mut distance: Vec<u32> = core_mask
        .iter()
        .map(|&m| if m { 0 } else { u32::MAX })
        .collect();

    if smoothness > 0 {
        let mut frontier = VecDeque::new();
        for y in 0..h {
            for x in 0..w {
                if !core_mask[(y * w + x) as usize] {
                    continue;
                }
                for (nx, ny) in neighbors(x, y) {
                    if nx >= w || ny >= h {
                        continue;
                    }
                    let nidx = (ny * w + nx) as usize;
                    if distance[nidx] == u32::MAX {
                        distance[nidx] = 1;
                        frontier.push_back((nx, ny));
                    }
                }
            }
        }
        while let Some((px, py)) = frontier.pop_front() {
            let cur = distance[(py * w + px) as usize];
            if cur >= smoothness {
                continue;
            }
            for (nx, ny) in neighbors(px, py) {
                if nx >= w || ny >= h {
                    continue;
                }
                let nidx = (ny * w + nx) as usize;
                if distance[nidx] == u32::MAX {
                    distance[nidx] = cur + 1;
                    frontier.push_back((nx, ny));
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Colour-to-alpha
    // ------------------------------------------------------------------------
    for (x, y, p) in out.enumerate_pixels_mut() {
        let dist = distance[(y * w + x) as usize];
        if dist == u32::MAX || p[3] == 0 {
            continue;
        }
        if let Some(rgba) = key_pixel(p, &seed_rgb, dist, smoothness) {
            *p = Rgba(rgba);
        }
    }
    out
}

/// GIMP-style colour-to-alpha for one pixel. `None` when the change is below
/// one alpha step.
fn key_pixel(p: &Rgba<u8>, seed_rgb: &[f32; 3], dist: u32, smoothness: u32) -> Option<[u8; 4]> {
    let (r, g, b) = (p[0] as f32, p[1] as f32, p[2] as f32);
    let max_d = ((r - seed_rgb[0]).abs())
        .max((g - seed_rgb[1]).abs())
        .max((b - seed_rgb[2]).abs())
        / 255.0;

    let mut removal = 1.0 - max_d;
    if dist > 0 && smoothness > 0 {
        removal *= 1.0 - (dist as f32 / (smoothness as f32 + 1.0));
    }
    let removal = removal.clamp(0.0, 1.0);
    if removal < 0.004 {
        return None;
    }

    let new_a = ((p[3] as f32 / 255.0) * (1.0 - removal) * 255.0)
        .round()
        .clamp(0.0, 255.0) as u8;
    if new_a == 0 {
        return Some([0, 0, 0, 0]);
    }

    // orig = seed * removal + result * kept
    let kept = 1.0 - removal;
    let recover = |orig: f32, seed_ch: f32| -> u8 {
        if kept < 0.001 {
            return orig as u8;
        }
        ((orig - seed_ch * removal) / kept).round().clamp(0.0, 255.0) as u8
    };
    Some([
        recover(r, seed_rgb[0]),
        recover(g, seed_rgb[1]),
        recover(b, seed_rgb[2]),
        new_a,
    ])
}

/// Most common opaque colour on the border, bucketed to 5 bits per channel and
/// averaged within the winning bucket.
pub fn dominant_border_color(pixels: &RgbaImage) -> Option<Rgba<u8>> {
    let (w, h) = pixels.dimensions();
    let mut buckets: HashMap<(u8, u8, u8), (u32, [u64; 3])> = HashMap::new();
    for (x, y) in border_coords(w, h) {
        let p = pixels.get_pixel(x, y);
        if p[3] < 128 {
            continue;
        }
        let entry = buckets.entry((p[0] >> 3, p[1] >> 3, p[2] >> 3)).or_insert((0, [0; 3]));
        entry.0 += 1;
        entry.1[0] += p[0] as u64;
        entry.1[1] += p[1] as u64;
        entry.1[2] += p[2] as u64;
    }
    let (count, sums) = buckets
        .into_values()
        .max_by_key(|(count, sums)| (*count, sums[0] + sums[1] + sums[2]))?;
    let n = count as u64;
    Some(Rgba([
        (sums[0] / n) as u8,
        (sums[1] / n) as u8,
        (sums[2] / n) as u8,
        255,
    ]))
}

fn border_coords(w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    let top_bottom = (0..w).flat_map(move |x| [(x, 0), (x, h.saturating_sub(1))]);
    let sides = (1..h.saturating_sub(1)).flat_map(move |y| [(0, y), (w.saturating_sub(1), y)]);
    top_bottom.chain(sides)
}

#[inline]
fn neighbors(x: u32, y: u32) -> [(u32, u32); 4] {
    [
        (x.wrapping_sub(1), y),
        (x + 1, y),
        (x, y.wrapping_sub(1)),
        (x, y + 1),
    ]
}

/// Squared Euclidean distance in RGB space.
#[inline]
fn color_dist_sq(pixel: &Rgba<u8>, seed_rgb: &[f32; 3]) -> f32 {
    let dr = pixel[0] as f32 - seed_rgb[0];
    let dg = pixel[1] as f32 - seed_rgb[1];
    let db = pixel[2] as f32 - seed_rgb[2];
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
#[path = "color_removal_test.rs"]
mod tests;
