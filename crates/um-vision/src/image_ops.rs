use image::{imageops, Rgba, RgbaImage};

/// Size that fits `width`x`height` into `max_w`x`max_h` keeping the aspect ratio.
/// Never enlarges. Rounds the free side to whichever neighbour keeps the ratio closest.
pub fn thumbnail_size(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (max_w >= width && max_h >= height) {
        return (width, height);
    }

    let aspect = width as f64 / height as f64;
    let (x, y) = (max_w as f64, max_h as f64);

    if x / y >= aspect {
        let w = round_aspect(y * aspect, |n| (aspect - n / y).abs());
        (w, max_h)
    } else {
        let h = round_aspect(x / aspect, |n| {
            if n == 0.0 {
                0.0
            } else {
                (aspect - x / n).abs()
            }
        });
        (max_w, h)
    }
}

fn round_aspect(number: f64, key: impl Fn(f64) -> f64) -> u32 {
    let (lo, hi) = (number.floor(), number.ceil());
    let best = if key(lo) <= key(hi) { lo } else { hi };
    (best as u32).max(1)
}

/// Shrink an image to fit into the given box, bilinear.
pub fn thumbnail(image: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = thumbnail_size(image.width(), image.height(), max_w, max_h);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, w, h, imageops::FilterType::Triangle)
}

/// Crop the box `left..right` x `top..bottom`, which may extend past the image.
/// Pixels outside the source are transparent black.
pub fn crop_padded(image: &RgbaImage, left: i64, top: i64, right: i64, bottom: i64) -> RgbaImage {
    let width = (right - left).max(0) as u32;
    let height = (bottom - top).max(0) as u32;
    let mut canvas = RgbaImage::new(width, height);

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = right.min(image.width() as i64);
    let y1 = bottom.min(image.height() as i64);

    if x0 < x1 && y0 < y1 {
        let region = imageops::crop_imm(
            image,
            x0 as u32,
            y0 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        )
        .to_image();
        imageops::replace(&mut canvas, &region, x0 - left, y0 - top);
    }

    canvas
}

/// Surround the image with a solid border.
pub fn expand_border(image: &RgbaImage, border: u32, color: Rgba<u8>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        image.width() + border * 2,
        image.height() + border * 2,
        color,
    );
    imageops::replace(&mut canvas, image, border as i64, border as i64);
    canvas
}

/// Paste `image` at (x, y) using its own alpha as the blend mask, on every
/// channel including alpha. Over a transparent canvas this darkens
/// semi-transparent pixels by their alpha.
pub fn paste_masked(canvas: &mut RgbaImage, image: &RgbaImage, x: i64, y: i64) {
    for (sx, sy, src) in image.enumerate_pixels() {
        let (dx, dy) = (x + sx as i64, y + sy as i64);
        if dx < 0 || dy < 0 || dx >= canvas.width() as i64 || dy >= canvas.height() as i64 {
            continue;
        }

        let mask = src[3] as u32;
        let dst = canvas.get_pixel_mut(dx as u32, dy as u32);
        for c in 0..4 {
            let blended = src[c] as u32 * mask + dst[c] as u32 * (255 - mask);
            dst[c] = ((blended + 127) / 255) as u8;
        }
    }
}

/// Mean R, G, B over a box of the image.
pub fn average_rgb(image: &RgbaImage, left: i64, top: i64, right: i64, bottom: i64) -> [f64; 3] {
    let region = crop_padded(image, left, top, right, bottom);
    let n = (region.width() * region.height()) as f64;
    if n == 0.0 {
        return [0.0; 3];
    }

    let mut sum = [0.0f64; 3];
    for px in region.pixels() {
        for (c, s) in sum.iter_mut().enumerate() {
            *s += px[c] as f64;
        }
    }
    sum.map(|s| s / n)
}
