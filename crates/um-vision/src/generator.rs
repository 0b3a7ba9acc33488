use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;
use tracing::debug;
use um_catalog::{Item, SocketColor};
use um_result::{ItemTemplate, MatchError};

use crate::image_ops::{paste_masked, thumbnail};

/// Artwork crop and template canvas, in pixels
pub const ITEM_MAX_SIZE: (u32, u32) = (99, 200);

/// Full-size socketed artwork is shrunk to this box before sockets go on
pub const LARGE_ITEM_PRE_THUMBNAIL: (u32, u32) = (100, 200);

pub const SOCKET_GLYPH_SIZE: u32 = 36;

/// Spacing between two sockets, horizontally and vertically
pub const LINK_WIDTH: u32 = 17;

/// Extra offset applied after centering the socket overlay on the artwork
const SOCKET_OFFSET: (i64, i64) = (1, 3);

/// Renders item artwork with socket overlays.
pub struct ItemGenerator {
    /// Indexed in `SocketColor::ALL` order
    glyphs: [RgbaImage; 4],
}

impl ItemGenerator {
    /// Load the socket glyphs from `data_dir/sockets/socket-src-{r,g,b,w}.png`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("sockets");
        let load = |color: SocketColor| -> Result<RgbaImage> {
            let path = dir.join(format!("socket-src-{}.png", color.suffix()));
            let img = image::open(&path)
                .with_context(|| format!("Failed to open socket glyph {}", path.display()))?;
            Ok(img.to_rgba8())
        };

        Ok(Self::from_glyphs([
            load(SocketColor::Red)?,
            load(SocketColor::Green)?,
            load(SocketColor::Blue)?,
            load(SocketColor::White)?,
        ]))
    }

    /// Build from glyph bitmaps in red, green, blue, white order.
    /// Each glyph is shrunk to fit the socket glyph box.
    pub fn from_glyphs(glyphs: [RgbaImage; 4]) -> Self {
        let glyphs = glyphs.map(|g| thumbnail(&g, SOCKET_GLYPH_SIZE, SOCKET_GLYPH_SIZE));
        Self { glyphs }
    }

    fn glyph(&self, color: SocketColor) -> &RgbaImage {
        match color {
            SocketColor::Red => &self.glyphs[0],
            SocketColor::Green => &self.glyphs[1],
            SocketColor::Blue => &self.glyphs[2],
            SocketColor::White => &self.glyphs[3],
        }
    }

    /// Compose `count` sockets into one transparent overlay.
    pub fn generate_sockets(
        &self,
        count: u32,
        columns: u32,
        color: SocketColor,
    ) -> Result<RgbaImage, MatchError> {
        validate_socket_count(count)?;

        let glyph = self.glyph(color);
        let (gw, gh) = glyph.dimensions();

        let rows = match columns {
            1 => count,
            2 => count.div_ceil(2),
            other => return Err(MatchError::InvalidSocketColumns(other)),
        };
        let columns = if count == 1 { 1 } else { columns };

        let mut canvas = RgbaImage::new(
            columns * gw + (columns - 1) * LINK_WIDTH,
            rows * gh + (rows - 1) * LINK_WIDTH,
        );

        let mut left_offset = 0;
        for n in 0..count {
            let (col, row) = if columns == 1 { (0, n) } else { (n % 2, n / 2) };

            // The lone socket of the middle row sits in the right column
            if count == 3 && n == 2 && columns == 2 {
                left_offset = gw + LINK_WIDTH;
            }

            let x = left_offset + col * (gw + LINK_WIDTH);
            let y = row * (gh + LINK_WIDTH);
            paste_masked(&mut canvas, glyph, x as i64, y as i64);
        }

        Ok(canvas)
    }

    /// Render the base artwork with `sockets` sockets of one color.
    pub fn generate_image(
        &self,
        base: &RgbaImage,
        item: &Item,
        sockets: u32,
        color: SocketColor,
    ) -> Result<RgbaImage, MatchError> {
        validate_socket_count(sockets)?;

        let base = fit_to_footprint(base, item);
        let mut canvas = RgbaImage::new(base.width(), base.height());
        paste_masked(&mut canvas, &base, 0, 0);

        let overlay = self.generate_sockets(sockets, item.columns, color)?;
        let x = (base.width() as i64 - overlay.width() as i64) / 2 + SOCKET_OFFSET.0;
        let y = (base.height() as i64 - overlay.height() as i64) / 2 + SOCKET_OFFSET.1;
        paste_masked(&mut canvas, &overlay, x, y);

        Ok(canvas)
    }

    /// Every template the item may appear as, most sockets first, grouped by color.
    pub fn variants(&self, icon: &RgbaImage, item: &Item) -> Result<Vec<ItemTemplate>, MatchError> {
        if item.sockets == 0 {
            return Ok(vec![ItemTemplate {
                image: fit_to_footprint(icon, item),
                sockets: 0,
                color: None,
            }]);
        }

        let icon = if item.is_smaller_than_full() {
            icon.clone()
        } else {
            let (w, h) = LARGE_ITEM_PRE_THUMBNAIL;
            thumbnail(icon, w, h)
        };

        let mut variants = Vec::with_capacity(SocketColor::ALL.len() * item.sockets as usize);
        for color in SocketColor::ALL {
            for sockets in (1..=item.sockets).rev() {
                variants.push(ItemTemplate {
                    image: self.generate_image(&icon, item, sockets, color)?,
                    sockets,
                    color: Some(color),
                });
            }
        }

        debug!("Generated {} variants for {}", variants.len(), item.name);
        Ok(variants)
    }
}

/// Shrink artwork to the template canvas, then to the item's share of it.
fn fit_to_footprint(image: &RgbaImage, item: &Item) -> RgbaImage {
    let (max_w, max_h) = ITEM_MAX_SIZE;
    let image = thumbnail(image, max_w, max_h);

    if !item.is_smaller_than_full() {
        return image;
    }

    let (w, h) = footprint_box(item);
    thumbnail(&image, w, h)
}

/// Pixel box of the template canvas occupied by an item's footprint.
pub(crate) fn footprint_box(item: &Item) -> (u32, u32) {
    let (max_w, max_h) = ITEM_MAX_SIZE;
    (
        (max_w as f64 * (item.width as f64 / Item::MAX_WIDTH as f64)) as u32,
        (max_h as f64 * (item.height as f64 / Item::MAX_HEIGHT as f64)) as u32,
    )
}

fn validate_socket_count(count: u32) -> Result<(), MatchError> {
    if (1..=Item::MAX_SOCKETS).contains(&count) {
        Ok(())
    } else {
        Err(MatchError::InvalidSocketCount(count))
    }
}
