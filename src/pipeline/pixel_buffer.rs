//! Output raster for the keyed colour image.
//!
//! Layout is row-major RGBA8 with `stride = width * 4` bytes per row. Writers
//! go through a [`WriteScope`], which edits a back buffer; only
//! [`WriteScope::commit`] copies the dirty region into the buffer readers
//! see. A scope dropped without committing publishes nothing.

use image::RgbaImage;

pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn union(self, other: DirtyRect) -> DirtyRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        DirtyRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    fn clamp_to(self, width: u32, height: u32) -> DirtyRect {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        DirtyRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

#[derive(Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    front: Vec<u8>,
    back: Vec<u8>,
    last_dirty: Option<DirtyRect>,
    generation: u64,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        PixelBuffer {
            width,
            height,
            front: vec![0u8; len],
            back: vec![0u8; len],
            last_dirty: None,
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn full_rect(&self) -> DirtyRect {
        DirtyRect::new(0, 0, self.width, self.height)
    }

    /// Last committed frame.
    pub fn pixels(&self) -> &[u8] {
        &self.front
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let px = self.front.get(idx..idx + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Number of commits so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_dirty(&self) -> Option<DirtyRect> {
        self.last_dirty
    }

    pub fn lock(&mut self) -> WriteScope<'_> {
        WriteScope {
            buffer: self,
            dirty: None,
        }
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.front.clone())
    }
}

/// Exclusive write access to a [`PixelBuffer`]'s back buffer.
pub struct WriteScope<'a> {
    buffer: &'a mut PixelBuffer,
    dirty: Option<DirtyRect>,
}

impl WriteScope<'_> {
    pub fn width(&self) -> u32 {
        self.buffer.width
    }

    pub fn height(&self) -> u32 {
        self.buffer.height
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.back
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; 4]) {
        if x >= self.buffer.width || y >= self.buffer.height {
            return;
        }
        let idx = y as usize * self.buffer.stride() + x as usize * BYTES_PER_PIXEL;
        self.buffer.back[idx..idx + BYTES_PER_PIXEL].copy_from_slice(&value);
    }

    pub fn add_dirty_rect(&mut self, rect: DirtyRect) {
        let rect = rect.clamp_to(self.buffer.width, self.buffer.height);
        self.dirty = Some(match self.dirty {
            Some(prev) => prev.union(rect),
            None => rect,
        });
    }

    /// Publishes the dirty region and ends the scope. Returns the region
    /// that became visible, if any.
    pub fn commit(self) -> Option<DirtyRect> {
        let dirty = self.dirty.filter(|rect| !rect.is_empty())?;
        let buffer = self.buffer;

        if dirty == buffer.full_rect() {
            buffer.front.copy_from_slice(&buffer.back);
        } else {
            let stride = buffer.stride();
            let start = dirty.x as usize * BYTES_PER_PIXEL;
            let end = start + dirty.width as usize * BYTES_PER_PIXEL;
            for row in dirty.y..dirty.y + dirty.height {
                let offset = row as usize * stride;
                buffer.front[offset + start..offset + end]
                    .copy_from_slice(&buffer.back[offset + start..offset + end]);
            }
        }

        buffer.generation += 1;
        buffer.last_dirty = Some(dirty);
        Some(dirty)
    }
}
