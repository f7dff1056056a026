//! Grayscale views over frame buffers.

/// A rectangular grayscale window over a row-major 8-bit buffer.
///
/// Cropping only narrows the window; pixels are copied out once, when the
/// view is handed to the codec.
#[derive(Debug, Clone, Copy)]
pub struct LumaView<'a> {
    buf: &'a [u8],
    stride: u32,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

impl<'a> LumaView<'a> {
    /// View the whole buffer. Returns `None` when the buffer is smaller than
    /// `width * height` or either dimension is zero.
    pub fn full(buf: &'a [u8], width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || buf.len() < width as usize * height as usize {
            return None;
        }
        Some(Self {
            buf,
            stride: width,
            left: 0,
            top: 0,
            width,
            height,
        })
    }

    /// Narrow the view to a sub-rectangle, relative to this view's origin.
    ///
    /// Returns `None` if the rectangle is empty or leaves the view.
    pub fn crop(&self, left: u32, top: u32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if left.checked_add(width)? > self.width || top.checked_add(height)? > self.height {
            return None;
        }
        Some(Self {
            buf: self.buf,
            stride: self.stride,
            left: self.left + left,
            top: self.top + top,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luminance at `(x, y)` relative to the view.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (self.top + y) as usize * self.stride as usize + (self.left + x) as usize;
        self.buf.get(idx).copied()
    }

    /// Copy the window into a tightly packed buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for row in self.top..self.top + self.height {
            let start = row as usize * self.stride as usize + self.left as usize;
            out.extend_from_slice(&self.buf[start..start + self.width as usize]);
        }
        out
    }
}
