/// Half-open pixel rectangle `[left, right) x [top, bottom)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Window {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Window {
    #[inline]
    pub fn ltrb(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Square of half size `radius` around `(x, y)`; the far edges are exclusive.
    #[inline]
    pub fn around(x: i64, y: i64, radius: i64) -> Self {
        Self::ltrb(
            x.saturating_sub(radius),
            y.saturating_sub(radius),
            x.saturating_add(radius),
            y.saturating_add(radius),
        )
    }

    /// Smallest window holding both pixels, grown by `margin` on each side.
    #[inline]
    pub fn spanning(a: (i64, i64), b: (i64, i64), margin: i64) -> Self {
        Self::ltrb(
            a.0.min(b.0).saturating_sub(margin),
            a.1.min(b.1).saturating_sub(margin),
            a.0.max(b.0).saturating_add(margin),
            a.1.max(b.1).saturating_add(margin),
        )
    }

    /// Intersection with a `cols x rows` frame.
    #[inline]
    pub fn clamp(&self, cols: usize, rows: usize) -> Self {
        let (cols, rows) = (cols as i64, rows as i64);

        Self::ltrb(
            self.left.clamp(0, cols),
            self.top.clamp(0, rows),
            self.right.clamp(0, cols),
            self.bottom.clamp(0, rows),
        )
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// `(row, col)` of every pixel, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> {
        let (left, right) = (self.left, self.right.max(self.left));

        (self.top..self.bottom.max(self.top))
            .flat_map(move |r| (left..right).map(move |c| (r as usize, c as usize)))
    }
}
