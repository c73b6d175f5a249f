/// Row-major read access shared by the map and tensor types.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Pixel];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { image: self, y: 0 }
    }

    /// `(height, width)`, the order the haze model indexes pixels in.
    fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline]
    fn at(&self, h: usize, w: usize) -> Self::Pixel {
        self.row(h)[w]
    }
}

pub trait ImageViewMut: ImageView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Pixel];
}

pub struct Rows<'a, I: ?Sized + ImageView> {
    image: &'a I,
    y: usize,
}

impl<'a, I: ImageView> Iterator for Rows<'a, I> {
    type Item = &'a [I::Pixel];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.image.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.image.row(y))
    }
}
