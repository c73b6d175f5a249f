/// Owned interleaved RGB buffer straight out of the codec, raw range [0, 255].
#[derive(Clone, Debug)]
pub struct RgbImageU8 {
    pub w: usize,
    pub h: usize,
    /// `h * w * 3` bytes, channel order R, G, B
    pub data: Vec<u8>,
}

impl RgbImageU8 {
    pub fn new(w: usize, h: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == w * h * 3).then_some(Self { w, h, data })
    }
}
