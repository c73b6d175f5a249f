use alpha_estimator::image::{ImageF32, RgbImageU8};

/// Chromatic clear-scene pixels; every channel is even.
const SCENE: [[u8; 3]; 4] = [[50, 100, 150], [20, 60, 120], [10, 140, 90], [120, 40, 70]];

/// Clear scene and its hazy observation under `I = J·t + A·(1 − t)` with
/// `t = 0.5` and airlight `alpha_u8 / 255`.
///
/// Clear channels get the parity of `alpha_u8`, so every hazy value is an
/// exact integer and the pair survives 8-bit storage without rounding.
pub fn haze_pair(width: usize, height: usize, alpha_u8: u8) -> (RgbImageU8, RgbImageU8) {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let parity = alpha_u8 % 2;
    let mut clear = Vec::with_capacity(width * height * 3);
    let mut hazy = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let base = SCENE[(x + 2 * y) % SCENE.len()];
            for c in base {
                let j = c + parity;
                clear.push(j);
                hazy.push(((j as u16 + alpha_u8 as u16) / 2) as u8);
            }
        }
    }
    (
        RgbImageU8::new(width, height, clear).expect("clear buffer size"),
        RgbImageU8::new(width, height, hazy).expect("hazy buffer size"),
    )
}

/// Strongly tinted haze image with brightest channel `background`, except for
/// one greyer pixel at `(x, y)` whose brightest channel is `peak`.
pub fn haze_with_peak(
    width: usize,
    height: usize,
    peak: u8,
    background: u8,
    at: (usize, usize),
) -> RgbImageU8 {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let px = if (x, y) == at {
                [peak / 2, peak - peak / 4, peak]
            } else {
                [background, background / 8, background / 4]
            };
            data.extend_from_slice(&px);
        }
    }
    RgbImageU8::new(width, height, data).expect("haze buffer size")
}

/// Transmission map that is 0.9 everywhere except 0.05 at `(x, y)`.
pub fn transmission_with_minimum(width: usize, height: usize, at: (usize, usize)) -> ImageF32 {
    let mut map = ImageF32::filled(width, height, 0.9);
    map.set(at.0, at.1, 0.05);
    map
}
