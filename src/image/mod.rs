pub mod f32;
pub mod io;
pub mod npy;
pub mod rgb;
pub mod traits;
pub mod u8;

pub use self::f32::ImageF32;
pub use self::rgb::RgbImageF32;
pub use self::traits::{ImageView, ImageViewMut, Rows};
pub use self::u8::RgbImageU8;
