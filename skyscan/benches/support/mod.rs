//! Synthetic star fields shared by the benchmarks.

use skyscan::Image;
use skyscan::synthetic::{Field, NoiseRng};

/// `width × height` frame with sky 1000, Gaussian noise of std 10, and
/// `stars` round stars of FWHM 3 at random positions.
pub fn star_field(width: usize, height: usize, stars: usize, seed: u64) -> Image {
    let mut rng = NoiseRng::new(seed);
    let mut field = Field::new(width, height)
        .background(1000.0)
        .noise_from(10.0, &mut rng);

    for _ in 0..stars {
        let cx = rng.uniform(5.0, width as f64 - 5.0);
        let cy = rng.uniform(5.0, height as f64 - 5.0);
        let amplitude = rng.uniform(100.0, 5000.0);
        field = field.star(cx, cy, 3.0, amplitude);
    }

    field.build().expect("valid benchmark field")
}
