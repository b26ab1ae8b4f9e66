use std::path::Path;

use image::imageops::FilterType;
use image::ImageReader;
use ndarray::Array4;

use crate::config::{EPSILON, INPUT_SIZE};

// Turn an uploaded image into the (1, size, size, 3) RGB tensor the network
// expects. The format is sniffed from the file contents, since spooled
// uploads carry no extension.
pub fn prepare(path: &Path) -> Result<Array4<f32>, image::ImageError> {
    let decoded = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgb8();
    let img = image::imageops::resize(&decoded, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let (width, height) = img.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, height as usize, width as usize, 3));
    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = pixel.0[c] as f32 / 255.0;
        }
    }

    standardize(&mut tensor);
    Ok(tensor)
}

// Samplewise standardization: subtract the image mean, divide by the
// population standard deviation plus epsilon. Both statistics come from the
// same f64 accumulation; a flat image must map to zeros, not to float
// rounding noise divided by the epsilon.
fn standardize(tensor: &mut Array4<f32>) {
    let n = tensor.len() as f64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &v in tensor.iter() {
        let v = v as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n;
    let std = (sum_sq / n - mean * mean).max(0.0).sqrt();

    let (mean, std) = (mean as f32, std as f32);
    tensor.mapv_inplace(|v| (v - mean) / (std + EPSILON));
}
