//! Small pixel-level helpers shared by the detection and recognition paths.

/// Convert interleaved RGB bytes to a single-channel luma plane (BT.601).
pub fn rgb_to_gray(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixels = width as usize * height as usize;
    debug_assert_eq!(data.len(), pixels * 3);
    let mut gray = Vec::with_capacity(pixels);
    for px in data.chunks_exact(3) {
        let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
        gray.push(y.round().clamp(0.0, 255.0) as u8);
    }
    gray
}

/// Histogram equalization of a grayscale plane.
///
/// Maps intensities through the cumulative distribution so the output
/// spans the full range. A constant image is returned unchanged.
pub fn equalize_histogram(gray: &[u8]) -> Vec<u8> {
    let total = gray.len() as u64;
    if total == 0 {
        return Vec::new();
    }

    let mut hist = [0u64; 256];
    for &v in gray {
        hist[v as usize] += 1;
    }

    let cdf_min = hist
        .iter()
        .scan(0u64, |acc, &c| {
            *acc += c;
            Some(*acc)
        })
        .find(|&c| c > 0)
        .unwrap_or(0);

    if cdf_min == total {
        // Single intensity, nothing to spread
        return gray.to_vec();
    }

    let mut lut = [0u8; 256];
    let mut cdf = 0u64;
    let denom = (total - cdf_min) as f64;
    for (i, &count) in hist.iter().enumerate() {
        cdf += count;
        if cdf >= cdf_min {
            let v = (cdf - cdf_min) as f64 * 255.0 / denom;
            lut[i] = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    gray.iter().map(|&v| lut[v as usize]).collect()
}

/// 3x3 Gaussian blur on a grayscale plane, separable [0.25, 0.5, 0.25]
/// passes with clamped borders.
pub fn gaussian_blur_3x3(gray: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    debug_assert_eq!(gray.len(), w * h);
    if w == 0 || h == 0 {
        return Vec::new();
    }

    const KERNEL: [f32; 3] = [0.25, 0.5, 0.25];

    // Horizontal pass
    let mut temp = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for (k, &kw) in KERNEL.iter().enumerate() {
                let sx = (x as isize + k as isize - 1).clamp(0, (w - 1) as isize) as usize;
                sum += gray[y * w + sx] as f32 * kw;
            }
            temp[y * w + x] = sum;
        }
    }

    // Vertical pass
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for (k, &kw) in KERNEL.iter().enumerate() {
                let sy = (y as isize + k as isize - 1).clamp(0, (h - 1) as isize) as usize;
                sum += temp[sy * w + x] * kw;
            }
            out[y * w + x] = sum.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Resize interleaved pixel data by weighted area averaging.
///
/// Exact box filtering for integer downscale factors and a close
/// approximation otherwise. Upscaling degrades gracefully to sampling
/// the overlapped source pixel.
pub fn area_resize(
    data: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    target_w: u32,
    target_h: u32,
) -> Vec<u8> {
    let c = channels as usize;
    debug_assert_eq!(data.len(), width as usize * height as usize * c);
    if target_w == 0 || target_h == 0 || width == 0 || height == 0 {
        return Vec::new();
    }

    let sx = width as f64 / target_w as f64;
    let sy = height as f64 / target_h as f64;
    let (w, h) = (width as usize, height as usize);
    let tw = target_w as usize;
    let mut out = vec![0u8; tw * target_h as usize * c];

    for ty in 0..target_h as usize {
        let y0f = ty as f64 * sy;
        let y1f = y0f + sy;
        let y0 = y0f.floor() as usize;
        let y1 = (y1f.ceil() as usize).min(h);
        for tx in 0..tw {
            let x0f = tx as f64 * sx;
            let x1f = x0f + sx;
            let x0 = x0f.floor() as usize;
            let x1 = (x1f.ceil() as usize).min(w);
            for ch in 0..c {
                let mut acc = 0.0f64;
                let mut weight = 0.0f64;
                for row in y0..y1 {
                    let wy = (row as f64 + 1.0).min(y1f) - (row as f64).max(y0f);
                    for col in x0..x1 {
                        let wx = (col as f64 + 1.0).min(x1f) - (col as f64).max(x0f);
                        let wgt = wx * wy;
                        acc += data[(row * w + col) * c + ch] as f64 * wgt;
                        weight += wgt;
                    }
                }
                out[(ty * tw + tx) * c + ch] = (acc / weight).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}
