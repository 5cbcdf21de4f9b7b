use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Fourier-domain resampling of one channel to `target_len` samples.
///
/// The spectrum is truncated or zero-padded and transformed back, so the
/// signal is treated as periodic. The Nyquist bin of the shorter length is
/// split (upsampling) or folded (downsampling).
pub fn resample(input: &[f32], target_len: usize) -> Vec<f32> {
    let n = input.len();
    let m = target_len;
    if n == 0 || m == 0 {
        return vec![0.0; m];
    }
    if n == m {
        return input.to_vec();
    }

    let mut planner = FftPlanner::<f64>::new();
    let mut spectrum: Vec<Complex<f64>> =
        input.iter().map(|&s| Complex::new(s as f64, 0.0)).collect();
    planner.plan_fft_forward(n).process(&mut spectrum);

    let keep = n.min(m);
    let mut out = vec![Complex::new(0.0, 0.0); m];
    let below_nyquist = (keep - 1) / 2;
    out[0] = spectrum[0];
    for k in 1..=below_nyquist {
        out[k] = spectrum[k];
        out[m - k] = spectrum[n - k];
    }
    if keep % 2 == 0 {
        let h = keep / 2;
        if n < m {
            let half = spectrum[h] * 0.5;
            out[h] = half;
            out[m - h] = half;
        } else {
            out[h] = spectrum[h] + spectrum[n - h];
        }
    }

    planner.plan_fft_inverse(m).process(&mut out);
    let norm = 1.0 / n as f64;
    out.iter().map(|c| (c.re * norm) as f32).collect()
}

/// Number of samples `len` occupies after converting `from` Hz to `to` Hz.
pub fn resampled_len(len: usize, from: u32, to: u32) -> usize {
    (len as f64 * to as f64 / from as f64).round() as usize
}
