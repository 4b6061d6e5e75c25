//! 1D and 2D Fast Hartley Transforms.
//!
//! The 1D engine is a radix-4-then-radix-2 in-place butterfly network on
//! bit-reversed input and computes
//! `H(k) = sum_n x(n) * cas(2*pi*n*k / N)` with `cas = cos + sin`.
//! The transform is its own inverse up to a factor `1/N`.
//!
//! The 2D transform runs the 1D engine over rows, then over columns (via an
//! in-place transpose), and finally recombines the separable result into the
//! true 2D Hartley transform
//! `H(u, v) = sum_{r,c} x(r, c) * cas(2*pi*(u*r + v*c) / N)` where `u` is the
//! row frequency. Coefficients are stored with DC at `[0, 0]`.

use ndarray::{Array2, ArrayView2, ArrayViewMut1, ArrayViewMut2};
use rustfft::num_complex::Complex;

use crate::error::FhtError;
use crate::float_trait::FhtFloat;
use crate::tables::{validate_size, FhtPlan};

/// Index of the mirror frequency `(N - i) mod N`.
#[inline(always)]
pub(crate) fn mirror(i: usize, n: usize) -> usize {
    (n - i) % n
}

/// Check that `dim` is an N x N buffer with N a valid transform size.
pub(crate) fn square_side(dim: (usize, usize)) -> Result<usize, FhtError> {
    let (rows, cols) = dim;
    if rows != cols {
        return Err(FhtError::NotSquare { rows, cols });
    }
    validate_size(rows)?;
    Ok(rows)
}

/// Butterfly stages on bit-reversed data.
fn butterflies<F: FhtFloat>(x: &mut [F], cos: &[F], sin: &[F], log2: u32) {
    let n = x.len();

    // Stages 0 and 1 combined: one radix-4 butterfly per group of four.
    let gp_size = 2;
    let mut num_gps = n / 4;
    for gp_num in 0..num_gps {
        let ad1 = gp_num * 4;
        let ad2 = ad1 + 1;
        let ad3 = ad1 + gp_size;
        let ad4 = ad2 + gp_size;
        let rt1 = x[ad1] + x[ad2]; // a + b
        let rt2 = x[ad1] - x[ad2]; // a - b
        let rt3 = x[ad3] + x[ad4]; // c + d
        let rt4 = x[ad3] - x[ad4]; // c - d
        x[ad1] = rt1 + rt3;
        x[ad2] = rt2 + rt4;
        x[ad3] = rt1 - rt3;
        x[ad4] = rt2 - rt4;
    }

    if log2 <= 2 {
        return;
    }

    let mut gp_size = 4;
    let mut num_bfs = 2;
    num_gps /= 2;
    for _stage in 2..log2 {
        for gp_num in 0..num_gps {
            let ad0 = gp_num * gp_size * 2;

            // First butterfly of the group needs no twiddle.
            let ad1 = ad0;
            let ad2 = ad1 + gp_size;
            let ad3 = ad1 + gp_size / 2;
            let ad4 = ad3 + gp_size;
            let rt1 = x[ad1];
            x[ad1] = x[ad1] + x[ad2];
            x[ad2] = rt1 - x[ad2];
            let rt1 = x[ad3];
            x[ad3] = x[ad3] + x[ad4];
            x[ad4] = rt1 - x[ad4];

            // Remaining butterflies are handled in symmetric pairs.
            for bf_num in 1..num_bfs {
                let ad1 = bf_num + ad0;
                let ad2 = ad1 + gp_size;
                let ad3 = gp_size - bf_num + ad0;
                let ad4 = ad3 + gp_size;

                let cs = bf_num * num_gps;
                let rt1 = x[ad2] * cos[cs] + x[ad4] * sin[cs];
                let rt2 = x[ad4] * cos[cs] - x[ad2] * sin[cs];

                x[ad2] = x[ad1] - rt1;
                x[ad1] = x[ad1] + rt1;
                x[ad4] = x[ad3] + rt2;
                x[ad3] = x[ad3] - rt2;
            }
        }
        gp_size *= 2;
        num_bfs *= 2;
        num_gps /= 2;
    }
}

/// 1D Hartley transform of `x` in place.
///
/// `x` may be any view of length N (a row, a column, or a strided slice of a
/// larger buffer). `scratch` must hold at least N elements; it receives the
/// bit-reversed samples while the butterflies run. With `inverse` set, every
/// output is divided by N.
///
/// # Panics
/// Panics if `x.len()` differs from the plan size or `scratch` is too short.
pub fn fht_1d<F: FhtFloat>(
    mut x: ArrayViewMut1<F>,
    inverse: bool,
    plan: &FhtPlan<F>,
    scratch: &mut [F],
) {
    let n = plan.size();
    assert_eq!(x.len(), n, "1D transform length must match the plan");
    assert!(scratch.len() >= n, "scratch buffer shorter than transform");
    let work = &mut scratch[..n];

    for (dst, &src) in work.iter_mut().zip(plan.bitrev()) {
        *dst = x[src];
    }

    butterflies(work, plan.cos(), plan.sin(), plan.log2());

    if inverse {
        let scale = F::usize_as(n);
        for (dst, &v) in x.iter_mut().zip(work.iter()) {
            *dst = v / scale;
        }
    } else {
        for (dst, &v) in x.iter_mut().zip(work.iter()) {
            *dst = v;
        }
    }
}

/// Transpose a square buffer in place.
///
/// # Panics
/// Panics if the view is not square.
pub fn transpose_in_place<F: FhtFloat>(mut buffer: ArrayViewMut2<F>) {
    let (rows, cols) = buffer.dim();
    assert_eq!(rows, cols, "in-place transpose needs a square buffer");
    for r in 0..rows {
        for c in (r + 1)..cols {
            buffer.swap([r, c], [c, r]);
        }
    }
}

/// Turn separable row/column Hartley transforms into the true 2D transform.
///
/// Rows and columns 0 and N/2 map onto themselves; the formula gives E = 0
/// there and leaves them unchanged.
fn recombine<F: FhtFloat>(mut x: ArrayViewMut2<F>) {
    let n = x.nrows();
    let half = n / 2;
    let two = F::from_f64_c(2.0);
    for row in 0..=half {
        let m_row = mirror(row, n);
        for col in 0..=half {
            let m_col = mirror(col, n);
            let a = x[[row, col]];
            let b = x[[m_row, col]];
            let c = x[[row, m_col]];
            let d = x[[m_row, m_col]];
            let e = ((a + d) - (b + c)) / two;
            x[[row, col]] = a - e;
            x[[m_row, col]] = b + e;
            x[[row, m_col]] = c + e;
            x[[m_row, m_col]] = d - e;
        }
    }
}

/// 2D Hartley transform of a square buffer in place.
///
/// The buffer must be `plan.size()` on each side; otherwise an error is
/// returned and the buffer is left untouched. The inverse includes the full
/// `1/N^2` normalization, so a forward/inverse pair reproduces the input.
pub fn fht2d<F: FhtFloat>(
    mut buffer: ArrayViewMut2<F>,
    inverse: bool,
    plan: &FhtPlan<F>,
) -> Result<(), FhtError> {
    let (rows, cols) = buffer.dim();
    if rows != cols {
        return Err(FhtError::NotSquare { rows, cols });
    }
    let n = plan.size();
    if rows != n {
        return Err(FhtError::DimensionMismatch {
            expected: (n, n),
            actual: (rows, cols),
        });
    }

    let mut scratch = vec![F::zero(); n];

    for row in buffer.rows_mut() {
        fht_1d(row, inverse, plan, &mut scratch);
    }
    transpose_in_place(buffer.view_mut());
    for row in buffer.rows_mut() {
        fht_1d(row, inverse, plan, &mut scratch);
    }
    transpose_in_place(buffer.view_mut());

    recombine(buffer.view_mut());
    Ok(())
}

/// Forward transform of a square power-of-two image without padding.
///
/// This is the direct path for inputs that already have a valid transform
/// shape. Anything else is rejected; use the padded pipeline instead.
pub fn forward_square<F: FhtFloat>(input: ArrayView2<F>) -> Result<Array2<F>, FhtError> {
    let n = square_side(input.dim())?;
    let plan = FhtPlan::new(n)?;
    let mut output = input.to_owned();
    fht2d(output.view_mut(), false, &plan)?;
    Ok(output)
}

/// Inverse transform of a square coefficient buffer.
pub fn inverse_square<F: FhtFloat>(coefficients: ArrayView2<F>) -> Result<Array2<F>, FhtError> {
    let n = square_side(coefficients.dim())?;
    let plan = FhtPlan::new(n)?;
    let mut output = coefficients.to_owned();
    fht2d(output.view_mut(), true, &plan)?;
    Ok(output)
}

/// Complex Fourier spectrum equivalent to a Hartley coefficient buffer.
///
/// `Re = (H(k) + H(-k)) / 2` and `Im = (H(-k) - H(k)) / 2`, which matches an
/// unnormalized forward DFT with kernel `exp(-i*theta)`. DC stays at `[0, 0]`.
pub fn complex_spectrum<F: FhtFloat>(fht: ArrayView2<F>) -> Result<Array2<Complex<F>>, FhtError> {
    let n = square_side(fht.dim())?;
    let half = F::from_f64_c(0.5);
    Ok(Array2::from_shape_fn((n, n), |(r, c)| {
        let h = fht[[r, c]];
        let h_mirror = fht[[mirror(r, n), mirror(c, n)]];
        Complex::new((h + h_mirror) * half, (h_mirror - h) * half)
    }))
}

/// Shared shape check for two-operand spectral arithmetic.
fn matching_square<F: FhtFloat>(h1: &ArrayView2<F>, h2: &ArrayView2<F>) -> Result<usize, FhtError> {
    let n = square_side(h1.dim())?;
    if h2.dim() != h1.dim() {
        return Err(FhtError::DimensionMismatch {
            expected: h1.dim(),
            actual: h2.dim(),
        });
    }
    Ok(n)
}

fn spectral_product<F: FhtFloat>(
    h1: ArrayView2<F>,
    h2: ArrayView2<F>,
    conjugate: bool,
) -> Result<Array2<F>, FhtError> {
    let n = matching_square(&h1, &h2)?;
    let half = F::from_f64_c(0.5);
    Ok(Array2::from_shape_fn((n, n), |(r, c)| {
        let (rm, cm) = (mirror(r, n), mirror(c, n));
        let h2_even = (h2[[r, c]] + h2[[rm, cm]]) * half;
        let h2_odd = (h2[[r, c]] - h2[[rm, cm]]) * half;
        if conjugate {
            h1[[r, c]] * h2_even - h1[[rm, cm]] * h2_odd
        } else {
            h1[[r, c]] * h2_even + h1[[rm, cm]] * h2_odd
        }
    }))
}

/// Hartley-domain product: the transform of the circular convolution.
pub fn multiply<F: FhtFloat>(h1: ArrayView2<F>, h2: ArrayView2<F>) -> Result<Array2<F>, FhtError> {
    spectral_product(h1, h2, false)
}

/// Hartley-domain conjugate product: the transform of the circular
/// correlation `c(m) = sum_n a(n + m) * b(n)`.
pub fn conjugate_multiply<F: FhtFloat>(
    h1: ArrayView2<F>,
    h2: ArrayView2<F>,
) -> Result<Array2<F>, FhtError> {
    spectral_product(h1, h2, true)
}

/// Hartley-domain quotient `h1 / h2`, the inverse of [`multiply`].
///
/// Squared magnitudes of `h2` below [`FhtFloat::DIVIDE_FLOOR`] are clamped to
/// it so empty frequencies do not produce infinities.
pub fn divide<F: FhtFloat>(h1: ArrayView2<F>, h2: ArrayView2<F>) -> Result<Array2<F>, FhtError> {
    let n = matching_square(&h1, &h2)?;
    Ok(Array2::from_shape_fn((n, n), |(r, c)| {
        let (rm, cm) = (mirror(r, n), mirror(c, n));
        let a = h2[[r, c]];
        let b = h2[[rm, cm]];
        let mag = (a * a + b * b).max(F::DIVIDE_FLOOR);
        let h2_even = a + b;
        let h2_odd = a - b;
        (h1[[r, c]] * h2_even - h1[[rm, cm]] * h2_odd) / mag
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use rustfft::FftPlanner;

    // Helper: Simple Linear Congruential Generator for deterministic "random" test data
    struct SimpleLcg {
        state: u64,
    }

    impl SimpleLcg {
        fn new(seed: u64) -> Self {
            Self { state: seed }
        }

        fn next_u64(&mut self) -> u64 {
            // LCG parameters from Numerical Recipes
            self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
            self.state
        }

        fn next_f32(&mut self) -> f32 {
            let u = self.next_u64();
            ((u >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        }

        fn next_f64(&mut self) -> f64 {
            let u = self.next_u64();
            ((u >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        }
    }

    fn random_matrix_f32(n: usize, seed: u64) -> Array2<f32> {
        let mut rng = SimpleLcg::new(seed);
        Array2::from_shape_fn((n, n), |_| rng.next_f32())
    }

    fn random_matrix_f64(n: usize, seed: u64) -> Array2<f64> {
        let mut rng = SimpleLcg::new(seed);
        Array2::from_shape_fn((n, n), |_| rng.next_f64())
    }

    fn cas(theta: f64) -> f64 {
        theta.cos() + theta.sin()
    }

    fn direct_dht_2d(x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let w = 2.0 * std::f64::consts::PI / n as f64;
        Array2::from_shape_fn((n, n), |(u, v)| {
            let mut sum = 0.0;
            for r in 0..n {
                for c in 0..n {
                    sum += x[[r, c]] * cas(w * ((u * r + v * c) % n) as f64);
                }
            }
            sum
        })
    }

    fn max_abs_diff_f32(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0f32, f32::max)
    }

    fn max_abs_diff_f64(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0f64, f64::max)
    }

    // ==================== 1D Engine ====================

    #[test]
    fn test_fht_1d_radix4_sign_pattern() {
        let plan = FhtPlan::<f64>::new(4).unwrap();
        let mut x = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let mut scratch = vec![0.0; 4];
        fht_1d(x.view_mut(), false, &plan, &mut scratch);
        // H(k) = sum x(n) cas(pi*n*k/2)
        assert_eq!(x.to_vec(), vec![10.0, -4.0, -2.0, 0.0]);
    }

    #[test]
    fn test_fht_1d_matches_direct_dht() {
        for n in [4usize, 8, 16, 32, 64] {
            let plan = FhtPlan::<f64>::new(n).unwrap();
            let mut rng = SimpleLcg::new(n as u64);
            let input: Vec<f64> = (0..n).map(|_| rng.next_f64()).collect();
            let mut x = Array1::from(input.clone());
            let mut scratch = vec![0.0; n];
            fht_1d(x.view_mut(), false, &plan, &mut scratch);

            let w = 2.0 * std::f64::consts::PI / n as f64;
            for k in 0..n {
                let expected: f64 = (0..n)
                    .map(|m| input[m] * cas(w * ((m * k) % n) as f64))
                    .sum();
                assert!(
                    (x[k] - expected).abs() < 1e-10,
                    "n={} k={} got {} expected {}",
                    n,
                    k,
                    x[k],
                    expected
                );
            }
        }
    }

    #[test]
    fn test_fht_1d_roundtrip_on_strided_column() {
        let n = 16;
        let plan = FhtPlan::<f64>::new(n).unwrap();
        let original = random_matrix_f64(n, 7);
        let mut buffer = original.clone();
        let mut scratch = vec![0.0; n];
        fht_1d(buffer.column_mut(3), false, &plan, &mut scratch);
        fht_1d(buffer.column_mut(3), true, &plan, &mut scratch);
        assert!(max_abs_diff_f64(&original, &buffer) < 1e-12);
    }

    // ==================== 2D Engine ====================

    #[test]
    fn test_fht2d_matches_direct_2d_dht() {
        for n in [4usize, 8, 16] {
            let plan = FhtPlan::<f64>::new(n).unwrap();
            let input = random_matrix_f64(n, 100 + n as u64);
            let mut buffer = input.clone();
            fht2d(buffer.view_mut(), false, &plan).unwrap();
            let expected = direct_dht_2d(&input);
            let diff = max_abs_diff_f64(&buffer, &expected);
            assert!(diff < 1e-9, "n={} max diff = {}", n, diff);
        }
    }

    #[test]
    fn test_fht2d_roundtrip_various_sizes() {
        for n in [4usize, 8, 16, 32, 64, 128] {
            let input = random_matrix_f32(n, (n * 1000) as u64);
            let plan = FhtPlan::<f32>::new(n).unwrap();
            let mut buffer = input.clone();
            fht2d(buffer.view_mut(), false, &plan).unwrap();
            fht2d(buffer.view_mut(), true, &plan).unwrap();
            let diff = max_abs_diff_f32(&input, &buffer);
            assert!(diff < 1e-4, "roundtrip failed for {}x{}: max diff = {}", n, n, diff);
        }
    }

    #[test]
    fn test_fht2d_roundtrip_multiple_seeds() {
        let plan = FhtPlan::<f32>::new(32).unwrap();
        for seed in 0..10u64 {
            let input = random_matrix_f32(32, seed * 7919);
            let mut buffer = input.clone();
            fht2d(buffer.view_mut(), false, &plan).unwrap();
            fht2d(buffer.view_mut(), true, &plan).unwrap();
            assert!(
                max_abs_diff_f32(&input, &buffer) < 1e-4,
                "roundtrip failed for seed {}",
                seed
            );
        }
    }

    #[test]
    fn test_fht2d_impulse_roundtrip_8x8() {
        let mut input = Array2::<f32>::zeros((8, 8));
        input[[4, 4]] = 1.0;
        let freq = forward_square(input.view()).unwrap();
        // Impulse at (4,4) has cas(pi*(u+v)) = (-1)^(u+v) everywhere.
        for ((u, v), &h) in freq.indexed_iter() {
            let expected = if (u + v) % 2 == 0 { 1.0 } else { -1.0 };
            assert!((h - expected).abs() < 1e-5);
        }
        let output = inverse_square(freq.view()).unwrap();
        assert!(max_abs_diff_f32(&input, &output) < 1e-6);
    }

    #[test]
    fn test_fht2d_constant_image_is_pure_dc() {
        let n = 16;
        let input = Array2::<f32>::from_elem((n, n), 3.0);
        let freq = forward_square(input.view()).unwrap();
        assert!((freq[[0, 0]] - 3.0 * (n * n) as f32).abs() < 1e-2);
        for ((u, v), &h) in freq.indexed_iter() {
            if (u, v) != (0, 0) {
                assert!(h.abs() < 1e-3, "coefficient ({}, {}) = {}", u, v, h);
            }
        }
    }

    #[test]
    fn test_fht2d_rejects_wrong_shapes_without_mutation() {
        let plan = FhtPlan::<f32>::new(8).unwrap();

        let mut rect = random_matrix_f32(8, 1).slice(ndarray::s![..4, ..]).to_owned();
        let before = rect.clone();
        assert_eq!(
            fht2d(rect.view_mut(), false, &plan),
            Err(FhtError::NotSquare { rows: 4, cols: 8 })
        );
        assert_eq!(rect, before);

        let mut other = random_matrix_f32(16, 2);
        let before = other.clone();
        assert!(matches!(
            fht2d(other.view_mut(), false, &plan),
            Err(FhtError::DimensionMismatch { .. })
        ));
        assert_eq!(other, before);
    }

    #[test]
    fn test_forward_square_rejects_invalid_input() {
        let rect = Array2::<f32>::zeros((8, 16));
        assert_eq!(
            forward_square(rect.view()).unwrap_err(),
            FhtError::NotSquare { rows: 8, cols: 16 }
        );
        let odd = Array2::<f32>::zeros((12, 12));
        assert_eq!(
            forward_square(odd.view()).unwrap_err(),
            FhtError::NotPowerOfTwo { size: 12 }
        );
    }

    #[test]
    fn test_transpose_in_place() {
        let mut m = Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f32);
        let expected = m.t().to_owned();
        transpose_in_place(m.view_mut());
        assert_eq!(m, expected);
    }

    // ==================== Spectral Arithmetic ====================

    #[test]
    fn test_complex_spectrum_matches_rustfft() {
        let n = 16;
        let input = random_matrix_f64(n, 4242);
        let freq = forward_square(input.view()).unwrap();
        let spectrum = complex_spectrum(freq.view()).unwrap();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);
        let mut reference = input.mapv(|v| Complex::new(v, 0.0));
        for mut row in reference.rows_mut() {
            let mut buf = row.to_vec();
            fft.process(&mut buf);
            for (dst, v) in row.iter_mut().zip(buf) {
                *dst = v;
            }
        }
        for mut col in reference.columns_mut() {
            let mut buf = col.to_vec();
            fft.process(&mut buf);
            for (dst, v) in col.iter_mut().zip(buf) {
                *dst = v;
            }
        }

        for (a, b) in spectrum.iter().zip(reference.iter()) {
            assert!((a.re - b.re).abs() < 1e-9);
            assert!((a.im - b.im).abs() < 1e-9);
        }
    }

    #[test]
    fn test_multiply_is_circular_convolution() {
        let n = 8;
        let a = random_matrix_f64(n, 11);
        let b = random_matrix_f64(n, 12);
        let ha = forward_square(a.view()).unwrap();
        let hb = forward_square(b.view()).unwrap();
        let product = multiply(ha.view(), hb.view()).unwrap();
        let conv = inverse_square(product.view()).unwrap();

        let expected = Array2::from_shape_fn((n, n), |(r, c)| {
            let mut sum = 0.0;
            for i in 0..n {
                for j in 0..n {
                    sum += a[[i, j]] * b[[(r + n - i) % n, (c + n - j) % n]];
                }
            }
            sum
        });
        assert!(max_abs_diff_f64(&conv, &expected) < 1e-10);
    }

    #[test]
    fn test_conjugate_multiply_is_circular_correlation() {
        let n = 8;
        let a = random_matrix_f64(n, 21);
        let b = random_matrix_f64(n, 22);
        let ha = forward_square(a.view()).unwrap();
        let hb = forward_square(b.view()).unwrap();
        let product = conjugate_multiply(ha.view(), hb.view()).unwrap();
        let corr = inverse_square(product.view()).unwrap();

        let expected = Array2::from_shape_fn((n, n), |(r, c)| {
            let mut sum = 0.0;
            for i in 0..n {
                for j in 0..n {
                    sum += a[[(i + r) % n, (j + c) % n]] * b[[i, j]];
                }
            }
            sum
        });
        assert!(max_abs_diff_f64(&corr, &expected) < 1e-10);
    }

    #[test]
    fn test_divide_undoes_multiply() {
        let n = 8;
        let ha = forward_square(random_matrix_f64(n, 31).view()).unwrap();
        let hb = forward_square(random_matrix_f64(n, 32).view()).unwrap();
        let product = multiply(ha.view(), hb.view()).unwrap();
        let quotient = divide(product.view(), hb.view()).unwrap();
        assert!(max_abs_diff_f64(&quotient, &ha) < 1e-6);
    }

    #[test]
    fn test_divide_by_zero_spectrum_is_finite() {
        let h1 = random_matrix_f32(8, 41);
        let zeros = Array2::<f32>::zeros((8, 8));
        let out = divide(h1.view(), zeros.view()).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_spectral_arithmetic_shape_mismatch() {
        let a = Array2::<f32>::zeros((8, 8));
        let b = Array2::<f32>::zeros((16, 16));
        assert_eq!(
            multiply(a.view(), b.view()).unwrap_err(),
            FhtError::DimensionMismatch {
                expected: (8, 8),
                actual: (16, 16)
            }
        );
    }
}
