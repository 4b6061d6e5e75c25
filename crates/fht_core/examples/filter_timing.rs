use fht_core::{filter_image, BandpassConfig, ProgressHandle, StripeAxis};
use ndarray::Array2;
use std::time::Instant;

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_stripes(value: &str) -> StripeAxis {
    match value {
        "horizontal" | "h" => StripeAxis::Horizontal,
        "vertical" | "v" => StripeAxis::Vertical,
        _ => StripeAxis::None,
    }
}

fn build_image(rows: usize, cols: usize) -> Array2<f32> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    Array2::from_shape_fn((rows, cols), |(r, _)| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let noise = ((state >> 40) as f32) / ((1u64 << 24) as f32);
        // Horizontal banding on top of noise.
        noise + if r % 16 < 2 { 0.5 } else { 0.0 }
    })
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let rows = parse_arg(&args, "--rows", 2048usize);
    let cols = parse_arg(&args, "--cols", 3072usize);
    let large = parse_arg(&args, "--large", 40.0f32);
    let small = parse_arg(&args, "--small", 3.0f32);
    let tolerance = parse_arg(&args, "--tolerance", 5.0f32);
    let stripes = parse_stripes(&parse_arg(&args, "--stripes", String::from("none")));

    println!(
        "filter timing start rows={} cols={} large={} small={} stripes={:?} tolerance={} profile_env={:?}",
        rows,
        cols,
        large,
        small,
        stripes,
        tolerance,
        std::env::var("FHT_PROFILE_TIMING").ok()
    );

    let image = build_image(rows, cols);
    let config = BandpassConfig::<f32> {
        filter_large: large,
        filter_small: small,
        stripes,
        tolerance,
        ..BandpassConfig::<f32>::default()
    };

    let (progress, updates) = ProgressHandle::with_channel();
    let t0 = Instant::now();
    let out = filter_image(image.view(), &config, &progress).expect("filter_image failed");
    let elapsed = t0.elapsed();

    for update in updates.try_iter() {
        println!("  {} -> {:.0}%", update.phase, update.fraction * 100.0);
    }

    // Keep output observable to avoid accidental optimization assumptions.
    let checksum: f64 = out
        .image
        .iter()
        .step_by((rows * cols / 4096).max(1))
        .map(|&v| v as f64)
        .sum();

    println!(
        "filter timing done elapsed_s={:.3} checksum={:.9} display_range={:?}",
        elapsed.as_secs_f64(),
        checksum,
        out.display_range.map(|r| (r.min, r.max))
    );
}
