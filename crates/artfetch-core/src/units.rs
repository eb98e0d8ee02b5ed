//! Humanized byte counts and transfer rates for terminal status lines.

/// Render a byte count as `B`/`KiB`/`MiB`/`GiB`, two decimals above bytes.
#[must_use]
pub fn size_in_str(total: u64) -> String {
    let mut value = total as f64;
    if value < 1024.0 {
        return format!("{value:.0} B");
    }
    value /= 1024.0;
    if value < 1024.0 {
        return format!("{value:.2} KiB");
    }
    value /= 1024.0;
    if value < 1024.0 {
        return format!("{value:.2} MiB");
    }
    value /= 1024.0;
    format!("{value:.2} GiB")
}

/// Render an average transfer rate over `elapsed_secs`.
///
/// A zero/negative duration reads as `infinity B/s` instead of dividing.
#[must_use]
pub fn speed_in_str(total: u64, elapsed_secs: f64) -> String {
    if elapsed_secs <= 0.0 {
        return "infinity B/s".to_string();
    }
    let mut speed = total as f64 / elapsed_secs;
    if speed < 1024.0 {
        return format!("{speed:.0} B/s");
    }
    speed /= 1024.0;
    if speed < 1024.0 {
        return format!("{speed:.2} KiB/s");
    }
    speed /= 1024.0;
    if speed < 1024.0 {
        return format!("{speed:.2} MiB/s");
    }
    speed /= 1024.0;
    format!("{speed:.2} GiB/s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_step_through_binary_units() {
        assert_eq!(size_in_str(512), "512 B");
        assert_eq!(size_in_str(2048), "2.00 KiB");
        assert_eq!(size_in_str(5 * 1024 * 1024), "5.00 MiB");
        assert_eq!(size_in_str(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }

    #[test]
    fn speed_guards_against_zero_elapsed() {
        assert_eq!(speed_in_str(1000, 0.0), "infinity B/s");
        assert_eq!(speed_in_str(2048, 2.0), "1.00 KiB/s");
    }
}
