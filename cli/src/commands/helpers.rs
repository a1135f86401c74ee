pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// Render a progress value against a goal, e.g. `1200 / 2000 (60%)`.
pub(crate) fn progress(current: f64, goal: i64) -> String {
    let current = no_neg_zero(current);
    if goal <= 0 {
        return format!("{current:.0}");
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = current / goal as f64 * 100.0;
    format!("{current:.0} / {goal} ({pct:.0}%)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(1200.0, 2000), "1200 / 2000 (60%)");
        assert_eq!(progress(-0.0, 150), "0 / 150 (0%)");
        assert_eq!(progress(300.0, 0), "300");
    }
}
