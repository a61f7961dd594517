//! Parsing helpers for user-typed flag values.

/// Parse a crop spec of the form "x,y,width,height" (natural pixels).
pub fn parse_crop_spec(value: &str) -> Option<(u32, u32, u32, u32)> {
    let mut parts = value.split(',').map(|part| part.trim().parse::<u32>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let w = parts.next()?.ok()?;
    let h = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((x, y, w, h))
}

/// Parse a frame size spec of the form "WIDTHxHEIGHT".
pub fn parse_size_spec(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.trim().split_once(['x', 'X'])?;
    let width = w.trim().parse::<u32>().ok()?;
    let height = h.trim().parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

/// Format a second count for status output, e.g. "12.3s".
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.1}s", seconds)
}
