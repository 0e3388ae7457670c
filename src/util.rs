pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Mean rounded to the nearest integer, 0 for an empty slice
pub fn rounded_mean(data: &[f64]) -> u32 {
    mean(data).map_or(0, |m| m.round().max(0.0) as u32)
}
