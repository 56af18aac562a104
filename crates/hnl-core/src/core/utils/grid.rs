use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("Geometric sequence bounds must be positive and finite, got [{start}, {stop}]")]
    InvalidBounds { start: f64, stop: f64 },
    #[error("Geometric sequence must contain at least one point")]
    Empty,
}

/// Returns `count` numbers spaced evenly on a log scale from `start` to `stop` inclusive.
pub fn geomspace(start: f64, stop: f64, count: usize) -> Result<Vec<f64>, GridError> {
    if count == 0 {
        return Err(GridError::Empty);
    }
    if !(start.is_finite() && stop.is_finite()) || start <= 0.0 || stop <= 0.0 {
        return Err(GridError::InvalidBounds { start, stop });
    }
    if count == 1 {
        return Ok(vec![start]);
    }

    let (log_start, log_stop) = (start.ln(), stop.ln());
    let step = (log_stop - log_start) / (count - 1) as f64;
    let mut values: Vec<f64> = (0..count)
        .map(|i| (log_start + step * i as f64).exp())
        .collect();
    values[0] = start;
    values[count - 1] = stop;
    Ok(values)
}

/// Flattens the Cartesian product of `xs` and `ys` the way a row-major `meshgrid(xs, ys)`
/// does: `ys` varies slowest, `xs` fastest.
pub fn mesh_points(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    ys.iter()
        .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
        .collect()
}
