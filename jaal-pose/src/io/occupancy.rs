//! Occupancy text format.

use std::path::Path;

use crate::error::{Error, Result};
use crate::map::OccupancyMap;

/// Read an occupancy map from a text file.
pub fn load_occupancy(path: impl AsRef<Path>) -> Result<OccupancyMap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let map = parse_occupancy(&text)?;
    log::info!(
        "Loaded occupancy map {}: {}x{}, {} occupied",
        path.display(),
        map.width(),
        map.height(),
        map.num_occupied()
    );
    Ok(map)
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

/// Parse the occupancy text format.
///
/// The first line is ignored. Values must lie in [0, 1].
pub fn parse_occupancy(text: &str) -> Result<OccupancyMap> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    lines.next().ok_or_else(|| parse_error(1, "missing header line"))?;
    let (dims_line, dims) = lines
        .next()
        .ok_or_else(|| parse_error(2, "missing dimensions line"))?;

    let mut fields = dims.split_whitespace().map(str::parse::<usize>);
    let (width, height) = match (fields.next(), fields.next()) {
        (Some(Ok(w)), Some(Ok(h))) => (w, h),
        _ => return Err(parse_error(dims_line, format!("expected `width height`, got {:?}", dims))),
    };

    let total = width
        .checked_mul(height)
        .ok_or_else(|| parse_error(dims_line, format!("grid {}x{} is too large", width, height)))?;

    // Grow with the rows actually present, not with the header's claim.
    let mut cells = Vec::with_capacity(total.min(text.len()));
    for row in 0..height {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(dims_line + row + 1, format!("missing row {} of {}", row, height)))?;

        let before = cells.len();
        for token in line.split_whitespace().take(width) {
            let value: f32 = token
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid cell value {:?}", token)))?;
            if !(0.0..=1.0).contains(&value) {
                return Err(parse_error(line_no, format!("cell value {} outside [0, 1]", value)));
            }
            cells.push(value);
        }
        let found = cells.len() - before;
        if found != width {
            return Err(parse_error(line_no, format!("expected {} values, found {}", width, found)));
        }
    }

    OccupancyMap::from_cells(width, height, cells)
}
