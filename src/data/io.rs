//! Reading and writing intensity maps.
//!
//! Formats are chosen by extension:
//! - `.int`: self-describing text with axis headers,
//! - `.txt`: plain numpy-style matrix, rows from the top of the detector,
//! - `.json`: serde representation.

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::Array2;

use crate::instrument::FixedBinAxis;

use super::{DataError, IntensityData};

const INT_HEADER: &str = "# gisasrs intensity data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Int,
    Txt,
    Json,
}

fn format_of(path: &Path) -> Result<Format, DataError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("int") => Ok(Format::Int),
        Some("txt") => Ok(Format::Txt),
        Some("json") => Ok(Format::Json),
        other => Err(DataError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

pub fn write_intensity_data(data: &IntensityData, path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    let format = format_of(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut out = BufWriter::new(fs::File::create(path)?);
    match format {
        Format::Int => write_int(data, &mut out)?,
        Format::Txt => write_txt(data, &mut out)?,
        Format::Json => serde_json::to_writer_pretty(&mut out, data)?,
    }
    out.flush()?;
    tracing::debug!(path = %path.display(), "wrote intensity data");
    Ok(())
}

pub fn read_intensity_data(path: impl AsRef<Path>) -> Result<IntensityData, DataError> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let reader = BufReader::new(fs::File::open(path)?);
    match format {
        Format::Int => read_int(reader),
        Format::Txt => read_txt(reader),
        Format::Json => Ok(serde_json::from_reader(reader)?),
    }
}

/// Axis names are written as JSON strings so whitespace survives a round trip.
fn write_axis<W: Write>(axis: &FixedBinAxis, out: &mut W) -> std::io::Result<()> {
    let name = serde_json::to_string(&axis.name)?;
    writeln!(out, "# axis {} {} {} {}", name, axis.size, axis.min, axis.max)
}

fn write_int<W: Write>(data: &IntensityData, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{INT_HEADER}")?;
    write_axis(&data.x_axis, out)?;
    write_axis(&data.y_axis, out)?;
    writeln!(out, "# data")?;
    for row in data.array().rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}

fn parse_error(line: usize, message: impl Into<String>) -> DataError {
    DataError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_row(text: &str, line: usize) -> Result<Vec<f64>, DataError> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|e| parse_error(line, format!("'{token}': {e}")))
        })
        .collect()
}

/// Split the axis name from the numeric fields. Quoted names are JSON
/// strings; bare names end at the first whitespace.
fn split_axis_name(text: &str, line: usize) -> Result<(String, &str), DataError> {
    let text = text.trim_start();
    if text.starts_with('"') {
        let mut stream = serde_json::Deserializer::from_str(text).into_iter::<String>();
        let name = match stream.next() {
            Some(Ok(name)) => name,
            Some(Err(e)) => return Err(parse_error(line, e.to_string())),
            None => return Err(parse_error(line, "missing axis name")),
        };
        Ok((name, &text[stream.byte_offset()..]))
    } else {
        let end = text.find(char::is_whitespace).unwrap_or(text.len());
        Ok((text[..end].to_string(), &text[end..]))
    }
}

fn parse_axis(text: &str, line: usize) -> Result<FixedBinAxis, DataError> {
    let (name, rest) = split_axis_name(text, line)?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if name.is_empty() || fields.len() != 3 {
        return Err(parse_error(line, "expected '# axis <name> <size> <min> <max>'"));
    }
    let size = fields[0]
        .parse::<usize>()
        .map_err(|e| parse_error(line, e.to_string()))?;
    let min = fields[1]
        .parse::<f64>()
        .map_err(|e| parse_error(line, e.to_string()))?;
    let max = fields[2]
        .parse::<f64>()
        .map_err(|e| parse_error(line, e.to_string()))?;
    Ok(FixedBinAxis::new(name, size, min, max)?)
}

fn read_int<R: BufRead>(reader: R) -> Result<IntensityData, DataError> {
    let mut axes = Vec::new();
    let mut rows: Vec<f64> = Vec::new();
    let mut in_data = false;
    let mut header_seen = false;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let number = number + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('#') {
            let rest = rest.trim();
            if trimmed == INT_HEADER {
                header_seen = true;
            } else if let Some(axis) = rest.strip_prefix("axis") {
                axes.push(parse_axis(axis, number)?);
            } else if rest == "data" {
                in_data = true;
            }
            continue;
        }
        if !in_data {
            return Err(parse_error(number, "values before '# data'"));
        }
        rows.extend(parse_row(trimmed, number)?);
    }

    if !header_seen {
        return Err(parse_error(1, "missing header"));
    }
    if axes.len() != 2 {
        return Err(parse_error(0, format!("expected 2 axes, found {}", axes.len())));
    }
    let y_axis = axes.pop().ok_or_else(|| parse_error(0, "missing y axis"))?;
    let x_axis = axes.pop().ok_or_else(|| parse_error(0, "missing x axis"))?;
    let shape = (x_axis.size, y_axis.size);
    let values = Array2::from_shape_vec(shape, rows).map_err(|e| parse_error(0, e.to_string()))?;
    IntensityData::from_array(x_axis, y_axis, values)
}

/// Rows run from the highest `alpha_f` down, columns along `phi_f`.
fn write_txt<W: Write>(data: &IntensityData, out: &mut W) -> std::io::Result<()> {
    let (nx, ny) = data.shape();
    let values = data.array();
    for iy in (0..ny).rev() {
        let line: Vec<String> = (0..nx).map(|ix| values[[ix, iy]].to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}

/// Plain matrices carry no axes; bins are numbered from zero.
fn read_txt<R: BufRead>(reader: R) -> Result<IntensityData, DataError> {
    let mut rows = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        rows.push(parse_row(trimmed, number + 1)?);
    }
    let ny = rows.len();
    let nx = rows.first().map(Vec::len).unwrap_or(0);
    if ny == 0 || nx == 0 {
        return Err(parse_error(0, "empty matrix"));
    }
    if let Some(bad) = rows.iter().position(|r| r.len() != nx) {
        return Err(parse_error(bad + 1, "ragged row"));
    }
    let values = Array2::from_shape_fn((nx, ny), |(ix, iy)| rows[ny - 1 - iy][ix]);
    IntensityData::from_array(
        FixedBinAxis::new("x", nx, 0.0, nx as f64)?,
        FixedBinAxis::new("y", ny, 0.0, ny as f64)?,
        values,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> IntensityData {
        let x = FixedBinAxis::new("phi_f", 3, -0.01, 0.01).unwrap();
        let y = FixedBinAxis::new("alpha_f", 2, 0.0, 0.02).unwrap();
        let values = Array2::from_shape_fn((3, 2), |(ix, iy)| 0.1 + (ix * 2 + iy) as f64 * 1.5e3);
        IntensityData::from_array(x, y, values).unwrap()
    }

    #[test]
    fn test_int_preserves_axes_and_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/map.int");
        let data = sample();
        write_intensity_data(&data, &path).unwrap();
        let back = read_intensity_data(&path).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_txt_orientation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.txt");
        write_intensity_data(&sample(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let first: Vec<f64> = text
            .lines()
            .next()
            .unwrap()
            .split_whitespace()
            .map(|t| t.parse().unwrap())
            .collect();
        // top row holds the highest alpha bin
        assert_eq!(first, vec![sample().array()[[0, 1]], sample().array()[[1, 1]], sample().array()[[2, 1]]]);
        let back = read_intensity_data(&path).unwrap();
        assert_eq!(back.array(), sample().array());
    }

    #[test]
    fn test_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        write_intensity_data(&sample(), &path).unwrap();
        assert_eq!(read_intensity_data(&path).unwrap(), sample());
    }

    #[test]
    fn test_json_rejects_inconsistent_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut value = serde_json::to_value(sample()).unwrap();
        // six values still, but the axes now claim 6x1 bins
        value["x_axis"]["size"] = 6.into();
        value["y_axis"]["size"] = 1.into();
        fs::write(&path, value.to_string()).unwrap();
        assert!(matches!(read_intensity_data(&path), Err(DataError::Json(_))));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["y_axis"]["size"] = 0.into();
        fs::write(&path, value.to_string()).unwrap();
        assert!(read_intensity_data(&path).is_err());
    }

    #[test]
    fn test_int_axis_name_with_spaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spaces.int");
        let x = FixedBinAxis::new("phi f [rad]", 3, -0.01, 0.01).unwrap();
        let y = FixedBinAxis::new("alpha_f", 2, 0.0, 0.02).unwrap();
        let data = IntensityData::from_array(x, y, sample().array().clone()).unwrap();
        write_intensity_data(&data, &path).unwrap();
        assert_eq!(read_intensity_data(&path).unwrap(), data);
    }

    #[test]
    fn test_int_bare_axis_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bare.int");
        fs::write(&path, "# gisasrs intensity data\n# axis x 2 0 1\n# axis y 1 0 1\n# data\n1\n2\n").unwrap();
        let data = read_intensity_data(&path).unwrap();
        assert_eq!(data.x_axis.name, "x");
        assert_eq!(data.bin_content(1), Some(2.0));
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            write_intensity_data(&sample(), "map.png"),
            Err(DataError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_malformed_int() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.int");
        fs::write(&path, "# gisasrs intensity data\n# axis x 2 0 1\n# data\n1 2\n").unwrap();
        assert!(matches!(
            read_intensity_data(&path),
            Err(DataError::Parse { .. })
        ));
    }
}
