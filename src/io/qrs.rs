//! Three-column ASCII curve files ("QRS": `q  I  dI`).
//!
//! Reading:
//! - whitespace separated, one sample per line
//! - blank lines and lines starting with `#` are skipped
//! - anything else that is not exactly three numbers is an error (no silent skipping)
//!
//! Writing uses tab separators and `%g`-style numbers.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::ScatteringCurve;
use crate::error::DesmearError;

/// Read a QRS file into a validated curve.
pub fn read_qrs(path: &Path) -> Result<ScatteringCurve, DesmearError> {
    let text = fs::read_to_string(path).map_err(|e| DesmearError::DataFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_qrs(&text, path)
}

/// Parse QRS text; `path` only labels errors.
pub fn parse_qrs(text: &str, path: &Path) -> Result<ScatteringCurve, DesmearError> {
    let mut q = Vec::new();
    let mut intensity = Vec::new();
    let mut uncertainty = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = || DesmearError::MalformedLine {
            path: path.to_path_buf(),
            line: idx + 1,
            content: line.to_string(),
        };
        let values = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| malformed())?;
        let &[qi, ii, di] = values.as_slice() else {
            return Err(malformed());
        };
        q.push(qi);
        intensity.push(ii);
        uncertainty.push(di);
    }

    ScatteringCurve::new(q, intensity, uncertainty).map_err(|e| match e {
        insufficient @ DesmearError::InsufficientData { .. } => insufficient,
        other => DesmearError::DataFile {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}

/// Write `(x, y, dy)` as tab-separated `%g` columns.
pub fn write_qrs(path: &Path, x: &[f64], y: &[f64], dy: &[f64]) -> Result<(), DesmearError> {
    let write_err = |e: std::io::Error| DesmearError::WriteFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    for ((xi, yi), di) in x.iter().zip(y).zip(dy) {
        writeln!(out, "{}\t{}\t{}", format_g(*xi), format_g(*yi), format_g(*di)).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    Ok(())
}

/// C `printf("%g")`: six significant digits, trailing zeros dropped,
/// exponent form when the exponent is below -4 or at least 6.
pub fn format_g(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return if v.is_nan() {
            "nan".to_string()
        } else if v > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    // Rounding to 6 significant digits can carry into the exponent (999999.5 -> 1e+06),
    // so take the exponent from the rounded scientific form.
    let sci = format!("{v:.5e}");
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs())
    } else {
        let decimals = (5 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_g_matches_printf() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(1.0), "1");
        assert_eq!(format_g(0.08), "0.08");
        assert_eq!(format_g(123456.0), "123456");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001234), "1.234e-05");
        assert_eq!(format_g(-2.5e-7), "-2.5e-07");
        assert_eq!(format_g(12982255.997449555), "1.29823e+07");
        assert_eq!(format_g(999999.5), "1e+06");
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let text = "# q I dI\n\n0.001 100 1\n  # inner comment\n0.002\t50\t0.5\n";
        let curve = parse_qrs(text, &PathBuf::from("mem.smr")).unwrap();
        assert_eq!(curve.q(), &[0.001, 0.002]);
        assert_eq!(curve.intensity(), &[100.0, 50.0]);
        assert_eq!(curve.uncertainty(), &[1.0, 0.5]);
    }

    #[test]
    fn malformed_lines_are_fatal_with_line_number() {
        let text = "0.001 100 1\n0.002 abc 1\n0.003 10 1\n";
        match parse_qrs(text, &PathBuf::from("bad.smr")) {
            Err(DesmearError::MalformedLine { line, content, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "0.002 abc 1");
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }

        let two_columns = "0.001 100\n0.002 50\n";
        assert!(matches!(
            parse_qrs(two_columns, &PathBuf::from("short.smr")),
            Err(DesmearError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn too_few_points_is_insufficient_data() {
        let err = parse_qrs("0.001 100 1\n", &PathBuf::from("one.smr")).unwrap_err();
        assert!(matches!(err, DesmearError::InsufficientData { found: 1, .. }));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_qrs(Path::new("/definitely/not/here.smr")).unwrap_err();
        assert!(matches!(err, DesmearError::DataFile { .. }));
        assert!(err.to_string().contains("/definitely/not/here.smr"));
    }
}
