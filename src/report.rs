use std::io::Write;

use crate::analysis::WindowFit;

/// Lines written before the first row
pub const TABLE_PREAMBLE: [&str; 2] = ["\\begin{longtblr}[]{}", "    \\toprule"];

/// Lines written after the last row
pub const TABLE_POSTAMBLE: [&str; 2] = ["    \\bottomrule", "\\end{longtblr}"];

/// Value with its error in units of the last printed digit, e.g. `1.23(1)`
pub fn format_with_error(value: f64, error_digits: f64) -> String {
    format!("{:.2}({})", value, error_digits.round() as i64)
}

/// One table row: window, slope with error, exponent with half-scale error
pub fn format_row(fit: &WindowFit) -> String {
    format!(
        "    {} & {} & {}\\\\",
        fit.window,
        format_with_error(fit.slope, fit.std_error * 100.0),
        format_with_error(fit.slope / 2.0, fit.std_error * 50.0),
    )
}

/// Write the whole table: preamble, one row per fit, postamble
pub fn write_table<W: Write>(out: &mut W, fits: &[WindowFit]) -> std::io::Result<()> {
    for line in TABLE_PREAMBLE {
        writeln!(out, "{}", line)?;
    }
    for fit in fits {
        writeln!(out, "{}", format_row(fit))?;
    }
    for line in TABLE_POSTAMBLE {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}
