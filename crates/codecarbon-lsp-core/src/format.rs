//! Emissions number formatting for editor-facing messages.

/// Unit reported to the editor.
const UNIT: &str = "kgCO2e";

/// Format an emissions value with `decimals` places and the kgCO2e unit.
///
/// Values below `1e-3` or above `1e6` switch to exponent notation so tiny
/// sessions stay readable.
///
/// ```
/// use codecarbon_lsp_core::format_emissions;
///
/// assert_eq!(format_emissions(0.0001, 2), "1.00e-4 kgCO2e");
/// assert_eq!(format_emissions(0.5, 2), "0.50 kgCO2e");
/// ```
pub fn format_emissions(value: f64, decimals: usize) -> String {
    if value < 1e-3 || value > 1e6 {
        format!("{value:.decimals$e} {UNIT}")
    } else {
        format!("{value:.decimals$} {UNIT}")
    }
}
