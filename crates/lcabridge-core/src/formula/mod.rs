//! Algebraic formula rewriting
//!
//! Formulas are first repaired textually (percent signs, decimal commas),
//! then scanned for two pseudo-calls: a unit conversion
//! `UnitConversion(value, 'from', 'to')`, replaced by a product with a
//! generated ratio variable, and a cross-reference
//! `Ref('entity'[, 'ProductionVolume'])`, replaced by the referenced
//! entity's recorded magnitude.

pub mod normalize;
pub mod rewriter;
pub mod scanner;

pub use normalize::{normalize_formula, replace_decimal_commas, replace_percent};
pub use rewriter::{FormulaRewriter, RewrittenFormula, PRODUCTION_VOLUME};
pub use scanner::{MarkerCall, MarkerScanner};

/// Make `formula` evaluate in the canonical unit of its amount
pub fn rescale_formula(formula: &str, scale_factor: f64) -> String {
    if scale_factor == 1.0 {
        formula.to_string()
    } else {
        format!("({}) * {}", formula, scale_factor)
    }
}
