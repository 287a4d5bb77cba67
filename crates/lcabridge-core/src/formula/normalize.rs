//! Regex-level formula repairs: percent signs and decimal commas

use regex::Regex;
use std::sync::OnceLock;

fn percent_regex() -> &'static Regex {
    static PERCENT: OnceLock<Regex> = OnceLock::new();
    PERCENT.get_or_init(|| Regex::new(r"(\d+(?:\.\d*)?)\s*%").expect("percent pattern is valid"))
}

/// Apply both repairs
pub fn normalize_formula(formula: &str) -> String {
    replace_decimal_commas(&replace_percent(formula))
}

/// `5.60%` becomes `5.60/ 100`
pub fn replace_percent(formula: &str) -> String {
    percent_regex().replace_all(formula, "${1}/ 100").into_owned()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Paren {
    Call,
    Group,
}

/// `1,45e-6` becomes `1.45e-6`
///
/// Only a digit run holding exactly one comma is rewritten, and only outside
/// quoted text and outside the argument list of a call, where the comma
/// separates arguments. Runs such as `1,000,000` are left alone.
pub fn replace_decimal_commas(formula: &str) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut parens: Vec<Paren> = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => quote = Some(c),
            '(' => {
                let is_call = previous_non_space(&chars, i).is_some_and(is_identifier_char);
                parens.push(if is_call { Paren::Call } else { Paren::Group });
            }
            ')' => {
                parens.pop();
            }
            _ => {}
        }

        let starts_number = c.is_ascii_digit()
            && !(i > 0 && (is_identifier_char(chars[i - 1]) || chars[i - 1] == '.'));
        if starts_number && !parens.contains(&Paren::Call) {
            let end = chars[i..]
                .iter()
                .position(|ch| !(ch.is_ascii_digit() || *ch == ','))
                .map_or(chars.len(), |offset| i + offset);
            let run: String = chars[i..end].iter().collect();
            out.push_str(&rewrite_run(&run));
            i = end;
            continue;
        }

        out.push(c);
        i += 1;
    }
    out
}

fn rewrite_run(run: &str) -> String {
    let groups: Vec<&str> = run.split(',').collect();
    match groups.as_slice() {
        [whole, fraction] if !whole.is_empty() && !fraction.is_empty() => {
            format!("{}.{}", whole, fraction)
        }
        _ => run.to_string(),
    }
}

fn previous_non_space(chars: &[char], index: usize) -> Option<char> {
    chars[..index].iter().rev().find(|c| !c.is_whitespace()).copied()
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_percent() {
        assert_eq!(
            replace_percent("8358976000 * 5.60% * (1 - 10%) / 0.5"),
            "8358976000 * 5.60/ 100 * (1 - 10/ 100) / 0.5"
        );
        assert_eq!(replace_percent("x * 3 %"), "x * 3/ 100");
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(replace_decimal_commas("1,45e-6*cement"), "1.45e-6*cement");
        assert_eq!(replace_decimal_commas("(1 - 0,5) * x"), "(1 - 0.5) * x");
    }

    #[test]
    fn test_call_arguments_keep_commas() {
        assert_eq!(replace_decimal_commas("max(1,2)"), "max(1,2)");
        assert_eq!(
            replace_decimal_commas("UnitConversion(4889,'kcal','MJ')"),
            "UnitConversion(4889,'kcal','MJ')"
        );
        assert_eq!(replace_decimal_commas("min((1,5),2)"), "min((1,5),2)");
    }

    #[test]
    fn test_thousands_and_identifiers_untouched() {
        assert_eq!(replace_decimal_commas("1,000,000 * x"), "1,000,000 * x");
        assert_eq!(replace_decimal_commas("a1,2"), "a1,2");
        assert_eq!(replace_decimal_commas("'1,5'"), "'1,5'");
    }
}
