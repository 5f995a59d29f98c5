//! Numeric literal grammar and number formatting.

use super::{is_verbatim, mode_at, Mode};
use crate::error::NormalizeError;
use crate::tree::{Fragment, NodeId, Tree};
use nom::{
    character::complete::{digit0, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
    sequence::{pair, preceded},
    IResult,
};

const TEXT_THOUSANDS: &str = "\u{a0}";
const TEXT_MINUS: &str = "\u{2212}";
const MATH_THOUSANDS: &str = r"\ ";
const MATH_DECIMAL: &str = "{,}";

/// A parsed numeric literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    /// `Some('-')` or `Some('+')` when the literal carries an explicit sign.
    pub sign: Option<char>,
    /// Integer digits, possibly empty (`.5`).
    pub integer: String,
    /// Fractional digits after the decimal mark.
    pub fraction: Option<String>,
    /// Exponent after an `e`/`E` marker, sign normalized to ASCII.
    pub exponent: Option<String>,
}

impl NumberLiteral {
    /// Literal of the mantissa alone.
    fn mantissa(&self) -> Self {
        Self {
            exponent: None,
            ..self.clone()
        }
    }

    fn mantissa_text(&self) -> String {
        let mut out = String::new();
        if let Some(sign) = self.sign {
            out.push(sign);
        }
        out.push_str(&self.integer);
        if let Some(ref fraction) = self.fraction {
            out.push('.');
            out.push_str(fraction);
        }
        out
    }
}

fn sign(input: &str) -> IResult<&str, Option<char>> {
    let (input, sign) = opt(one_of("+-\u{2212}"))(input)?;
    Ok((input, sign.map(|c| if c == '+' { '+' } else { '-' })))
}

fn literal(input: &str) -> IResult<&str, NumberLiteral> {
    let (input, sign) = sign(input)?;
    let (input, integer) = digit0(input)?;
    let (input, fraction) = opt(preceded(one_of(".,"), digit1))(input)?;
    let (input, exponent) = opt(preceded(
        one_of("eE"),
        recognize(pair(opt(one_of("+-\u{2212}")), digit1)),
    ))(input)?;

    Ok((
        input,
        NumberLiteral {
            sign,
            integer: integer.to_string(),
            fraction: fraction.map(str::to_string),
            exponent: exponent.map(|e| e.replace('\u{2212}', "-")),
        },
    ))
}

/// Parse a numeric literal. Whitespace, including existing thousands
/// separators, is ignored; `.` and `,` are both accepted as decimal mark.
pub fn parse_literal(text: &str) -> Result<NumberLiteral, NormalizeError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let parsed = match all_consuming(literal)(compact.as_str()) {
        Ok((_, parsed)) if !parsed.integer.is_empty() || parsed.fraction.is_some() => Ok(parsed),
        _ => Err(NormalizeError::MalformedNumber(text.to_string())),
    };
    parsed
}

/// Format a literal for running text: `,` as decimal mark, a non-breaking
/// space between groups of three digits and a true minus sign.
///
/// ```
/// use html2latex::normalize::format_number;
///
/// assert_eq!(format_number("1234567").unwrap(), "1\u{a0}234\u{a0}567");
/// assert_eq!(format_number("1234.5678").unwrap(), "1\u{a0}234,567\u{a0}8");
/// ```
pub fn format_number(literal: &str) -> Result<String, NormalizeError> {
    format_number_in(literal, Mode::Text)
}

/// Format a literal for the given mode. Empty input formats to an empty
/// string. Literals with an exponent are rejected; the number rule splits
/// them into coefficient and exponent before formatting.
pub fn format_number_in(literal: &str, mode: Mode) -> Result<String, NormalizeError> {
    if literal.trim().is_empty() {
        return Ok(String::new());
    }
    let parsed = parse_literal(literal)?;
    if parsed.exponent.is_some() {
        return Err(NormalizeError::MalformedNumber(literal.to_string()));
    }
    Ok(format_parsed(&parsed, mode, true))
}

fn format_parsed(parsed: &NumberLiteral, mode: Mode, grouped: bool) -> String {
    let (thousands, decimal, minus) = match mode {
        Mode::Text => (TEXT_THOUSANDS, ",", TEXT_MINUS),
        Mode::Math => (MATH_THOUSANDS, MATH_DECIMAL, "-"),
    };
    let thousands = if grouped { thousands } else { "" };

    let mut out = String::new();
    match parsed.sign {
        Some('-') => out.push_str(minus),
        Some(sign) => out.push(sign),
        None => {}
    }

    let integer = if parsed.integer.is_empty() {
        "0"
    } else {
        parsed.integer.as_str()
    };
    out.push_str(&group_from_right(integer, thousands));

    if let Some(ref fraction) = parsed.fraction {
        out.push_str(decimal);
        out.push_str(&group_from_left(fraction, thousands));
    }
    out
}

/// Group digits in threes counting from the right (integer part).
fn group_from_right(digits: &str, separator: &str) -> String {
    let mut out = String::with_capacity(digits.len() * 2);
    let lead = match digits.len() % 3 {
        0 => 3,
        n => n,
    };
    for (i, c) in digits.chars().enumerate() {
        if i >= lead && (i - lead) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// Group digits in threes counting from the left (fractional part).
fn group_from_left(digits: &str, separator: &str) -> String {
    let mut out = String::with_capacity(digits.len() * 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// Round a literal half-up to `places` decimals using its decimal digits.
pub fn round_literal(parsed: &NumberLiteral, places: usize) -> NumberLiteral {
    let fraction = parsed.fraction.clone().unwrap_or_default();
    let integer = if parsed.integer.is_empty() {
        "0".to_string()
    } else {
        parsed.integer.clone()
    };

    let mut digits: Vec<u8> = integer.bytes().map(|b| b - b'0').collect();
    let mut kept: Vec<u8> = fraction.bytes().map(|b| b - b'0').collect();
    let round_up = kept.get(places).is_some_and(|&d| d >= 5);
    kept.resize(places, 0);
    digits.extend_from_slice(&kept);

    if round_up {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == 9 {
                *d = 0;
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - places;
    let to_text = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    NumberLiteral {
        sign: parsed.sign,
        integer: to_text(&digits[..split]),
        fraction: (places > 0).then(|| to_text(&digits[split..])),
        exponent: None,
    }
}

/// Format a currency amount: rounded, decimal mark localized, not grouped.
pub fn format_amount(parsed: &NumberLiteral, places: usize, mode: Mode) -> String {
    format_parsed(&round_literal(parsed, places), mode, false)
}

/// Number rule of the normalization pass.
pub(super) fn normalize_numbers(tree: &mut Tree) -> Result<usize, NormalizeError> {
    let worklist = super::collect(tree, "number");
    let mut count = 0;

    for id in worklist {
        if !tree.is_attached(id) {
            continue;
        }
        if is_verbatim(tree, id) {
            unwrap_literal(tree, id)?;
            continue;
        }

        split_exponent(tree, id)?;
        let mode = mode_at(tree, id);
        let fragment = if has_parts(tree, id) {
            composite(tree, id, mode)?
        } else {
            let text = tree.text_content(id);
            Fragment::text(format_number_in(&text, mode)?)
        };
        tree.splice(id, fragment)?;
        count += 1;
    }

    Ok(count)
}

fn unwrap_literal(tree: &mut Tree, id: NodeId) -> Result<(), NormalizeError> {
    let text = tree.node(id).text.clone();
    let children = tree.children(id).to_vec();
    tree.splice(id, Fragment::new(text, children))
}

fn has_parts(tree: &Tree, id: NodeId) -> bool {
    tree.children(id).iter().any(|&c| {
        matches!(
            tree.node(c).local_name(),
            "coefficient" | "base" | "exponent"
        )
    })
}

/// Turn a leaf literal such as `1.5e-3` into coefficient and exponent children.
fn split_exponent(tree: &mut Tree, id: NodeId) -> Result<(), NormalizeError> {
    if !tree.children(id).is_empty() {
        return Ok(());
    }
    let text = tree.node(id).text.clone();
    if text.trim().is_empty() {
        return Ok(());
    }
    let parsed = parse_literal(&text)?;
    let Some(ref exponent) = parsed.exponent else {
        return Ok(());
    };

    let coefficient = tree.create_text_element("coefficient", parsed.mantissa().mantissa_text());
    let exponent = tree.create_text_element("exponent", exponent.clone());
    tree.node_mut(id).text.clear();
    tree.append_child(id, coefficient);
    tree.append_child(id, exponent);
    Ok(())
}

/// Scientific notation: `coeff × base^exp`, or `base^exp` without a coefficient.
fn composite(tree: &mut Tree, id: NodeId, mode: Mode) -> Result<Fragment, NormalizeError> {
    let part = |tree: &Tree, name: &str| {
        tree.find_child(id, |n| n.local_name() == name)
            .map(|c| tree.text_content(c))
            .filter(|t| !t.trim().is_empty())
    };
    let coefficient = part(&*tree, "coefficient")
        .map(|c| format_number_in(&c, mode))
        .transpose()?;
    let base = format_number_in(&part(&*tree, "base").unwrap_or_else(|| "10".to_string()), mode)?;
    let exponent = part(&*tree, "exponent")
        .map(|e| format_number_in(&e, mode))
        .transpose()?;

    let Some(exponent) = exponent else {
        return Ok(Fragment::text(coefficient.unwrap_or(base)));
    };

    match mode {
        Mode::Math => {
            let power = format!("{base}^{{{exponent}}}");
            Ok(Fragment::text(match coefficient {
                Some(c) => format!(r"{c} \times {power}"),
                None => power,
            }))
        }
        Mode::Text => {
            let lead = match coefficient {
                Some(c) => format!("{c} \u{d7} {base}"),
                None => base,
            };
            let sup = tree.create_text_element("sup", exponent);
            Ok(Fragment::new(lead, vec![sup]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_xml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_integer_grouping() {
        assert_eq!(format_number("1234567").unwrap(), "1\u{a0}234\u{a0}567");
        assert_eq!(format_number("123").unwrap(), "123");
        assert_eq!(format_number("1234").unwrap(), "1\u{a0}234");
    }

    #[test]
    fn test_format_fraction_groups_left_to_right() {
        assert_eq!(format_number("1234.5678").unwrap(), "1\u{a0}234,567\u{a0}8");
        assert_eq!(format_number("0,1234567").unwrap(), "0,123\u{a0}456\u{a0}7");
    }

    #[test]
    fn test_format_sign() {
        assert_eq!(format_number("-1500").unwrap(), "\u{2212}1\u{a0}500");
        assert_eq!(format_number_in("-1500", Mode::Math).unwrap(), r"-1\ 500");
        assert_eq!(format_number("+3").unwrap(), "+3");
    }

    #[test]
    fn test_format_math_mode() {
        assert_eq!(format_number_in("12345.5", Mode::Math).unwrap(), r"12\ 345{,}5");
    }

    #[test]
    fn test_format_edge_cases() {
        assert_eq!(format_number("").unwrap(), "");
        assert_eq!(format_number("  ").unwrap(), "");
        assert_eq!(format_number(".5").unwrap(), "0,5");
        assert_eq!(format_number("1\u{a0}000").unwrap(), "1\u{a0}000");
    }

    #[test]
    fn test_malformed_literals() {
        for bad in ["12a", "1.2.3", "--1", "e5", "1,000,000"] {
            assert_eq!(
                format_number(bad),
                Err(NormalizeError::MalformedNumber(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_exponent() {
        let parsed = parse_literal("1.5E\u{2212}3").unwrap();
        assert_eq!(parsed.integer, "1");
        assert_eq!(parsed.fraction.as_deref(), Some("5"));
        assert_eq!(parsed.exponent.as_deref(), Some("-3"));
    }

    #[test]
    fn test_round_literal() {
        let round = |text: &str, places| {
            let rounded = round_literal(&parse_literal(text).unwrap(), places);
            format!(
                "{}{}",
                rounded.integer,
                rounded.fraction.map(|f| format!(".{f}")).unwrap_or_default()
            )
        };
        assert_eq!(round("2.675", 2), "2.68");
        assert_eq!(round("9.995", 2), "10.00");
        assert_eq!(round("1500", 0), "1500");
        assert_eq!(round("1500", 2), "1500.00");
        assert_eq!(round("0.4", 0), "0");
        assert_eq!(round("0.5", 0), "1");
    }

    #[test]
    fn test_format_amount() {
        let parsed = parse_literal("1499.999").unwrap();
        assert_eq!(format_amount(&parsed, 2, Mode::Text), "1500,00");
        assert_eq!(format_amount(&parsed, 2, Mode::Math), "1500{,}00");
    }

    #[test]
    fn test_number_rule_leaf() {
        let mut tree = parse_xml("<para>It costs <number>12500</number> in total.</para>").unwrap();
        normalize_numbers(&mut tree).unwrap();
        assert_eq!(tree.node(tree.root()).text, "It costs 12\u{a0}500 in total.");
    }

    #[test]
    fn test_number_rule_scientific_text_mode() {
        let mut tree = parse_xml("<para>About <number>1.5e-3</number> m</para>").unwrap();
        normalize_numbers(&mut tree).unwrap();

        let root = tree.root();
        assert_eq!(tree.node(root).text, "About 1,5 \u{d7} 10");
        let sup = tree.children(root)[0];
        assert_eq!(tree.node(sup).tag, "sup");
        assert_eq!(tree.node(sup).text, "\u{2212}3");
        assert_eq!(tree.node(sup).tail, " m");
    }

    #[test]
    fn test_number_rule_scientific_math_mode() {
        let mut tree = parse_xml(
            "<latex>x = <number><coefficient>6.02</coefficient><exponent>23</exponent></number></latex>",
        )
        .unwrap();
        normalize_numbers(&mut tree).unwrap();
        assert_eq!(tree.node(tree.root()).text, r"x = 6{,}02 \times 10^{23}");
    }

    #[test]
    fn test_number_rule_base_without_coefficient() {
        let mut tree = parse_xml(
            "<latex><number><base>2</base><exponent>-5</exponent></number></latex>",
        )
        .unwrap();
        normalize_numbers(&mut tree).unwrap();
        assert_eq!(tree.node(tree.root()).text, "2^{-5}");
    }

    #[test]
    fn test_number_rule_skips_verbatim() {
        let mut tree = parse_xml("<para><code>x = <number>12345</number>;</code></para>").unwrap();
        normalize_numbers(&mut tree).unwrap();
        let code = tree.children(tree.root())[0];
        assert_eq!(tree.node(code).text, "x = 12345;");
    }

    #[test]
    fn test_number_rule_rejects_malformed() {
        let mut tree = parse_xml("<para><number>12 apples</number></para>").unwrap();
        assert!(matches!(
            normalize_numbers(&mut tree),
            Err(NormalizeError::MalformedNumber(_))
        ));
    }
}
