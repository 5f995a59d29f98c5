//! Built-in MathML walker covering presentation markup found in lesson content.

use super::MathTransform;
use crate::error::RenderError;
use crate::tree::{NodeId, Tree};

/// Operators and identifiers with a LaTeX command of their own.
const SYMBOLS: &[(&str, &str)] = &[
    ("\u{2192}", r"\rightarrow "),
    ("\u{2190}", r"\leftarrow "),
    ("\u{21cc}", r"\rightleftharpoons "),
    ("\u{2264}", r"\leq "),
    ("\u{2265}", r"\geq "),
    ("\u{2260}", r"\neq "),
    ("\u{2248}", r"\approx "),
    ("\u{b1}", r"\pm "),
    ("\u{b7}", r"\cdot "),
    ("\u{22c5}", r"\cdot "),
    ("\u{f7}", r"\div "),
    ("\u{221e}", r"\infty "),
    ("\u{2206}", r"\Delta "),
    ("\u{394}", r"\Delta "),
    ("\u{3b1}", r"\alpha "),
    ("\u{3b2}", r"\beta "),
    ("\u{3b3}", r"\gamma "),
    ("\u{3b8}", r"\theta "),
    ("\u{3bb}", r"\lambda "),
    ("\u{3bc}", r"\mu "),
    ("\u{3c0}", r"\pi "),
    ("\u{3c1}", r"\rho "),
    ("\u{3c3}", r"\sigma "),
    ("\u{3a9}", r"\Omega "),
    ("\u{3c9}", r"\omega "),
    ("\u{b0}", r"^{\circ}"),
    ("{", r"\{"),
    ("}", r"\}"),
    ("%", r"\%"),
    ("&", r"\&"),
];

/// Presentation-MathML transform.
///
/// Handles token elements, scripts, fractions, roots, fences, accents and
/// TeX annotations. Unknown elements contribute their children.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMathml;

impl MathTransform for BasicMathml {
    fn to_latex(&self, tree: &Tree, node: NodeId) -> Result<String, RenderError> {
        let out = walk(tree, node)?;
        Ok(out.trim().to_string())
    }
}

fn walk(tree: &Tree, id: NodeId) -> Result<String, RenderError> {
    let node = tree.node(id);
    if node.is_comment() {
        return Ok(String::new());
    }

    match node.local_name() {
        "mi" | "mn" | "mo" => Ok(symbols(tree.text_content(id).trim())),
        "mtext" => {
            let text = tree.text_content(id);
            if text.trim().is_empty() {
                Ok(r"\ ".to_string())
            } else {
                Ok(format!(r"\text{{{text}}}"))
            }
        }
        "mspace" => Ok(r"\ ".to_string()),
        "msup" => {
            let [base, sup] = args::<2>(tree, id)?;
            Ok(format!("{}^{{{}}}", group(tree, base)?, walk(tree, sup)?))
        }
        "msub" => {
            let [base, sub] = args::<2>(tree, id)?;
            Ok(format!("{}_{{{}}}", group(tree, base)?, walk(tree, sub)?))
        }
        "msubsup" => {
            let [base, sub, sup] = args::<3>(tree, id)?;
            Ok(format!(
                "{}_{{{}}}^{{{}}}",
                group(tree, base)?,
                walk(tree, sub)?,
                walk(tree, sup)?
            ))
        }
        "mfrac" => {
            let [num, den] = args::<2>(tree, id)?;
            Ok(format!(r"\frac{{{}}}{{{}}}", walk(tree, num)?, walk(tree, den)?))
        }
        "msqrt" => Ok(format!(r"\sqrt{{{}}}", children(tree, id)?)),
        "mroot" => {
            let [radicand, index] = args::<2>(tree, id)?;
            Ok(format!(r"\sqrt[{}]{{{}}}", walk(tree, index)?, walk(tree, radicand)?))
        }
        "mover" => {
            let [base, over] = args::<2>(tree, id)?;
            Ok(format!(r"\overset{{{}}}{{{}}}", walk(tree, over)?.trim(), walk(tree, base)?))
        }
        "munder" => {
            let [base, under] = args::<2>(tree, id)?;
            Ok(format!(r"\underset{{{}}}{{{}}}", walk(tree, under)?.trim(), walk(tree, base)?))
        }
        "mfenced" => {
            let open = node.attr("open").unwrap_or("(");
            let close = node.attr("close").unwrap_or(")");
            let separator = node.attr("separators").unwrap_or(",").trim();
            let parts = elements(tree, id)
                .map(|c| walk(tree, c))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!(
                r"\left{} {} \right{}",
                fence(open),
                parts.join(separator),
                fence(close)
            ))
        }
        "semantics" => {
            let tex = elements(tree, id).find(|&c| {
                let child = tree.node(c);
                child.local_name() == "annotation"
                    && matches!(
                        child.attr("encoding"),
                        Some("TeX" | "LaTeX" | "application/x-tex")
                    )
            });
            match tex {
                Some(annotation) => Ok(tree.text_content(annotation).trim().to_string()),
                None => children(tree, id),
            }
        }
        "annotation" | "annotation-xml" => Ok(String::new()),
        _ => children(tree, id),
    }
}

fn elements<'a>(tree: &'a Tree, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    tree.children(id)
        .iter()
        .copied()
        .filter(move |&c| !tree.node(c).is_comment())
}

fn children(tree: &Tree, id: NodeId) -> Result<String, RenderError> {
    elements(tree, id).map(|c| walk(tree, c)).collect()
}

/// Exactly `N` element children, as required by script and fraction elements.
fn args<const N: usize>(tree: &Tree, id: NodeId) -> Result<[NodeId; N], RenderError> {
    let found: Vec<NodeId> = elements(tree, id).collect();
    found.try_into().map_err(|found: Vec<NodeId>| RenderError::Structure {
        tag: tree.node(id).local_name().to_string(),
        message: format!("expected {N} arguments, found {}", found.len()),
    })
}

/// A script base, braced unless it is a single token.
fn group(tree: &Tree, id: NodeId) -> Result<String, RenderError> {
    let base = walk(tree, id)?;
    if base.chars().count() <= 1 || matches!(tree.node(id).local_name(), "mi" | "mn" | "mo") {
        Ok(base)
    } else {
        Ok(format!("{{{base}}}"))
    }
}

fn symbols(text: &str) -> String {
    SYMBOLS
        .iter()
        .find(|(symbol, _)| *symbol == text)
        .map_or_else(|| text.to_string(), |(_, latex)| latex.to_string())
}

fn fence(delimiter: &str) -> &str {
    match delimiter {
        "{" => r"\{",
        "}" => r"\}",
        "" => ".",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_xml;
    use pretty_assertions::assert_eq;

    fn convert(input: &str) -> String {
        let tree = parse_xml(input).unwrap();
        BasicMathml.to_latex(&tree, tree.root()).unwrap()
    }

    #[test]
    fn test_tokens_and_rows() {
        assert_eq!(
            convert("<math><mrow><mi>x</mi><mo>+</mo><mn>2</mn></mrow></math>"),
            "x+2"
        );
    }

    #[test]
    fn test_scripts_and_fractions() {
        assert_eq!(
            convert("<math><msup><mi>x</mi><mn>2</mn></msup></math>"),
            "x^{2}"
        );
        assert_eq!(
            convert("<math><msub><mrow><mi>v</mi><mi>f</mi></mrow><mn>1</mn></msub></math>"),
            "{vf}_{1}"
        );
        assert_eq!(
            convert("<math><mfrac><mn>1</mn><mrow><mi>x</mi><mo>\u{2212}</mo><mn>1</mn></mrow></mfrac></math>"),
            "\\frac{1}{x\u{2212}1}"
        );
        assert_eq!(
            convert("<math><msqrt><mn>2</mn></msqrt></math>"),
            r"\sqrt{2}"
        );
    }

    #[test]
    fn test_symbols_and_accents() {
        assert_eq!(
            convert("<math><mover><mi>F</mi><mo>\u{2192}</mo></mover></math>"),
            r"\overset{\rightarrow}{F}"
        );
        assert_eq!(convert("<math><mi>\u{3c0}</mi></math>"), r"\pi");
    }

    #[test]
    fn test_fenced() {
        assert_eq!(
            convert("<math><mfenced><mi>a</mi><mi>b</mi></mfenced></math>"),
            r"\left( a,b \right)"
        );
    }

    #[test]
    fn test_tex_annotation_wins() {
        assert_eq!(
            convert(
                "<math><semantics><mi>x</mi><annotation encoding=\"TeX\">x_0</annotation></semantics></math>"
            ),
            "x_0"
        );
    }

    #[test]
    fn test_wrong_arity_is_structural() {
        let tree = parse_xml("<math><mfrac><mn>1</mn></mfrac></math>").unwrap();
        assert!(matches!(
            BasicMathml.to_latex(&tree, tree.root()),
            Err(RenderError::Structure { tag, .. }) if tag == "mfrac"
        ));
    }
}
