//! Built-in LaTeX templates.
//!
//! Templates use LaTeX-friendly delimiters so that braces in the output
//! never collide with template syntax:
//!
//! | Construct | Delimiters |
//! |-----------|------------|
//! | variable  | `(((` `)))` |
//! | block     | `((*` `*))` |
//! | comment   | `((=` `=))` |

use super::TemplateBackend;
use crate::config::Dialect;
use crate::error::{ConfigError, TemplateError};
use crate::render::ContentRecord;
use minijinja::syntax::SyntaxConfig;
use minijinja::{context, AutoEscape, Environment};
use std::collections::HashMap;

/// Templates shared by both dialects.
const SHARED: &[(&str, &str)] = &[
    ("document", "(((content.text)))"),
    (
        "standalone",
        "\\documentclass{book}\n\
         \\usepackage[utf8]{inputenc}\n\
         \\usepackage{amsmath}\n\
         \\usepackage{graphicx}\n\
         \\usepackage{float}\n\
         \\usepackage{caption}\n\
         \\usepackage{framed}\n\
         \\usepackage{hyperref}\n\
         \\begin{document}\n\
         (((content.text)))\n\
         \\end{document}\n",
    ),
    ("not_implemented", "((= unmapped element, content kept =))(((content.text)))"),
    ("error", r"\textbf{[error in (((content.tag))): (((content.message)))]}"),
    (
        "math",
        r#"((* if content.display == "block" *))\[(((content.text)))\]((* else *))$(((content.text)))$((* endif *))"#,
    ),
    (
        "latex",
        r#"((* if content.mode == "raw" *))(((content.text)))((* elif content.mode == "block" *))\[(((content.text)))\]((* else *))$(((content.text)))$((* endif *))"#,
    ),
    (
        "table",
        "\n\\begin{center}\n\\begin{tabular}{(((content.cols)))}\n\\hline\n(((content.text)))\n\\end{tabular}\n\\end{center}\n",
    ),
    ("row", "(((content.text))) \\\\ \\hline\n"),
    ("entry", "(((content.text)))"),
    ("tr", "(((content.text)))\n"),
    ("td", "(((content.text))) & "),
    ("th", r"\textbf{(((content.text)))} & "),
    ("tgroup", "(((content.text)))"),
    ("thead", "(((content.text)))"),
    ("tbody", "(((content.text)))"),
    ("image", r"\includegraphics[width=(((content.width)))\textwidth]{(((content.src)))}"),
    (
        "figure",
        "((* if content.inside_float *))\n\\begin{center}\n(((content.text)))\n\
         ((* if content.caption *))\\captionof{(((content.type)))}{(((content.caption)))}\n((* endif *))\
         \\end{center}\n\
         ((* else *))\n\\begin{(((content.type)))}[H]\n\\centering\n(((content.text)))\n\
         ((* if content.caption *))\\caption{(((content.caption)))}\n((* endif *))\
         \\end{(((content.type)))}\n((* endif *))",
    ),
    (
        "link_url",
        r#"((* if content.text and content.text != content.url *))\href{(((content.url)))}{(((content.text)))}((* else *))\url{(((content.url)))}((* endif *))"#,
    ),
    ("link_ref", r"\ref{(((content.target)))}"),
    ("sup", r"\textsuperscript{(((content.text)))}"),
    ("sub", r"\textsubscript{(((content.text)))}"),
    ("list_bulleted", "\n\\begin{itemize}\n(((content.text)))\n\\end{itemize}\n"),
    ("list_enumerated", "\n\\begin{enumerate}\n(((content.text)))\n\\end{enumerate}\n"),
    ("chapter", "\n\\chapter{(((content.title)))}\n(((content.text)))"),
    ("section", "\n\\section{(((content.title)))}\n(((content.text)))"),
    ("subsection", "\n\\subsection{(((content.title)))}\n(((content.text)))"),
    ("subsubsection", "\n\\subsubsection{(((content.title)))}\n(((content.text)))"),
    ("bold", "\n\\textbf{(((content.title)))}\n\n(((content.text)))"),
    ("note", "\n\\begin{framed}\n(((content.text)))\n\\end{framed}\n"),
    ("note_keyconcepts", "\n\\keyconcepts{(((content.text)))}\n"),
    ("note_newwords", "\n\\newwords{(((content.text)))}\n"),
    ("note_visit", "\n\\visit{(((content.text)))}\n"),
    ("keyconcepts", "\n\\keyconcepts{(((content.text)))}\n"),
    ("newwords", "\n\\newwords{(((content.text)))}\n"),
    ("emphasis_italics", r"\textit{(((content.text)))}"),
    ("emphasis_bold", r"\textbf{(((content.text)))}"),
    ("emphasis_underline", r"\underline{(((content.text)))}"),
    (
        "definition",
        "\n\\begin{definition}{(((content.term)))}\n(((content.meaning)))(((content.text)))\n\\end{definition}\n",
    ),
    (
        "worked_example",
        "\n\\begin{workedexample}{(((content.title)))}\n(((content.text)))\n\\end{workedexample}\n",
    ),
    ("workstep", "\n\\textbf{(((content.title)))}\n\n(((content.text)))\n"),
    (
        "exercise",
        "\n\\begin{exercise}\n(((content.problem)))(((content.text)))\n\
         ((* if content.solution *))\\begin{solution}\n(((content.solution)))\n\\end{solution}\n((* endif *))\
         \\end{exercise}\n",
    ),
    (
        "exercises",
        "\n\\begin{exercises}{(((content.title)))}\n(((content.text)))\n\\end{exercises}\n",
    ),
    (
        "activity",
        "\n\\begin{activity}{(((content.type)))}{(((content.title)))}\n(((content.text)))\n\\end{activity}\n",
    ),
];

/// CNXML+ element templates.
const CNXML: &[(&str, &str)] = &[
    ("para", "\n(((content.text)))\n"),
    ("title", r"\textbf{(((content.text)))}"),
    ("bgroup", "{(((content.text)))}"),
    ("item", "\\item (((content.text)))\n"),
    ("media", "(((content.text)))"),
    ("content", "(((content.text)))"),
    ("term", r"\textbf{(((content.text)))}"),
    ("meaning", "(((content.text)))"),
];

/// HTML element templates.
const HTML: &[(&str, &str)] = &[
    ("p", "\n(((content.text)))\n"),
    ("h1", r"\chapter{(((content.text)))}"),
    ("h2", r"\section{(((content.text)))}"),
    ("h3", r"\subsection{(((content.text)))}"),
    ("h4", r"\subsubsection{(((content.text)))}"),
    ("h5", r"\paragraph{(((content.text)))}"),
    ("h6", r"\paragraph{(((content.text)))}"),
    ("em", r"\textit{(((content.text)))}"),
    ("i", r"\textit{(((content.text)))}"),
    ("strong", r"\textbf{(((content.text)))}"),
    ("b", r"\textbf{(((content.text)))}"),
    ("u", r"\underline{(((content.text)))}"),
    ("br", "\\newline\n"),
    ("blockquote", "\n\\begin{quote}\n(((content.text)))\n\\end{quote}\n"),
    ("code", r"\texttt{(((content.text)))}"),
    ("body", "(((content.text)))"),
    ("div", "(((content.text)))"),
    ("span", "(((content.text)))"),
    ("li", "\\item (((content.text)))\n"),
    ("figcaption", "(((content.text)))"),
];

/// Template backend built on a `minijinja` environment.
pub struct LatexTemplates {
    env: Environment<'static>,
}

impl LatexTemplates {
    /// Built-in templates for `dialect`.
    pub fn new(dialect: Dialect) -> Result<Self, ConfigError> {
        Self::with_overrides(dialect, &HashMap::new())
    }

    /// Built-in templates for `dialect`, with `overrides` replacing or adding
    /// templates by name.
    pub fn with_overrides(
        dialect: Dialect,
        overrides: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("((*", "*))")
            .variable_delimiters("(((", ")))")
            .comment_delimiters("((=", "=))")
            .build()
            .map_err(|e| invalid("syntax", &e))?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        let dialect_set = match dialect {
            Dialect::Html => HTML,
            Dialect::Cnxml => CNXML,
        };
        for &(name, source) in SHARED.iter().chain(dialect_set) {
            env.add_template(name, source)
                .map_err(|e| invalid(name, &e))?;
        }
        for (name, source) in overrides {
            env.add_template_owned(name.clone(), source.clone())
                .map_err(|e| invalid(name, &e))?;
        }

        Ok(Self { env })
    }
}

fn invalid(name: &str, error: &minijinja::Error) -> ConfigError {
    ConfigError::InvalidTemplate {
        name: name.to_string(),
        message: error.to_string(),
    }
}

impl TemplateBackend for LatexTemplates {
    fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    fn render_template(&self, name: &str, content: &ContentRecord) -> Result<String, TemplateError> {
        let failed = |e: minijinja::Error| TemplateError {
            name: name.to_string(),
            message: e.to_string(),
        };
        let template = self.env.get_template(name).map_err(failed)?;
        template.render(context! { content => content }).map_err(failed)
    }
}
