//! The LaTeX template pandoc renders citations with.
//!
//! The template sets a letter-width page with narrow margins so `pdfcrop`
//! has little to trim, disables hyphenation (author names and titles must
//! not be split), and renders ragged-right so short citations do not get
//! stretched into rivers of whitespace. Page headers and footers are off so
//! the page number never ends up in the caption.

/// Placeholder pandoc replaces with the converted markdown body.
pub const BODY_PLACEHOLDER: &str = "$body$";

/// Default template used when no `--latex` file is supplied.
pub const DEFAULT_TEMPLATE: &str = r#"\documentclass[12pt]{article}
\usepackage{fontspec}
\setmainfont{Times New Roman}
\usepackage{ragged2e}
\usepackage[paperwidth=8.5in, margin=0.2in]{geometry}
\pagestyle{empty} % no headers or footers
\usepackage{parskip}
\usepackage{microtype}

\begin{document}
\RaggedRight
\hyphenpenalty=10000
\exhyphenpenalty=10000
\emergencystretch=3em
$body$
\end{document}
"#;

/// True if `template` can carry a citation body.
pub fn has_body_placeholder(template: &str) -> bool {
    template.contains(BODY_PLACEHOLDER)
}
