//! Declaration pages of the Sphinx-rendered reference.
//!
//! A function page carries its signature in a `dl` (`code.descclassname`
//! plus `code.descname`), the description in the first `dd`, and its
//! parameters and return values in a `table.field-list`.

pub mod examples;
pub mod fields;
pub mod reference;

use docbind_model::Function;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static SEL_H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static SEL_DL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl").unwrap());
static SEL_DD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());
static SEL_CLASS_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("code.descclassname").unwrap());
static SEL_NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("code.descname").unwrap());
static SEL_FIELD_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.field-list").unwrap());

/// Name and enclosing path of a documented callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Raw class marker including the trailing dot, e.g. `numpy.linalg.`
    pub class_prefix: String,
    pub name: String,
}

impl Signature {
    /// Key for run-wide deduplication.
    pub fn qualified_name(&self) -> String {
        format!("{}{}", self.class_prefix, self.name)
    }

    pub fn class_name(&self) -> String {
        self.class_prefix.trim_end_matches('.').to_string()
    }
}

/// Signature of the page, or `None` when the page documents no callable.
pub fn signature(html: &Html) -> Option<Signature> {
    html.select(&SEL_H1).next()?;
    let class_prefix = html.select(&SEL_CLASS_NAME).next().map(text_of)?;
    let name = html.select(&SEL_NAME).next().map(text_of)?;
    Some(Signature { class_prefix, name })
}

/// True when the first `dl` of the page documents a method.
pub fn documents_method(html: &Html) -> bool {
    html.select(&SEL_DL)
        .next()
        .is_some_and(|dl| dl.value().classes().any(|c| c == "method"))
}

/// Parse the declaration of a function page. Pages without a field table
/// yield `None`.
pub fn parse_function(html: &Html, sig: &Signature, tag: Option<&str>) -> Option<Function> {
    let dl = html.select(&SEL_DL).next()?;
    let mut func = Function::new(sig.name.clone(), Some(sig.class_name()));
    func.info.tag = tag.map(str::to_string);
    func.info.description = dl.select(&SEL_DD).next().and_then(parse_description);
    let table = html.select(&SEL_FIELD_TABLE).next()?;
    fields::parse_arguments(table, &mut func);
    fields::parse_default_values(html, &mut func);
    fields::parse_returns(table, &mut func);
    Some(func)
}

/// Paragraphs of a `dd` up to the examples, separated by blank lines.
pub fn parse_description(dd: ElementRef) -> Option<String> {
    let paragraphs: Vec<String> = dd
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "p")
        .map(text_of)
        .take_while(|text| !text.starts_with("Examples"))
        .collect();
    if paragraphs.is_empty() {
        return None;
    }
    Some(paragraphs.join("\n\n"))
}

/// Concatenated text content of an element.
pub fn text_of(el: ElementRef) -> String {
    el.text().collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal Sphinx-shaped pages for parser tests.

    /// One `(name, classifier, description)` entry per row.
    pub fn function_page(
        class_prefix: &str,
        name: &str,
        signature: &[&str],
        params: &[(&str, Option<&str>, &str)],
        returns: &[(&str, &str, &str)],
    ) -> String {
        let ems: Vec<String> = signature
            .iter()
            .map(|e| format!("<em>{}</em>", e))
            .collect();
        let mut html = format!(
            r#"<html><body><h1>{prefix}{name}</h1>
<dl class="function"><dt id="{prefix}{name}"><code class="descclassname">{prefix}</code><code class="descname">{name}</code>({ems})</dt>
<dd><p>Does {name} things.</p>
<p>Works element-wise.</p>
<table class="docutils field-list" frame="void" rules="none"><tbody valign="top">
"#,
            prefix = class_prefix,
            name = name,
            ems = ems.join(", "),
        );
        if !params.is_empty() {
            html.push_str(r#"<tr class="field-odd field"><th class="field-name">Parameters:</th><td class="field-body"><dl class="first docutils">"#);
            for (pname, classifier, desc) in params {
                html.push_str(&format!("\n<dt><strong>{}</strong>", pname));
                if let Some(c) = classifier {
                    html.push_str(&format!(r#" : <span class="classifier">{}</span>"#, c));
                }
                html.push_str(&format!("</dt>\n<dd><p>{}</p>\n</dd>", desc));
            }
            html.push_str("\n</dl></td></tr>\n");
        }
        if !returns.is_empty() {
            html.push_str(r#"<tr class="field-even field"><th class="field-name">Returns:</th><td class="field-body"><dl class="first last docutils">"#);
            for (rname, classifier, desc) in returns {
                html.push_str(&format!(
                    "\n<dt><strong>{}</strong> : <span class=\"classifier\">{}</span></dt>\n<dd><p>{}</p>\n</dd>",
                    rname, classifier, desc
                ));
            }
            html.push_str("\n</dl></td></tr>\n");
        }
        html.push_str("</tbody></table>\n</dd></dl></body></html>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::function_page;
    use super::*;

    #[test]
    fn signature_from_markers() {
        let html = Html::parse_document(&function_page("numpy.linalg.", "norm", &[], &[], &[]));
        let sig = signature(&html).unwrap();
        assert_eq!(sig.qualified_name(), "numpy.linalg.norm");
        assert_eq!(sig.class_name(), "numpy.linalg");
        assert_eq!(sig.name, "norm");
    }

    #[test]
    fn page_without_heading_has_no_signature() {
        let html = Html::parse_document(
            r#"<html><body><code class="descclassname">numpy.</code><code class="descname">x</code></body></html>"#,
        );
        assert!(signature(&html).is_none());
    }

    #[test]
    fn page_without_class_marker_has_no_signature() {
        let html = Html::parse_document("<html><body><h1>Array objects</h1></body></html>");
        assert!(signature(&html).is_none());
    }

    #[test]
    fn parse_function_reads_description() {
        let html = Html::parse_document(&function_page(
            "numpy.",
            "zeros",
            &["shape"],
            &[("shape", Some("int or tuple of ints"), "Shape of the new array.")],
            &[("out", "ndarray", "Array of zeros.")],
        ));
        let sig = signature(&html).unwrap();
        let func = parse_function(&html, &sig, Some("routines.array-creation.html")).unwrap();
        assert_eq!(func.info.name, "zeros");
        assert_eq!(func.info.class_name.as_deref(), Some("numpy"));
        assert_eq!(func.info.tag.as_deref(), Some("routines.array-creation.html"));
        assert_eq!(
            func.info.description.as_deref(),
            Some("Does zeros things.\n\nWorks element-wise.")
        );
        assert_eq!(func.arguments.len(), 1);
        assert_eq!(func.return_type(), Some("NDarray"));
    }

    #[test]
    fn page_without_field_table_is_skipped() {
        let html = Html::parse_document(
            r#"<html><body><h1>numpy.x</h1><dl class="function"><dt><code class="descclassname">numpy.</code><code class="descname">x</code></dt><dd><p>Nothing.</p></dd></dl></body></html>"#,
        );
        let sig = signature(&html).unwrap();
        assert!(parse_function(&html, &sig, None).is_none());
    }

    #[test]
    fn method_pages_are_recognized() {
        let method = Html::parse_document(r#"<dl class="method"><dt>x</dt></dl>"#);
        let function = Html::parse_document(r#"<dl class="function"><dt>x</dt></dl>"#);
        assert!(documents_method(&method));
        assert!(!documents_method(&function));
    }

    #[test]
    fn description_stops_at_examples() {
        let html = Html::parse_document(
            r#"<dl><dd><p>First.</p><p class="rubric">Examples</p><p>Ignored.</p></dd></dl>"#,
        );
        let dd = html.select(&SEL_DD).next().unwrap();
        assert_eq!(parse_description(dd).as_deref(), Some("First."));
    }
}
