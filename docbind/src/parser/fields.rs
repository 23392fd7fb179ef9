//! Field table parsing: parameters, return values and signature defaults.

use super::{parse_description, text_of};
use crate::infer::{infer_default, infer_type};
use docbind_model::{Argument, Function};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::warn;

static SEL_TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static SEL_TH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static SEL_DT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt").unwrap());
static SEL_STRONG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("strong").unwrap());
static SEL_CLASSIFIER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.classifier").unwrap());
static SEL_SIGNATURE_EM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl.function em").unwrap());

/// Type description of an argument without a classifier.
const NO_VALUE: &str = "_NoValue";

/// The table row whose header starts with `header`.
fn field_row<'a>(table: ElementRef<'a>, header: &str) -> Option<ElementRef<'a>> {
    table.select(&SEL_TR).find(|tr| {
        tr.select(&SEL_TH)
            .next()
            .is_some_and(|th| text_of(th).trim_start().starts_with(header))
    })
}

fn classifier(dt: ElementRef) -> Option<String> {
    dt.select(&SEL_CLASSIFIER).next().map(text_of)
}

/// The `dd` right after a `dt`.
fn definition(dt: ElementRef) -> Option<ElementRef> {
    dt.next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|e| e.value().name() == "dd")
}

/// Append one argument per parameter entry.
///
/// An entry named `none` documents an empty parameter list and is dropped.
pub fn parse_arguments(table: ElementRef, func: &mut Function) {
    let Some(tr) = field_row(table, "Parameters") else {
        return;
    };
    for dt in tr.select(&SEL_DT) {
        let Some(strong) = dt.select(&SEL_STRONG).next() else {
            continue;
        };
        let raw_name = text_of(strong);
        let (name, type_description) = match raw_name.split_once(':') {
            Some((name, ty)) => (name.trim().to_string(), ty.trim().to_string()),
            None => (
                raw_name.clone(),
                classifier(dt).unwrap_or_else(|| NO_VALUE.to_string()),
            ),
        };
        if name.eq_ignore_ascii_case("none") {
            continue;
        }
        let mut arg = Argument::new(name, "");
        arg.tag = func.info.tag.clone();
        let phrase = type_description.split(',').next().unwrap_or_default();
        arg.ty = infer_type(&mut arg, phrase);
        if type_description.contains("optional") {
            arg.is_named_arg = true;
            arg.is_nullable = true;
        }
        if let Some(fragment) = type_description.split(',').find(|p| p.contains("default:")) {
            let raw = fragment.trim().trim_start_matches("default:");
            arg.default_value = infer_default(raw);
        }
        arg.description = definition(dt).and_then(parse_description);
        arg.position = func.arguments.len();
        func.arguments.push(arg);
    }
}

/// Defaults from the `name=value` items of the signature line.
pub fn parse_default_values(html: &Html, func: &mut Function) {
    for em in html.select(&SEL_SIGNATURE_EM) {
        let text = text_of(em);
        let mut tokens = text.split('=');
        let (Some(name), Some(value)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        match func.arg_mut(name) {
            Some(arg) => arg.default_value = infer_default(value),
            None => warn!("{}: default for unknown argument '{}'", func.info.name, name),
        }
    }
}

/// Append one return value per named, classified entry of the returns row.
pub fn parse_returns(table: ElementRef, func: &mut Function) {
    let Some(tr) = field_row(table, "Returns") else {
        return;
    };
    for dt in tr.select(&SEL_DT) {
        let Some(name) = dt.select(&SEL_STRONG).next().map(text_of) else {
            continue;
        };
        if name.eq_ignore_ascii_case("none") {
            continue;
        }
        let Some(type_description) = classifier(dt) else {
            continue;
        };
        let mut ret = Argument::returning(name, "");
        let phrase = type_description.split(',').next().unwrap_or_default();
        ret.ty = infer_type(&mut ret, phrase);
        ret.description = definition(dt).and_then(parse_description);
        func.info.returns.push(ret);
    }
}
