//! Index-style pages: scalar type table and the reference contents tree.

use super::text_of;
use docbind_model::Property;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static SEL_TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static SEL_TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static SEL_SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static SEL_TOCTREE_L1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.toctree-l1").unwrap());

/// One read-only `Dtype` property per three-cell row of the scalar table.
pub fn parse_scalar_types(html: &Html) -> Vec<Property> {
    let mut props = Vec::new();
    for tr in html.select(&SEL_TR) {
        let cells: Vec<ElementRef> = tr.select(&SEL_TD).collect();
        if cells.len() != 3 {
            continue;
        }
        let Some(span) = tr.select(&SEL_SPAN).next() else {
            continue;
        };
        let mut prop = Property::new(text_of(span), "Dtype");
        prop.has_setter = false;
        prop.info.description = Some(text_of(cells[1]));
        props.push(prop);
    }
    props
}

/// Every `numpy…` entry below the "NumPy Reference" entry of the contents
/// tree.
pub fn collect_reference_functions(html: &Html) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let root = html
        .select(&SEL_TOCTREE_L1)
        .find(|li| text_of(*li).trim_start().starts_with("NumPy Reference"));
    if let Some(li) = root {
        collect(li, &mut names);
    }
    names
}

fn collect(li: ElementRef, names: &mut BTreeSet<String>) {
    let children: Vec<ElementRef> = li.children().filter_map(ElementRef::wrap).collect();
    if let Some(a) = children.iter().find(|e| e.value().name() == "a") {
        let text = text_of(*a);
        if text.starts_with("numpy") {
            names.insert(text);
        }
    }
    let Some(ul) = children.iter().find(|e| e.value().name() == "ul") else {
        return;
    };
    for sub in ul.children().filter_map(ElementRef::wrap) {
        if sub.value().name() == "li" {
            collect(sub, names);
        }
    }
}
