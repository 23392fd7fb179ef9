//! The scraping pipeline: load, parse, infer, correct, expand.
//!
//! Groups run one after another and every page is finished before the next
//! is loaded. The only state shared between pages is the set of qualified
//! names already generated and the `NDarray` API once its group has run.

use crate::config::{ApiGroup, GroupKind};
use crate::loader::{Loader, Page};
use crate::parser::{self, examples, reference, Signature};
use crate::{overloads, rules};
use anyhow::Result;
use docbind_model::{DynamicApi, Function, StaticApi, TestFile};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Methods documented on their own page that are not generated.
const NDARRAY_SKIPPED: &[&str] = &["sort", "partition", "transpose"];

/// Top-level functions not copied into the `NDarray` class.
const NDARRAY_NOT_COPIED: &[&str] = &["copyto", "transpose", "amax", "amin", "real", "imag"];

const TOP_LEVEL_PREFIX: &str = "numpy.";

/// Everything one run produced.
#[derive(Debug, Default, PartialEq)]
pub struct Model {
    pub static_apis: Vec<StaticApi>,
    pub ndarray: Option<DynamicApi>,
    pub test_files: Vec<TestFile>,
    /// Distinct qualified names that produced a declaration
    pub generated: usize,
}

pub struct Pipeline {
    loader: Loader,
    seen: HashSet<String>,
    ndarray: Option<DynamicApi>,
}

impl Pipeline {
    pub fn new(loader: Loader) -> Self {
        Pipeline {
            loader,
            seen: HashSet::new(),
            ndarray: None,
        }
    }

    /// Process `groups` in order.
    pub fn run(&mut self, groups: &[ApiGroup]) -> Result<Model> {
        let mut model = Model::default();
        for group in groups {
            match group.kind {
                GroupKind::Routines => {
                    let (api, tests) = self.parse_routines(group)?;
                    info!("{}: {} declarations", group.partial, api.api.declarations.len());
                    model.static_apis.push(api);
                    model.test_files.push(tests);
                }
                GroupKind::NdarrayMethods => {
                    let api = self.parse_ndarray_methods(group)?;
                    info!("{}: {} declarations", group.partial, api.api.declarations.len());
                    self.ndarray = Some(api);
                }
                GroupKind::ScalarTypes => {
                    let api = self.parse_scalar_types(group)?;
                    info!("{}: {} declarations", group.partial, api.api.declarations.len());
                    model.static_apis.push(api);
                }
            }
        }
        model.ndarray = self.ndarray.take();
        model.generated = self.seen.len();
        Ok(model)
    }

    /// Names listed under "NumPy Reference" on the documentation index.
    pub fn reference_functions(&mut self, index: &str) -> Result<BTreeSet<String>> {
        let page = self.loader.load(index)?;
        Ok(reference::collect_reference_functions(&page.html))
    }

    fn parse_routines(&mut self, group: &ApiGroup) -> Result<(StaticApi, TestFile)> {
        let mut api = StaticApi::new(group.partial);
        let mut tests = TestFile {
            name: format!("{}_{}", api.impl_name, group.partial),
            ..Default::default()
        };
        for link in self.loader.overview_pages(group.page)? {
            let page = self.loader.load(&link)?;
            let Some(sig) = page_signature(&page) else {
                continue;
            };
            if !self.seen.insert(sig.qualified_name()) {
                debug!("{}: already generated", sig.qualified_name());
                continue;
            }
            let Some(decl) = parse_declaration(&page, &sig, Some(group.page)) else {
                continue;
            };
            let name = decl.info.name.clone();
            let test_case = examples::parse_examples(&page.html, &name);
            let top_level = sig.class_prefix == TOP_LEVEL_PREFIX;
            for mut overload in overloads::expand(decl, group.expand_array_like) {
                rules::post_process_overload(&mut overload);
                if top_level {
                    self.copy_to_ndarray(&name, &overload);
                }
                api.api.declarations.push(overload.into());
            }
            if let Some(case) = test_case {
                tests.test_cases.push(case);
            }
        }
        Ok((api, tests))
    }

    /// Offer a top-level overload taking an array first to `NDarray` as an
    /// instance method.
    fn copy_to_ndarray(&mut self, name: &str, overload: &Function) {
        let Some(ndarray) = self.ndarray.as_mut() else {
            return;
        };
        if NDARRAY_NOT_COPIED.contains(&name)
            || overload.arguments.first().is_none_or(|a| a.ty != "NDarray")
        {
            return;
        }
        let mut method = overload.clone();
        method.arguments.remove(0);
        method.renumber();
        ndarray.api.declarations.push(method.into());
    }

    fn parse_ndarray_methods(&mut self, group: &ApiGroup) -> Result<DynamicApi> {
        let mut api = DynamicApi {
            class_name: "NDarray".to_string(),
            ..Default::default()
        };
        for link in self.loader.overview_pages(group.page)? {
            let page = self.loader.load(&link)?;
            let Some(sig) = page_signature(&page) else {
                continue;
            };
            if !parser::documents_method(&page.html) || NDARRAY_SKIPPED.contains(&sig.name.as_str())
            {
                continue;
            }
            let Some(mut decl) = parse_declaration(&page, &sig, None) else {
                continue;
            };
            // instance methods resolve on the array itself
            decl.info.class_name = Some(sig.class_name().split('.').take(1).collect());
            for mut overload in overloads::expand(decl, group.expand_array_like) {
                rules::post_process_overload(&mut overload);
                api.api.declarations.push(overload.into());
            }
        }
        Ok(api)
    }

    fn parse_scalar_types(&mut self, group: &ApiGroup) -> Result<StaticApi> {
        let page = self.loader.load(group.page)?;
        let mut api = StaticApi::new(group.partial);
        api.api.declarations.extend(
            reference::parse_scalar_types(&page.html)
                .into_iter()
                .map(Into::into),
        );
        Ok(api)
    }
}

fn page_signature(page: &Page) -> Option<Signature> {
    let sig = parser::signature(&page.html);
    if sig.is_none() {
        debug!("{} ({}, {} bytes): no callable documented", page.id, page.url, page.text.len());
    }
    sig
}

/// Parse a declaration and run the argument and declaration rules.
fn parse_declaration(page: &Page, sig: &Signature, tag: Option<&str>) -> Option<Function> {
    let mut decl = parser::parse_function(&page.html, sig, tag)?;
    for arg in &mut decl.arguments {
        rules::post_process_argument(arg);
    }
    rules::post_process(&mut decl);
    Some(decl)
}
