//! API groupings and worked-example test files.
//!
//! Each grouping is one generated source unit. A declaration belongs to
//! exactly one grouping, owned through its `declarations` list.

use crate::model::{Declaration, Function};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Declarations plus where to write them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    pub declarations: Vec<Declaration>,
    /// Target directory; falls back to the generator-wide path
    pub output_path: Option<PathBuf>,
    /// Name part of a partial class file (`np.<partial>.gen.cs`)
    pub partial_name: Option<String>,
    /// Subdirectory below the output path; only set on hand-built models
    pub sub_dir: Option<String>,
}

impl Api {
    /// File stem for a unit named `base`, e.g. `np.linalg`.
    pub fn file_stem(&self, base: &str) -> String {
        match self.partial_name {
            Some(ref partial) => format!("{}.{}", base, partial),
            None => base.to_string(),
        }
    }
}

/// A static class forwarding to a Python module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticApi {
    #[serde(flatten)]
    pub api: Api,
    /// Name of the generated static class
    pub static_name: String,
    /// Name of the implementing singleton
    pub impl_name: String,
    /// Wrapped Python module
    pub python_module: String,
}

impl StaticApi {
    pub fn new(partial_name: &str) -> Self {
        StaticApi {
            api: Api {
                partial_name: Some(partial_name.to_string()),
                ..Default::default()
            },
            static_name: "np".to_string(),
            impl_name: "NumPy".to_string(),
            python_module: "numpy".to_string(),
        }
    }
}

/// Extra methods generated into an existing, hand-written class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicApi {
    #[serde(flatten)]
    pub api: Api,
    pub class_name: String,
}

/// A class generated from scratch, constructors included.
///
/// The documentation pipeline yields none of these; they are built by hand
/// by library callers that wrap classes the reference does not describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClass {
    #[serde(flatten)]
    pub api: Api,
    /// Dotted path; all but the last part become static wrapper classes
    pub class_name: String,
    pub doc_string: Option<String>,
    pub ignore: bool,
    pub base_class: String,
    pub constructors: Vec<Function>,
}

impl ApiClass {
    pub fn new(class_name: &str) -> Self {
        ApiClass {
            api: Api::default(),
            class_name: class_name.to_string(),
            doc_string: None,
            ignore: false,
            base_class: "PythonObject".to_string(),
            constructors: Vec::new(),
        }
    }
}

/// Generated test stubs for one API group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFile {
    /// File name without extension
    pub name: String,
    pub test_cases: Vec<TestCase>,
    /// Subdirectory below the test root; only set on hand-built models
    pub sub_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub parts: Vec<TestPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestPart {
    Comment(String),
    Example(ExampleCode),
}

/// A worked example: the raw text plus its classified lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleCode {
    pub text: String,
    pub lines: Vec<CodeLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    Cmd,
    Comment,
    Output,
}

/// One command or comment, or a run of consecutive output lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLine {
    pub kind: LineKind,
    pub text: Vec<String>,
}
