//! C# emitter, pure templating over a finished declaration set.
//!
//! No inference happens here. Files written:
//!
//! - `<module>.module.gen.cs`: lazy module import and conversion helpers
//! - `<static>.<partial>.gen.cs`: one per [`StaticApi`]
//! - `PythonObject.gen.cs`: conversion helpers for model classes
//! - `<Class>.gen.cs`: one per [`DynamicApi`] and per [`ApiClass`]
//! - `<Test>.tests.cs`: worked-example stubs, never overwritten

mod declaration;
mod stubs;
mod support;

use crate::api::{ApiClass, DynamicApi, StaticApi, TestFile};
use crate::writer::CodeWriter;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Emits a fixed snippet into a writer.
pub type Hook = fn(&mut CodeWriter);

/// C# keywords that must be escaped with `@` when used as identifiers.
const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "var",
    "virtual", "void", "volatile", "while", "add", "alias", "async", "await", "dynamic",
    "get", "global", "nameof", "partial", "remove", "set", "value", "when", "where", "yield",
    "ascending", "by", "descending", "equals", "from", "group", "into", "join", "let", "on",
    "orderby", "select",
];

/// Escape an identifier that collides with a C# keyword.
pub fn escape_name(name: &str) -> String {
    if CSHARP_KEYWORDS.contains(&name) {
        format!("@{}", name)
    } else {
        name.to_string()
    }
}

/// Files touched by one [`CodeGenerator::generate`] run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    /// Test stubs left alone because they already existed
    pub kept: Vec<PathBuf>,
}

/// Emitter configuration plus the declaration set to emit.
pub struct CodeGenerator {
    pub copyright_notice: Option<String>,
    pub namespace: String,
    pub static_module_name: String,
    pub python_module_name: String,
    pub usings: Vec<String>,
    pub use_python_included: bool,
    /// Append each declaration's JSON after its code
    pub print_model_json: bool,

    pub static_apis: Vec<StaticApi>,
    pub dynamic_apis: Vec<DynamicApi>,
    /// Hand-built classes, emitted after the documented APIs
    pub api_classes: Vec<ApiClass>,
    pub test_files: Vec<TestFile>,

    pub static_api_files_path: Option<PathBuf>,
    pub dynamic_api_files_path: Option<PathBuf>,
    pub models_path: Option<PathBuf>,
    pub test_files_path: Option<PathBuf>,

    /// `case` lines of the generated `ToPython` switch
    pub to_python_conversions: Vec<String>,
    /// `case` lines of the generated `ToCsharp<T>` switch
    pub to_csharp_conversions: Vec<String>,
    pub sharp_to_sharp_conversions: Vec<Hook>,
    pub special_conversion_generators: Vec<Hook>,
    /// Run inside `InstallAndImport` before the engine starts
    pub initialization_generators: Vec<Hook>,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        CodeGenerator {
            copyright_notice: None,
            namespace: "Numpy".to_string(),
            static_module_name: "np".to_string(),
            python_module_name: "numpy".to_string(),
            usings: [
                "using System;",
                "using System.Collections;",
                "using System.Collections.Generic;",
                "using System.IO;",
                "using System.Linq;",
                "using System.Runtime.InteropServices;",
                "using System.Text;",
                "using Python.Runtime;",
            ]
            .iter()
            .map(|u| u.to_string())
            .collect(),
            use_python_included: true,
            print_model_json: false,
            static_apis: Vec::new(),
            dynamic_apis: Vec::new(),
            api_classes: Vec::new(),
            test_files: Vec::new(),
            static_api_files_path: None,
            dynamic_api_files_path: None,
            models_path: None,
            test_files_path: None,
            to_python_conversions: Vec::new(),
            to_csharp_conversions: Vec::new(),
            sharp_to_sharp_conversions: Vec::new(),
            special_conversion_generators: Vec::new(),
            initialization_generators: Vec::new(),
        }
    }
}

impl CodeGenerator {
    /// Add a using line unless already present.
    pub fn add_using(&mut self, using: &str) {
        if !self.usings.iter().any(|u| u == using) {
            self.usings.push(using.to_string());
        }
    }

    /// Write every configured API, the support files and missing test stubs.
    pub fn generate(&self) -> Result<GenerateReport> {
        let static_path = self
            .static_api_files_path
            .as_deref()
            .context("static API output path is not set")?;
        let dynamic_path = self.dynamic_api_files_path.as_deref().unwrap_or(static_path);
        let mut report = GenerateReport::default();

        let head = static_path.join(format!("{}.module.gen.cs", self.static_module_name));
        self.write_file(&head, |s| {
            self.generate_module_head(s);
            Ok(())
        })?;
        report.written.push(head);

        for api in &self.static_apis {
            let dir = api.api.output_path.as_deref().unwrap_or(static_path);
            let path = dir.join(format!("{}.gen.cs", api.api.file_stem(&api.static_name)));
            self.write_file(&path, |s| {
                self.generate_static_api(api, s);
                Ok(())
            })?;
            report.written.push(path);
        }

        let models = self.models_path.as_deref().unwrap_or(dynamic_path);
        let pyobj = models.join("PythonObject.gen.cs");
        self.write_file(&pyobj, |s| {
            self.generate_python_object_conversions(s);
            Ok(())
        })?;
        report.written.push(pyobj);

        for api in &self.dynamic_apis {
            let dir = api.api.output_path.as_deref().unwrap_or(dynamic_path);
            let path = dir.join(format!("{}.gen.cs", api.api.file_stem(&api.class_name)));
            self.write_file(&path, |s| {
                self.generate_dynamic_api(api, s);
                Ok(())
            })?;
            report.written.push(path);
        }

        for class in self.api_classes.iter().filter(|c| !c.ignore) {
            let mut dir = class
                .api
                .output_path
                .clone()
                .unwrap_or_else(|| dynamic_path.to_path_buf());
            if let Some(ref sub) = class.api.sub_dir {
                dir = dir.join(sub);
            }
            let path = dir.join(format!("{}.gen.cs", class.api.file_stem(&class.class_name)));
            self.write_file(&path, |s| self.generate_class(class, s))?;
            report.written.push(path);
        }

        self.generate_all_tests(&mut report)?;
        Ok(report)
    }

    /// Dump the declaration model of every static and dynamic API as JSON
    /// next to the generated sources.
    pub fn generate_intermediate_json(&self) -> Result<Vec<PathBuf>> {
        let static_path = self
            .static_api_files_path
            .as_deref()
            .context("static API output path is not set")?;
        let dynamic_path = self.dynamic_api_files_path.as_deref().unwrap_or(static_path);
        let mut written = Vec::new();
        for api in &self.static_apis {
            let dir = api.api.output_path.as_deref().unwrap_or(static_path);
            let path = dir.join(format!("{}.gen.json", api.api.file_stem(&api.static_name)));
            write_json(&path, api)?;
            written.push(path);
        }
        for api in &self.dynamic_apis {
            let dir = api.api.output_path.as_deref().unwrap_or(dynamic_path);
            let path = dir.join(format!("{}.gen.json", api.api.file_stem(&api.class_name)));
            write_json(&path, api)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write one generated file. A failure inside `generate` is recorded as a
    /// comment block in the file instead of aborting the run.
    fn write_file(
        &self,
        path: &Path,
        generate: impl FnOnce(&mut CodeWriter) -> Result<()>,
    ) -> Result<()> {
        let mut s = CodeWriter::new();
        if let Some(ref notice) = self.copyright_notice {
            s.out(format!("// {}", notice));
        }
        s.out("// Code generated by docbind from the NumPy reference documentation. Do not edit.");
        s.blank();
        if let Err(e) = generate(&mut s) {
            tracing::warn!("generator exception in {}: {:#}", path.display(), e);
            s.out("/*");
            s.out(" --------------- generator exception ---------------------");
            for cause in e.chain() {
                s.out(cause.to_string());
            }
            s.out("*/");
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory: {}", dir.display()))?;
        }
        fs::write(path, s.as_str())
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }

    fn generate_usings(&self, s: &mut CodeWriter) {
        for using in &self.usings {
            s.out(using);
        }
        if self.use_python_included {
            s.out("using Python.Included;");
        }
        s.blank();
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory: {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Argument, Function};
    use tempfile::TempDir;

    fn sample_generator(root: &Path) -> CodeGenerator {
        let mut api = StaticApi::new("math");
        let mut f = Function::new("sqrt", Some("numpy".into()));
        f.arguments.push(Argument::new("x", "NDarray"));
        f.set_return_type("NDarray");
        api.api.declarations.push(f.into());
        CodeGenerator {
            static_apis: vec![api],
            dynamic_apis: vec![DynamicApi {
                class_name: "NDarray".into(),
                ..Default::default()
            }],
            static_api_files_path: Some(root.join("Numpy")),
            models_path: Some(root.join("Numpy/Models")),
            test_files_path: Some(root.join("test")),
            copyright_notice: Some("Copyright (c) docbind authors".into()),
            ..Default::default()
        }
    }

    #[test]
    fn escape_keywords() {
        assert_eq!(escape_name("out"), "@out");
        assert_eq!(escape_name("where"), "@where");
        assert_eq!(escape_name("axis"), "axis");
    }

    #[test]
    fn generate_writes_expected_files() {
        let dir = TempDir::new().unwrap();
        let gen = sample_generator(dir.path());
        let report = gen.generate().unwrap();
        let names: Vec<String> = report
            .written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "np.module.gen.cs",
                "np.math.gen.cs",
                "PythonObject.gen.cs",
                "NDarray.gen.cs"
            ]
        );
        let math = fs::read_to_string(dir.path().join("Numpy/np.math.gen.cs")).unwrap();
        assert!(math.starts_with("// Copyright (c) docbind authors\n"));
        assert!(math.contains("public static NDarray sqrt(NDarray x)"));
        assert!(dir.path().join("Numpy/Models/PythonObject.gen.cs").exists());
    }

    #[test]
    fn hand_built_classes_go_to_their_sub_dir() {
        let dir = TempDir::new().unwrap();
        let mut gen = sample_generator(dir.path());
        let mut matrix = ApiClass::new("numpy.Matrix");
        matrix.api.sub_dir = Some("Classes".into());
        let mut ctor = Function::new("Matrix", None);
        ctor.arguments.push(Argument::new("data", "NDarray"));
        matrix.constructors.push(ctor);
        let mut hidden = ApiClass::new("Hidden");
        hidden.ignore = true;
        gen.api_classes = vec![matrix, hidden];

        let report = gen.generate().unwrap();
        let path = dir.path().join("Numpy/Classes/Matrix.gen.cs");
        assert!(report.written.contains(&path));
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("public partial class Matrix : PythonObject"));
        assert!(text.contains("public Matrix(NDarray data)"));
        assert!(!dir.path().join("Numpy/Hidden.gen.cs").exists());
    }

    #[test]
    fn generate_requires_static_path() {
        let gen = CodeGenerator::default();
        let err = gen.generate().unwrap_err();
        assert!(err.to_string().contains("static API output path"));
    }

    #[test]
    fn intermediate_json_is_valid_json() {
        let dir = TempDir::new().unwrap();
        let gen = sample_generator(dir.path());
        let written = gen.generate_intermediate_json().unwrap();
        assert_eq!(written.len(), 2);
        let text = fs::read_to_string(&written[0]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["partial_name"], "math");
        assert_eq!(value["declarations"][0]["name"], "sqrt");
    }

    #[test]
    fn add_using_deduplicates() {
        let mut gen = CodeGenerator::default();
        let before = gen.usings.len();
        gen.add_using("using Numpy.Models;");
        gen.add_using("using Numpy.Models;");
        assert_eq!(gen.usings.len(), before + 1);
    }
}
