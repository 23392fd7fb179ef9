//! Worked-example test stubs.
//!
//! Stubs are meant to be corrected by hand, so an existing file is never
//! overwritten.

use super::{CodeGenerator, GenerateReport};
use crate::api::{ExampleCode, LineKind, TestCase, TestFile, TestPart};
use crate::writer::CodeWriter;
use anyhow::{Context, Result};

impl CodeGenerator {
    pub(super) fn generate_all_tests(&self, report: &mut GenerateReport) -> Result<()> {
        let files: Vec<&TestFile> = self
            .test_files
            .iter()
            .filter(|f| !f.test_cases.is_empty())
            .collect();
        if files.is_empty() {
            return Ok(());
        }
        let root = self
            .test_files_path
            .as_deref()
            .context("test output path is not set")?;
        for file in files {
            let dir = match file.sub_dir {
                Some(ref sub) if !sub.trim().is_empty() => root.join(sub),
                _ => root.to_path_buf(),
            };
            let path = dir.join(format!("{}.tests.cs", file.name));
            if path.exists() {
                tracing::debug!("keeping existing {}", path.display());
                report.kept.push(path);
                continue;
            }
            self.write_file(&path, |s| {
                self.generate_tests(file, s);
                Ok(())
            })?;
            report.written.push(path);
        }
        Ok(())
    }

    fn generate_tests(&self, file: &TestFile, s: &mut CodeWriter) {
        self.generate_usings(s);
        s.out("using Microsoft.VisualStudio.TestTools.UnitTesting;");
        s.out("using Assert = NUnit.Framework.Assert;");
        s.blank();
        s.out_block(format!("namespace {}.UnitTest", self.namespace), |s| {
            s.out("[TestClass]");
            s.out_block(format!("public class {}Test : BaseTestCase", file.name), |s| {
                for case in &file.test_cases {
                    generate_test_case(case, s);
                }
            });
        });
    }
}

fn generate_test_case(case: &TestCase, s: &mut CodeWriter) {
    s.blank();
    s.out("[TestMethod]");
    s.out_block(format!("public void {}()", case.name), |s| {
        let mut vars = Declared::default();
        for part in &case.parts {
            match part {
                TestPart::Comment(text) => {
                    for line in text.lines() {
                        s.out(format!("// {}", line));
                    }
                    s.blank();
                }
                TestPart::Example(example) => generate_example(example, &mut vars, s),
            }
        }
    });
    s.blank();
}

/// Whether `given` and `expected` were already declared in this method.
#[derive(Default)]
struct Declared {
    given: bool,
    expected: bool,
}

fn generate_example(example: &ExampleCode, vars: &mut Declared, s: &mut CodeWriter) {
    for line in example.text.lines() {
        s.out(format!("// {}", line));
    }
    s.blank();
    s.out("#if TODO");
    for line in &example.lines {
        let Some(first) = line.text.first() else {
            continue;
        };
        match line.kind {
            LineKind::Comment => s.out(first),
            LineKind::Cmd => {
                let var = if vars.given { "" } else { "var " };
                s.out(format!("{}given= {};", var, first));
                vars.given = true;
            }
            LineKind::Output => {
                let var = if vars.expected { "" } else { "var " };
                s.out(format!("{}expected=", var));
                vars.expected = true;
                s.indented(|s| {
                    let last = line.text.len() - 1;
                    for (i, output) in line.text.iter().enumerate() {
                        let output = escape_string(output);
                        if i < last {
                            s.out(format!("\"{}\\n\" +", output));
                        } else {
                            s.out(format!("\"{}\";", output));
                        }
                    }
                });
                s.out("Assert.AreEqual(expected, given.repr);");
            }
        }
    }
    s.out("#endif");
}

/// Escape text for a C# string literal.
fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
