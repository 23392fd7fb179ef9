//! Declaration emission: signatures, doc comments and marshalling bodies.

use super::{escape_name, CodeGenerator};
use crate::api::{ApiClass, DynamicApi, StaticApi};
use crate::model::{Argument, DeclInfo, Declaration, Function, Property};
use crate::writer::CodeWriter;
use anyhow::{bail, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static RE_MULTI_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\r?\n){2,}").unwrap());

static RE_LINE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n").unwrap());

const LINE_BREAK: &str = "<br></br>";

impl CodeGenerator {
    pub fn generate_static_api(&self, api: &StaticApi, s: &mut CodeWriter) {
        self.generate_usings(s);
        s.out_block(format!("namespace {}", self.namespace), |s| {
            s.out_block(format!("public static partial class {}", api.static_name), |s| {
                s.blank();
                for decl in api.api.declarations.iter().filter(|d| !d.info().ignore) {
                    self.guarded(s, decl.name(), decl, |s| self.api_function(decl, s, true));
                }
                s.blank();
            });
        });
    }

    pub fn generate_dynamic_api(&self, api: &DynamicApi, s: &mut CodeWriter) {
        self.generate_usings(s);
        s.out_block(format!("namespace {}", self.namespace), |s| {
            s.out_block(format!("public partial class {}", api.class_name), |s| {
                s.blank();
                for decl in &api.api.declarations {
                    let info = decl.info();
                    if info.manual_override || info.ignore {
                        continue;
                    }
                    self.guarded(s, decl.name(), decl, |s| self.api_function(decl, s, false));
                }
            });
        });
    }

    /// A class generated from scratch: wrapper constructors, documented
    /// constructors, then methods.
    pub fn generate_class(&self, class: &ApiClass, s: &mut CodeWriter) -> Result<()> {
        let names: Vec<&str> = class.class_name.split('.').collect();
        let Some((class_name, outer)) = names.split_last().filter(|(n, _)| !n.is_empty()) else {
            bail!("invalid class name '{}'", class.class_name);
        };
        let class_name = escape_name(class_name);
        let base = escape_name(&class.base_class);
        self.generate_usings(s);
        s.out_block(format!("namespace {}", self.namespace), |s| {
            for name in outer {
                s.out(format!("public static partial class {} {{", escape_name(name)));
                s.indent();
            }
            if let Some(doc) = class.doc_string.as_deref().filter(|d| !d.trim().is_empty()) {
                s.out("/// <summary>");
                for line in RE_LINE_SPLIT.split(&process_doc_string(doc)) {
                    s.out(format!("///\t{}", line));
                }
                s.out("/// </summary>");
            }
            s.out_block(format!("public partial class {} : {}", class_name, base), |s| {
                s.out("// auto-generated class");
                s.blank();
                s.out(format!("public {}(PyObject pyobj) : base(pyobj) {{ }}", class_name));
                s.blank();
                s.out(format!(
                    "public {}({} other) : base(other.PyObject as PyObject) {{ }}",
                    class_name, base
                ));
                s.blank();
                for ctor in &class.constructors {
                    if ctor.info.manual_override || ctor.info.ignore {
                        continue;
                    }
                    self.guarded(s, "constructor", ctor, |s| {
                        let mut func = ctor.clone();
                        func.sanitize();
                        func.is_constructor = true;
                        func.info.class_name = Some(outer.join("."));
                        func.info.name = names[names.len() - 1].to_string();
                        let arguments = generate_arguments(&func)?;
                        s.out_block(format!("public {}({})", class_name, arguments), |s| {
                            function_body(&func, s)
                        });
                        Ok(())
                    });
                }
                s.blank();
                for decl in &class.api.declarations {
                    let info = decl.info();
                    if info.manual_override || info.ignore {
                        continue;
                    }
                    self.guarded(s, decl.name(), decl, |s| self.api_function(decl, s, false));
                }
            });
            for _ in outer {
                s.outdent();
                s.out("}");
            }
            s.blank();
        });
        Ok(())
    }

    /// Emit into a scratch writer; on failure write the error and the
    /// serialized model as a comment and carry on with the next item.
    fn guarded<T: Serialize>(
        &self,
        s: &mut CodeWriter,
        what: &str,
        model: &T,
        emit: impl FnOnce(&mut CodeWriter) -> Result<()>,
    ) {
        let mut scratch = CodeWriter::at_level(s.level());
        match emit(&mut scratch) {
            Ok(()) => s.append(scratch.as_str()),
            Err(e) => {
                tracing::warn!("error generating declaration {}: {:#}", what, e);
                s.out(format!("// Error generating declaration: {}", what));
                s.out(format!("// Message: {}", e));
                s.out("/*");
                for cause in e.chain().skip(1) {
                    s.out(format!("caused by: {}", cause));
                }
                s.out("----------------------------");
                s.out("Declaration JSON:");
                match serde_json::to_string_pretty(model) {
                    Ok(json) => json.lines().for_each(|l| s.out(l)),
                    Err(err) => s.out(format!("<not serializable: {}>", err)),
                }
                s.out("*/");
            }
        }
    }

    /// An entire declaration: nesting classes, doc comment, signature, body.
    fn api_function(&self, decl: &Declaration, s: &mut CodeWriter, is_static: bool) -> Result<()> {
        if decl.info().manual_override {
            return Ok(());
        }
        let mut decl = decl.clone();
        decl.sanitize();
        let info = decl.info();
        if info.debugger_break {
            tracing::info!(
                "break on {}: {}",
                info.name,
                serde_json::to_string(&decl).unwrap_or_default()
            );
        }
        if info.comment_out {
            s.out("/*");
        }
        let class_names: Vec<&str> = info.class_path().split('.').collect();
        let nested = &class_names[1..];
        for name in nested {
            s.out(format!("public static partial class {} {{", escape_name(name)));
            s.indent();
        }
        generate_doc_string(&decl, s);
        let retval = generate_return_type(info)?;
        let static_kw = if is_static { "static " } else { "" };
        match decl {
            Declaration::Function(ref func) => {
                let arguments = generate_arguments(func)?;
                let generics = func
                    .generics
                    .as_ref()
                    .map(|g| format!("<{}>", g.join(",")))
                    .unwrap_or_default();
                s.out_block(
                    format!(
                        "public {}{} {}{}{}({})",
                        static_kw,
                        retval,
                        escape_name(&info.name),
                        info.sharp_only_postfix.as_deref().unwrap_or(""),
                        generics,
                        arguments
                    ),
                    |s| function_body(func, s),
                );
            }
            Declaration::Property(ref prop) => {
                s.out_block(
                    format!("public {}{} {}", static_kw, retval, escape_name(&info.name)),
                    |s| -> Result<()> {
                        s.out_block("get", |s| property_getter(prop, s))?;
                        if prop.has_setter {
                            s.out_block("set", |s| {
                                s.out(format!("self.SetAttr(\"{}\", ToPython(value));", prop.info.name))
                            });
                        }
                        Ok(())
                    },
                )?;
            }
        }
        for _ in nested {
            s.outdent();
            s.out("}");
        }
        if info.comment_out {
            s.out("*/");
        }
        if self.print_model_json {
            s.out("// the declaration model:");
            s.out("/*");
            serde_json::to_string_pretty(&decl)?
                .lines()
                .for_each(|l| s.out(l));
            s.out("*/");
        }
        s.blank();
        Ok(())
    }
}

/// Whether an argument is emitted as a C# value type.
fn is_value_type(arg: &Argument) -> bool {
    match arg.ty.as_str() {
        "bool" | "int" | "long" | "double" | "float" => true,
        "object" | "string" => false,
        _ => arg.is_value_type,
    }
}

/// Python literals that slipped through inference.
fn map_default_value(default: &str) -> &str {
    match default {
        "None" => "null",
        "True" => "true",
        "False" => "false",
        other => other,
    }
}

/// The parameter list between the parentheses.
fn generate_arguments(func: &Function) -> Result<String> {
    let mut params = Vec::with_capacity(func.arguments.len());
    for arg in &func.arguments {
        if arg.ty.is_empty() {
            bail!("argument '{}' of {} has no type", arg.name, func.info.name);
        }
        let mut p = arg.ty.clone();
        if arg.is_nullable && is_value_type(arg) {
            p.push('?');
        }
        p.push(' ');
        p.push_str(&escape_name(&arg.name));
        match arg.default_value.as_deref() {
            Some(d) if !d.trim().is_empty() => {
                p.push_str(" = ");
                p.push_str(map_default_value(d));
            }
            _ if arg.is_nullable => p.push_str(" = null"),
            _ => {}
        }
        params.push(p);
    }
    Ok(params.join(", "))
}

fn generate_return_type(info: &DeclInfo) -> Result<String> {
    match info.returns.as_slice() {
        [] => Ok("void".to_string()),
        [single] if single.ty.is_empty() => bail!("return value of {} has no type", info.name),
        [single] => Ok(single.ty.clone()),
        many => Ok(format!(
            "({})",
            many.iter().map(|r| r.ty.as_str()).collect::<Vec<_>>().join(", ")
        )),
    }
}

/// The marshalling body: resolve the Python object, pack positional and
/// keyword arguments, invoke, convert the result.
fn function_body(func: &Function, s: &mut CodeWriter) {
    s.out("//auto-generated code, do not change");
    let class_path = func.info.class_name.as_deref().unwrap_or("no_name");
    let class_names: Vec<&str> = class_path.split('.').collect();
    if class_names.len() < 2 {
        s.out("var __self__=self;");
    } else {
        let mut last = "self".to_string();
        for name in &class_names[1..] {
            let var = escape_name(name);
            s.out(format!("var {} = {}.GetAttr(\"{}\");", var, last, name));
            last = var;
        }
        s.out(format!("var __self__={};", last));
    }
    if func.arguments.is_empty() {
        s.out(format!("dynamic py = __self__.InvokeMethod(\"{}\");", func.info.name));
    } else {
        s.out("var pyargs=ToTuple(new object[]");
        s.block_with("{", "});", |s| {
            for arg in func.arguments.iter().filter(|a| !a.is_named_arg) {
                let name = escape_name(&arg.name);
                match arg.convert_to_sharp_type.as_deref().filter(|t| !t.trim().is_empty()) {
                    Some(conv) => s.out(format!("SharpToSharp<{}>({}),", conv, name)),
                    None => s.out(format!("{},", name)),
                }
            }
        });
        s.out("var kwargs=new PyDict();");
        for arg in func.arguments.iter().filter(|a| a.is_named_arg) {
            let name = escape_name(&arg.name);
            let default_if_null = arg.default_if_null.as_deref().filter(|d| !d.trim().is_empty());
            match (arg.default_value.as_deref(), default_if_null) {
                (Some(d), _) if !d.trim().is_empty() => s.out(format!(
                    "if ({}!={}) kwargs[\"{}\"]=ToPython({});",
                    name, d, arg.name, name
                )),
                (_, Some(fallback)) => s.out(format!(
                    "kwargs[\"{}\"]=ToPython({} ?? {});",
                    arg.name, name, fallback
                )),
                _ => s.out(format!(
                    "if ({}!=null) kwargs[\"{}\"]=ToPython({});",
                    name, arg.name, name
                )),
            }
        }
        s.out(format!(
            "dynamic py = __self__.InvokeMethod(\"{}\", pyargs, kwargs);",
            func.info.name
        ));
    }
    if func.is_constructor {
        s.out("self=py as PyObject;");
        return;
    }
    match func.info.returns.as_slice() {
        [] => {}
        [single] => s.out(format!("return ToCsharp<{}>(py);", single.ty)),
        many => {
            let conv: Vec<String> = many
                .iter()
                .enumerate()
                .map(|(i, r)| format!("ToCsharp<{}>(py[{}])", r.ty, i))
                .collect();
            s.out(format!("return ({});", conv.join(", ")));
        }
    }
}

fn property_getter(prop: &Property, s: &mut CodeWriter) -> Result<()> {
    if prop.info.returns.len() != 1 {
        bail!("property {} returns a tuple", prop.info.name);
    }
    let ty = prop.ty().unwrap_or_default();
    s.out(format!("dynamic py = self.GetAttr(\"{}\");", prop.info.name));
    s.out(format!("return ToCsharp<{}>(py);", ty));
    Ok(())
}

/// XML doc comment from the description texts.
fn generate_doc_string(decl: &Declaration, s: &mut CodeWriter) {
    let info = decl.info();
    let Some(desc) = info.description.as_deref().filter(|d| !d.trim().is_empty()) else {
        return;
    };
    s.out("/// <summary>");
    for line in RE_LINE_SPLIT.split(&process_doc_string(desc)) {
        s.out(format!("///\t{}", line));
    }
    s.out("/// </summary>");
    if let Declaration::Function(ref func) = decl {
        for arg in &func.arguments {
            let Some(text) = arg.description.as_deref().filter(|d| !d.trim().is_empty()) else {
                continue;
            };
            // param names are never @-escaped in doc comments
            s.out(format!("/// <param name=\"{}\">", arg.name));
            for line in RE_LINE_SPLIT.split(&process_doc_string(text)) {
                s.out(format!("///\t{}", line.trim_start()));
            }
            s.out("/// </param>");
        }
    }
    let described = |r: &Argument| r.description.as_deref().is_some_and(|d| !d.trim().is_empty());
    if !info.returns.iter().any(described) {
        return;
    }
    s.out("/// <returns>");
    if let [single] = info.returns.as_slice() {
        let text = process_doc_string(single.description.as_deref().unwrap_or_default());
        for line in RE_LINE_SPLIT.split(&text) {
            s.out(format!("///\t{}", line));
        }
    } else {
        s.out("/// A tuple of:");
        for ret in &info.returns {
            s.out(format!("/// {}", ret.name));
            for line in RE_LINE_SPLIT.split(ret.description.as_deref().unwrap_or_default()) {
                s.out(format!("///\t{}", line));
            }
        }
    }
    s.out("/// </returns>");
}

/// One sentence per line, collapsed blank runs, no trailing break marker.
pub(crate) fn process_doc_string(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    let broken = break_sentences(text);
    let collapsed = RE_MULTI_NEWLINE.replace_all(&broken, "\n\n");
    let trimmed = collapsed.trim();
    trimmed.strip_suffix(LINE_BREAK).unwrap_or(trimmed).to_string()
}

/// Insert a break after each sentence-ending period: a period after a
/// letter, `)` or `]` (or after a digit that follows whitespace) and
/// before whitespace or end of text.
fn break_sentences(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 32);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if c != '.' {
            continue;
        }
        let ends_text = chars.get(i + 1).is_none_or(|n| n.is_whitespace());
        let after_word = match i.checked_sub(1).map(|j| chars[j]) {
            Some(p) if p.is_ascii_digit() => i >= 2 && chars[i - 2].is_whitespace(),
            Some(p) => p.is_alphanumeric() || p == '_' || p == ')' || p == ']',
            None => false,
        };
        if ends_text && after_word {
            out.push_str(LINE_BREAK);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(decl: Declaration) -> String {
        let gen = CodeGenerator::default();
        let mut s = CodeWriter::new();
        gen.api_function(&decl, &mut s, true).unwrap();
        s.into_string()
    }

    fn sum() -> Function {
        let mut f = Function::new("sum", Some("numpy".into()));
        f.arguments.push(Argument::new("a", "NDarray"));
        let mut axis = Argument::new("axis", "int");
        axis.is_nullable = true;
        axis.is_named_arg = true;
        f.arguments.push(axis);
        let mut keepdims = Argument::new("keepdims", "bool");
        keepdims.default_value = Some("false".into());
        f.arguments.push(keepdims);
        f.set_return_type("NDarray");
        f
    }

    #[test]
    fn emits_signature_and_body() {
        let out = emit(sum().into());
        assert!(out.contains(
            "public static NDarray sum(NDarray a, int? axis = null, bool keepdims = false)"
        ));
        assert!(out.contains("var __self__=self;"));
        assert!(out.contains("if (axis!=null) kwargs[\"axis\"]=ToPython(axis);"));
        assert!(out.contains("if (keepdims!=false) kwargs[\"keepdims\"]=ToPython(keepdims);"));
        assert!(out.contains("dynamic py = __self__.InvokeMethod(\"sum\", pyargs, kwargs);"));
        assert!(out.contains("return ToCsharp<NDarray>(py);"));
    }

    #[test]
    fn nested_class_path_resolves_attributes() {
        let mut f = Function::new("norm", Some("numpy.linalg".into()));
        f.arguments.push(Argument::new("x", "NDarray"));
        f.set_return_type("float");
        let out = emit(f.into());
        assert!(out.contains("public static partial class linalg {"));
        assert!(out.contains("var linalg = self.GetAttr(\"linalg\");"));
        assert!(out.contains("var __self__=linalg;"));
    }

    #[test]
    fn manual_override_emits_nothing() {
        let mut f = sum();
        f.info.manual_override = true;
        assert_eq!(emit(f.into()), "");
    }

    #[test]
    fn comment_out_wraps_output() {
        let mut f = sum();
        f.info.comment_out = true;
        let out = emit(f.into());
        assert!(out.starts_with("/*\n"));
        assert!(out.trim_end().ends_with("*/"));
    }

    #[test]
    fn convert_to_sharp_type_wraps_positional() {
        let mut f = Function::new("array", Some("numpy".into()));
        let mut a = Argument::new("object", "T[]");
        a.convert_to_sharp_type = Some("NDarray".into());
        f.arguments.push(a);
        f.arguments.push(Argument::new("copy", "bool"));
        f.make_generic("T");
        f.set_return_type("NDarray<T>");
        let out = emit(f.into());
        assert!(out.contains("public static NDarray<T> array<T>(T[] @object, bool copy)"));
        assert!(out.contains("SharpToSharp<NDarray>(@object),"));
    }

    #[test]
    fn default_if_null_is_substituted() {
        let mut f = Function::new("rot90", Some("numpy".into()));
        f.arguments.push(Argument::new("m", "NDarray"));
        let mut axes = Argument::new("axes", "int[]");
        axes.is_named_arg = true;
        axes.default_if_null = Some("new int[] {0, 1}".into());
        f.arguments.push(axes);
        let out = emit(f.into());
        assert!(out.contains("kwargs[\"axes\"]=ToPython(axes ?? new int[] {0, 1});"));
    }

    #[test]
    fn tuple_return_type() {
        let mut f = Function::new("histogram", Some("numpy".into()));
        f.arguments.push(Argument::new("a", "NDarray"));
        f.info.returns = vec![
            Argument::returning("hist", "NDarray"),
            Argument::returning("bin_edges", "NDarray"),
        ];
        let out = emit(f.into());
        assert!(out.contains("public static (NDarray, NDarray) histogram(NDarray a)"));
        assert!(out.contains("return (ToCsharp<NDarray>(py[0]), ToCsharp<NDarray>(py[1]));"));
    }

    #[test]
    fn property_getter_and_setter() {
        let mut p = Property::new("int8", "Dtype");
        p.has_setter = false;
        let out = emit(p.into());
        assert!(out.contains("public static Dtype int8"));
        assert!(out.contains("dynamic py = self.GetAttr(\"int8\");"));
        assert!(!out.contains("SetAttr"));
    }

    #[test]
    fn broken_declaration_is_recorded_and_batch_continues() {
        let mut api = StaticApi::new("broken");
        let mut p = Property::new("pair", "int");
        p.info.returns.push(Argument::returning("b", "int"));
        api.api.declarations.push(p.into());
        api.api.declarations.push(sum().into());
        let gen = CodeGenerator::default();
        let mut s = CodeWriter::new();
        gen.generate_static_api(&api, &mut s);
        let out = s.into_string();
        assert!(out.contains("// Error generating declaration: pair"));
        assert!(out.contains("// Message: property pair returns a tuple"));
        assert!(out.contains("\"name\": \"pair\""));
        assert!(out.contains("public static NDarray sum("));
    }

    #[test]
    fn doc_string_one_sentence_per_line() {
        let mut f = sum();
        f.info.description = Some("Sum of array elements. Works over an axis.".into());
        let out = emit(f.into());
        assert!(out.contains("///\tSum of array elements.<br></br>\n"));
        assert!(out.contains("///\t Works over an axis.\n"));
    }

    #[test]
    fn process_doc_string_keeps_decimals() {
        assert_eq!(process_doc_string("Use 1.5 here."), "Use 1.5 here.");
        assert_eq!(process_doc_string("See np.sum (x). Then"), "See np.sum (x).<br></br>\n Then");
    }

    #[test]
    fn class_with_constructor() {
        let mut class = ApiClass::new("numpy.random.RandomState");
        class.doc_string = Some("Container for the Mersenne Twister.".into());
        let mut ctor = Function::new("RandomState", None);
        let mut seed = Argument::new("seed", "int");
        seed.is_nullable = true;
        seed.is_named_arg = true;
        ctor.arguments.push(seed);
        class.constructors.push(ctor);
        let gen = CodeGenerator::default();
        let mut s = CodeWriter::new();
        gen.generate_class(&class, &mut s).unwrap();
        let out = s.into_string();
        assert!(out.contains("public static partial class numpy {"));
        assert!(out.contains("public partial class RandomState : PythonObject"));
        assert!(out.contains("public RandomState(int? seed = null)"));
        assert!(out.contains("var random = self.GetAttr(\"random\");"));
        assert!(out.contains("self=py as PyObject;"));
    }

    #[test]
    fn class_with_empty_name_fails() {
        let class = ApiClass::new("numpy.");
        let gen = CodeGenerator::default();
        let mut s = CodeWriter::new();
        assert!(gen.generate_class(&class, &mut s).is_err());
    }
}
