//! Declaration model: the in-memory form of one parsed API item.
//!
//! Declarations are created once per documentation page, corrected by the
//! rule tables, cloned by the overload expander and finally handed to the
//! emitter. They are never deleted; suppression goes through the flags on
//! [`DeclInfo`].

use serde::{Deserialize, Serialize};

/// Target types that map to C# value types.
const VALUE_TYPES: &[&str] = &["int", "long", "float", "double", "bool"];

/// A function argument or a return value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    /// Target type name, e.g. `NDarray`, `int[]`, `Dtype`
    #[serde(rename = "type")]
    pub ty: String,
    pub is_nullable: bool,
    pub is_value_type: bool,
    /// Default value as target-language source text
    pub default_value: Option<String>,
    pub is_named_arg: bool,
    pub description: Option<String>,
    /// Convert to this target type first, only then to a Python object
    pub convert_to_sharp_type: Option<String>,
    /// Non-constant default, substituted when the caller passes null
    pub default_if_null: Option<String>,
    pub position: usize,
    pub is_return_value: bool,
    /// Source page identifier
    pub tag: Option<String>,
    /// Dropped by [`Function::sanitize`]
    pub ignore: bool,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Argument {
            name: name.into(),
            ty: ty.into(),
            ..Default::default()
        }
    }

    /// A return value entry.
    pub fn returning(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Argument {
            is_return_value: true,
            ..Argument::new(name, ty)
        }
    }

    /// True when a non-blank default literal is present.
    pub fn has_default(&self) -> bool {
        self.default_value
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    pub fn set_nullable_optional(&mut self, ty: &str, default: Option<&str>) {
        self.ty = ty.to_string();
        self.is_nullable = true;
        self.is_named_arg = true;
        self.default_value = default.map(str::to_string);
    }

    pub fn make_mandatory(&mut self) {
        self.default_value = None;
        self.is_nullable = false;
    }
}

/// Attributes shared by functions and properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclInfo {
    pub name: String,
    /// Containing API path, e.g. `numpy` or `numpy.linalg`
    pub class_name: Option<String>,
    /// Overrides `class_name` for the emitted nesting
    pub generated_class_name: Option<String>,
    pub description: Option<String>,
    pub returns: Vec<Argument>,
    pub is_deprecated: bool,
    /// A hand-written implementation exists; emit nothing
    pub manual_override: bool,
    /// Emit inside a block comment
    pub comment_out: bool,
    /// Do not emit at all
    pub ignore: bool,
    /// Log the full declaration when it is emitted
    pub debugger_break: bool,
    /// Appended to the emitted name only (e.g. `fft_`)
    pub sharp_only_postfix: Option<String>,
    /// Source page identifier
    pub tag: Option<String>,
}

impl DeclInfo {
    pub fn new(name: impl Into<String>, class_name: Option<String>) -> Self {
        DeclInfo {
            name: name.into(),
            class_name,
            ..Default::default()
        }
    }

    /// Nesting path used by the emitter.
    pub fn class_path(&self) -> &str {
        self.generated_class_name
            .as_deref()
            .or(self.class_name.as_deref())
            .unwrap_or("no_name")
    }
}

/// A callable API item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    #[serde(flatten)]
    pub info: DeclInfo,
    pub arguments: Vec<Argument>,
    /// Generic type parameters
    pub generics: Option<Vec<String>>,
    pub is_constructor: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, class_name: Option<String>) -> Self {
        Function {
            info: DeclInfo::new(name, class_name),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn arg(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn arg_mut(&mut self, name: &str) -> Option<&mut Argument> {
        self.arguments.iter_mut().find(|a| a.name == name)
    }

    /// Remove the first argument with the given name.
    pub fn remove_arg(&mut self, name: &str) -> Option<Argument> {
        let pos = self.arguments.iter().position(|a| a.name == name)?;
        Some(self.arguments.remove(pos))
    }

    /// Type of the first return value.
    pub fn return_type(&self) -> Option<&str> {
        self.info.returns.first().map(|r| r.ty.as_str())
    }

    /// Set the type of the first return value, creating it if absent.
    pub fn set_return_type(&mut self, ty: &str) {
        match self.info.returns.first_mut() {
            Some(ret) => ret.ty = ty.to_string(),
            None => self.info.returns.push(Argument {
                ty: ty.to_string(),
                is_return_value: true,
                ..Default::default()
            }),
        }
    }

    pub fn make_generic(&mut self, param: &str) {
        self.generics = Some(vec![param.to_string()]);
    }

    /// Reassign `position` from list order.
    pub fn renumber(&mut self) {
        for (i, arg) in self.arguments.iter_mut().enumerate() {
            arg.position = i;
        }
    }

    /// Ordered argument types; two overloads with the same signature are
    /// the same overload.
    pub fn signature(&self) -> Vec<&str> {
        self.arguments.iter().map(|a| a.ty.as_str()).collect()
    }

    /// Normalise arguments for emission.
    ///
    /// After this call named arguments are contiguous: once an argument is
    /// named or has a default, every later argument is named too. Ignored
    /// arguments still count for that before they are dropped.
    pub fn sanitize(&mut self) {
        let mut all_named = false;
        for arg in &mut self.arguments {
            if arg.default_value.is_some() || arg.is_named_arg {
                all_named = true;
            }
            if all_named {
                arg.is_named_arg = true;
            }
            if arg.name == "self" {
                arg.name = "self_".to_string();
            }
            if arg.default_value.as_deref() == Some("null")
                && !arg.is_nullable
                && VALUE_TYPES.contains(&arg.ty.as_str())
            {
                arg.is_nullable = true;
            }
            if arg.ty == "float" {
                if let Some(d) = arg.default_value.as_mut() {
                    if !d.trim().is_empty() && d.contains('.') && !d.ends_with('f') {
                        d.push('f');
                    }
                }
            }
            if arg.default_value.as_deref().is_some_and(|d| d.starts_with('"')) {
                arg.ty = "string".to_string();
            }
        }
        self.arguments.retain(|a| !a.ignore);
        // a lone array argument becomes a params array
        if let [arg] = self.arguments.as_mut_slice() {
            if arg.ty.ends_with("[]") && !arg.ty.starts_with("params") {
                arg.ty = format!("params {}", arg.ty);
                arg.is_nullable = false;
                arg.default_value = None;
            }
        }
    }
}

/// A get/settable value with no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(flatten)]
    pub info: DeclInfo,
    pub has_setter: bool,
    pub default_value: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, ty: &str) -> Self {
        let mut prop = Property {
            info: DeclInfo::new(name, None),
            has_setter: true,
            default_value: None,
        };
        prop.set_type(ty);
        prop
    }

    /// Type of the first return value; tuple-valued properties use `returns`.
    pub fn ty(&self) -> Option<&str> {
        self.info.returns.first().map(|r| r.ty.as_str())
    }

    pub fn set_type(&mut self, ty: &str) {
        match self.info.returns.first_mut() {
            Some(ret) => ret.ty = ty.to_string(),
            None => self.info.returns.push(Argument::returning("", ty)),
        }
    }
}

/// Any emittable API item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Declaration {
    Function(Function),
    Property(Property),
}

impl Declaration {
    pub fn info(&self) -> &DeclInfo {
        match self {
            Declaration::Function(f) => &f.info,
            Declaration::Property(p) => &p.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut DeclInfo {
        match self {
            Declaration::Function(f) => &mut f.info,
            Declaration::Property(p) => &mut p.info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Declaration::Function(f) => Some(f),
            Declaration::Property(_) => None,
        }
    }

    pub fn sanitize(&mut self) {
        if let Declaration::Function(f) = self {
            f.sanitize();
        }
    }
}

impl From<Function> for Declaration {
    fn from(f: Function) -> Self {
        Declaration::Function(f)
    }
}

impl From<Property> for Declaration {
    fn from(p: Property) -> Self {
        Declaration::Property(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, ty: &str, default: Option<&str>) -> Argument {
        Argument {
            default_value: default.map(str::to_string),
            ..Argument::new(name, ty)
        }
    }

    #[test]
    fn sanitize_makes_named_args_contiguous() {
        let mut f = Function::new("f", Some("numpy".into()));
        f.arguments = vec![
            named("a", "NDarray", None),
            named("axis", "int", Some("0")),
            named("out", "NDarray", None),
            named("keepdims", "bool", None),
        ];
        f.sanitize();
        let flags: Vec<bool> = f.arguments.iter().map(|a| a.is_named_arg).collect();
        assert_eq!(flags, vec![false, true, true, true]);
    }

    #[test]
    fn sanitize_drops_ignored_args() {
        let mut f = Function::new("linspace", None);
        let mut retstep = named("retstep", "bool", None);
        retstep.ignore = true;
        f.arguments = vec![named("start", "double", None), retstep, named("num", "int", None)];
        f.sanitize();
        assert!(f.arg("retstep").is_none());
        assert_eq!(f.arguments.len(), 2);
    }

    #[test]
    fn ignored_default_still_names_later_args() {
        let mut f = Function::new("linspace", None);
        let mut retstep = named("retstep", "bool", Some("false"));
        retstep.ignore = true;
        f.arguments = vec![
            named("start", "NDarray", None),
            named("stop", "NDarray", None),
            retstep,
            named("dtype", "Dtype", None),
        ];
        f.sanitize();
        let names: Vec<&str> = f.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["start", "stop", "dtype"]);
        let flags: Vec<bool> = f.arguments.iter().map(|a| a.is_named_arg).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn sanitize_value_type_null_default_becomes_nullable() {
        let mut f = Function::new("f", None);
        f.arguments = vec![named("a", "NDarray", None), named("n", "int", Some("null"))];
        f.sanitize();
        assert!(f.arguments[1].is_nullable);
    }

    #[test]
    fn sanitize_float_default_gets_suffix() {
        let mut f = Function::new("f", None);
        f.arguments = vec![named("a", "NDarray", None), named("tol", "float", Some("0.5"))];
        f.sanitize();
        assert_eq!(f.arguments[1].default_value.as_deref(), Some("0.5f"));
    }

    #[test]
    fn sanitize_quoted_default_forces_string() {
        let mut f = Function::new("f", None);
        f.arguments = vec![named("a", "NDarray", None), named("mode", "object", Some("\"xy\""))];
        f.sanitize();
        assert_eq!(f.arguments[1].ty, "string");
    }

    #[test]
    fn sanitize_single_array_becomes_params() {
        let mut f = Function::new("f", None);
        f.arguments = vec![named("shape", "int[]", Some("null"))];
        f.sanitize();
        assert_eq!(f.arguments[0].ty, "params int[]");
        assert!(f.arguments[0].default_value.is_none());
    }

    #[test]
    fn sanitize_renames_self() {
        let mut f = Function::new("f", None);
        f.arguments = vec![named("self", "NDarray", None), named("b", "int", None)];
        f.sanitize();
        assert_eq!(f.arguments[0].name, "self_");
    }

    #[test]
    fn set_return_type_creates_entry() {
        let mut f = Function::new("mgrid", None);
        assert_eq!(f.return_type(), None);
        f.set_return_type("NDarray[]");
        assert_eq!(f.return_type(), Some("NDarray[]"));
        assert!(f.info.returns[0].is_return_value);
    }

    #[test]
    fn class_path_prefers_generated_name() {
        let mut info = DeclInfo::new("norm", Some("numpy.linalg".into()));
        assert_eq!(info.class_path(), "numpy.linalg");
        info.generated_class_name = Some("numpy".into());
        assert_eq!(info.class_path(), "numpy");
        assert_eq!(DeclInfo::default().class_path(), "no_name");
    }

    #[test]
    fn declaration_serializes_with_kind_tag() {
        let decl: Declaration = Property::new("int8", "Dtype").into();
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["kind"], "Property");
        assert_eq!(json["name"], "int8");
    }
}
