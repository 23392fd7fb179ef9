//! Type and default-value inference from documentation phrases.
//!
//! The phrase tables are closed: anything not listed falls through to a
//! couple of prefix checks and then to the phrase itself, so an unknown
//! phrase surfaces later as a compile error in the emitted code.

use docbind_model::Argument;
use regex::Regex;
use std::sync::LazyLock;

/// Decimal or exponent literal somewhere in the text.
static RE_FLOAT_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?(\d+\.\d+)|(\d+(\.\d+)?e[+-]\d+)").unwrap());

/// Infer the target type of `arg` from the first comma-separated part of its
/// type description.
///
/// A few argument names rename the argument or mark it nullable on the way.
pub fn infer_type(arg: &mut Argument, phrase: &str) -> String {
    let phrase = phrase.trim();
    if let Some(ty) = type_by_name(arg, phrase) {
        return ty.to_string();
    }
    if let Some(ty) = type_by_phrase(arg, phrase) {
        return ty.to_string();
    }
    if arg.is_return_value && matches!(phrase, "array" | "array_like") {
        return "NDarray".to_string();
    }
    if phrase.starts_with("ndarray") {
        return "NDarray".to_string();
    }
    if phrase.starts_with("{‘") {
        return "string".to_string();
    }
    phrase.to_string()
}

// -- Argument-name overrides ---------------------------------------------------

fn type_by_name(arg: &mut Argument, phrase: &str) -> Option<&'static str> {
    match arg.name.as_str() {
        "shape" | "newshape" | "new_shape" => Some("Shape"),
        "dtype" => Some("Dtype"),
        "order" => Some("string"),
        "slice" => Some("Slice"),
        "strides" => Some("int[]"),
        "edge_order" => Some("int"),
        "arys1, arys2, …" => {
            arg.name = "arys".to_string();
            Some("params NDarray[]")
        }
        "`*args`" => {
            arg.name = "args".to_string();
            None
        }
        "a1, a2, …" => {
            arg.name = "arys".to_string();
            None
        }
        "norm" if phrase == "{None" => Some("string"),
        "axis" if phrase == "{int" => Some("int[]"),
        _ => None,
    }
}

// -- Phrase table --------------------------------------------------------------

fn type_by_phrase(arg: &mut Argument, phrase: &str) -> Option<&'static str> {
    let ty = match phrase {
        "dtype" | "data-type" | "dtype or dtype specifier" | "data type code" | "integer type"
        | "dtype_like" => "Dtype",

        "matrix" => "Matrix",

        "array" | "ndarray" | "np.ndarray" | "2-D array" | "1-D array or sequence" | "(…"
        | "(…) array_like" | "{(…" | "{ (…" | "(M" | "(N" | "(k" | "{(M" | "{(N" | "{(1"
        | "(min(M" | "list of scalar or array" | "scalar or array_like or None"
        | "scalar or array_like" | "float or ndarray" | "(…) array_like of float"
        | "complex ndarray" | "1-D array_like" | "scalar or ndarray" | "broadcast object"
        | "array_like or scalar" | "single item or ndarray" | "1-D array-like"
        | "2-D array_like" | "array_like of rank N" | "{sequence" | "1D or 2D array_like"
        | "1-D sequence" | "scalar or array_like of shape(M" | "array_like of values"
        | "array-like" => "NDarray",

        "array of ints searchsorted(1-D array_like" | "array of ints" | "array of integer type"
        | "array_like of integer type" | "int or ndarray of ints" | "int or array_like of ints"
        | "int array" => "NDarray<int>",

        "array_like of float" | "array of dtype float" | "float or ndarray of floats"
        | "float or array_like of floats" | "float or array_like of float"
        | "sequence of floats" => "NDarray<float>",

        "bool (scalar) or boolean ndarray" | "bool or ndarray of bool" | "1-D array of bools"
        | "array of bool" => "NDarray<bool>",

        "list of bool ndarrays" => "NDarray<bool>[]",

        "scalar" if arg.is_return_value => "T",
        "scalar" => "ValueType",

        "{ ‘warn’" | "file" | "str" | "string or list" | "file or str" | "str or function"
        | "file-like object" | "str or file" | "filename or file handle" | "str or regexp"
        | "str or None" | "file-like" | "{{‘begin’" | "str or array_like of bool"
        | "str or unicode" | "{str" | "str of length 256" => "string",

        "str or sequence of str" | "str or list of str" | "array of str or unicode-like"
        | "str or sequence of strs" | "sequence of str" | "str or list"
        | "str or list/tuple of str" | "list of str or array_like" | "array_like of datetime64"
        | "array_like of datetime64[D]" | "array_like of str or unicode"
        | "array-like of str or unicode" => "string[]",

        "callable" | "function" => "Delegate",
        "any" => "object",
        "iterable object" => "IEnumerable<T>",
        "dict" => "Hashtable",

        "int or tuple" | "int or sequence" | "int or sequence of int" | "int or sequence of ints"
        | "sequence of ints" | "int or array of ints" | "int or tuple of ints"
        | "None or int or tuple of ints" | "int or 1-D array" | "sequence or int"
        | "array_like of ints" | "ints" => "int[]",

        "boolean" => "bool",
        "integer" => "int",
        "int or None" => {
            arg.is_nullable = true;
            "int"
        }
        "Standard Python scalar object" => "T",
        "Arguments (variable number and type)" => "params int[]",
        "list" => "List<T>",

        "list of arrays" | "array_likes" | "sequence of arrays" | "sequence of ndarrays"
        | "sequence of array_like" | "sequence of 1-D or 2-D arrays." | "list of ndarrays"
        | "tuple" | "list of array_like" | "tuple of ndarrays" | "tuple of ndarray"
        | "1-D sequences" | "tuple of arrays." | "tuple of arrays" | "array_like (Ni…"
        | "array_like (Nj…)" => "NDarray[]",

        "slice" => "Slice",
        "Number" => "double",
        "scalar dtype or object" => "object",
        _ => return None,
    };
    Some(ty)
}

// -- Default values ------------------------------------------------------------

/// Map a documented Python default to target source text. `None` means the
/// argument has no usable default.
pub fn infer_default(raw: &str) -> Option<String> {
    let raw = raw.trim();
    match raw {
        "None" | "<class 'float'>" | "<class 'numpy.float64'>" | "<no value>" => return None,
        "True" => return Some("true".to_string()),
        "False" => return Some("false".to_string()),
        _ => {}
    }
    if raw.starts_with('\'') {
        return Some(format!("\"{}\"", raw.trim_matches('\'')));
    }
    if RE_FLOAT_LITERAL.is_match(raw) {
        return Some(format!("{}f", raw));
    }
    Some(raw.to_string())
}
