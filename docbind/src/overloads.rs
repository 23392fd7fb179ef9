//! Overload expansion.
//!
//! The documentation describes one dynamically typed parameter where C#
//! needs several static overloads. A handful of functions get a curated
//! overload set; everything else goes through a work queue that clones the
//! function once per concrete representation of each polymorphic argument.

use docbind_model::{Argument, Function};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Never get array representation overloads.
const ARRAY_LIKE_EXCLUDED: &[&str] = &[
    "logspace", "linspace", "geomspace", "tile", "delete", "repeat", "roll", "rot90",
];

/// No array representation overloads for the first argument.
const ARRAY_LIKE_EXCLUDED_FIRST: &[&str] = &[
    "insert", "append", "resize", "flip", "flipud", "fliplr", "squeeze", "expand_dims",
    "broadcast_to", "transpose", "swapaxes", "ravel", "reshape", "copyto",
];

/// Reducers returning an array with `axis` and a scalar without it.
const REDUCERS: &[&str] = &[
    "percentile", "nanpercentile", "quantile", "nanquantile", "median", "average", "mean", "std",
    "var", "nanmedian", "nanmean", "nanstd", "nanvar",
];

const HISTOGRAMS: &[&str] = &["histogram", "histogram2d", "histogramdd", "histogram_bin_edges"];

const NUMBER_WIDTHS: &[&str] = &["byte", "short", "int", "long", "float", "double"];

/// Concrete overloads for `decl`, first occurrence of each argument type
/// signature kept.
///
/// `expand_array_like` enables the flat and 2D array overloads of
/// `array_like` arguments.
pub fn expand(decl: Function, expand_array_like: bool) -> Vec<Function> {
    let overloads = match named_overloads(decl) {
        Expansion::Done(overloads) => overloads,
        Expansion::Generic(decl) => generic_overloads(decl, expand_array_like),
    };
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    overloads
        .into_iter()
        .filter(|f| seen.insert(f.signature().iter().map(|s| s.to_string()).collect()))
        .map(|mut f| {
            f.renumber();
            f
        })
        .collect()
}

enum Expansion {
    Done(Vec<Function>),
    Generic(Function),
}

// -- Named exceptions ----------------------------------------------------------

/// Apply `f` to the named argument, if the page documented it.
fn with_arg(func: &mut Function, name: &str, f: impl FnOnce(&mut Argument)) {
    match func.arg_mut(name) {
        Some(arg) => f(arg),
        None => debug!("{}: no argument '{}' to adjust", func.info.name, name),
    }
}

fn with_first(func: &mut Function, f: impl FnOnce(&mut Argument)) {
    if let Some(arg) = func.arguments.first_mut() {
        f(arg);
    }
}

fn remove_args(func: &mut Function, names: &[&str]) {
    for name in names {
        func.remove_arg(name);
    }
}

/// Remove arguments `from..to`, clamped to the argument count.
fn drain_args(func: &mut Function, from: usize, to: usize) {
    let to = to.min(func.arguments.len());
    if from < to {
        func.arguments.drain(from..to);
    }
}

fn set_type(ty: &'static str) -> impl FnOnce(&mut Argument) {
    move |arg| arg.ty = ty.to_string()
}

fn named_overloads(mut decl: Function) -> Expansion {
    let name = decl.info.name.clone();
    let overloads = match name.as_str() {
        "norm" | "asscalar" | "normal" | "meshgrid" => Vec::new(),
        "all" | "any" => {
            with_first(&mut decl, set_type("NDarray"));
            decl.set_return_type("NDarray<bool>");
            with_arg(&mut decl, "axis", |a| a.is_nullable = false);
            let mut scalar = decl.clone();
            remove_args(&mut scalar, &["axis", "out", "keepdims"]);
            scalar.set_return_type("bool");
            vec![decl, scalar]
        }
        "count_nonzero" => {
            with_first(&mut decl, set_type("NDarray"));
            decl.set_return_type("NDarray<int>");
            with_arg(&mut decl, "axis", |a| a.is_nullable = false);
            let mut scalar = decl.clone();
            remove_args(&mut scalar, &["axis"]);
            scalar.set_return_type("int");
            vec![decl, scalar]
        }
        "sort" => {
            with_arg(&mut decl, "axis", |a| a.default_value = Some("-1".to_string()));
            return Expansion::Generic(decl);
        }
        n if REDUCERS.contains(&n) => {
            with_first(&mut decl, set_type("NDarray"));
            decl.set_return_type("NDarray<double>");
            if let Some(arg) = decl.arg_mut("interpolation") {
                arg.default_value = Some("\"linear\"".to_string());
                arg.is_named_arg = true;
            }
            if let Some(arg) = decl.arg_mut("weights") {
                arg.ty = "NDarray".to_string();
                arg.is_named_arg = true;
                arg.is_nullable = true;
            }
            with_arg(&mut decl, "axis", |a| a.is_nullable = false);
            let mut scalar = decl.clone();
            remove_args(&mut scalar, &["axis", "keepdims"]);
            scalar.set_return_type("double");
            vec![decl, scalar]
        }
        n if HISTOGRAMS.contains(&n) => histogram_overloads(decl),
        "choice" | "permutation" | "binomial" => {
            with_first(&mut decl, |a| {
                if !a.ty.starts_with("NDarray") {
                    a.ty = "NDarray".to_string();
                }
            });
            let mut count = decl.clone();
            with_first(&mut count, set_type("int"));
            vec![decl, count]
        }
        "seed" | "RandomState" => {
            with_first(&mut decl, |a| {
                a.ty = "int".to_string();
                a.default_value = Some("null".to_string());
                a.is_nullable = true;
            });
            let mut array = decl.clone();
            with_first(&mut array, set_type("NDarray"));
            vec![decl, array]
        }
        "unique" => {
            with_arg(&mut decl, "ar", set_type("NDarray"));
            for arg in decl.arguments.iter_mut().filter(|a| a.name != "axis") {
                arg.is_nullable = false;
                arg.default_value = None;
            }
            decl.info.returns.truncate(1);
            // without the return_* flags only the unique values come back
            let mut minimal = decl.clone();
            drain_args(&mut minimal, 1, 4);
            decl.set_return_type("NDarray[]");
            vec![minimal, decl]
        }
        "linspace" => {
            with_arg(&mut decl, "retstep", |a| a.ignore = true);
            with_arg(&mut decl, "start", set_type("NDarray"));
            with_arg(&mut decl, "stop", set_type("NDarray"));
            with_arg(&mut decl, "num", |a| a.default_value = Some("50".to_string()));
            with_arg(&mut decl, "endpoint", |a| a.default_value = Some("true".to_string()));
            let mut scalar = decl.clone();
            if scalar.info.returns.len() > 1 {
                scalar.info.returns.remove(1);
            }
            with_arg(&mut scalar, "start", set_type("double"));
            with_arg(&mut scalar, "stop", set_type("double"));
            vec![decl, scalar]
        }
        "rand" | "randn" => {
            let mut single = decl.clone();
            single.arguments.clear();
            single.info.manual_override = false;
            single.set_return_type("float");
            vec![decl, single]
        }
        "where" => {
            for arg in ["condition", "x", "y"] {
                with_arg(&mut decl, arg, set_type("NDarray"));
            }
            let mut condition_only = decl.clone();
            drain_args(&mut condition_only, 1, 3);
            condition_only.set_return_type("NDarray[]");
            vec![decl, condition_only]
        }
        "transpose" => {
            if decl.arguments.first().is_some_and(|a| a.ty == "array_like") {
                with_first(&mut decl, set_type("NDarray"));
                let mut many = decl.clone();
                with_first(&mut many, set_type("NDarray[]"));
                vec![decl, many]
            } else {
                vec![decl]
            }
        }
        _ => return Expansion::Generic(decl),
    };
    debug!("{}: {} curated overloads", name, overloads.len());
    Expansion::Done(overloads)
}

fn histogram_overloads(mut decl: Function) -> Vec<Function> {
    with_first(&mut decl, set_type("NDarray"));
    if decl.info.returns.len() > 1 {
        decl.info.returns[1].ty = "NDarray".to_string();
        decl.generics = None;
    }
    if let Some(arg) = decl.arg_mut("bins") {
        arg.ty = "int".to_string();
        arg.is_named_arg = true;
    }
    if let Some(arg) = decl.arg_mut("range") {
        arg.ty = "(float, float)".to_string();
        arg.is_named_arg = true;
        arg.is_value_type = true;
        arg.is_nullable = true;
    }
    if let Some(arg) = decl.arg_mut("weights") {
        arg.ty = "NDarray".to_string();
        arg.is_named_arg = true;
        arg.is_nullable = true;
    }
    if let Some(arg) = decl.arg_mut("y") {
        arg.ty = "NDarray".to_string();
    }
    let mut array_bins = decl.clone();
    with_arg(&mut array_bins, "bins", set_type("NDarray"));
    let mut named_bins = decl.clone();
    with_arg(&mut named_bins, "bins", set_type("List<string>"));
    vec![decl, array_bins, named_bins]
}

// -- Generic expansion ---------------------------------------------------------

fn generic_overloads(decl: Function, expand_array_like: bool) -> Vec<Function> {
    if decl.arguments.is_empty() {
        return vec![decl];
    }
    match decl.info.name.as_str() {
        "arange" => return arange_overloads(decl),
        "bmat" => return bmat_overloads(decl),
        _ => {}
    }
    let mut queue = VecDeque::from([(decl, 0usize)]);
    let mut done = Vec::new();
    while let Some((func, cursor)) = queue.pop_front() {
        let next = func
            .arguments
            .iter()
            .skip(cursor)
            .position(|a| is_polymorphic(&a.ty))
            .map(|offset| cursor + offset);
        let Some(i) = next else {
            done.push(func);
            continue;
        };
        for variant in variants(&func, i, expand_array_like) {
            queue.push_back((variant, i + 1));
        }
    }
    done
}

fn is_polymorphic(ty: &str) -> bool {
    matches!(ty, "array_like" | "array_like of bool" | "number")
}

/// Concrete versions of `func` for its polymorphic argument `i`; the first
/// one keeps the default representation.
fn variants(func: &Function, i: usize, expand_array_like: bool) -> Vec<Function> {
    let retype = |ty: &str, convert: Option<&str>| {
        let mut clone = func.clone();
        clone.arguments[i].ty = ty.to_string();
        clone.arguments[i].convert_to_sharp_type = convert.map(str::to_string);
        clone
    };
    match func.arguments[i].ty.as_str() {
        "array_like" => {
            let mut out = vec![retype("NDarray", None)];
            if expand_array_like && !array_like_excluded(func.name(), i) {
                for ty in ["T[]", "T[,]"] {
                    let mut clone = retype(ty, Some("NDarray"));
                    clone.make_generic("T");
                    if clone.return_type() == Some("NDarray") {
                        clone.set_return_type("NDarray<T>");
                    }
                    out.push(clone);
                }
            }
            out
        }
        "array_like of bool" => vec![retype("NDarray", None), retype("bool[]", Some("NDarray"))],
        "number" => ["float", "byte", "short", "int", "long", "double"]
            .into_iter()
            .map(|ty| retype(ty, None))
            .collect(),
        _ => vec![func.clone()],
    }
}

fn array_like_excluded(name: &str, i: usize) -> bool {
    ARRAY_LIKE_EXCLUDED.contains(&name) || (i == 0 && ARRAY_LIKE_EXCLUDED_FIRST.contains(&name))
}

/// `arange([start, ]stop, [step, ]dtype=None)`: for every numeric width one
/// overload with `start` and one without.
fn arange_overloads(mut decl: Function) -> Vec<Function> {
    if let Some(dtype) = decl.arguments.last_mut() {
        dtype.is_nullable = true;
        dtype.is_named_arg = true;
    }
    if !decl.arguments.iter().any(|a| a.ty == "number") {
        return vec![decl];
    }
    let mut out = Vec::with_capacity(NUMBER_WIDTHS.len() * 2);
    for width in NUMBER_WIDTHS {
        let mut with_start = decl.clone();
        for arg in with_start.arguments.iter_mut().filter(|a| a.ty == "number") {
            arg.ty = width.to_string();
        }
        with_first(&mut with_start, |a| {
            a.is_named_arg = false;
            a.is_nullable = false;
            a.default_value = None;
        });
        let mut without_start = with_start.clone();
        without_start.arguments.remove(0);
        out.push(with_start);
        out.push(without_start);
    }
    out
}

fn bmat_overloads(mut decl: Function) -> Vec<Function> {
    with_first(&mut decl, set_type("string"));
    let mut generic = decl.clone();
    with_first(&mut generic, |a| {
        a.ty = "T[]".to_string();
        a.convert_to_sharp_type = Some("NDarray".to_string());
    });
    generic.make_generic("T");
    generic.set_return_type("Matrix<T>");
    vec![decl, generic]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: &str, args: &[(&str, &str)], ret: Option<&str>) -> Function {
        let mut f = Function::new(name, Some("numpy".to_string()));
        for (i, (n, ty)) in args.iter().enumerate() {
            f.arguments.push(Argument {
                position: i,
                ..Argument::new(*n, *ty)
            });
        }
        if let Some(ty) = ret {
            f.info.returns.push(Argument::returning("out", ty));
        }
        f
    }

    fn signatures(overloads: &[Function]) -> Vec<String> {
        overloads.iter().map(|f| f.signature().join(", ")).collect()
    }

    #[test]
    fn single_array_like_gives_three_overloads() {
        let f = func("asarray", &[("a", "array_like"), ("dtype", "Dtype")], Some("NDarray"));
        let overloads = expand(f, true);
        assert_eq!(
            signatures(&overloads),
            vec!["NDarray, Dtype", "T[], Dtype", "T[,], Dtype"]
        );
        assert_eq!(overloads[0].generics, None);
        assert_eq!(overloads[0].return_type(), Some("NDarray"));
        for generic in &overloads[1..] {
            assert_eq!(generic.generics, Some(vec!["T".to_string()]));
            assert_eq!(generic.return_type(), Some("NDarray<T>"));
            assert_eq!(generic.arguments[0].convert_to_sharp_type.as_deref(), Some("NDarray"));
        }
    }

    #[test]
    fn array_like_without_expansion_is_ndarray() {
        let f = func("sum", &[("a", "array_like")], Some("NDarray"));
        let overloads = expand(f, false);
        assert_eq!(signatures(&overloads), vec!["NDarray"]);
    }

    #[test]
    fn excluded_first_position() {
        let f = func("reshape", &[("a", "array_like"), ("newshape", "Shape")], None);
        assert_eq!(signatures(&expand(f, true)), vec!["NDarray, Shape"]);

        let f = func("insert", &[("arr", "array_like"), ("values", "array_like")], None);
        assert_eq!(
            signatures(&expand(f, true)),
            vec!["NDarray, NDarray", "NDarray, T[]", "NDarray, T[,]"]
        );
    }

    #[test]
    fn two_array_likes_combine() {
        let f = func("dot", &[("a", "array_like"), ("b", "array_like")], Some("NDarray"));
        let overloads = expand(f, true);
        assert_eq!(overloads.len(), 9);
        assert_eq!(overloads[0].signature(), vec!["NDarray", "NDarray"]);
        assert_eq!(overloads[8].signature(), vec!["T[,]", "T[,]"]);
    }

    #[test]
    fn bool_array_like() {
        let f = func("compress", &[("condition", "array_like of bool")], None);
        let overloads = expand(f, false);
        assert_eq!(signatures(&overloads), vec!["NDarray", "bool[]"]);
        assert_eq!(overloads[1].arguments[0].convert_to_sharp_type.as_deref(), Some("NDarray"));
    }

    #[test]
    fn number_gets_every_width() {
        let f = func("full", &[("shape", "Shape"), ("fill_value", "number")], None);
        assert_eq!(
            signatures(&expand(f, false)),
            vec![
                "Shape, float",
                "Shape, byte",
                "Shape, short",
                "Shape, int",
                "Shape, long",
                "Shape, double"
            ]
        );
    }

    #[test]
    fn no_arguments_is_single_overload() {
        let f = func("get_printoptions", &[], Some("Hashtable"));
        assert_eq!(expand(f.clone(), true), vec![f]);
    }

    #[test]
    fn arange_ladder() {
        let f = func(
            "arange",
            &[("start", "number"), ("stop", "number"), ("step", "number"), ("dtype", "Dtype")],
            Some("NDarray"),
        );
        let overloads = expand(f, true);
        assert_eq!(overloads.len(), 12);
        assert_eq!(overloads[0].signature(), vec!["byte", "byte", "byte", "Dtype"]);
        assert_eq!(overloads[1].signature(), vec!["byte", "byte", "Dtype"]);
        assert_eq!(overloads[11].signature(), vec!["double", "double", "Dtype"]);
        assert!(overloads.iter().all(|o| o.arguments.last().unwrap().is_named_arg));
        assert!(!overloads[0].arguments[0].is_nullable);
        let positions: Vec<usize> = overloads[1].arguments.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn arange_without_numbers() {
        let f = func("arange", &[("stop", "int"), ("dtype", "Dtype")], None);
        let overloads = expand(f, true);
        assert_eq!(overloads.len(), 1);
        assert!(overloads[0].arguments[1].is_nullable);
    }

    #[test]
    fn suppressed_functions() {
        for name in ["norm", "asscalar", "normal", "meshgrid"] {
            assert!(expand(func(name, &[("x", "array_like")], None), true).is_empty());
        }
    }

    #[test]
    fn reducer_axis_and_scalar_overloads() {
        let mut f = func(
            "mean",
            &[("a", "array_like"), ("axis", "int[]"), ("dtype", "Dtype"), ("keepdims", "bool")],
            Some("ndarray"),
        );
        f.arguments[1].is_nullable = true;
        let overloads = expand(f, true);
        assert_eq!(overloads.len(), 2);
        assert_eq!(overloads[0].return_type(), Some("NDarray<double>"));
        assert!(!overloads[0].arguments[1].is_nullable);
        assert_eq!(overloads[1].signature(), vec!["NDarray", "Dtype"]);
        assert_eq!(overloads[1].return_type(), Some("double"));
    }

    #[test]
    fn all_any_drop_out_and_keepdims() {
        let f = func(
            "any",
            &[("a", "array_like"), ("axis", "int[]"), ("out", "NDarray"), ("keepdims", "bool")],
            Some("NDarray"),
        );
        let overloads = expand(f, true);
        assert_eq!(overloads[1].signature(), vec!["NDarray"]);
        assert_eq!(overloads[1].return_type(), Some("bool"));
    }

    #[test]
    fn histogram_bins_variants() {
        let mut f = func(
            "histogram",
            &[("a", "array_like"), ("bins", "int"), ("range", "(float"), ("weights", "array_like")],
            Some("NDarray"),
        );
        f.info.returns.push(Argument::returning("bin_edges", "array of dtype float"));
        f.make_generic("T");
        let overloads = expand(f, true);
        assert_eq!(overloads.len(), 3);
        assert_eq!(overloads[0].generics, None);
        assert_eq!(overloads[0].info.returns[1].ty, "NDarray");
        let bins: Vec<&str> = overloads.iter().map(|o| o.arg("bins").unwrap().ty.as_str()).collect();
        assert_eq!(bins, vec!["int", "NDarray", "List<string>"]);
        assert_eq!(overloads[0].arg("range").unwrap().ty, "(float, float)");
    }

    #[test]
    fn unique_minimal_first() {
        let f = func(
            "unique",
            &[
                ("ar", "array_like"),
                ("return_index", "bool"),
                ("return_inverse", "bool"),
                ("return_counts", "bool"),
                ("axis", "int"),
            ],
            Some("ndarray"),
        );
        let mut f = f;
        for name in ["indices", "inverse", "counts"] {
            f.info.returns.push(Argument::returning(name, "NDarray"));
        }
        let overloads = expand(f, true);
        assert_eq!(overloads.len(), 2);
        assert_eq!(overloads[0].signature(), vec!["NDarray", "int"]);
        assert_eq!(overloads[0].info.returns.len(), 1);
        assert_eq!(overloads[1].return_type(), Some("NDarray[]"));
        assert_eq!(overloads[1].arguments.len(), 5);
    }

    #[test]
    fn where_condition_only() {
        let f = func(
            "where",
            &[("condition", "array_like, bool"), ("x", "array_like"), ("y", "array_like")],
            Some("NDarray"),
        );
        let overloads = expand(f, true);
        assert_eq!(signatures(&overloads), vec!["NDarray, NDarray, NDarray", "NDarray"]);
        assert_eq!(overloads[1].return_type(), Some("NDarray[]"));
    }

    #[test]
    fn seed_int_and_array() {
        let f = func("seed", &[("seed", "int")], None);
        let overloads = expand(f, false);
        assert_eq!(signatures(&overloads), vec!["int", "NDarray"]);
        assert_eq!(overloads[0].arguments[0].default_value.as_deref(), Some("null"));
    }

    #[test]
    fn sort_continues_generically() {
        let f = func("sort", &[("a", "array_like"), ("axis", "int")], Some("NDarray"));
        let overloads = expand(f, true);
        assert_eq!(overloads.len(), 3);
        assert!(overloads
            .iter()
            .all(|o| o.arg("axis").unwrap().default_value.as_deref() == Some("-1")));
    }

    #[test]
    fn duplicate_signatures_collapse() {
        // without start and stop both linspace overloads look the same
        let f = func("linspace", &[("num", "int")], Some("NDarray"));
        assert_eq!(expand(f, true).len(), 1);
    }

    #[test]
    fn transpose_array_like_or_not() {
        let f = func("transpose", &[("a", "NDarray[]")], None);
        assert_eq!(expand(f, true).len(), 1);

        let f = func("transpose", &[("a", "array_like")], None);
        assert_eq!(signatures(&expand(f, true)), vec!["NDarray", "NDarray[]"]);
    }

    #[test]
    fn bmat_string_and_generic() {
        let f = func("bmat", &[("obj", "str")], Some("matrix"));
        let overloads = expand(f, true);
        assert_eq!(signatures(&overloads), vec!["string", "T[]"]);
        assert_eq!(overloads[1].return_type(), Some("Matrix<T>"));
    }
}
