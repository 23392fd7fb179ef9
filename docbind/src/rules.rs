//! Post-processing rules applied after inference.
//!
//! Three layers, in order:
//!
//! 1. [`post_process_argument`]: keyed by argument name, for every argument
//! 2. [`post_process`]: generic declaration fixes, then the per-function
//!    [`CORRECTIONS`] table
//! 3. [`post_process_overload`]: for every overload the expander produced
//!
//! The correction table pins facts about one documentation snapshot. Each
//! entry is data; nothing here tries to derive a general rule from them.

use docbind_model::{Argument, Function};
use tracing::debug;

// -- Argument rules ------------------------------------------------------------

/// Fix up one argument by its name and type.
pub fn post_process_argument(arg: &mut Argument) {
    match arg.name.as_str() {
        "order" => arg.default_value = None,
        "axes" => {
            arg.ty = "int[]".to_string();
            arg.default_value = Some("null".to_string());
            return;
        }
        "where" | "out" => {
            arg.is_nullable = true;
            arg.is_named_arg = true;
            arg.default_value = None;
        }
        "requirements" | "comments" => arg.default_value = Some("null".to_string()),
        _ => {}
    }
    if let Some(stripped) = arg.name.strip_prefix('*') {
        arg.name = stripped.to_string();
    }
    if arg.ty == "Dtype" {
        arg.is_value_type = false;
        if arg.has_default() {
            arg.default_value = Some("null".to_string());
        }
    }
}

// -- Declaration rules ---------------------------------------------------------

/// Generic fixes followed by the per-name corrections.
pub fn post_process(func: &mut Function) {
    detect_generics(func);
    if func.arguments.iter().any(|a| a.ty == "buffer_like") {
        func.info.comment_out = true;
    }
    func.arguments.retain(|a| a.ty != "_NoValue");
    split_combined_names(func);
    func.renumber();
    apply_corrections(func);
    func.renumber();
}

fn detect_generics(func: &mut Function) {
    if func.arguments.iter().any(|a| a.ty.contains("<T>")) {
        func.make_generic("T");
        if func.return_type() == Some("NDarray") {
            func.set_return_type("NDarray<T>");
        }
    }
    if func
        .info
        .returns
        .iter()
        .any(|r| r.ty == "T" || r.ty.contains("<T>"))
    {
        func.make_generic("T");
    }
}

/// `x, y` documents two arguments sharing a description.
fn split_combined_names(func: &mut Function) {
    if !func.arguments.iter().any(|a| a.name.contains(',')) {
        return;
    }
    let mut split = Vec::with_capacity(func.arguments.len());
    for arg in func.arguments.drain(..) {
        if !arg.name.contains(',') {
            split.push(arg);
            continue;
        }
        for part in arg.name.split(',').map(str::trim) {
            if part.is_empty() || part == "…" || part == "..." {
                continue;
            }
            split.push(Argument {
                name: part.to_string(),
                ..arg.clone()
            });
        }
    }
    func.arguments = split;
}

/// Rules for the overloads produced by the expander.
pub fn post_process_overload(func: &mut Function) {
    for arg in &mut func.arguments {
        if arg.name == "axis"
            && arg.ty == "int[]"
            && arg.default_value.as_deref().is_none_or(|d| d == "null")
        {
            arg.ty = "Axis".to_string();
        }
    }
}

// -- Correction table ----------------------------------------------------------

/// Which arguments an [`Action::Arg`] touches.
#[derive(Debug, Clone, Copy)]
pub enum ArgSelector {
    Named(&'static str),
    At(usize),
    FirstOfType(&'static str),
    AllOfType(&'static str),
    All,
}

#[derive(Debug, Clone, Copy)]
pub enum Patch {
    Type(&'static str),
    /// `None` clears the default
    Default(Option<&'static str>),
    DefaultIfNull(&'static str),
    Nullable(bool),
    Named(bool),
    Rename(&'static str),
    Remove,
}

#[derive(Debug, Clone, Copy)]
pub enum Action {
    /// Suffix for the C# name only
    Postfix(&'static str),
    Manual,
    /// Manual override when the declaration lives in this module
    ManualIn(&'static str),
    CommentOut,
    ReturnType(&'static str),
    /// Add a return value unless one is documented
    EnsureReturn(&'static str, &'static str),
    ReplaceReturns(&'static str, &'static str),
    ClearArgs,
    AddArg(&'static str, &'static str),
    Arg(ArgSelector, &'static [Patch]),
}

pub struct Correction {
    pub names: &'static [&'static str],
    pub actions: &'static [Action],
}

use Action::*;
use ArgSelector::{All, AllOfType, At, FirstOfType};
use Patch::{Default as Dflt, DefaultIfNull, Named as NamedArg, Nullable, Remove, Rename, Type};

const NULL: Option<&str> = Some("null");

pub static CORRECTIONS: &[Correction] = &[
    Correction {
        names: &["fft", "random"],
        actions: &[Postfix("_")],
    },
    Correction {
        names: &["array"],
        actions: &[ManualIn("numpy")],
    },
    Correction {
        names: &["itemset", "tostring", "tobytes", "view", "resize"],
        actions: &[Manual],
    },
    Correction {
        names: &["arange"],
        actions: &[
            Arg(At(0), &[Nullable(false), Dflt(Some("0"))]),
            Arg(At(2), &[Dflt(Some("1")), Nullable(false)]),
            Arg(At(3), &[Nullable(false), NamedArg(true)]),
        ],
    },
    Correction {
        names: &["logspace", "geomspace"],
        actions: &[Arg(
            FirstOfType("Dtype"),
            &[Nullable(false), Dflt(NULL), NamedArg(true)],
        )],
    },
    Correction {
        names: &["copy"],
        actions: &[EnsureReturn("array", "NDarray")],
    },
    Correction {
        names: &[
            "mat", "bmat", "block", "interp", "einsum_path", "cond", "get_state", "set_state",
            "genfromtxt", "array2string", "tolist", "format_float_positional",
            "format_float_scientific", "set_printoptions", "set_string_function",
            "ravel_multi_index", "nditer", "nested_iters", "result_type", "issubclass_",
            "find_common_type", "busdaycalendar", "is_busday", "busday_count", "busday_offset",
        ],
        actions: &[CommentOut],
    },
    Correction {
        names: &["require", "tensordot"],
        actions: &[EnsureReturn("array", "NDarray")],
    },
    Correction {
        names: &["isfortran"],
        actions: &[EnsureReturn("retval", "bool")],
    },
    Correction {
        names: &["matrix_rank"],
        actions: &[EnsureReturn("retval", "int")],
    },
    Correction {
        names: &["correlate"],
        actions: &[Arg(ArgSelector::Named("old_behavior"), &[Remove])],
    },
    Correction {
        names: &["einsum"],
        actions: &[Arg(
            ArgSelector::Named("optimize"),
            &[Type("object"), Dflt(NULL), DefaultIfNull("false")],
        )],
    },
    Correction {
        names: &["rot90"],
        actions: &[Arg(
            ArgSelector::Named("axes"),
            &[Dflt(NULL), DefaultIfNull("new int[] {0, 1}")],
        )],
    },
    Correction {
        names: &["insert"],
        actions: &[
            Arg(ArgSelector::Named("obj"), &[Dflt(Some("0"))]),
            Arg(ArgSelector::Named("values"), &[Dflt(NULL)]),
        ],
    },
    Correction {
        names: &["trapz"],
        actions: &[Arg(ArgSelector::Named("dx"), &[Type("float")])],
    },
    Correction {
        names: &["lstsq"],
        actions: &[Arg(ArgSelector::Named("rcond"), &[Dflt(NULL)])],
    },
    Correction {
        names: &["pinv"],
        actions: &[Arg(ArgSelector::Named("rcond"), &[Type("float")])],
    },
    Correction {
        names: &["histogram", "histogram2d", "histogramdd", "histogram_bin_edges"],
        actions: &[Arg(ArgSelector::Named("bins"), &[Dflt(NULL)])],
    },
    Correction {
        names: &["exponential"],
        actions: &[Arg(At(0), &[Dflt(NULL)])],
    },
    Correction {
        names: &["gamma"],
        actions: &[Arg(ArgSelector::Named("scale"), &[Dflt(NULL)])],
    },
    Correction {
        names: &[
            "gumbel", "laplace", "logistic", "lognormal", "normal", "poisson", "rayleigh",
            "uniform",
        ],
        actions: &[Arg(All, &[Dflt(NULL), NamedArg(true)])],
    },
    Correction {
        names: &["RandomState"],
        actions: &[Arg(
            At(0),
            &[Type("int"), Dflt(NULL), Nullable(true), NamedArg(true)],
        )],
    },
    Correction {
        names: &["fftfreq", "rfftfreq"],
        actions: &[Arg(At(1), &[Type("float")])],
    },
    Correction {
        names: &["load"],
        actions: &[
            Arg(ArgSelector::Named("mmap_mode"), &[Type("MemMapMode")]),
            Arg(ArgSelector::Named("allow_pickle"), &[Dflt(Some("false"))]),
        ],
    },
    Correction {
        names: &["save", "savez", "savez_compressed"],
        actions: &[Manual],
    },
    Correction {
        names: &["savetxt"],
        actions: &[
            Arg(ArgSelector::Named("fmt"), &[Dflt(NULL)]),
            Arg(ArgSelector::Named("encoding"), &[Type("string")]),
        ],
    },
    Correction {
        names: &["mask_indices"],
        actions: &[Arg(ArgSelector::Named("k"), &[Type("int")])],
    },
    Correction {
        names: &["select"],
        actions: &[Arg(ArgSelector::Named("default"), &[Type("object"), Dflt(NULL)])],
    },
    Correction {
        names: &["pv", "pmt", "ppmt", "ipmt", "nper"],
        actions: &[
            Arg(ArgSelector::Named("fv"), &[Dflt(NULL)]),
            Arg(ArgSelector::Named("when"), &[NamedArg(true)]),
        ],
    },
    Correction {
        names: &["format_parser"],
        actions: &[Arg(ArgSelector::Named("titles"), &[Type("string[]")])],
    },
    Correction {
        names: &["mintypecode"],
        actions: &[Arg(ArgSelector::Named("typeset"), &[Dflt(NULL)])],
    },
    Correction {
        names: &["rand", "randn"],
        actions: &[ClearArgs, AddArg("shape", "int[]"), Manual],
    },
    Correction {
        names: &["take_along_axis"],
        actions: &[
            Arg(At(2), &[Nullable(true)]),
            ReplaceReturns("array", "NDarray"),
        ],
    },
    Correction {
        names: &["column_stack"],
        actions: &[Manual],
    },
    Correction {
        names: &["meshgrid"],
        actions: &[
            ReturnType("NDarray[]"),
            Arg(At(0), &[Type("NDarray[]"), Rename("xi")]),
            // the rest of the split `x1, x2,…, xn`
            Arg(AllOfType("NDarray"), &[Remove]),
            Arg(ArgSelector::Named("indexing"), &[Dflt(Some("\"xy\""))]),
        ],
    },
    Correction {
        names: &["mgrid"],
        actions: &[ReturnType("NDarray[]")],
    },
    Correction {
        names: &["ogrid"],
        actions: &[ReturnType("NDarray[]"), ClearArgs],
    },
    Correction {
        names: &["fromfile"],
        actions: &[ReturnType("NDarray")],
    },
];

/// Every correction action registered for `name`, in table order.
pub fn corrections_for(name: &str) -> impl Iterator<Item = &'static Action> + '_ {
    CORRECTIONS
        .iter()
        .filter(move |c| c.names.contains(&name))
        .flat_map(|c| c.actions.iter())
}

fn apply_corrections(func: &mut Function) {
    let name = func.info.name.clone();
    for action in corrections_for(&name) {
        apply(func, action);
    }
}

fn apply(func: &mut Function, action: &Action) {
    match *action {
        Postfix(postfix) => func.info.sharp_only_postfix = Some(postfix.to_string()),
        Manual => func.info.manual_override = true,
        ManualIn(module) => {
            if func.info.class_name.as_deref() == Some(module) {
                func.info.manual_override = true;
            }
        }
        CommentOut => func.info.comment_out = true,
        ReturnType(ty) => func.set_return_type(ty),
        EnsureReturn(name, ty) => {
            if func.info.returns.is_empty() {
                func.info.returns.push(Argument::returning(name, ty));
            }
        }
        ReplaceReturns(name, ty) => func.info.returns = vec![Argument::returning(name, ty)],
        ClearArgs => func.arguments.clear(),
        AddArg(name, ty) => {
            let position = func.arguments.len();
            func.arguments.push(Argument {
                position,
                ..Argument::new(name, ty)
            });
        }
        Arg(selector, patches) => {
            let indices = select(func, selector);
            if indices.is_empty() {
                debug!("{}: no argument matches {:?}, rule skipped", func.info.name, selector);
                return;
            }
            if patches.iter().any(|p| matches!(p, Remove)) {
                for i in indices.into_iter().rev() {
                    func.arguments.remove(i);
                }
                func.renumber();
                return;
            }
            for i in indices {
                for patch in patches {
                    patch_argument(&mut func.arguments[i], patch);
                }
            }
        }
    }
}

fn select(func: &Function, selector: ArgSelector) -> Vec<usize> {
    match selector {
        ArgSelector::Named(name) => func
            .arguments
            .iter()
            .position(|a| a.name == name)
            .into_iter()
            .collect(),
        At(i) if i < func.arguments.len() => vec![i],
        At(_) => Vec::new(),
        FirstOfType(ty) => func
            .arguments
            .iter()
            .position(|a| a.ty == ty)
            .into_iter()
            .collect(),
        AllOfType(ty) => func
            .arguments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.ty == ty)
            .map(|(i, _)| i)
            .collect(),
        All => (0..func.arguments.len()).collect(),
    }
}

fn patch_argument(arg: &mut Argument, patch: &Patch) {
    match *patch {
        Type(ty) => arg.ty = ty.to_string(),
        Dflt(default) => arg.default_value = default.map(str::to_string),
        DefaultIfNull(value) => arg.default_if_null = Some(value.to_string()),
        Nullable(nullable) => arg.is_nullable = nullable,
        NamedArg(named) => arg.is_named_arg = named,
        Rename(name) => arg.name = name.to_string(),
        Remove => {}
    }
}
