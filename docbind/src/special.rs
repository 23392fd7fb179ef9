//! NumPy-specific snippets plugged into the emitter.

use docbind_model::CodeWriter;

/// Extra `case` lines of `ToPython` for the model types.
pub const TO_PYTHON_CONVERSIONS: &[&str] = &[
    "case Axis o: return o.Axes==null ? null : ToTuple(o.Axes);",
    "case Shape o: return ToTuple(o.Dimensions);",
    "case Slice o: return o.ToPython();",
    "case PythonObject o: return o.PyObject;",
    "case Dictionary<string, NDarray> o: return ToDict(o);",
];

/// Extra `case` lines of `ToCsharp<T>`, keyed by the CLR type name.
pub const TO_CSHARP_CONVERSIONS: &[&str] = &[
    "case \"Dtype\": return (T)(object)new Dtype(pyobj);",
    "case \"NDarray\": return (T)(object)new NDarray(pyobj);",
    "case \"NDarray`1\":",
    "switch (typeof(T).GenericTypeArguments[0].Name)",
    "{",
    "   case \"Byte\": return (T)(object)new NDarray<byte>(pyobj);",
    "   case \"Short\": return (T)(object)new NDarray<short>(pyobj);",
    "   case \"Boolean\": return (T)(object)new NDarray<bool>(pyobj);",
    "   case \"Int32\": return (T)(object)new NDarray<int>(pyobj);",
    "   case \"Int64\": return (T)(object)new NDarray<long>(pyobj);",
    "   case \"Single\": return (T)(object)new NDarray<float>(pyobj);",
    "   case \"Double\": return (T)(object)new NDarray<double>(pyobj);",
    "   default: throw new NotImplementedException($\"Type NDarray<{typeof(T).GenericTypeArguments[0].Name}> missing. Add it to 'ToCsharpConversions'\");",
    "}",
    "break;",
    "case \"NDarray[]\":",
    "   var po = pyobj as PyObject;",
    "   var len = po.Length();",
    "   var rv = new NDarray[len];",
    "   for (int i = 0; i < len; i++)",
    "       rv[i] = ToCsharp<NDarray>(po[i]);",
    "   return (T) (object) rv;",
    "case \"Matrix\": return (T)(object)new Matrix(pyobj);",
];

/// Bundled wheel installed before the engine starts.
const NUMPY_WHEEL: &str = "numpy-1.16.3-cp37-cp37m-win_amd64.whl";

pub fn install_numpy_wheel(s: &mut CodeWriter) {
    s.out("#if PYTHON_INCLUDED");
    s.out(format!(
        "Installer.InstallWheel(typeof(np).Assembly, \"{}\").Wait();",
        NUMPY_WHEEL
    ));
    s.out("#endif");
}

pub fn array_to_ndarray_case(s: &mut CodeWriter) {
    s.out("case Array a:");
    s.out("if (typeof(T)==typeof(NDarray)) return (T)(object)ConvertArrayToNDarray(a);");
    s.out("break;");
}

pub fn convert_array_to_ndarray(s: &mut CodeWriter) {
    s.out_block("private static NDarray ConvertArrayToNDarray(Array a)", |s| {
        s.out_block("switch(a)", |s| {
            for ty in ["bool", "int", "float", "double"] {
                s.out(format!("case {}[] arr: return np.array(arr);", ty));
            }
            for ty in ["int", "float", "double", "bool"] {
                s.out(format!(
                    "case {ty}[,] arr: return np.array(arr.Cast<{ty}>().ToArray()).reshape(arr.GetLength(0), arr.GetLength(1));"
                ));
            }
            s.out("default: throw new NotImplementedException($\"Type {a.GetType()} not supported yet in ConvertArrayToNDarray.\");");
        });
    });
}

pub fn convert_dict(s: &mut CodeWriter) {
    s.out_block("private static PyDict ToDict(Dictionary<string, NDarray> d)", |s| {
        s.out("var dict = new PyDict();");
        s.out("foreach (var pair in d)");
        s.out("    dict[new PyString(pair.Key)] = pair.Value.self;");
        s.out("return dict;");
    });
}
