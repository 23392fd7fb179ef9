//! Module head and the Python conversion helpers.

use super::CodeGenerator;
use crate::writer::CodeWriter;

impl CodeGenerator {
    /// The lazily imported module singleton.
    pub fn generate_module_head(&self, s: &mut CodeWriter) {
        self.generate_usings(s);
        s.out_block(format!("namespace {}", self.namespace), |s| {
            s.out_block(
                format!("public static partial class {}", self.static_module_name),
                |s| {
                    s.blank();
                    s.out("public static PyObject self => _lazy_self.Value;");
                    s.blank();
                    s.out("private static Lazy<PyObject> _lazy_self = new Lazy<PyObject>(() => ");
                    s.block(|s| {
                        s.out_block("try", |s| s.out("return InstallAndImport();"));
                        s.out_block("catch (Exception)", |s| {
                            s.out("// retry with a forced repair of the installation");
                            s.out("return InstallAndImport(force: true);");
                        });
                    });
                    s.out(");");
                    s.blank();
                    s.out_block("private static PyObject InstallAndImport(bool force = false)", |s| {
                        if self.use_python_included {
                            s.out("Installer.SetupPython(force).Wait();");
                        }
                        for hook in &self.initialization_generators {
                            hook(s);
                        }
                        s.out("PythonEngine.Initialize();");
                        s.out(format!("var mod = Py.Import(\"{}\");", self.python_module_name));
                        s.out("return mod;");
                    });
                    s.blank();
                    s.out("public static dynamic dynamic_self => self;");
                    s.out("private static bool IsInitialized => self != null;");
                    s.blank();
                    s.out_block("public static void Dispose()", |s| s.out("self?.Dispose();"));
                    s.blank();
                    self.generate_conversions(s, true);
                },
            );
        });
    }

    /// Instance conversion helpers shared by every model class.
    pub fn generate_python_object_conversions(&self, s: &mut CodeWriter) {
        self.generate_usings(s);
        s.out_block(format!("namespace {}", self.namespace), |s| {
            s.out_block("public partial class PythonObject", |s| {
                s.blank();
                self.generate_conversions(s, false);
            });
        });
    }

    fn generate_conversions(&self, s: &mut CodeWriter, is_static: bool) {
        let visibility = if is_static { "private static" } else { "public" };

        s.blank();
        s.out("//auto-generated");
        s.out_block(format!("{} PyTuple ToTuple(Array input)", visibility), |s| {
            s.out("var array = new PyObject[input.Length];");
            s.out_block("for (int i = 0; i < input.Length; i++)", |s| {
                s.out("array[i]=ToPython(input.GetValue(i));");
            });
            s.out("return new PyTuple(array);");
        });

        s.blank();
        s.out("//auto-generated");
        s.out_block(format!("{} PyObject ToPython(object obj)", visibility), |s| {
            s.out("if (obj == null) return Runtime.GetPyNone();");
            s.out_block("switch (obj)", |s| {
                s.out("// basic types");
                s.out("case int o: return new PyInt(o);");
                s.out("case long o: return new PyLong(o);");
                s.out("case float o: return new PyFloat(o);");
                s.out("case double o: return new PyFloat(o);");
                s.out("case string o: return new PyString(o);");
                s.out("case bool o: return ConverterExtension.ToPython(o);");
                s.out("case PyObject o: return o;");
                s.out("// sequence types");
                s.out("case Array o: return ToTuple(o);");
                s.out("// special types");
                for case in &self.to_python_conversions {
                    s.out(case);
                }
                s.out("default: throw new NotImplementedException($\"Type is not yet supported: { obj.GetType().Name}. Add it to 'ToPythonConversions'\");");
            });
        });

        s.blank();
        s.out("//auto-generated");
        s.out_block(format!("{} T ToCsharp<T>(dynamic pyobj)", visibility), |s| {
            s.out_block("switch (typeof(T).Name)", |s| {
                s.out("// special types");
                for case in &self.to_csharp_conversions {
                    s.out(case);
                }
                s.out("default:");
                s.out_block("try", |s| s.out("return pyobj.As<T>();"));
                s.out_block("catch (Exception e)", |s| {
                    s.out("throw new NotImplementedException($\"conversion from {typeof(T).Name} to {pyobj.__class__} not implemented\", e);");
                    s.out("return default(T);");
                });
            });
        });

        s.blank();
        s.out("//auto-generated");
        s.out_block(format!("{} T SharpToSharp<T>(object obj)", visibility), |s| {
            s.out("if (obj == null) return default(T);");
            s.out_block("switch (obj)", |s| {
                for hook in &self.sharp_to_sharp_conversions {
                    hook(s);
                }
            });
            s.out("throw new NotImplementedException($\"Type is not yet supported: { obj.GetType().Name}. Add it to 'SharpToSharpConversions'\");");
        });

        for hook in &self.special_conversion_generators {
            s.blank();
            s.out("//auto-generated: SpecialConversions");
            hook(s);
        }
    }
}
