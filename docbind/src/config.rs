//! Run configuration: the API group catalogue, output layout and emitter
//! settings.

use crate::pipeline::Model;
use crate::special;
use docbind_model::CodeGenerator;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://docs.scipy.org/doc/numpy-1.16.1/reference/";
pub const DEFAULT_REFERENCE_INDEX: &str = "https://docs.scipy.org/doc/numpy/contents.html";

const COPYRIGHT_NOTICE: &str = "Copyright (c) 2020 by Meinrad Recheis (Member of SciSharp)";

/// How a group's page is turned into declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Overview page linking to one page per function
    Routines,
    /// Overview of `ndarray` methods, feeding the `NDarray` class
    NdarrayMethods,
    /// Single table of scalar types
    ScalarTypes,
}

/// One generated API unit and the page that feeds it.
#[derive(Debug, Clone, Copy)]
pub struct ApiGroup {
    /// Name part of the generated file, `np.<partial>.gen.cs`
    pub partial: &'static str,
    pub page: &'static str,
    pub kind: GroupKind,
    /// Add flat and 2D array overloads for `array_like` arguments
    pub expand_array_like: bool,
}

const fn routines(partial: &'static str, page: &'static str) -> ApiGroup {
    ApiGroup {
        partial,
        page,
        kind: GroupKind::Routines,
        expand_array_like: false,
    }
}

/// Every group in run order. Earlier groups win for shared names.
pub static API_GROUPS: &[ApiGroup] = &[
    ApiGroup {
        expand_array_like: true,
        ..routines("array_creation", "routines.array-creation.html")
    },
    ApiGroup {
        kind: GroupKind::NdarrayMethods,
        ..routines("ndarray", "arrays.ndarray.html")
    },
    routines("array_manipulation", "routines.array-manipulation.html"),
    ApiGroup {
        kind: GroupKind::ScalarTypes,
        ..routines("dtype", "arrays.scalars.html")
    },
    routines("bitwise", "routines.bitwise.html"),
    routines("string", "routines.char.html"),
    routines("datetime", "routines.datetime.html"),
    routines("dtype.routines", "routines.dtype.html"),
    routines("linalg_fft", "routines.dual.html"),
    routines("fft", "routines.fft.html"),
    routines("financial", "routines.financial.html"),
    routines("indexing", "routines.indexing.html"),
    routines("io", "routines.io.html"),
    routines("linalg", "routines.linalg.html"),
    routines("logic", "routines.logic.html"),
    routines("math", "routines.math.html"),
    routines("padding", "routines.padding.html"),
    routines("random", "routines.random.html"),
    routines("set", "routines.set.html"),
    routines("sorting", "routines.sort.html"),
    routines("statistics", "routines.statistics.html"),
    routines("window", "routines.window.html"),
];

/// Where generated files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Static API files and the module head
    pub sources: PathBuf,
    /// Model classes: `PythonObject`, `NDarray`
    pub models: PathBuf,
    pub tests: PathBuf,
}

impl OutputLayout {
    /// `<output>/Numpy`, `<output>/Numpy/Models` and
    /// `<tests>/Numpy.UnitTest`, tests defaulting to `<output>/test`.
    pub fn new(output: &Path, tests: Option<&Path>) -> Self {
        let sources = output.join("Numpy");
        let models = sources.join("Models");
        let tests = tests
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output.join("test"))
            .join("Numpy.UnitTest");
        OutputLayout {
            sources,
            models,
            tests,
        }
    }
}

/// Emitter settings for one run.
pub struct GeneratorConfig {
    pub copyright_notice: Option<String>,
    pub namespace: String,
    pub static_module: String,
    pub python_module: String,
    /// Added to the emitter's default usings
    pub usings: Vec<String>,
    pub layout: OutputLayout,
    pub print_model_json: bool,
}

impl GeneratorConfig {
    pub fn numpy(layout: OutputLayout) -> Self {
        GeneratorConfig {
            copyright_notice: Some(COPYRIGHT_NOTICE.to_string()),
            namespace: "Numpy".to_string(),
            static_module: "np".to_string(),
            python_module: "numpy".to_string(),
            usings: vec!["using Numpy.Models;".to_string()],
            layout,
            print_model_json: false,
        }
    }

    /// Emitter for the parsed `model`, with the NumPy conversion hooks.
    pub fn into_generator(self, model: Model) -> CodeGenerator {
        let mut generator = CodeGenerator {
            copyright_notice: self.copyright_notice,
            namespace: self.namespace,
            static_module_name: self.static_module,
            python_module_name: self.python_module,
            print_model_json: self.print_model_json,
            static_apis: model.static_apis,
            test_files: model.test_files,
            static_api_files_path: Some(self.layout.sources.clone()),
            dynamic_api_files_path: Some(self.layout.sources),
            models_path: Some(self.layout.models.clone()),
            test_files_path: Some(self.layout.tests),
            to_python_conversions: to_strings(special::TO_PYTHON_CONVERSIONS),
            to_csharp_conversions: to_strings(special::TO_CSHARP_CONVERSIONS),
            sharp_to_sharp_conversions: vec![special::array_to_ndarray_case],
            special_conversion_generators: vec![
                special::convert_array_to_ndarray,
                special::convert_dict,
            ],
            initialization_generators: vec![special::install_numpy_wheel],
            ..CodeGenerator::default()
        };
        if let Some(mut ndarray) = model.ndarray {
            ndarray.api.output_path = Some(self.layout.models);
            generator.dynamic_apis.push(ndarray);
        }
        for using in &self.usings {
            generator.add_using(using);
        }
        generator
    }
}

fn to_strings(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn group_catalogue() {
        assert_eq!(API_GROUPS.len(), 22);
        assert_eq!(API_GROUPS[0].partial, "array_creation");
        assert!(API_GROUPS[0].expand_array_like);
        assert_eq!(API_GROUPS[1].kind, GroupKind::NdarrayMethods);
        assert_eq!(API_GROUPS[3].kind, GroupKind::ScalarTypes);
        assert_eq!(
            API_GROUPS.iter().filter(|g| g.expand_array_like).count(),
            1
        );
        let partials: HashSet<&str> = API_GROUPS.iter().map(|g| g.partial).collect();
        assert_eq!(partials.len(), API_GROUPS.len());
        assert!(partials.contains("statistics"));
    }

    #[test]
    fn layout_defaults() {
        let layout = OutputLayout::new(Path::new("/out"), None);
        assert_eq!(layout.sources, Path::new("/out/Numpy"));
        assert_eq!(layout.models, Path::new("/out/Numpy/Models"));
        assert_eq!(layout.tests, Path::new("/out/test/Numpy.UnitTest"));

        let layout = OutputLayout::new(Path::new("/out"), Some(Path::new("/t")));
        assert_eq!(layout.tests, Path::new("/t/Numpy.UnitTest"));
    }

    #[test]
    fn generator_gets_hooks_and_paths() {
        let layout = OutputLayout::new(Path::new("/out"), None);
        let model = Model {
            ndarray: Some(Default::default()),
            ..Default::default()
        };
        let generator = GeneratorConfig::numpy(layout).into_generator(model);
        assert_eq!(generator.static_module_name, "np");
        assert!(generator.usings.iter().any(|u| u == "using Numpy.Models;"));
        assert_eq!(generator.to_python_conversions.len(), 5);
        assert_eq!(generator.initialization_generators.len(), 1);
        assert_eq!(generator.dynamic_apis.len(), 1);
        assert_eq!(
            generator.dynamic_apis[0].api.output_path.as_deref(),
            Some(Path::new("/out/Numpy/Models"))
        );
        assert_eq!(
            generator.test_files_path.as_deref(),
            Some(Path::new("/out/test/Numpy.UnitTest"))
        );
    }
}
