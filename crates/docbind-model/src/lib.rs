//! docbind-model: declaration model, API groupings and the C# emitter.
//!
//! Provides: [`Argument`], [`Function`], [`Property`], [`Declaration`],
//!           [`StaticApi`], [`DynamicApi`], [`ApiClass`], [`TestFile`],
//!           [`CodeWriter`], [`CodeGenerator`]

pub mod api;
pub mod generator;
pub mod model;
pub mod writer;

pub use api::{
    Api, ApiClass, CodeLine, DynamicApi, ExampleCode, LineKind, StaticApi, TestCase, TestFile,
    TestPart,
};
pub use generator::{escape_name, CodeGenerator, GenerateReport, Hook};
pub use model::{Argument, DeclInfo, Declaration, Function, Property};
pub use writer::CodeWriter;
