//! Keras script generation.
//!
//! Turns a [`ModelSpec`](kerasgen_core::ModelSpec) and a
//! [`CompileSpec`](kerasgen_core::CompileSpec) into a Python script that
//! rebuilds the architecture with the Keras functional API and compiles it.
//!
//! ## Usage
//!
//! ```rust
//! use kerasgen_codegen::CodeGenerator;
//! use kerasgen_core::{CompileSpec, LayerEntry, ModelSpec};
//!
//! let model = ModelSpec::new("x", "h1").with_layer(
//!     LayerEntry::layer("Dense", "h1")
//!         .with_input("x")
//!         .with_param("units", "64")
//!         .with_param("activation", "relu"),
//! );
//! let compile = CompileSpec::new("adam", 0.001, "mse").with_metrics(["accuracy"]);
//!
//! let script = CodeGenerator::tensorflow().generate(&model, &compile).unwrap();
//! assert!(script
//!     .render()
//!     .contains(r#"h1 = tf.keras.layers.Dense(units=64, activation="relu")(x)"#));
//! ```

mod error;
mod generator;
mod literal;
mod script;
mod statement;

pub use error::{GenerateError, GenerateResult};
pub use generator::{validate_references, CodeGenerator};
pub use literal::{is_ambiguous, LiteralPolicy};
pub use script::{Script, SCRIPT_FILE_NAME};
pub use statement::StatementBuilder;
