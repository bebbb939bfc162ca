//! # rusvelte-boot
//!
//! Load-once parser module and application bootstrap for the rusvelte
//! playground.
//!
//! ## Overview
//!
//! Startup runs in a fixed order:
//! - **Load**: a [`ModuleLoader`] instantiates the parser module exactly once
//! - **Construct**: the loaded [`ParserModule`] builds a [`ParserInstance`]
//! - **Parse**: the parser turns a sample component into an opaque JSON AST
//! - **Mount**: a [`Host`] attaches the root UI component to a document
//!   element
//!
//! ## Example
//!
//! ```
//! use futures::executor::block_on;
//! use rusvelte_boot::{BootConfig, Bootstrap, BundledModule, HeadlessDocument, ModuleLoader};
//!
//! let loader = ModuleLoader::new(BundledModule);
//! let mut document = HeadlessDocument::with_elements(["app"]);
//! let mut bootstrap = Bootstrap::new(BootConfig::default());
//!
//! let booted = block_on(bootstrap.run(&loader, &mut document)).unwrap();
//!
//! assert_eq!(booted.parser.ast()["type"], "Root");
//! assert_eq!(booted.app.target_id, "app");
//! ```

pub mod ast;
pub mod bootstrap;
pub mod error;
pub mod headless;
pub mod module;
pub mod parser;

pub use bootstrap::{
    BootConfig, BootPhase, Booted, Bootstrap, DEFAULT_TARGET_ID, Host, SAMPLE_SOURCE,
};
pub use error::{BootError, ModuleLoadError, ParseError, ParseErrorKind, TargetNotFoundError};
pub use headless::{HeadlessApp, HeadlessDocument};
pub use module::{
    BundledModule, LoadState, ModuleInfo, ModuleLoader, ModuleSource, ParserInstance,
    ParserModule, bundled_loader,
};
pub use parser::parse;
