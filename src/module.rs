//! The parser module boundary and its load-once loader.
//!
//! Loading follows a two-phase protocol:
//!
//! - **Uninitialized**: no [`ParserModule`] exists, so no parser can be built
//! - **Ready**: [`ModuleLoader::initialize`] has resolved and the module's
//!   exports, including the parser constructor, are callable
//!
//! A [`ParserModule`] can only be obtained from a loader, which makes
//! constructing a parser before the module has loaded a type error rather
//! than a runtime ordering bug.

use std::future::Future;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::{ModuleLoadError, ParseError, ParseErrorKind};
use crate::parser;

/// Input parsed during instantiation to check the engine works.
const PROBE_SOURCE: &str = "<p class=\"probe\">{probe}</p>";

/// Name and version of a loaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl ModuleInfo {
    pub const BUNDLED: ModuleInfo = ModuleInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
}

/// Export surface of the loaded parser module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserModule {
    info: ModuleInfo,
}

impl ParserModule {
    pub(crate) fn new(info: ModuleInfo) -> Self {
        Self { info }
    }

    pub fn info(&self) -> ModuleInfo {
        self.info
    }

    /// Parser constructor export. Returns a parser with no prior parse state.
    pub fn create_parser(&self) -> ParserInstance {
        ParserInstance {
            module: self.info,
            ast: Value::Null,
        }
    }
}

/// A parser built from a loaded module.
///
/// `parse` replaces the stored tree; [`ast`](Self::ast) returns it as an
/// opaque JSON value (`Null` until a parse succeeds).
#[derive(Debug, Clone, PartialEq)]
pub struct ParserInstance {
    module: ModuleInfo,
    ast: Value,
}

impl ParserInstance {
    pub fn parse(&mut self, source: &str) -> Result<(), ParseError> {
        self.ast = Value::Null;
        let root = parser::parse(source)?;
        self.ast = serde_json::to_value(&root)
            .map_err(|e| ParseError::new(0, ParseErrorKind::AstEncoding(e.to_string())))?;
        Ok(())
    }

    pub fn ast(&self) -> &Value {
        &self.ast
    }

    pub fn module(&self) -> ModuleInfo {
        self.module
    }
}

/// Where a module comes from: the default asynchronous initializer.
pub trait ModuleSource {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Retrieve and instantiate the module.
    fn instantiate(&self) -> impl Future<Output = Result<ParserModule, ModuleLoadError>>;
}

/// The parser engine compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledModule;

impl ModuleSource for BundledModule {
    fn name(&self) -> &str {
        ModuleInfo::BUNDLED.name
    }

    fn instantiate(&self) -> impl Future<Output = Result<ParserModule, ModuleLoadError>> {
        async { instantiate_bundled() }
    }
}

fn instantiate_bundled() -> Result<ParserModule, ModuleLoadError> {
    let module = ParserModule::new(ModuleInfo::BUNDLED);

    // Self-check: a module that cannot parse the probe is unusable
    let mut probe = module.create_parser();
    probe
        .parse(PROBE_SOURCE)
        .map_err(|e| ModuleLoadError::Instantiate(format!("probe parse failed: {e}")))?;
    if probe.ast().get("type").and_then(Value::as_str) != Some("Root") {
        return Err(ModuleLoadError::Instantiate(
            "probe parse did not produce a Root".to_string(),
        ));
    }

    Ok(module)
}

/// Observable phase of a [`ModuleLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Ready,
}

/// Single-flight, load-once wrapper around a [`ModuleSource`].
///
/// Concurrent and repeated calls to [`initialize`](Self::initialize) share a
/// single instantiation. A failed load is returned to the caller and not
/// cached.
#[derive(Debug)]
pub struct ModuleLoader<S> {
    source: S,
    module: OnceCell<ParserModule>,
    attempts: AtomicUsize,
}

impl<S: ModuleSource> ModuleLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            module: OnceCell::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Load the module if needed and return its exports.
    pub async fn initialize(&self) -> Result<&ParserModule, ModuleLoadError> {
        self.module
            .get_or_try_init(|| async {
                self.attempts.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(source = self.source.name(), "instantiating parser module");

                match self.source.instantiate().await {
                    Ok(module) => {
                        let info = module.info();
                        tracing::info!(
                            module = info.name,
                            version = info.version,
                            "parser module ready"
                        );
                        Ok(module)
                    }
                    Err(e) => {
                        tracing::error!(
                            source = self.source.name(),
                            error = %e,
                            "module load failed"
                        );
                        Err(e)
                    }
                }
            })
            .await
    }

    pub fn state(&self) -> LoadState {
        if self.module.initialized() {
            LoadState::Ready
        } else {
            LoadState::Uninitialized
        }
    }

    /// Synchronous access to the exports; fails before `initialize` resolves.
    pub fn module(&self) -> Result<&ParserModule, ModuleLoadError> {
        self.module.get().ok_or(ModuleLoadError::NotInitialized)
    }

    /// Number of times the source was asked to instantiate.
    pub fn load_attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

static BUNDLED_LOADER: LazyLock<ModuleLoader<BundledModule>> =
    LazyLock::new(|| ModuleLoader::new(BundledModule));

/// Process-wide loader for the bundled module.
pub fn bundled_loader() -> &'static ModuleLoader<BundledModule> {
    &BUNDLED_LOADER
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Pending on first poll, ready on the second.
    pub struct YieldOnce(bool);

    impl YieldOnce {
        pub fn new() -> Self {
            Self(false)
        }
    }

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// Counts instantiations and suspends once before delegating to the
    /// bundled module.
    #[derive(Default)]
    pub struct CountingSource {
        pub calls: AtomicUsize,
    }

    impl ModuleSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn instantiate(&self) -> impl Future<Output = Result<ParserModule, ModuleLoadError>> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                YieldOnce::new().await;
                BundledModule.instantiate().await
            }
        }
    }

    /// Always fails as if the module artifact could not be fetched.
    pub struct FailingSource;

    impl ModuleSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn instantiate(&self) -> impl Future<Output = Result<ParserModule, ModuleLoadError>> {
            async {
                Err::<ParserModule, _>(ModuleLoadError::Fetch {
                    source_name: "failing".to_string(),
                    reason: "network unreachable".to_string(),
                })
            }
        }
    }
}
