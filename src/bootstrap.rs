//! Application bootstrap: load the module, build a parser, parse the sample,
//! mount the UI.
//!
//! The sequence is linear and runs to completion or fails outright:
//!
//! ```text
//! Start → ModuleReady → ParserConstructed → Parsed → Mounted
//! ```
//!
//! Awaiting the module loader is the only suspension point. Parsing and
//! mounting both need the loaded module but not each other; the sample parse
//! is reported on the host's diagnostic channel and is not handed to the UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TargetNotFoundError};
use crate::module::{ModuleLoader, ModuleSource, ParserInstance, ParserModule};

/// Element id the UI is mounted into by default.
pub const DEFAULT_TARGET_ID: &str = "app";

/// Source parsed once during startup.
pub const SAMPLE_SOURCE: &str = "\n<script>let a = $state()</script>\n{a}\n";

/// Startup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Id of the document element the UI is mounted into.
    pub target_id: String,
    /// Source handed to the demonstration parse.
    pub sample: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            target_id: DEFAULT_TARGET_ID.to_string(),
            sample: SAMPLE_SOURCE.to_string(),
        }
    }
}

impl BootConfig {
    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = target_id.into();
        self
    }

    pub fn with_sample(mut self, sample: impl Into<String>) -> Self {
        self.sample = sample.into();
        self
    }
}

/// Progress through the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootPhase {
    Start,
    ModuleReady,
    ParserConstructed,
    Parsed,
    Mounted,
}

impl BootPhase {
    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<BootPhase> {
        match self {
            Self::Start => Some(Self::ModuleReady),
            Self::ModuleReady => Some(Self::ParserConstructed),
            Self::ParserConstructed => Some(Self::Parsed),
            Self::Parsed => Some(Self::Mounted),
            Self::Mounted => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ModuleReady => "module-ready",
            Self::ParserConstructed => "parser-constructed",
            Self::Parsed => "parsed",
            Self::Mounted => "mounted",
        }
    }
}

/// The environment the UI is mounted into.
pub trait Host {
    /// Handle to the live UI instance.
    type App;

    /// Diagnostic output channel for the sample parse.
    fn report_ast(&mut self, ast: &Value);

    /// Mount the root component into the element with id `target_id`.
    ///
    /// Must fail when the element does not exist, without attaching
    /// anything.
    fn mount(
        &mut self,
        module: &ParserModule,
        target_id: &str,
    ) -> std::result::Result<Self::App, TargetNotFoundError>;
}

/// Result of a completed bootstrap.
#[derive(Debug)]
pub struct Booted<A> {
    /// The mounted UI instance; the bootstrap's externally visible result.
    pub app: A,
    /// The parser that ran the sample parse.
    pub parser: ParserInstance,
}

/// Drives the bootstrap sequence.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: BootConfig,
    phase: BootPhase,
}

impl Bootstrap {
    pub fn new(config: BootConfig) -> Self {
        Self {
            config,
            phase: BootPhase::Start,
        }
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Last phase reached. After a failure this is the last phase that
    /// completed.
    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    /// Run the sequence once. No step is retried; the first failure is
    /// returned and later steps do not run.
    pub async fn run<S, H>(
        &mut self,
        loader: &ModuleLoader<S>,
        host: &mut H,
    ) -> Result<Booted<H::App>>
    where
        S: ModuleSource,
        H: Host,
    {
        let module = loader.initialize().await?;
        self.advance(BootPhase::ModuleReady);

        let mut parser = module.create_parser();
        self.advance(BootPhase::ParserConstructed);

        parser.parse(&self.config.sample)?;
        host.report_ast(parser.ast());
        self.advance(BootPhase::Parsed);

        let app = host.mount(module, &self.config.target_id)?;
        self.advance(BootPhase::Mounted);
        tracing::info!(target_id = %self.config.target_id, "application mounted");

        Ok(Booted { app, parser })
    }

    fn advance(&mut self, next: BootPhase) {
        debug_assert_eq!(self.phase.next(), Some(next), "bootstrap phases run in order");
        tracing::debug!(from = self.phase.name(), to = next.name(), "bootstrap phase");
        self.phase = next;
    }
}
