//! In-memory document used as a [`Host`] outside the browser.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::bootstrap::Host;
use crate::error::TargetNotFoundError;
use crate::module::{ModuleInfo, ParserModule};

/// Record of a root component mounted into a headless document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessApp {
    pub target_id: String,
    pub module: ModuleInfo,
}

/// A document reduced to the set of element ids it contains.
#[derive(Debug, Default)]
pub struct HeadlessDocument {
    elements: BTreeSet<String>,
    mounted: Vec<HeadlessApp>,
    reports: Vec<Value>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn insert_element(&mut self, id: impl Into<String>) {
        self.elements.insert(id.into());
    }

    /// Returns whether the element existed.
    pub fn remove_element(&mut self, id: &str) -> bool {
        self.elements.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains(id)
    }

    pub fn mounted(&self) -> &[HeadlessApp] {
        &self.mounted
    }

    /// ASTs received on the diagnostic channel, oldest first.
    pub fn reports(&self) -> &[Value] {
        &self.reports
    }
}

impl Host for HeadlessDocument {
    type App = HeadlessApp;

    fn report_ast(&mut self, ast: &Value) {
        tracing::debug!(ast = %ast, "sample parsed");
        self.reports.push(ast.clone());
    }

    fn mount(
        &mut self,
        module: &ParserModule,
        target_id: &str,
    ) -> Result<HeadlessApp, TargetNotFoundError> {
        if !self.contains(target_id) {
            return Err(TargetNotFoundError::new(target_id));
        }

        let app = HeadlessApp {
            target_id: target_id.to_string(),
            module: module.info(),
        };
        self.mounted.push(app.clone());
        Ok(app)
    }
}
