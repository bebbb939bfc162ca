//! Module source for the browser.

use std::future::Future;

use rusvelte_boot::{BundledModule, ModuleLoadError, ModuleSource, ParserModule};

/// Instantiates the parser once a window and document are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserModuleSource;

impl ModuleSource for BrowserModuleSource {
    fn name(&self) -> &str {
        "browser"
    }

    fn instantiate(&self) -> impl Future<Output = Result<ParserModule, ModuleLoadError>> {
        async {
            check_environment()?;
            BundledModule.instantiate().await
        }
    }
}

fn check_environment() -> Result<(), ModuleLoadError> {
    let window = web_sys::window()
        .ok_or_else(|| ModuleLoadError::UnsupportedEnvironment("no global `window`".to_string()))?;
    if window.document().is_none() {
        return Err(ModuleLoadError::UnsupportedEnvironment(
            "window has no `document`".to_string(),
        ));
    }
    Ok(())
}
