//! Web UI for rusvelte-boot
//!
//! Loads the parser module, parses a sample component as a smoke check, and
//! mounts a Yew parser playground into `#app`.

mod app;
mod components;
pub mod host;
pub mod loader;

use std::cell::RefCell;
use std::sync::LazyLock;

use rusvelte_boot::{BootConfig, Bootstrap, ModuleLoader};
use wasm_bindgen::prelude::*;
use yew::AppHandle;

pub use app::{App, AppProps};
pub use host::BrowserHost;
pub use loader::BrowserModuleSource;

static LOADER: LazyLock<ModuleLoader<BrowserModuleSource>> =
    LazyLock::new(|| ModuleLoader::new(BrowserModuleSource));

thread_local! {
    static MOUNTED: RefCell<Option<AppHandle<App>>> = const { RefCell::new(None) };
}

/// Entry point for the WASM application.
///
/// Not registered as the start function in test builds, where the test
/// harness owns the page.
#[cfg_attr(not(test), wasm_bindgen(start))]
pub fn run_app() {
    // Initialize panic hook for better error messages
    console_error_panic_hook::set_once();

    // Core events (module loads, bootstrap phases) go to the browser console
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build(),
    );
    tracing::info!("starting playground");

    // Dropped on purpose: a failed boot surfaces as an unhandled rejection
    let _ = wasm_bindgen_futures::future_to_promise(async {
        boot().await?;
        Ok(JsValue::UNDEFINED)
    });
}

/// Run the bootstrap sequence. Rejects with a JS `Error` on failure.
#[wasm_bindgen]
pub async fn boot() -> Result<(), JsValue> {
    let mut bootstrap = Bootstrap::new(BootConfig::default());
    let mut host = BrowserHost;

    match bootstrap.run(&*LOADER, &mut host).await {
        Ok(booted) => {
            let previous = MOUNTED.with(|slot| slot.borrow_mut().replace(booted.app));
            if let Some(handle) = previous {
                handle.destroy();
            }
            Ok(())
        }
        Err(e) => {
            gloo::console::error!(format!(
                "boot failed after phase '{}': {}",
                bootstrap.phase().name(),
                e
            ));
            Err(js_sys::Error::new(&e.to_string()).into())
        }
    }
}

/// Unmount the playground. Returns whether an app was mounted.
#[wasm_bindgen]
pub fn teardown() -> bool {
    let handle = MOUNTED.with(|slot| slot.borrow_mut().take());
    match handle {
        Some(handle) => {
            handle.destroy();
            true
        }
        None => false,
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    //! Browser tests. Run with `wasm-pack test --headless --firefox wasm-ui`.

    use super::*;
    use rusvelte_boot::{BootError, BootPhase, Host, LoadState, TargetNotFoundError};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> web_sys::Document {
        web_sys::window().unwrap().document().unwrap()
    }

    #[wasm_bindgen_test]
    async fn test_browser_source_loads_once() {
        let loader = ModuleLoader::new(BrowserModuleSource);
        assert_eq!(loader.state(), LoadState::Uninitialized);

        loader.initialize().await.unwrap();
        loader.initialize().await.unwrap();

        assert_eq!(loader.state(), LoadState::Ready);
        assert_eq!(loader.load_attempts(), 1);
    }

    #[wasm_bindgen_test]
    fn test_start_hook_has_not_mounted() {
        assert!(!teardown());
    }

    #[wasm_bindgen_test]
    async fn test_mount_missing_target_fails() {
        let loader = ModuleLoader::new(BrowserModuleSource);
        let module = loader.initialize().await.unwrap();

        let err = BrowserHost.mount(module, "no-such-element").unwrap_err();
        assert_eq!(err, TargetNotFoundError::new("no-such-element"));
        assert!(document().get_element_by_id("no-such-element").is_none());
    }

    #[wasm_bindgen_test]
    async fn test_bootstrap_without_target_stops_after_parse() {
        let loader = ModuleLoader::new(BrowserModuleSource);
        let mut bootstrap = Bootstrap::new(BootConfig::default().with_target("missing-root"));

        let err = bootstrap.run(&loader, &mut BrowserHost).await.unwrap_err();

        assert!(matches!(err, BootError::TargetNotFound(_)));
        assert_eq!(bootstrap.phase(), BootPhase::Parsed);
    }

    #[wasm_bindgen_test]
    async fn test_bootstrap_mounts_into_target() {
        let target = document().create_element("div").unwrap();
        target.set_id("test-root");
        document().body().unwrap().append_child(&target).unwrap();

        let loader = ModuleLoader::new(BrowserModuleSource);
        let mut bootstrap = Bootstrap::new(BootConfig::default().with_target("test-root"));
        let booted = bootstrap.run(&loader, &mut BrowserHost).await.unwrap();

        assert_eq!(bootstrap.phase(), BootPhase::Mounted);
        assert_eq!(booted.parser.ast()["type"], "Root");

        booted.app.destroy();
        target.remove();
    }
}
