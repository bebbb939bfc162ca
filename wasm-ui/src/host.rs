//! The browser document as a bootstrap host.

use rusvelte_boot::{Host, ParserModule, TargetNotFoundError};
use serde_json::Value;
use wasm_bindgen::JsValue;
use yew::AppHandle;

use crate::app::{App, AppProps};

/// Mounts the playground with Yew and reports to the browser console.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

impl Host for BrowserHost {
    type App = AppHandle<App>;

    fn report_ast(&mut self, ast: &Value) {
        // Log as a JS object so the console renders an inspectable tree
        let js = js_sys::JSON::parse(&ast.to_string())
            .unwrap_or_else(|_| JsValue::from_str(&ast.to_string()));
        web_sys::console::log_2(&JsValue::from_str("sample AST:"), &js);
    }

    fn mount(
        &mut self,
        module: &ParserModule,
        target_id: &str,
    ) -> Result<AppHandle<App>, TargetNotFoundError> {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(target_id))
            .ok_or_else(|| TargetNotFoundError::new(target_id))?;

        let props = AppProps {
            module: module.clone(),
        };
        Ok(yew::Renderer::<App>::with_root_and_props(element, props).render())
    }
}
