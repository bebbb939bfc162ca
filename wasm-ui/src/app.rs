//! Root playground component.

use rusvelte_boot::{ParserModule, SAMPLE_SOURCE};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, HtmlAnchorElement, HtmlInputElement, Url};
use yew::prelude::*;

use crate::components::{AstPanel, SourcePanel};

/// The loaded module the playground builds its parsers from.
#[derive(Properties, Clone, PartialEq)]
pub struct AppProps {
    pub module: ParserModule,
}

/// Main application state.
#[derive(Clone, PartialEq)]
pub struct AppState {
    /// Component source being edited.
    pub source: String,
    /// Pretty-printed AST from the last successful parse.
    pub ast_text: String,
    /// Parse error, if the last parse failed.
    pub error: Option<String>,
    pub stats: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            source: SAMPLE_SOURCE.trim_start().to_string(),
            ast_text: String::new(),
            error: None,
            stats: String::new(),
        }
    }
}

impl AppState {
    /// Parse `source` with a fresh parser and record the outcome.
    fn run_parse(&mut self, module: &ParserModule) {
        let mut parser = module.create_parser();
        match parser.parse(&self.source) {
            Ok(()) => {
                let ast = parser.ast();
                self.ast_text = serde_json::to_string_pretty(ast).unwrap_or_default();
                self.error = None;
                self.stats = format!(
                    "{} nodes | {} bytes",
                    count_nodes(ast),
                    self.source.len()
                );
            }
            Err(e) => {
                self.ast_text.clear();
                self.error = Some(e.to_string());
                self.stats.clear();
            }
        }
    }
}

/// Number of typed nodes in a JSON AST.
pub(crate) fn count_nodes(value: &Value) -> usize {
    match value {
        Value::Object(map) => {
            let own = usize::from(map.contains_key("type"));
            own + map.values().map(count_nodes).sum::<usize>()
        }
        Value::Array(items) => items.iter().map(count_nodes).sum(),
        _ => 0,
    }
}

fn download(filename: &str, text: &str) -> Result<(), JsValue> {
    let array = js_sys::Array::new();
    array.push(&JsValue::from_str(text));

    let blob = Blob::new_with_str_sequence(&array)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;

    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();

    Url::revoke_object_url(&url)
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    let state = {
        let module = props.module.clone();
        use_state(move || {
            let mut initial = AppState::default();
            initial.run_parse(&module);
            initial
        })
    };

    let on_source_change = {
        let state = state.clone();
        Callback::from(move |text: String| {
            let mut new_state = (*state).clone();
            new_state.source = text;
            state.set(new_state);
        })
    };

    let on_run = {
        let state = state.clone();
        let module = props.module.clone();
        Callback::from(move |_| {
            let mut new_state = (*state).clone();
            new_state.run_parse(&module);
            state.set(new_state);
        })
    };

    let on_load = {
        let state = state.clone();
        let module = props.module.clone();
        Callback::from(move |e: web_sys::Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let file = input.files().and_then(|files| files.get(0));
            if let (Some(file), Ok(reader)) = (file, web_sys::FileReader::new()) {
                let state = state.clone();
                let module = module.clone();
                let reader_clone = reader.clone();

                let onload = Closure::wrap(Box::new(move |_: web_sys::Event| {
                    if let Some(text) = reader_clone.result().ok().and_then(|r| r.as_string()) {
                        let mut new_state = (*state).clone();
                        new_state.source = text;
                        new_state.run_parse(&module);
                        state.set(new_state);
                    }
                }) as Box<dyn FnMut(_)>);

                reader.set_onload(Some(onload.as_ref().unchecked_ref()));
                onload.forget();

                if let Err(err) = reader.read_as_text(&file) {
                    web_sys::console::error_2(&JsValue::from_str("failed to read file:"), &err);
                }
            }
            // Clear the input so the same file can be loaded again
            input.set_value("");
        })
    };

    let on_save = {
        let state = state.clone();
        Callback::from(move |_| {
            if let Err(err) = download("ast.json", &state.ast_text) {
                web_sys::console::error_2(&JsValue::from_str("failed to save AST:"), &err);
            }
        })
    };

    let info = props.module.info();

    html! {
        <div class="app">
            <header class="header">
                <div class="header-left">
                    <h1>{ "rusvelte" }</h1>
                    <p class="subtitle">{ "Component Parser Playground" }</p>
                </div>
                <div class="header-right">
                    <span class="module-info">{ format!("{} v{}", info.name, info.version) }</span>
                </div>
            </header>

            <main class="main">
                <div class="panels">
                    <SourcePanel
                        value={state.source.clone()}
                        on_change={on_source_change}
                        on_run={on_run}
                        on_load={on_load}
                    />

                    <AstPanel
                        value={state.ast_text.clone()}
                        error={state.error.clone()}
                        stats={state.stats.clone()}
                        on_save={on_save}
                    />
                </div>
            </main>

            <footer class="footer">
                <div class="footer-row">
                    <span class="footer-left">{ "MIT License" }</span>
                    <span class="footer-build">
                        { format!("Build: {}@{} {}", env!("BUILD_HOST"), env!("BUILD_COMMIT"), env!("BUILD_TIMESTAMP")) }
                    </span>
                </div>
            </footer>
        </div>
    }
}
