//! UI Components for the parser playground.

use yew::prelude::*;

/// Editor panel for component source.
#[derive(Properties, PartialEq)]
pub struct SourcePanelProps {
    pub value: String,
    pub on_change: Callback<String>,
    pub on_run: Callback<()>,
    pub on_load: Callback<web_sys::Event>,
}

#[function_component(SourcePanel)]
pub fn source_panel(props: &SourcePanelProps) -> Html {
    let on_input = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            let target: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
            on_change.emit(target.value());
        })
    };

    let on_run_click = {
        let on_run = props.on_run.clone();
        Callback::from(move |_| {
            on_run.emit(());
        })
    };

    let on_load_change = {
        let on_load = props.on_load.clone();
        Callback::from(move |e: web_sys::Event| {
            on_load.emit(e);
        })
    };

    html! {
        <div class="panel source-panel">
            <div class="panel-header">
                <h2>{ "Component" }</h2>
                <div class="button-group">
                    <label class="file-button">
                        { "Load" }
                        <input type="file" accept=".svelte" onchange={on_load_change} />
                    </label>
                    <button class="run-button" onclick={on_run_click}>
                        { "Parse" }
                    </button>
                </div>
            </div>
            <div class="panel-content">
                <textarea
                    class="source-input"
                    value={props.value.clone()}
                    oninput={on_input}
                    spellcheck="false"
                    rows="16"
                    placeholder="<script>let name = 'world';</script>"
                />
                <div class="syntax-help">
                    <details>
                        <summary>{ "Supported Syntax" }</summary>
                        <pre>{r#"<script> / <script context="module">  - hoisted to instance / module
<style>                                 - hoisted to css
<div attr="a{b}c" {x} {...rest}>        - elements and attributes
<Widget /> <ui.Button />                - components
on:click|once bind:value class:x use:a  - directives
{expr} {@html x} {@render s()}          - expression and special tags
{@const x = y} {@debug a, b}
<!-- comment -->"#}</pre>
                    </details>
                </div>
            </div>
        </div>
    }
}

/// Panel displaying the parsed tree.
#[derive(Properties, PartialEq)]
pub struct AstPanelProps {
    pub value: String,
    pub error: Option<String>,
    pub stats: String,
    pub on_save: Callback<()>,
}

#[function_component(AstPanel)]
pub fn ast_panel(props: &AstPanelProps) -> Html {
    let on_save_click = {
        let on_save = props.on_save.clone();
        Callback::from(move |_| {
            on_save.emit(());
        })
    };

    html! {
        <div class="panel ast-panel">
            <div class="panel-header">
                <h2>{ "AST" }</h2>
                if !props.stats.is_empty() {
                    <span class="stats">{ &props.stats }</span>
                }
                <button
                    class="save-button"
                    onclick={on_save_click}
                    disabled={props.value.is_empty()}
                >
                    { "Save" }
                </button>
            </div>
            <div class="panel-content">
                if let Some(error) = &props.error {
                    <div class="error">
                        { error }
                    </div>
                } else {
                    <pre class="ast-output">{ &props.value }</pre>
                }
            </div>
        </div>
    }
}
