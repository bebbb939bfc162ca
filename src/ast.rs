//! Syntax tree produced by the template parser.
//!
//! Every node records byte `start`/`end` offsets into the trimmed source and
//! serializes with a `"type"` discriminator. JavaScript is not parsed: script
//! bodies and `{...}` expressions keep their raw text.

use serde::Serialize;

/// Root of a parsed component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Root {
    pub start: usize,
    pub end: usize,
    pub fragment: Fragment,
    pub instance: Option<Script>,
    pub module: Option<Script>,
    pub css: Option<StyleSheet>,
}

/// An ordered list of sibling nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Fragment {
    pub nodes: Vec<FragmentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum FragmentNode {
    Text(Text),
    RegularElement(Element),
    Component(Element),
    Comment(Comment),
    ExpressionTag(ExpressionTag),
    HtmlTag(ExpressionTag),
    RenderTag(ExpressionTag),
    ConstTag(ExpressionTag),
    DebugTag(DebugTag),
    IfBlock(IfBlock),
    EachBlock(EachBlock),
    AwaitBlock(AwaitBlock),
    KeyBlock(KeyBlock),
}

impl FragmentNode {
    pub fn start(&self) -> usize {
        match self {
            Self::Text(n) => n.start,
            Self::RegularElement(n) | Self::Component(n) => n.start,
            Self::Comment(n) => n.start,
            Self::ExpressionTag(n) | Self::HtmlTag(n) | Self::RenderTag(n) | Self::ConstTag(n) => {
                n.start
            }
            Self::DebugTag(n) => n.start,
            Self::IfBlock(n) => n.start,
            Self::EachBlock(n) => n.start,
            Self::AwaitBlock(n) => n.start,
            Self::KeyBlock(n) => n.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Self::Text(n) => n.end,
            Self::RegularElement(n) | Self::Component(n) => n.end,
            Self::Comment(n) => n.end,
            Self::ExpressionTag(n) | Self::HtmlTag(n) | Self::RenderTag(n) | Self::ConstTag(n) => {
                n.end
            }
            Self::DebugTag(n) => n.end,
            Self::IfBlock(n) => n.end,
            Self::EachBlock(n) => n.end,
            Self::AwaitBlock(n) => n.end,
            Self::KeyBlock(n) => n.end,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        if let Self::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::RegularElement(element) | Self::Component(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_expression_tag(&self) -> Option<&ExpressionTag> {
        if let Self::ExpressionTag(tag) = self {
            Some(tag)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub start: usize,
    pub end: usize,
    /// Source text as written.
    pub raw: String,
    /// Text with HTML entities decoded.
    pub data: String,
}

impl Text {
    pub fn new(start: usize, end: usize, raw: &str) -> Self {
        Self {
            start,
            end,
            raw: raw.to_string(),
            data: decode_entities(raw),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.raw.chars().all(char::is_whitespace)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub fragment: Fragment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub start: usize,
    pub end: usize,
    pub data: String,
}

/// A `{...}` tag. For `{@const ...}` the expression holds the declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionTag {
    pub start: usize,
    pub end: usize,
    pub expression: JsExpression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugTag {
    pub start: usize,
    pub end: usize,
    pub identifiers: Vec<String>,
}

/// `{#if test}...{:else}...{/if}`.
///
/// An `{:else if ...}` branch is a nested block with `elseif` set, placed
/// alone in the parent's `alternate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBlock {
    pub start: usize,
    pub end: usize,
    pub elseif: bool,
    pub test: JsExpression,
    pub consequent: Fragment,
    pub alternate: Option<Fragment>,
}

/// `{#each expression as context, index (key)}...{:else}...{/each}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EachBlock {
    pub start: usize,
    pub end: usize,
    pub expression: JsExpression,
    /// Binding pattern for each item; absent for `{#each items}`.
    pub context: Option<JsExpression>,
    pub index: Option<String>,
    pub key: Option<JsExpression>,
    pub body: Fragment,
    pub fallback: Option<Fragment>,
}

/// `{#await expression}...{:then value}...{:catch error}...{/await}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwaitBlock {
    pub start: usize,
    pub end: usize,
    pub expression: JsExpression,
    pub value: Option<JsExpression>,
    pub error: Option<JsExpression>,
    pub pending: Option<Fragment>,
    pub then: Option<Fragment>,
    pub catch: Option<Fragment>,
}

/// `{#key expression}...{/key}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyBlock {
    pub start: usize,
    pub end: usize,
    pub expression: JsExpression,
    pub fragment: Fragment,
}

/// Opaque JavaScript source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct JsExpression {
    pub start: usize,
    pub end: usize,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Attribute {
    Attribute(NormalAttribute),
    SpreadAttribute(SpreadAttribute),
    BindDirective(Directive),
    OnDirective(Directive),
    ClassDirective(Directive),
    StyleDirective(StyleDirective),
    UseDirective(Directive),
    TransitionDirective(TransitionDirective),
    AnimateDirective(Directive),
    LetDirective(Directive),
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Self::Attribute(attr) => &attr.name,
            Self::SpreadAttribute(_) => "...",
            Self::StyleDirective(d) => &d.name,
            Self::TransitionDirective(d) => &d.name,
            Self::BindDirective(d)
            | Self::OnDirective(d)
            | Self::ClassDirective(d)
            | Self::UseDirective(d)
            | Self::AnimateDirective(d)
            | Self::LetDirective(d) => &d.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalAttribute {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub value: AttributeValue,
}

/// `true` for a bare attribute, a lone expression for `name={expr}`,
/// otherwise the quoted sequence of text and expression chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    True(bool),
    Expression(ValuePart),
    Sequence(Vec<ValuePart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ValuePart {
    Text(Text),
    ExpressionTag(ExpressionTag),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadAttribute {
    pub start: usize,
    pub end: usize,
    pub expression: JsExpression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directive {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub modifiers: Vec<String>,
    pub expression: Option<JsExpression>,
}

/// `transition:`, `in:` or `out:`. `in:` is intro only, `out:` outro only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionDirective {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub modifiers: Vec<String>,
    pub expression: Option<JsExpression>,
    pub intro: bool,
    pub outro: bool,
}

/// `style:property`. Unlike other directives the value may be quoted text;
/// the shorthand form has value `true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDirective {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub modifiers: Vec<String>,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptContext {
    Default,
    Module,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Script {
    pub start: usize,
    pub end: usize,
    pub context: ScriptContext,
    pub content: RawContent,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct StyleSheet {
    pub start: usize,
    pub end: usize,
    pub attributes: Vec<Attribute>,
    pub children: Vec<StyleSheetChild>,
    pub content: RawContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawContent {
    pub start: usize,
    pub end: usize,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StyleSheetChild {
    Rule(Rule),
    #[serde(rename = "Atrule")]
    AtRule(AtRule),
}

/// `selector, ... { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub start: usize,
    pub end: usize,
    pub prelude: SelectorList,
    pub block: CssBlock,
}

/// `@name prelude;` or `@name prelude { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRule {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub prelude: String,
    pub block: Option<CssBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Block")]
pub struct CssBlock {
    pub start: usize,
    pub end: usize,
    pub children: Vec<BlockChild>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum BlockChild {
    Rule(Rule),
    #[serde(rename = "Atrule")]
    AtRule(AtRule),
    Declaration(Declaration),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub start: usize,
    pub end: usize,
    pub property: String,
    pub value: String,
}

/// Comma-separated selectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SelectorList {
    pub start: usize,
    pub end: usize,
    pub children: Vec<ComplexSelector>,
}

/// One selector of a list, split at combinators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ComplexSelector {
    pub start: usize,
    pub end: usize,
    pub children: Vec<RelativeSelector>,
}

/// Compound selector with the combinator that precedes it, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct RelativeSelector {
    pub start: usize,
    pub end: usize,
    pub combinator: Option<Combinator>,
    pub selectors: Vec<SimpleSelector>,
}

/// `>`, `+`, `~`, `||`, or `" "` for a descendant combinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Combinator {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SimpleSelector {
    TypeSelector(NamedSelector),
    IdSelector(NamedSelector),
    ClassSelector(NamedSelector),
    AttributeSelector(AttributeSelector),
    PseudoElementSelector(NamedSelector),
    PseudoClassSelector(PseudoClassSelector),
    Percentage(SelectorValue),
    Nth(SelectorValue),
    NestingSelector(NamedSelector),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSelector {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorValue {
    pub start: usize,
    pub end: usize,
    pub value: String,
}

/// `[name]`, `[name=value]`, `[name~="value" i]`, ...
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSelector {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub matcher: Option<String>,
    pub value: Option<String>,
    pub flags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PseudoClassSelector {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub args: Option<SelectorList>,
}

// Named entities seen in practice; anything else passes through untouched.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("copy", '\u{00A9}'),
];

/// Decode HTML character references in text content.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail
            .find(';')
            .and_then(|semi| decode_reference(&tail[..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, ch)| *ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_named_and_numeric_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
    }

    #[test]
    fn test_decode_leaves_unknown_references() {
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn test_fragment_node_serializes_with_type() {
        let node = FragmentNode::Text(Text::new(0, 2, "hi"));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({"type": "Text", "start": 0, "end": 2, "raw": "hi", "data": "hi"})
        );
    }

    #[test]
    fn test_attribute_value_true_serializes_as_bool() {
        let attr = Attribute::Attribute(NormalAttribute {
            start: 3,
            end: 11,
            name: "disabled".to_string(),
            value: AttributeValue::True(true),
        });
        let value = serde_json::to_value(&attr).unwrap();
        assert_eq!(value["type"], "Attribute");
        assert_eq!(value["value"], json!(true));
    }

    #[test]
    fn test_css_block_and_at_rule_type_names() {
        let child = BlockChild::AtRule(AtRule {
            start: 0,
            end: 20,
            name: "media".to_string(),
            prelude: "print".to_string(),
            block: Some(CssBlock {
                start: 13,
                end: 20,
                children: Vec::new(),
            }),
        });
        let value = serde_json::to_value(&child).unwrap();
        assert_eq!(value["type"], "Atrule");
        assert_eq!(value["block"]["type"], "Block");
    }

    #[test]
    fn test_script_context_lowercase() {
        assert_eq!(
            serde_json::to_value(ScriptContext::Module).unwrap(),
            json!("module")
        );
    }
}
