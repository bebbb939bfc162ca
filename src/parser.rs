//! Template parser for Svelte components.
//!
//! Source format:
//! ```text
//! <script>let a = $state()</script>
//! <p class="greeting {tone}">Hello {a}!</p>
//! <style>p { color: red; }</style>
//! ```
//!
//! - Top-level `<script>` becomes the instance script (or the module script
//!   when marked `module` / `context="module"`)
//! - Top-level `<style>` becomes the stylesheet
//! - `{expr}` becomes an expression tag; `{@html}`, `{@render}`, `{@const}`
//!   and `{@debug}` are special tags
//! - Capitalized or dotted tag names are components
//! - `{#if}`, `{#each}`, `{#await}` and `{#key}` open blocks closed by the
//!   matching `{/...}`; other block names are rejected
//! - The top-level stylesheet is parsed into rules, at-rules and declarations
//!
//! JavaScript is never parsed. Expressions are delimited by scanning for the
//! matching `}` while skipping strings, template literals and comments.

mod css;

use crate::ast::{
    Attribute, AttributeValue, AwaitBlock, Comment, DebugTag, Directive, EachBlock, Element,
    ExpressionTag, Fragment, FragmentNode, IfBlock, JsExpression, KeyBlock, NormalAttribute,
    RawContent, Root, Script, ScriptContext, SpreadAttribute, StyleDirective, StyleSheet, Text,
    TransitionDirective, ValuePart,
};
use crate::error::{ParseError, ParseErrorKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Parse component source into a [`Root`].
pub fn parse(source: &str) -> Result<Root, ParseError> {
    Parser::new(source).parse()
}

/// Whether `name` is an HTML void element (no children, no closing tag).
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

pub struct Parser<'a> {
    source: &'a str,
    offset: usize,
    /// Element nesting depth; 0 at the component root.
    depth: usize,
    instance: Option<Script>,
    module: Option<Script>,
    css: Option<StyleSheet>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.trim_end(),
            offset: 0,
            depth: 0,
            instance: None,
            module: None,
            css: None,
        }
    }

    pub fn parse(mut self) -> Result<Root, ParseError> {
        let fragment = self.parse_fragment()?;

        if self.match_block_boundary() {
            return Err(self.error(ParseErrorKind::BlockUnexpectedTag));
        }
        if self.match_str("</") {
            let start = self.offset;
            self.offset += 2;
            self.skip_whitespace();
            let name = self.read_tag_name();
            return Err(ParseError::new(
                start,
                ParseErrorKind::UnexpectedClosingTag(name.to_string()),
            ));
        }

        // The root spans all content, hoisted script and style included, with
        // surrounding whitespace excluded.
        let hoisted = [
            self.instance.as_ref().map(|s| (s.start, s.end)),
            self.module.as_ref().map(|s| (s.start, s.end)),
            self.css.as_ref().map(|s| (s.start, s.end)),
        ];
        let spans: Vec<(usize, usize)> = fragment
            .nodes
            .iter()
            .filter_map(content_span)
            .chain(hoisted.into_iter().flatten())
            .collect();
        let start = spans.iter().map(|&(start, _)| start).min().unwrap_or(0);
        let end = spans.iter().map(|&(_, end)| end).max().unwrap_or(0);

        Ok(Root {
            start,
            end,
            fragment,
            instance: self.instance.take(),
            module: self.module.take(),
            css: self.css.take(),
        })
    }

    /// Unconsumed source.
    pub fn remain(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn is_eof(&self) -> bool {
        self.offset >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.remain().chars().next()
    }

    fn match_str(&self, s: &str) -> bool {
        self.remain().starts_with(s)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.offset += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.match_str(s) {
            self.offset += s.len();
            true
        } else {
            false
        }
    }

    /// `word` is next and is not the prefix of a longer identifier.
    fn match_word(&self, word: &str) -> bool {
        let after = self.remain().get(word.len()..).and_then(|s| s.chars().next());
        self.match_str(word) && !after.is_some_and(is_identifier_char)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.match_word(word) {
            self.offset += word.len();
            true
        } else {
            false
        }
    }

    /// `{` then optional whitespace then `:` or `/`.
    fn match_block_boundary(&self) -> bool {
        self.remain()
            .strip_prefix('{')
            .is_some_and(|rest| rest.trim_start().starts_with([':', '/']))
    }

    /// Consume `{` and `marker` plus any whitespace around the marker.
    fn eat_block_tag(&mut self, marker: char) -> bool {
        let Some(rest) = self.remain().strip_prefix('{') else {
            return false;
        };
        let trimmed = rest.trim_start();
        if !trimmed.starts_with(marker) {
            return false;
        }
        self.offset += 1 + (rest.len() - trimmed.len()) + marker.len_utf8();
        self.skip_whitespace();
        true
    }

    fn expect(&mut self, ch: char) -> Result<(), ParseError> {
        if self.eat(ch) {
            Ok(())
        } else if self.is_eof() {
            Err(self.error(ParseErrorKind::UnexpectedEof))
        } else {
            Err(self.error(ParseErrorKind::ExpectedChar(ch)))
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remain();
        self.offset += rest.len() - rest.trim_start().len();
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.remain();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(rest.len(), |(i, _)| i);
        self.offset += len;
        &rest[..len]
    }

    fn read_tag_name(&mut self) -> &'a str {
        self.read_while(|c| !c.is_whitespace() && !matches!(c, '/' | '>' | '<'))
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.offset, kind)
    }

    fn parse_fragment(&mut self) -> Result<Fragment, ParseError> {
        let mut nodes = Vec::new();
        while !self.is_eof() && !self.match_str("</") && !self.match_block_boundary() {
            if let Some(node) = self.parse_fragment_node()? {
                nodes.push(node);
            }
        }
        Ok(Fragment { nodes })
    }

    /// Returns `None` when the node was hoisted out of the fragment
    /// (top-level script or style).
    fn parse_fragment_node(&mut self) -> Result<Option<FragmentNode>, ParseError> {
        if self.match_str("<!--") {
            self.parse_comment().map(Some)
        } else if self.match_str("<") {
            self.parse_element()
        } else if self.match_str("{") {
            self.parse_tag().map(Some)
        } else {
            Ok(Some(FragmentNode::Text(self.parse_text())))
        }
    }

    fn parse_text(&mut self) -> Text {
        let start = self.offset;
        let raw = self.read_while(|c| !matches!(c, '<' | '{'));
        Text::new(start, self.offset, raw)
    }

    fn parse_comment(&mut self) -> Result<FragmentNode, ParseError> {
        let start = self.offset;
        self.offset += "<!--".len();
        let Some(len) = self.remain().find("-->") else {
            return Err(ParseError::new(start, ParseErrorKind::UnclosedComment));
        };
        let data = self.remain()[..len].to_string();
        self.offset += len + "-->".len();

        Ok(FragmentNode::Comment(Comment {
            start,
            end: self.offset,
            data,
        }))
    }

    fn parse_element(&mut self) -> Result<Option<FragmentNode>, ParseError> {
        let start = self.offset;
        self.expect('<')?;
        let name = self.read_tag_name();
        if !is_valid_tag_name(name) {
            return Err(ParseError::new(start + 1, ParseErrorKind::TagInvalidName));
        }

        let attributes = self.parse_attributes()?;
        let self_closing = self.eat_str("/>");
        if !self_closing {
            self.expect('>')?;
        }

        let at_root = self.depth == 0;
        match name {
            "script" if at_root => {
                let content = self.parse_raw_content(name, start, self_closing)?;
                self.hoist_script(start, content, attributes)?;
                return Ok(None);
            }
            "style" if at_root => {
                if self.css.is_some() {
                    return Err(ParseError::new(start, ParseErrorKind::StyleDuplicate));
                }
                let stylesheet = self.parse_style_sheet(start, attributes, self_closing)?;
                self.css = Some(stylesheet);
                return Ok(None);
            }
            _ => {}
        }

        let is_component = name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.');
        let fragment = if self_closing || (!is_component && is_void(name)) {
            Fragment::default()
        } else if matches!(name, "script" | "style") {
            let content = self.parse_raw_content(name, start, false)?;
            let mut fragment = Fragment::default();
            if !content.raw.is_empty() {
                fragment.nodes.push(FragmentNode::Text(Text::new(
                    content.start,
                    content.end,
                    &content.raw,
                )));
            }
            fragment
        } else {
            self.depth += 1;
            let fragment = self.parse_fragment();
            self.depth -= 1;
            let fragment = fragment?;
            self.parse_closing_tag(name, start)?;
            fragment
        };

        let element = Element {
            start,
            end: self.offset,
            name: name.to_string(),
            attributes,
            fragment,
        };
        Ok(Some(if is_component {
            FragmentNode::Component(element)
        } else {
            FragmentNode::RegularElement(element)
        }))
    }

    fn parse_closing_tag(&mut self, name: &str, element_start: usize) -> Result<(), ParseError> {
        if self.is_eof() {
            return Err(ParseError::new(
                element_start,
                ParseErrorKind::ElementUnclosed(name.to_string()),
            ));
        }
        if self.match_block_boundary() {
            return Err(self.error(ParseErrorKind::BlockUnexpectedTag));
        }

        let start = self.offset;
        self.offset += "</".len();
        self.skip_whitespace();
        let found = self.read_tag_name();
        self.skip_whitespace();
        self.expect('>')?;

        if found != name {
            return Err(ParseError::new(
                start,
                ParseErrorKind::ExpectedClosingTag {
                    expected: name.to_string(),
                    found: found.to_string(),
                },
            ));
        }
        Ok(())
    }

    /// Content of a raw-text element up to and including its closing tag.
    fn parse_raw_content(
        &mut self,
        name: &str,
        element_start: usize,
        self_closing: bool,
    ) -> Result<RawContent, ParseError> {
        let start = self.offset;
        if self_closing {
            return Ok(RawContent {
                start,
                end: start,
                raw: String::new(),
            });
        }

        let close = format!("</{name}");
        let Some(len) = self.remain().find(&close) else {
            return Err(ParseError::new(
                element_start,
                ParseErrorKind::ElementUnclosed(name.to_string()),
            ));
        };
        let raw = self.remain()[..len].to_string();
        self.offset += len + close.len();
        self.skip_whitespace();
        self.expect('>')?;

        Ok(RawContent {
            start,
            end: start + len,
            raw,
        })
    }

    fn hoist_script(
        &mut self,
        start: usize,
        content: RawContent,
        attributes: Vec<Attribute>,
    ) -> Result<(), ParseError> {
        let context = script_context(&attributes)
            .ok_or_else(|| ParseError::new(start, ParseErrorKind::ScriptInvalidContext))?;
        let slot = match context {
            ScriptContext::Default => &mut self.instance,
            ScriptContext::Module => &mut self.module,
        };
        if slot.is_some() {
            return Err(ParseError::new(start, ParseErrorKind::ScriptDuplicate));
        }

        *slot = Some(Script {
            start,
            end: self.offset,
            context,
            content,
            attributes,
        });
        Ok(())
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
                Some('>') => break,
                Some('/') if self.match_str("/>") => break,
                Some('{') => attributes.push(self.parse_brace_attribute()?),
                Some(_) => attributes.push(self.parse_attribute()?),
            }
        }
        Ok(attributes)
    }

    /// `{name}` shorthand or `{...spread}`.
    fn parse_brace_attribute(&mut self) -> Result<Attribute, ParseError> {
        let start = self.offset;
        self.expect('{')?;
        self.skip_whitespace();

        if self.eat_str("...") {
            let expression = self.read_expression()?;
            self.expect('}')?;
            return Ok(Attribute::SpreadAttribute(SpreadAttribute {
                start,
                end: self.offset,
                expression,
            }));
        }

        if self.peek() == Some('}') {
            return Err(ParseError::new(start, ParseErrorKind::AttributeEmptyShorthand));
        }
        let expression = self.read_expression()?;
        self.expect('}')?;

        let end = self.offset;
        Ok(Attribute::Attribute(NormalAttribute {
            start,
            end,
            name: expression.raw.clone(),
            value: AttributeValue::Expression(ValuePart::ExpressionTag(ExpressionTag {
                start,
                end,
                expression,
            })),
        }))
    }

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let start = self.offset;
        let name = self.read_while(|c| {
            !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '{' | '"' | '\'')
        });
        if name.is_empty() {
            return Err(self.error(ParseErrorKind::ExpectedChar('>')));
        }
        let name_end = self.offset;

        let checkpoint = self.offset;
        self.skip_whitespace();
        let value = if self.eat('=') {
            self.skip_whitespace();
            Some(self.parse_attribute_value()?)
        } else {
            self.offset = checkpoint;
            None
        };
        let end = self.offset;

        if let Some((prefix, rest)) = name.split_once(':') {
            if prefix == "style" {
                return parse_style_directive(rest, start, end, value);
            }
            if let Some(kind) = DirectiveKind::from_prefix(prefix) {
                return parse_directive(kind, prefix, rest, start, name_end, end, value);
            }
        }

        Ok(Attribute::Attribute(NormalAttribute {
            start,
            end,
            name: name.to_string(),
            value: value.unwrap_or(AttributeValue::True(true)),
        }))
    }

    fn parse_attribute_value(&mut self) -> Result<AttributeValue, ParseError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.offset += 1;
                let parts = self.parse_value_parts(Some(quote))?;
                self.expect(quote)?;
                Ok(AttributeValue::Sequence(parts))
            }
            Some('{') => {
                let tag = self.parse_expression_tag()?;
                Ok(AttributeValue::Expression(ValuePart::ExpressionTag(tag)))
            }
            Some(_) => {
                let parts = self.parse_value_parts(None)?;
                if parts.is_empty() {
                    return Err(self.error(ParseErrorKind::ExpectedAttributeValue));
                }
                Ok(AttributeValue::Sequence(parts))
            }
            None => Err(self.error(ParseErrorKind::UnexpectedEof)),
        }
    }

    /// Text and `{expr}` chunks up to the closing quote, or for unquoted
    /// values up to whitespace or the end of the tag.
    fn parse_value_parts(&mut self, quote: Option<char>) -> Result<Vec<ValuePart>, ParseError> {
        let mut parts = Vec::new();
        let mut text_start = self.offset;

        loop {
            let Some(ch) = self.peek() else {
                if let Some(q) = quote {
                    return Err(self.error(ParseErrorKind::ExpectedChar(q)));
                }
                break;
            };
            let done = match quote {
                Some(q) => ch == q,
                None => ch.is_whitespace() || ch == '>' || self.match_str("/>"),
            };
            if done {
                break;
            }

            if ch == '{' {
                if self.offset > text_start {
                    let raw = &self.source[text_start..self.offset];
                    parts.push(ValuePart::Text(Text::new(text_start, self.offset, raw)));
                }
                parts.push(ValuePart::ExpressionTag(self.parse_expression_tag()?));
                text_start = self.offset;
            } else {
                self.offset += ch.len_utf8();
            }
        }

        if self.offset > text_start {
            let raw = &self.source[text_start..self.offset];
            parts.push(ValuePart::Text(Text::new(text_start, self.offset, raw)));
        }
        Ok(parts)
    }

    fn parse_expression_tag(&mut self) -> Result<ExpressionTag, ParseError> {
        let start = self.offset;
        self.expect('{')?;
        let expression = self.read_expression()?;
        self.expect('}')?;
        Ok(ExpressionTag {
            start,
            end: self.offset,
            expression,
        })
    }

    /// A `{...}` tag in fragment position.
    fn parse_tag(&mut self) -> Result<FragmentNode, ParseError> {
        let start = self.offset;
        self.expect('{')?;
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.error(ParseErrorKind::UnexpectedEof)),
            Some('#') => {
                self.offset += 1;
                self.parse_block(start)
            }
            Some(':' | '/') => Err(ParseError::new(start, ParseErrorKind::BlockUnexpectedTag)),
            Some('@') => {
                self.offset += 1;
                self.parse_special_tag(start)
            }
            Some(_) => {
                let expression = self.read_expression()?;
                self.expect('}')?;
                Ok(FragmentNode::ExpressionTag(ExpressionTag {
                    start,
                    end: self.offset,
                    expression,
                }))
            }
        }
    }

    fn parse_special_tag(&mut self, start: usize) -> Result<FragmentNode, ParseError> {
        if self.eat_word("debug") {
            let body_start = self.offset;
            let Some(len) = scan_expression(self.remain(), &[], &[]) else {
                return Err(ParseError::new(self.source.len(), ParseErrorKind::UnexpectedEof));
            };
            let identifiers = self.source[body_start..body_start + len]
                .split(',')
                .map(str::trim)
                .filter(|ident| !ident.is_empty())
                .map(str::to_string)
                .collect();
            self.offset += len;
            self.expect('}')?;
            return Ok(FragmentNode::DebugTag(DebugTag {
                start,
                end: self.offset,
                identifiers,
            }));
        }

        let make: fn(ExpressionTag) -> FragmentNode = if self.eat_word("html") {
            FragmentNode::HtmlTag
        } else if self.eat_word("render") {
            FragmentNode::RenderTag
        } else if self.match_word("const") {
            // The declaration keeps its `const` keyword.
            FragmentNode::ConstTag
        } else {
            return Err(self.error(ParseErrorKind::ExpectedTagType));
        };

        self.skip_whitespace();
        let expression = self.read_expression()?;
        self.expect('}')?;
        Ok(make(ExpressionTag {
            start,
            end: self.offset,
            expression,
        }))
    }

    fn parse_block(&mut self, start: usize) -> Result<FragmentNode, ParseError> {
        if self.eat_word("if") {
            self.parse_if_block(start, false).map(FragmentNode::IfBlock)
        } else if self.eat_word("each") {
            self.parse_each_block(start).map(FragmentNode::EachBlock)
        } else if self.eat_word("await") {
            self.parse_await_block(start).map(FragmentNode::AwaitBlock)
        } else if self.eat_word("key") {
            self.parse_key_block(start).map(FragmentNode::KeyBlock)
        } else {
            let name = self.read_while(|c| c.is_ascii_alphabetic());
            Err(ParseError::new(
                start,
                ParseErrorKind::BlockUnsupported(name.to_string()),
            ))
        }
    }

    /// Block content up to the next `{:...}` or `{/...}` tag.
    fn parse_block_body(&mut self) -> Result<Fragment, ParseError> {
        self.depth += 1;
        let fragment = self.parse_fragment();
        self.depth -= 1;
        fragment
    }

    fn expect_block_close(&mut self, name: &str, block_start: usize) -> Result<(), ParseError> {
        let at = self.offset;
        if !self.eat_block_tag('/') {
            if self.match_block_boundary() {
                return Err(self.error(ParseErrorKind::ExpectedBlockClause(format!(
                    "`{{/{name}}}`"
                ))));
            }
            return Err(ParseError::new(
                block_start,
                ParseErrorKind::BlockUnclosed(name.to_string()),
            ));
        }

        let found = self.read_while(|c| c.is_ascii_alphabetic());
        if found != name {
            return Err(ParseError::new(
                at,
                ParseErrorKind::BlockCloseMismatch {
                    expected: name.to_string(),
                    found: found.to_string(),
                },
            ));
        }
        self.skip_whitespace();
        self.expect('}')
    }

    /// `{#if}` after the keyword. An `{:else if}` branch recurses and
    /// consumes the shared `{/if}`.
    fn parse_if_block(&mut self, start: usize, elseif: bool) -> Result<IfBlock, ParseError> {
        let test = self.read_expression()?;
        self.expect('}')?;
        let consequent = self.parse_block_body()?;

        let clause_start = self.offset;
        let mut alternate = None;
        let mut closed_by_branch = false;
        if self.eat_block_tag(':') {
            if !self.eat_word("else") {
                return Err(self.error(ParseErrorKind::ExpectedBlockClause(
                    "`{:else}` or `{:else if ...}`".to_string(),
                )));
            }
            self.skip_whitespace();
            if self.eat_word("if") {
                let branch = self.parse_if_block(clause_start, true)?;
                alternate = Some(Fragment {
                    nodes: vec![FragmentNode::IfBlock(branch)],
                });
                closed_by_branch = true;
            } else {
                self.expect('}')?;
                alternate = Some(self.parse_block_body()?);
            }
        }
        if !closed_by_branch {
            self.expect_block_close("if", start)?;
        }

        Ok(IfBlock {
            start,
            end: self.offset,
            elseif,
            test,
            consequent,
            alternate,
        })
    }

    fn parse_each_block(&mut self, start: usize) -> Result<EachBlock, ParseError> {
        let expression = self.read_expression_until(&["as"], &[])?;

        let mut context = None;
        let mut index = None;
        let mut key = None;
        if self.eat_word("as") {
            context = Some(self.read_expression_until(&[], b",(")?);
            if self.eat(',') {
                self.skip_whitespace();
                let name = self.read_while(is_identifier_char);
                if name.is_empty() {
                    return Err(self.error(ParseErrorKind::ExpectedIdentifier));
                }
                index = Some(name.to_string());
                self.skip_whitespace();
            }
            if self.eat('(') {
                key = Some(self.read_expression_until(&[], b")")?);
                self.expect(')')?;
                self.skip_whitespace();
            }
        }
        self.expect('}')?;
        let body = self.parse_block_body()?;

        let mut fallback = None;
        if self.eat_block_tag(':') {
            if !self.eat_word("else") {
                return Err(
                    self.error(ParseErrorKind::ExpectedBlockClause("`{:else}`".to_string()))
                );
            }
            self.skip_whitespace();
            self.expect('}')?;
            fallback = Some(self.parse_block_body()?);
        }
        self.expect_block_close("each", start)?;

        Ok(EachBlock {
            start,
            end: self.offset,
            expression,
            context,
            index,
            key,
            body,
            fallback,
        })
    }

    fn parse_await_block(&mut self, start: usize) -> Result<AwaitBlock, ParseError> {
        let expression = self.read_expression_until(&["then", "catch"], &[])?;
        let mut block = AwaitBlock {
            start,
            end: start,
            expression,
            value: None,
            error: None,
            pending: None,
            then: None,
            catch: None,
        };

        // `{#await p then v}` and `{#await p catch e}` skip the pending branch
        if self.eat_word("then") {
            block.value = self.read_binding()?;
            self.expect('}')?;
            block.then = Some(self.parse_block_body()?);
        } else if self.eat_word("catch") {
            block.error = self.read_binding()?;
            self.expect('}')?;
            block.catch = Some(self.parse_block_body()?);
        } else {
            self.expect('}')?;
            block.pending = Some(self.parse_block_body()?);
        }

        loop {
            let clause_start = self.offset;
            if !self.eat_block_tag(':') {
                break;
            }
            if self.eat_word("then") {
                if block.then.is_some() {
                    return Err(ParseError::new(
                        clause_start,
                        ParseErrorKind::BlockDuplicateClause("{:then}".to_string()),
                    ));
                }
                block.value = self.read_binding()?;
                self.expect('}')?;
                block.then = Some(self.parse_block_body()?);
            } else if self.eat_word("catch") {
                if block.catch.is_some() {
                    return Err(ParseError::new(
                        clause_start,
                        ParseErrorKind::BlockDuplicateClause("{:catch}".to_string()),
                    ));
                }
                block.error = self.read_binding()?;
                self.expect('}')?;
                block.catch = Some(self.parse_block_body()?);
            } else {
                return Err(self.error(ParseErrorKind::ExpectedBlockClause(
                    "`{:then ...}` or `{:catch ...}`".to_string(),
                )));
            }
        }
        self.expect_block_close("await", start)?;

        block.end = self.offset;
        Ok(block)
    }

    fn parse_key_block(&mut self, start: usize) -> Result<KeyBlock, ParseError> {
        let expression = self.read_expression()?;
        self.expect('}')?;
        let fragment = self.parse_block_body()?;
        self.expect_block_close("key", start)?;

        Ok(KeyBlock {
            start,
            end: self.offset,
            expression,
            fragment,
        })
    }

    /// Optional binding pattern before a tag's closing `}`.
    fn read_binding(&mut self) -> Result<Option<JsExpression>, ParseError> {
        self.skip_whitespace();
        if self.peek() == Some('}') {
            return Ok(None);
        }
        self.read_expression().map(Some)
    }

    /// Read a JavaScript expression up to (not including) its closing `}`.
    fn read_expression(&mut self) -> Result<JsExpression, ParseError> {
        self.read_expression_until(&[], &[])
    }

    /// Like [`read_expression`](Self::read_expression), but also stops before
    /// any of `stop_words` or `stop_chars` found outside brackets.
    fn read_expression_until(
        &mut self,
        stop_words: &[&str],
        stop_chars: &[u8],
    ) -> Result<JsExpression, ParseError> {
        let begin = self.offset;
        let Some(len) = scan_expression(self.remain(), stop_words, stop_chars) else {
            return Err(ParseError::new(self.source.len(), ParseErrorKind::UnexpectedEof));
        };
        let slice = &self.remain()[..len];
        let raw = slice.trim();
        if raw.is_empty() {
            return Err(ParseError::new(begin, ParseErrorKind::EmptyExpression));
        }
        self.offset += len;

        let start = begin + (slice.len() - slice.trim_start().len());
        Ok(JsExpression {
            start,
            end: start + raw.len(),
            raw: raw.to_string(),
        })
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '.' | '_'))
}

/// `None` when the `context` attribute has a value other than `module`.
fn script_context(attributes: &[Attribute]) -> Option<ScriptContext> {
    let mut context = ScriptContext::Default;
    for attr in attributes {
        let Attribute::Attribute(attr) = attr else {
            continue;
        };
        match attr.name.as_str() {
            "module" => context = ScriptContext::Module,
            "context" => match &attr.value {
                AttributeValue::Sequence(parts) => match parts.as_slice() {
                    [ValuePart::Text(text)] if text.data == "module" => {
                        context = ScriptContext::Module
                    }
                    _ => return None,
                },
                _ => return None,
            },
            _ => {}
        }
    }
    Some(context)
}

/// Directives whose value is a single expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    On,
    Bind,
    Class,
    Use,
    Transition { intro: bool, outro: bool },
    Animate,
    Let,
}

impl DirectiveKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "on" => Self::On,
            "bind" => Self::Bind,
            "class" => Self::Class,
            "use" => Self::Use,
            "transition" => Self::Transition {
                intro: true,
                outro: true,
            },
            "in" => Self::Transition {
                intro: true,
                outro: false,
            },
            "out" => Self::Transition {
                intro: false,
                outro: true,
            },
            "animate" => Self::Animate,
            "let" => Self::Let,
            _ => return None,
        })
    }
}

/// Split `name|mod1|mod2` into the name and its modifiers.
fn split_directive_name(
    prefix: &str,
    rest: &str,
    start: usize,
) -> Result<(String, Vec<String>), ParseError> {
    let mut segments = rest.split('|');
    let name = segments.next().unwrap_or_default();
    if name.is_empty() {
        return Err(ParseError::new(
            start,
            ParseErrorKind::DirectiveMissingName(format!("{prefix}:")),
        ));
    }
    Ok((name.to_string(), segments.map(str::to_string).collect()))
}

fn parse_style_directive(
    rest: &str,
    start: usize,
    end: usize,
    value: Option<AttributeValue>,
) -> Result<Attribute, ParseError> {
    let (name, modifiers) = split_directive_name("style", rest, start)?;
    Ok(Attribute::StyleDirective(StyleDirective {
        start,
        end,
        name,
        modifiers,
        value: value.unwrap_or(AttributeValue::True(true)),
    }))
}

fn parse_directive(
    kind: DirectiveKind,
    prefix: &str,
    rest: &str,
    start: usize,
    name_end: usize,
    end: usize,
    value: Option<AttributeValue>,
) -> Result<Attribute, ParseError> {
    let (name, modifiers) = split_directive_name(prefix, rest, start)?;

    let expression = match value {
        None if matches!(kind, DirectiveKind::Bind | DirectiveKind::Class) => {
            // `bind:value` is shorthand for `bind:value={value}`
            let name_start = start + prefix.len() + 1;
            Some(JsExpression {
                start: name_start,
                end: name_start + name.len(),
                raw: name.clone(),
            })
        }
        None => None,
        Some(AttributeValue::Expression(ValuePart::ExpressionTag(tag))) => Some(tag.expression),
        Some(AttributeValue::Sequence(parts)) => match <[ValuePart; 1]>::try_from(parts) {
            Ok([ValuePart::ExpressionTag(tag)]) => Some(tag.expression),
            _ => return Err(ParseError::new(name_end, ParseErrorKind::DirectiveInvalidValue)),
        },
        Some(_) => return Err(ParseError::new(name_end, ParseErrorKind::DirectiveInvalidValue)),
    };

    let directive = Directive {
        start,
        end,
        name,
        modifiers,
        expression,
    };
    Ok(match kind {
        DirectiveKind::On => Attribute::OnDirective(directive),
        DirectiveKind::Bind => Attribute::BindDirective(directive),
        DirectiveKind::Class => Attribute::ClassDirective(directive),
        DirectiveKind::Use => Attribute::UseDirective(directive),
        DirectiveKind::Animate => Attribute::AnimateDirective(directive),
        DirectiveKind::Let => Attribute::LetDirective(directive),
        DirectiveKind::Transition { intro, outro } => {
            let Directive {
                start,
                end,
                name,
                modifiers,
                expression,
            } = directive;
            Attribute::TransitionDirective(TransitionDirective {
                start,
                end,
                name,
                modifiers,
                expression,
                intro,
                outro,
            })
        }
    })
}

/// Source span of a node with surrounding whitespace trimmed, `None` for
/// whitespace-only text.
fn content_span(node: &FragmentNode) -> Option<(usize, usize)> {
    match node.as_text() {
        Some(text) if text.is_whitespace() => None,
        Some(text) => {
            let leading = text.raw.len() - text.raw.trim_start().len();
            let trailing = text.raw.len() - text.raw.trim_end().len();
            Some((text.start + leading, text.end - trailing))
        }
        None => Some((node.start(), node.end())),
    }
}

/// `text` starts with `word` as a whole identifier.
fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.chars().next().is_some_and(is_identifier_char))
}

/// Byte length of the expression at the head of `text`: the index of the
/// first `}` not matched by an opening bracket. Outside brackets, a byte in
/// `stop_chars` or a whitespace-preceded word in `stop_words` also ends it.
/// `None` if input runs out.
fn scan_expression(text: &str, stop_words: &[&str], stop_chars: &[u8]) -> Option<usize> {
    let bytes = text.as_bytes();
    // Open brackets; a backtick marks template-literal text.
    let mut stack: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if stack.last() == Some(&b'`') {
            match b {
                b'\\' => i += 1,
                b'`' => {
                    stack.pop();
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    stack.push(b'{');
                    i += 1;
                }
                _ => {}
            }
            i += 1;
            continue;
        }

        if stack.is_empty() {
            if stop_chars.contains(&b) {
                return Some(i);
            }
            let after_space = i > 0 && bytes[i - 1].is_ascii_whitespace();
            if after_space && stop_words.iter().any(|w| starts_with_word(&text[i..], w)) {
                return Some(i);
            }
        }

        match b {
            b'\'' | b'"' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = bytes[i..].iter().position(|&c| c == b'\n').map(|n| i + n)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..].find("*/").map(|n| i + 2 + n + 2)?;
                continue;
            }
            b'`' | b'(' | b'[' | b'{' => stack.push(b),
            b')' | b']' => {
                stack.pop();
            }
            b'}' => {
                if stack.pop().is_none() {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Index just past the string literal opening at `open`.
fn skip_string(bytes: &[u8], open: usize) -> Option<usize> {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StyleSheetChild;

    const SAMPLE: &str = "\n<script>let a = $state()</script>\n{a}\n";

    fn first_element(root: &Root) -> &Element {
        root.fragment
            .nodes
            .iter()
            .find_map(FragmentNode::as_element)
            .unwrap()
    }

    fn parse_err(source: &str) -> ParseErrorKind {
        parse(source).unwrap_err().kind
    }

    #[test]
    fn test_parse_sample_component() {
        let root = parse(SAMPLE).unwrap();

        let script = root.instance.as_ref().unwrap();
        assert_eq!(script.context, ScriptContext::Default);
        assert_eq!(script.content.raw, "let a = $state()");
        assert_eq!((script.start, script.end), (1, 34));
        assert!(root.module.is_none());

        let tag = root
            .fragment
            .nodes
            .iter()
            .find_map(FragmentNode::as_expression_tag)
            .unwrap();
        assert_eq!(tag.expression.raw, "a");
        assert_eq!((tag.start, tag.end), (35, 38));
        assert_eq!((tag.expression.start, tag.expression.end), (36, 37));

        assert_eq!((root.start, root.end), (1, 38));
    }

    #[test]
    fn test_parse_empty_source() {
        let root = parse("   \n").unwrap();
        assert!(root.fragment.nodes.is_empty());
        assert_eq!((root.start, root.end), (0, 0));
    }

    #[test]
    fn test_parse_element_with_attributes() {
        let root = parse(r#"<input type="text" disabled value={name} class="a {b}" />"#).unwrap();
        let input = first_element(&root);
        assert_eq!(input.name, "input");
        assert_eq!(input.attributes.len(), 4);

        let Attribute::Attribute(disabled) = &input.attributes[1] else {
            panic!("expected normal attribute");
        };
        assert_eq!(disabled.value, AttributeValue::True(true));

        let Attribute::Attribute(value) = &input.attributes[2] else {
            panic!("expected normal attribute");
        };
        assert!(matches!(value.value, AttributeValue::Expression(_)));

        let Attribute::Attribute(class) = &input.attributes[3] else {
            panic!("expected normal attribute");
        };
        let AttributeValue::Sequence(parts) = &class.value else {
            panic!("expected sequence");
        };
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_parse_unquoted_attribute_value() {
        let root = parse("<a href=/docs/intro>docs</a>").unwrap();
        let a = first_element(&root);
        let Attribute::Attribute(href) = &a.attributes[0] else {
            panic!("expected normal attribute");
        };
        let AttributeValue::Sequence(parts) = &href.value else {
            panic!("expected sequence");
        };
        assert!(matches!(&parts[0], ValuePart::Text(t) if t.raw == "/docs/intro"));
    }

    #[test]
    fn test_parse_shorthand_and_spread() {
        let root = parse("<div {id} {...rest}></div>").unwrap();
        let div = first_element(&root);
        assert_eq!(div.attributes[0].name(), "id");
        assert!(matches!(div.attributes[1], Attribute::SpreadAttribute(_)));
    }

    #[test]
    fn test_parse_directives() {
        let root =
            parse("<button on:click|once|preventDefault={go} bind:this class:active>go</button>")
                .unwrap();
        let button = first_element(&root);

        let Attribute::OnDirective(on) = &button.attributes[0] else {
            panic!("expected on directive");
        };
        assert_eq!(on.name, "click");
        assert_eq!(on.modifiers, vec!["once", "preventDefault"]);
        assert_eq!(on.expression.as_ref().unwrap().raw, "go");

        let Attribute::BindDirective(bind) = &button.attributes[1] else {
            panic!("expected bind directive");
        };
        assert_eq!(bind.expression.as_ref().unwrap().raw, "this");

        assert!(matches!(button.attributes[2], Attribute::ClassDirective(_)));
    }

    #[test]
    fn test_transition_directions() {
        let root = parse("<p transition:fade in:fly={{ y: 20 }} out:fade|local>x</p>").unwrap();
        let p = first_element(&root);
        let flags: Vec<(&str, bool, bool)> = p
            .attributes
            .iter()
            .map(|attr| match attr {
                Attribute::TransitionDirective(t) => (t.name.as_str(), t.intro, t.outro),
                other => panic!("expected transition, got {other:?}"),
            })
            .collect();
        assert_eq!(
            flags,
            vec![("fade", true, true), ("fly", true, false), ("fade", false, true)]
        );

        let Attribute::TransitionDirective(fly) = &p.attributes[1] else {
            unreachable!();
        };
        assert_eq!(fly.expression.as_ref().unwrap().raw, "{ y: 20 }");
        let Attribute::TransitionDirective(out) = &p.attributes[2] else {
            unreachable!();
        };
        assert_eq!(out.modifiers, vec!["local"]);
        assert!(out.expression.is_none());
    }

    #[test]
    fn test_style_directives() {
        let root =
            parse(r#"<p style:color={c} style:font-size="{size}px" style:opacity|important>x</p>"#)
                .unwrap();
        let p = first_element(&root);

        let Attribute::StyleDirective(color) = &p.attributes[0] else {
            panic!("expected style directive");
        };
        assert_eq!(color.name, "color");
        assert!(matches!(color.value, AttributeValue::Expression(_)));

        let Attribute::StyleDirective(size) = &p.attributes[1] else {
            panic!("expected style directive");
        };
        let AttributeValue::Sequence(parts) = &size.value else {
            panic!("expected sequence");
        };
        assert_eq!(parts.len(), 2);

        let Attribute::StyleDirective(opacity) = &p.attributes[2] else {
            panic!("expected style directive");
        };
        assert_eq!(opacity.modifiers, vec!["important"]);
        assert_eq!(opacity.value, AttributeValue::True(true));
        assert_eq!(p.attributes[2].name(), "opacity");
    }

    #[test]
    fn test_let_use_and_animate_directives() {
        let root = parse("<Row let:item let:index={i} use:tooltip={text} animate:flip>x</Row>")
            .unwrap();
        let row = first_element(&root);

        let Attribute::LetDirective(item) = &row.attributes[0] else {
            panic!("expected let directive");
        };
        assert_eq!(item.name, "item");
        assert!(item.expression.is_none());

        let Attribute::LetDirective(index) = &row.attributes[1] else {
            panic!("expected let directive");
        };
        assert_eq!(index.expression.as_ref().unwrap().raw, "i");

        assert!(matches!(&row.attributes[2], Attribute::UseDirective(d) if d.name == "tooltip"));
        assert!(matches!(&row.attributes[3], Attribute::AnimateDirective(d) if d.name == "flip"));
    }

    #[test]
    fn test_directive_missing_name() {
        assert_eq!(
            parse_err("<div on:={x}></div>"),
            ParseErrorKind::DirectiveMissingName("on:".to_string())
        );
    }

    #[test]
    fn test_directive_rejects_text_value() {
        assert_eq!(
            parse_err(r#"<div on:click="nope"></div>"#),
            ParseErrorKind::DirectiveInvalidValue
        );
    }

    #[test]
    fn test_parse_nested_elements_and_components() {
        let root = parse("<main><Widget.Item label=\"x\"/><p>hi <b>there</b></p></main>").unwrap();
        let main = first_element(&root);
        assert_eq!(main.fragment.nodes.len(), 2);
        assert!(matches!(main.fragment.nodes[0], FragmentNode::Component(_)));

        let p = main.fragment.nodes[1].as_element().unwrap();
        assert_eq!(p.name, "p");
        assert_eq!(p.fragment.nodes.len(), 2);
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let root = parse("<p>a<br>b</p>").unwrap();
        let p = first_element(&root);
        assert_eq!(p.fragment.nodes.len(), 3);
        assert!(p.fragment.nodes[1].as_element().unwrap().fragment.nodes.is_empty());
    }

    #[test]
    fn test_text_decodes_entities() {
        let root = parse("<p>Tom &amp; Jerry</p>").unwrap();
        let p = first_element(&root);
        let text = p.fragment.nodes[0].as_text().unwrap();
        assert_eq!(text.raw, "Tom &amp; Jerry");
        assert_eq!(text.data, "Tom & Jerry");
    }

    #[test]
    fn test_parse_comment() {
        let root = parse("<!-- note -->").unwrap();
        assert!(matches!(&root.fragment.nodes[0], FragmentNode::Comment(c) if c.data == " note "));
    }

    #[test]
    fn test_unclosed_comment() {
        assert_eq!(parse_err("<!-- note"), ParseErrorKind::UnclosedComment);
    }

    #[test]
    fn test_module_script_and_style() {
        assert_eq!(
            parse_err("<script>let x;</script><script>let y;</script>"),
            ParseErrorKind::ScriptDuplicate
        );

        let source = "<script module>export const x = 1;</script>\n<script>let y;</script>\n<style>p { color: red; }</style>";
        let root = parse(source).unwrap();
        assert_eq!(root.module.unwrap().content.raw, "export const x = 1;");
        assert_eq!(root.instance.unwrap().content.raw, "let y;");
        let css = root.css.unwrap();
        assert_eq!(css.content.raw, "p { color: red; }");
        assert_eq!(css.children.len(), 1);
        assert!(matches!(&css.children[0], StyleSheetChild::Rule(rule)
            if rule.block.children.len() == 1));
        assert_eq!((root.start, root.end), (0, source.len()));
    }

    #[test]
    fn test_invalid_script_context() {
        assert_eq!(
            parse_err(r#"<script context="server">let a;</script>"#),
            ParseErrorKind::ScriptInvalidContext
        );
    }

    #[test]
    fn test_duplicate_style() {
        assert_eq!(
            parse_err("<style></style><style></style>"),
            ParseErrorKind::StyleDuplicate
        );
    }

    #[test]
    fn test_nested_script_is_raw_text() {
        let root = parse("<svelte:head><script>if (a < b) {}</script></svelte:head>").unwrap();
        assert!(root.instance.is_none());
        let head = first_element(&root);
        let script = head.fragment.nodes[0].as_element().unwrap();
        assert_eq!(script.fragment.nodes[0].as_text().unwrap().raw, "if (a < b) {}");
    }

    #[test]
    fn test_expression_skips_strings_and_templates() {
        let root = parse(r#"{ fmt("}", `a${ {b: 1}.b }}`) }"#).unwrap();
        let tag = root.fragment.nodes[0].as_expression_tag().unwrap();
        assert_eq!(tag.expression.raw, r#"fmt("}", `a${ {b: 1}.b }}`)"#);
    }

    #[test]
    fn test_expression_skips_comments() {
        let root = parse("{a /* } */ + b}").unwrap();
        let tag = root.fragment.nodes[0].as_expression_tag().unwrap();
        assert_eq!(tag.expression.raw, "a /* } */ + b");
    }

    #[test]
    fn test_special_tags() {
        let root = parse("{@html raw}{@render row(item)}{@const double = n * 2}{@debug a, b}")
            .unwrap();
        let nodes = &root.fragment.nodes;
        assert!(matches!(&nodes[0], FragmentNode::HtmlTag(t) if t.expression.raw == "raw"));
        assert!(matches!(&nodes[1], FragmentNode::RenderTag(t) if t.expression.raw == "row(item)"));
        assert!(
            matches!(&nodes[2], FragmentNode::ConstTag(t) if t.expression.raw == "const double = n * 2")
        );
        assert!(matches!(&nodes[3], FragmentNode::DebugTag(t) if t.identifiers == vec!["a", "b"]));
    }

    #[test]
    fn test_unknown_special_tag() {
        assert_eq!(parse_err("{@nope x}"), ParseErrorKind::ExpectedTagType);
    }

    fn if_block(node: &FragmentNode) -> &IfBlock {
        match node {
            FragmentNode::IfBlock(block) => block,
            other => panic!("expected if block, got {other:?}"),
        }
    }

    #[test]
    fn test_if_block() {
        let root = parse("{#if ok}yes{/if}").unwrap();
        let block = if_block(&root.fragment.nodes[0]);
        assert_eq!(block.test.raw, "ok");
        assert!(!block.elseif);
        assert_eq!(block.consequent.nodes[0].as_text().unwrap().raw, "yes");
        assert!(block.alternate.is_none());
        assert_eq!((block.start, block.end), (0, 16));
        assert_eq!((root.start, root.end), (0, 16));
    }

    #[test]
    fn test_else_if_chain() {
        let source = "{#if a}A{:else if b}B{:else}C{/if}";
        let root = parse(source).unwrap();
        let outer = if_block(&root.fragment.nodes[0]);
        assert_eq!(outer.end, source.len());

        let alternate = outer.alternate.as_ref().unwrap();
        assert_eq!(alternate.nodes.len(), 1);
        let branch = if_block(&alternate.nodes[0]);
        assert!(branch.elseif);
        assert_eq!(branch.test.raw, "b");
        assert_eq!(branch.start, 8);
        assert_eq!(branch.end, source.len());

        let fallback = branch.alternate.as_ref().unwrap();
        assert_eq!(fallback.nodes[0].as_text().unwrap().raw, "C");
    }

    #[test]
    fn test_each_block_with_index_key_and_fallback() {
        let root = parse(
            "<ul>{#each items as item, i (item.id)}<li>{#if item.done}x{/if}</li>{:else}none{/each}</ul>",
        )
        .unwrap();
        let ul = first_element(&root);
        let FragmentNode::EachBlock(each) = &ul.fragment.nodes[0] else {
            panic!("expected each block");
        };
        assert_eq!(each.expression.raw, "items");
        assert_eq!(each.context.as_ref().unwrap().raw, "item");
        assert_eq!(each.index.as_deref(), Some("i"));
        assert_eq!(each.key.as_ref().unwrap().raw, "item.id");

        let li = each.body.nodes[0].as_element().unwrap();
        assert_eq!(if_block(&li.fragment.nodes[0]).test.raw, "item.done");

        let fallback = each.fallback.as_ref().unwrap();
        assert_eq!(fallback.nodes[0].as_text().unwrap().raw, "none");
    }

    #[test]
    fn test_each_block_destructuring_context() {
        let root = parse("{#each pairs as [k, v]}{k}={v}{/each}").unwrap();
        let FragmentNode::EachBlock(each) = &root.fragment.nodes[0] else {
            panic!("expected each block");
        };
        assert_eq!(each.context.as_ref().unwrap().raw, "[k, v]");
        assert!(each.index.is_none());
        assert_eq!(each.body.nodes.len(), 3);
    }

    #[test]
    fn test_await_block_branches() {
        let root = parse("{#await load()}wait{:then data}{data}{:catch err}fail{/await}").unwrap();
        let FragmentNode::AwaitBlock(block) = &root.fragment.nodes[0] else {
            panic!("expected await block");
        };
        assert_eq!(block.expression.raw, "load()");
        assert!(block.pending.is_some());
        assert_eq!(block.value.as_ref().unwrap().raw, "data");
        assert!(block.then.is_some());
        assert_eq!(block.error.as_ref().unwrap().raw, "err");
        assert_eq!(
            block.catch.as_ref().unwrap().nodes[0].as_text().unwrap().raw,
            "fail"
        );
    }

    #[test]
    fn test_await_block_then_shorthand() {
        let root = parse("{#await promise then value}{value}{/await}").unwrap();
        let FragmentNode::AwaitBlock(block) = &root.fragment.nodes[0] else {
            panic!("expected await block");
        };
        assert_eq!(block.expression.raw, "promise");
        assert!(block.pending.is_none());
        assert_eq!(block.value.as_ref().unwrap().raw, "value");
        assert!(block.catch.is_none());
    }

    #[test]
    fn test_await_block_duplicate_then() {
        assert_eq!(
            parse_err("{#await p}{:then a}x{:then b}y{/await}"),
            ParseErrorKind::BlockDuplicateClause("{:then}".to_string())
        );
    }

    #[test]
    fn test_key_block() {
        let root = parse("{#key id}<p>x</p>{/key}").unwrap();
        let FragmentNode::KeyBlock(block) = &root.fragment.nodes[0] else {
            panic!("expected key block");
        };
        assert_eq!(block.expression.raw, "id");
        assert_eq!(block.fragment.nodes[0].as_element().unwrap().name, "p");
    }

    #[test]
    fn test_script_inside_block_is_not_hoisted() {
        let root = parse("{#if a}<script>x</script>{/if}").unwrap();
        assert!(root.instance.is_none());
        let block = if_block(&root.fragment.nodes[0]);
        assert_eq!(block.consequent.nodes[0].as_element().unwrap().name, "script");
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse("<p>before</p>{#if a}yes").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::BlockUnclosed("if".to_string()));
        assert_eq!(err.offset, 13);

        assert_eq!(
            parse_err("<div>{#each xs as x}{x}</div>"),
            ParseErrorKind::BlockUnclosed("each".to_string())
        );
    }

    #[test]
    fn test_mismatched_block_close() {
        let err = parse("{#if a}x{/each}").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::BlockCloseMismatch {
                expected: "if".to_string(),
                found: "each".to_string(),
            }
        );
        assert_eq!(err.offset, 8);
    }

    #[test]
    fn test_stray_block_tags() {
        assert_eq!(parse_err("{/if}"), ParseErrorKind::BlockUnexpectedTag);
        assert_eq!(parse_err("text {:else}"), ParseErrorKind::BlockUnexpectedTag);
        assert_eq!(parse_err("<p>{/if}</p>"), ParseErrorKind::BlockUnexpectedTag);
    }

    #[test]
    fn test_misplaced_block_clause() {
        assert_eq!(
            parse_err("{#if a}x{:else}y{:else}z{/if}"),
            ParseErrorKind::ExpectedBlockClause("`{/if}`".to_string())
        );
        assert_eq!(
            parse_err("{#each xs}{:then}{/each}"),
            ParseErrorKind::ExpectedBlockClause("`{:else}`".to_string())
        );
    }

    #[test]
    fn test_unknown_block() {
        assert_eq!(
            parse_err("{#snippet row()}x{/snippet}"),
            ParseErrorKind::BlockUnsupported("snippet".to_string())
        );
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(parse_err("<p>{ }</p>"), ParseErrorKind::EmptyExpression);
    }

    #[test]
    fn test_unclosed_expression() {
        assert_eq!(parse_err("<p>{a</p>"), ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<div><p>text</p>").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ElementUnclosed("div".to_string()));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_mismatched_closing_tag() {
        assert_eq!(
            parse_err("<div></span>"),
            ParseErrorKind::ExpectedClosingTag {
                expected: "div".to_string(),
                found: "span".to_string(),
            }
        );
    }

    #[test]
    fn test_stray_closing_tag() {
        assert_eq!(
            parse_err("text</div>"),
            ParseErrorKind::UnexpectedClosingTag("div".to_string())
        );
    }

    #[test]
    fn test_invalid_tag_name() {
        assert_eq!(parse_err("a < b"), ParseErrorKind::TagInvalidName);
    }

    #[test]
    fn test_is_void() {
        assert!(is_void("br"));
        assert!(is_void("IMG"));
        assert!(!is_void("div"));
    }
}
