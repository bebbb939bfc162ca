//! Stylesheet parsing for the top-level `<style>` element.
//!
//! Produces rules, at-rules and declarations. Selectors are split into
//! complex, relative and simple selectors; declaration values and at-rule
//! preludes are kept as trimmed source text.

use super::Parser;
use crate::ast::{
    AtRule, Attribute, AttributeSelector, BlockChild, Combinator, ComplexSelector, CssBlock,
    Declaration, NamedSelector, PseudoClassSelector, RawContent, RelativeSelector, Rule,
    SelectorList, SelectorValue, SimpleSelector, StyleSheet, StyleSheetChild,
};
use crate::error::{ParseError, ParseErrorKind};

const COMBINATORS: &[&str] = &["||", ">", "+", "~"];
const ATTRIBUTE_MATCHERS: &[&str] = &["~=", "^=", "$=", "*=", "|=", "="];

impl Parser<'_> {
    /// Stylesheet body after `<style ...>`, up to and including `</style>`.
    pub(super) fn parse_style_sheet(
        &mut self,
        start: usize,
        attributes: Vec<Attribute>,
        self_closing: bool,
    ) -> Result<StyleSheet, ParseError> {
        let content_start = self.offset;
        let mut children = Vec::new();

        if !self_closing {
            loop {
                self.skip_css_trivia();
                if self.match_style_close() {
                    break;
                }
                if self.is_eof() {
                    return Err(ParseError::new(
                        start,
                        ParseErrorKind::ElementUnclosed("style".to_string()),
                    ));
                }
                if self.match_str("@") {
                    children.push(StyleSheetChild::AtRule(self.parse_css_at_rule()?));
                } else {
                    children.push(StyleSheetChild::Rule(self.parse_css_rule()?));
                }
            }
        }

        let content_end = self.offset;
        if !self_closing {
            self.offset += "</style".len();
            self.skip_whitespace();
            self.expect('>')?;
        }

        Ok(StyleSheet {
            start,
            end: self.offset,
            attributes,
            children,
            content: RawContent {
                start: content_start,
                end: content_end,
                raw: self.source[content_start..content_end].to_string(),
            },
        })
    }

    fn match_style_close(&self) -> bool {
        self.remain()
            .strip_prefix("</style")
            .is_some_and(|rest| rest.trim_start().starts_with('>'))
    }

    /// Whitespace, `/* */` comments and `<!-- -->` comments.
    fn skip_css_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            let close = if self.eat_str("/*") {
                "*/"
            } else if self.eat_str("<!--") {
                "-->"
            } else {
                break;
            };
            match self.remain().find(close) {
                Some(len) => self.offset += len + close.len(),
                None => self.offset = self.source.len(),
            }
        }
    }

    fn parse_css_at_rule(&mut self) -> Result<AtRule, ParseError> {
        let start = self.offset;
        self.expect('@')?;
        let name = self.parse_css_identifier()?;
        let prelude = self.parse_css_value()?;

        let block = if self.match_str("{") {
            Some(self.parse_css_block()?)
        } else {
            self.expect(';')?;
            None
        };

        Ok(AtRule {
            start,
            end: self.offset,
            name,
            prelude,
            block,
        })
    }

    fn parse_css_rule(&mut self) -> Result<Rule, ParseError> {
        let start = self.offset;
        let prelude = self.parse_selector_list(false)?;
        let block = self.parse_css_block()?;

        Ok(Rule {
            start,
            end: self.offset,
            prelude,
            block,
        })
    }

    fn parse_css_block(&mut self) -> Result<CssBlock, ParseError> {
        let start = self.offset;
        self.expect('{')?;

        let mut children = Vec::new();
        loop {
            self.skip_css_trivia();
            if self.match_str("}") || self.is_eof() {
                break;
            }
            children.push(self.parse_block_child()?);
        }
        self.expect('}')?;

        Ok(CssBlock {
            start,
            end: self.offset,
            children,
        })
    }

    /// A nested rule if a `{` comes before the next `;` or `}`, otherwise
    /// a declaration.
    fn parse_block_child(&mut self) -> Result<BlockChild, ParseError> {
        if self.match_str("@") {
            return self.parse_css_at_rule().map(BlockChild::AtRule);
        }

        let start = self.offset;
        self.parse_css_value()?;
        let is_rule = self.match_str("{");
        self.offset = start;

        if is_rule {
            self.parse_css_rule().map(BlockChild::Rule)
        } else {
            self.parse_css_declaration().map(BlockChild::Declaration)
        }
    }

    fn parse_css_declaration(&mut self) -> Result<Declaration, ParseError> {
        let start = self.offset;
        let property = self.read_while(|c| !c.is_whitespace() && c != ':');
        self.skip_whitespace();
        self.eat(':');
        let colon_end = self.offset;
        self.skip_whitespace();

        let value = self.parse_css_value()?;
        if value.is_empty() && !property.starts_with("--") {
            return Err(ParseError::new(
                colon_end,
                ParseErrorKind::CssEmptyDeclaration,
            ));
        }

        let end = self.offset;
        if !self.match_str("}") {
            self.expect(';')?;
        }

        Ok(Declaration {
            start,
            end,
            property: property.to_string(),
            value,
        })
    }

    /// Trimmed text up to the next `;`, `{` or `}` outside quotes and
    /// `url(...)`.
    fn parse_css_value(&mut self) -> Result<String, ParseError> {
        let start = self.offset;
        let mut quote = None;
        let mut in_url = false;

        for (i, ch) in self.remain().char_indices() {
            match ch {
                c if quote == Some(c) => quote = None,
                _ if quote.is_some() => {}
                '\'' | '"' => quote = Some(ch),
                '(' if self.source[..start + i].ends_with("url") => in_url = true,
                ')' => in_url = false,
                ';' | '{' | '}' if !in_url => {
                    self.offset = start + i;
                    return Ok(self.source[start..self.offset].trim().to_string());
                }
                _ => {}
            }
        }

        Err(ParseError::new(
            self.source.len(),
            ParseErrorKind::UnexpectedEof,
        ))
    }

    fn match_selector_end(&self, inside_pseudo_class: bool) -> bool {
        self.match_str(if inside_pseudo_class { ")" } else { "{" })
    }

    fn parse_selector_list(&mut self, inside_pseudo_class: bool) -> Result<SelectorList, ParseError> {
        self.skip_css_trivia();
        let start = self.offset;
        let mut children = Vec::new();

        while !self.is_eof() {
            children.push(self.parse_selector(inside_pseudo_class)?);
            let end = self.offset;
            self.skip_css_trivia();
            if self.match_selector_end(inside_pseudo_class) {
                return Ok(SelectorList {
                    start,
                    end,
                    children,
                });
            }
            self.expect(',')?;
            self.skip_css_trivia();
        }

        Err(self.error(ParseErrorKind::UnexpectedEof))
    }

    fn parse_selector(&mut self, inside_pseudo_class: bool) -> Result<ComplexSelector, ParseError> {
        let list_start = self.offset;
        let mut children = Vec::new();
        let mut relative = RelativeSelector {
            start: list_start,
            end: list_start,
            combinator: None,
            selectors: Vec::new(),
        };

        while !self.is_eof() {
            if let Some(selector) = self.parse_simple_selector(inside_pseudo_class)? {
                relative.selectors.push(selector);
            }

            let index = self.offset;
            self.skip_css_trivia();
            if self.match_selector_end(inside_pseudo_class) || self.match_str(",") {
                self.offset = index;
                relative.end = index;
                children.push(relative);
                return Ok(ComplexSelector {
                    start: list_start,
                    end: index,
                    children,
                });
            }

            self.offset = index;
            let Some(combinator) = self.parse_css_combinator() else {
                continue;
            };
            let combinator_start = combinator.start;
            if !relative.selectors.is_empty() {
                relative.end = index;
                children.push(relative);
            }
            relative = RelativeSelector {
                start: combinator_start,
                end: combinator_start,
                combinator: Some(combinator),
                selectors: Vec::new(),
            };

            self.skip_whitespace();
            if self.match_str(",") || self.match_selector_end(inside_pseudo_class) {
                return Err(self.error(ParseErrorKind::CssSelectorInvalid));
            }
        }

        Err(self.error(ParseErrorKind::UnexpectedEof))
    }

    /// `None` when a combinator comes next.
    fn parse_simple_selector(
        &mut self,
        inside_pseudo_class: bool,
    ) -> Result<Option<SimpleSelector>, ParseError> {
        let start = self.offset;

        let selector = if self.eat('&') {
            SimpleSelector::NestingSelector(named(start, self.offset, "&".to_string()))
        } else if self.eat('*') {
            let name = if !self.match_str("||") && self.eat('|') {
                self.parse_css_identifier()?
            } else {
                "*".to_string()
            };
            SimpleSelector::TypeSelector(named(start, self.offset, name))
        } else if self.eat('#') {
            let name = self.parse_css_identifier()?;
            SimpleSelector::IdSelector(named(start, self.offset, name))
        } else if self.eat('.') {
            let name = self.parse_css_identifier()?;
            SimpleSelector::ClassSelector(named(start, self.offset, name))
        } else if self.eat_str("::") {
            let name = self.parse_css_identifier()?;
            let selector = SimpleSelector::PseudoElementSelector(named(start, self.offset, name));
            // Arguments such as `::part(label)` are validated and dropped.
            if self.eat('(') {
                self.parse_selector_list(true)?;
                self.expect(')')?;
            }
            selector
        } else if self.eat(':') {
            let name = self.parse_css_identifier()?;
            let args = if self.eat('(') {
                let args = self.parse_selector_list(true)?;
                self.expect(')')?;
                Some(args)
            } else {
                None
            };
            SimpleSelector::PseudoClassSelector(PseudoClassSelector {
                start,
                end: self.offset,
                name,
                args,
            })
        } else if self.eat('[') {
            SimpleSelector::AttributeSelector(self.parse_attribute_selector(start)?)
        } else if let Some(len) = nth_len(self.remain()).filter(|_| inside_pseudo_class) {
            let value = self.remain()[..len].to_string();
            self.offset += len;
            SimpleSelector::Nth(SelectorValue {
                start,
                end: self.offset,
                value,
            })
        } else if let Some(len) = percentage_len(self.remain()) {
            let value = self.remain()[..len].to_string();
            self.offset += len;
            SimpleSelector::Percentage(SelectorValue {
                start,
                end: self.offset,
                value,
            })
        } else if COMBINATORS.iter().any(|c| self.match_str(c)) {
            return Ok(None);
        } else {
            let mut name = self.parse_css_identifier()?;
            if !self.match_str("||") && self.eat('|') {
                name = self.parse_css_identifier()?;
            }
            SimpleSelector::TypeSelector(named(start, self.offset, name))
        };

        Ok(Some(selector))
    }

    /// `[name matcher value flags]` after the opening `[`.
    fn parse_attribute_selector(&mut self, start: usize) -> Result<AttributeSelector, ParseError> {
        self.skip_whitespace();
        let name = self.parse_css_identifier()?;
        self.skip_whitespace();

        let mut matcher = None;
        let mut value = None;
        if let Some(m) = ATTRIBUTE_MATCHERS.iter().find(|m| self.match_str(m)) {
            self.offset += m.len();
            self.skip_whitespace();
            matcher = Some(m.to_string());
            value = Some(self.parse_css_attribute_value()?);
        }

        self.skip_whitespace();
        let flags = self.read_while(|c| c.is_ascii_alphabetic());
        let flags = (!flags.is_empty()).then(|| flags.to_string());
        self.skip_whitespace();
        self.expect(']')?;

        Ok(AttributeSelector {
            start,
            end: self.offset,
            name,
            matcher,
            value,
            flags,
        })
    }

    fn parse_css_attribute_value(&mut self) -> Result<String, ParseError> {
        if let Some(quote) = self.peek().filter(|&c| matches!(c, '"' | '\'')) {
            self.offset += 1;
            let value = self.read_while(|c| c != quote);
            self.expect(quote)?;
            return Ok(value.to_string());
        }
        Ok(self
            .read_while(|c| !c.is_whitespace() && c != ']')
            .to_string())
    }

    /// Explicit combinator, or `" "` when only whitespace separates two
    /// compound selectors.
    fn parse_css_combinator(&mut self) -> Option<Combinator> {
        let start = self.offset;
        self.skip_whitespace();

        let index = self.offset;
        if let Some(name) = COMBINATORS.iter().find(|c| self.match_str(c)) {
            self.offset += name.len();
            let end = self.offset;
            self.skip_whitespace();
            return Some(Combinator {
                start: index,
                end,
                name: name.to_string(),
            });
        }

        (self.offset != start).then(|| Combinator {
            start,
            end: self.offset,
            name: " ".to_string(),
        })
    }

    fn parse_css_identifier(&mut self) -> Result<String, ParseError> {
        let rest = self.remain();
        let bytes = rest.as_bytes();
        let leading_digit = match bytes {
            [b'-', b'-', ..] => true,
            [b'-', next, ..] => next.is_ascii_digit(),
            [first, ..] => first.is_ascii_digit(),
            [] => false,
        };
        if leading_digit {
            return Err(self.error(ParseErrorKind::CssExpectedIdentifier));
        }

        let mut len = 0;
        let mut chars = rest.char_indices();
        while let Some((i, ch)) = chars.next() {
            if ch == '\\' {
                // the escaped character is part of the identifier
                len = chars.next().map_or(rest.len(), |(j, c)| j + c.len_utf8());
                continue;
            }
            if !(ch.is_ascii_alphanumeric() || !ch.is_ascii() || matches!(ch, '-' | '_')) {
                break;
            }
            len = i + ch.len_utf8();
        }

        if len == 0 {
            return Err(self.error(ParseErrorKind::CssExpectedIdentifier));
        }
        self.offset += len;
        Ok(rest[..len].to_string())
    }
}

fn named(start: usize, end: usize, name: String) -> NamedSelector {
    NamedSelector { start, end, name }
}

/// Length of an `An+B` argument (`odd`, `even`, `3`, `2n + 1`, `-n+3`)
/// at the head of `text`. A trailing ` of ` is included.
fn nth_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let keyword = ["even", "odd"]
        .into_iter()
        .find(|word| super::starts_with_word(text, word));

    let len = match keyword {
        Some(word) => word.len(),
        None => {
            let mut i = 0;
            let sign = bytes.first().copied().filter(|&b| matches!(b, b'+' | b'-'));
            if sign.is_some() {
                i += 1;
            }
            let digits_start = i;
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
            let has_digits = i > digits_start;

            if bytes.get(i) == Some(&b'n') {
                i += 1;
                let mut j = i;
                while bytes.get(j).is_some_and(u8::is_ascii_whitespace) {
                    j += 1;
                }
                if matches!(bytes.get(j), Some(b'+' | b'-')) {
                    j += 1;
                    while bytes.get(j).is_some_and(u8::is_ascii_whitespace) {
                        j += 1;
                    }
                    let offset_start = j;
                    while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                        j += 1;
                    }
                    if j > offset_start {
                        i = j;
                    }
                }
            } else if !has_digits || sign == Some(b'-') {
                return None;
            }
            i
        }
    };

    let rest = &text[len..];
    let trimmed = rest.trim_start();
    if trimmed.starts_with([')', ',']) {
        return Some(len);
    }
    let after_of = trimmed.strip_prefix("of")?;
    let spaced = trimmed.len() < rest.len();
    let after = after_of.trim_start();
    (spaced && after.len() < after_of.len()).then(|| text.len() - after.len())
}

/// Length of a keyframe selector such as `50%` or `12.5%`.
fn percentage_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if i == 0 {
        return None;
    }
    if bytes.get(i) == Some(&b'.') {
        let fraction = bytes[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if fraction == 0 {
            return None;
        }
        i += 1 + fraction;
    }
    (bytes.get(i) == Some(&b'%')).then_some(i + 1)
}
