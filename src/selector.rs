//! CSS selector support for page role lookup.
//!
//! Selectors are parsed with the `selectors` crate and matched against the
//! html5ever reference DOM through [`ElementRef`]. Pseudo-classes and
//! pseudo-elements are rejected at parse time; roles are plain element queries.

use cssparser::{Parser, ParserInput, ToCss};
use markup5ever_rcdom::{Handle, NodeData};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::context::QuirksMode;
use selectors::matching::{
    matches_selector, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
    NeedsSelectorFlags, SelectorCaches,
};
use selectors::parser::{ParseRelative, SelectorImpl, SelectorList, SelectorParseErrorKind};
use selectors::{Element, OpaqueElement};
use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Selector implementation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSelectorImpl;

impl SelectorImpl for PageSelectorImpl {
    type ExtraMatchingData<'a> = ();
    type AttrValue = SelectorString;
    type Identifier = SelectorString;
    type LocalName = SelectorString;
    type NamespacePrefix = SelectorString;
    type NamespaceUrl = SelectorString;
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = str;

    type NonTSPseudoClass = PseudoClass;
    type PseudoElement = PseudoElement;
}

/// String atom handed to the selectors crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorString(pub String);

impl From<&str> for SelectorString {
    fn from(s: &str) -> Self {
        SelectorString(s.to_string())
    }
}

impl Borrow<str> for SelectorString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl ToCss for SelectorString {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(&self.0)
    }
}

impl precomputed_hash::PrecomputedHash for SelectorString {
    fn precomputed_hash(&self) -> u32 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish() as u32
    }
}

/// No pseudo-classes are accepted in role selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {}

impl selectors::parser::NonTSPseudoClass for PseudoClass {
    type Impl = PageSelectorImpl;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl ToCss for PseudoClass {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = PageSelectorImpl;
}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

struct RoleSelectorParser;

impl<'i> selectors::parser::Parser<'i> for RoleSelectorParser {
    type Impl = PageSelectorImpl;
    type Error = SelectorParseErrorKind<'i>;
}

// ============================================================================
// Parsing and matching
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector {:?}: {}", self.selector, self.reason)
    }
}

impl std::error::Error for SelectorError {}

pub fn parse_selector(raw: &str) -> Result<SelectorList<PageSelectorImpl>, SelectorError> {
    let mut input = ParserInput::new(raw);
    let mut parser = Parser::new(&mut input);
    SelectorList::parse(&RoleSelectorParser, &mut parser, ParseRelative::No).map_err(|e| {
        SelectorError {
            selector: raw.to_string(),
            reason: format!("{:?}", e.kind),
        }
    })
}

pub fn matches(list: &SelectorList<PageSelectorImpl>, element: &ElementRef) -> bool {
    let mut caches = SelectorCaches::default();
    let mut context = MatchingContext::new(
        MatchingMode::Normal,
        None,
        &mut caches,
        QuirksMode::NoQuirks,
        NeedsSelectorFlags::No,
        MatchingForInvalidation::No,
    );
    list.slice()
        .iter()
        .any(|selector| matches_selector(selector, 0, None, element, &mut context))
}

// ============================================================================
// Element adapter
// ============================================================================

pub(crate) fn is_element(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Element { .. })
}

pub(crate) fn parent_handle(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    handle.parent.set(weak);
    parent
}

/// A DOM element as seen by the selector matcher.
#[derive(Clone)]
pub struct ElementRef {
    handle: Handle,
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle.data {
            NodeData::Element { name, .. } => write!(f, "<{}>", &*name.local),
            _ => write!(f, "<#node>"),
        }
    }
}

impl ElementRef {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    fn attr(&self, name: &str) -> Option<String> {
        match &self.handle.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| &*a.name.local == name)
                .map(|a| String::from(&*a.value)),
            _ => None,
        }
    }

    fn local_name(&self) -> Option<&str> {
        match &self.handle.data {
            NodeData::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    fn sibling_elements(&self) -> Option<(Vec<Handle>, usize)> {
        let parent = parent_handle(&self.handle)?;
        let siblings: Vec<Handle> = parent
            .children
            .borrow()
            .iter()
            .filter(|c| is_element(c))
            .cloned()
            .collect();
        let idx = siblings.iter().position(|c| Rc::ptr_eq(c, &self.handle))?;
        Some((siblings, idx))
    }
}

fn eq_case(actual: &str, expected: &str, case_sensitivity: CaseSensitivity) -> bool {
    match case_sensitivity {
        CaseSensitivity::CaseSensitive => actual == expected,
        CaseSensitivity::AsciiCaseInsensitive => actual.eq_ignore_ascii_case(expected),
    }
}

impl Element for ElementRef {
    type Impl = PageSelectorImpl;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(&*self.handle)
    }

    fn parent_element(&self) -> Option<Self> {
        parent_handle(&self.handle)
            .filter(is_element)
            .map(ElementRef::new)
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let (siblings, idx) = self.sibling_elements()?;
        idx.checked_sub(1)
            .map(|prev| ElementRef::new(siblings[prev].clone()))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let (siblings, idx) = self.sibling_elements()?;
        siblings.get(idx + 1).cloned().map(ElementRef::new)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.handle
            .children
            .borrow()
            .iter()
            .find(|c| is_element(c))
            .cloned()
            .map(ElementRef::new)
    }

    fn is_html_element_in_html_document(&self) -> bool {
        match &self.handle.data {
            NodeData::Element { name, .. } => &*name.ns == crate::dom::HTML_NAMESPACE,
            _ => false,
        }
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.local_name().is_some_and(|tag| tag.eq_ignore_ascii_case(local_name))
    }

    fn has_namespace(&self, ns: &str) -> bool {
        match &self.handle.data {
            NodeData::Element { name, .. } => ns.is_empty() || &*name.ns == ns,
            _ => false,
        }
    }

    fn is_same_type(&self, other: &Self) -> bool {
        match (&self.handle.data, &other.handle.data) {
            (NodeData::Element { name: a, .. }, NodeData::Element { name: b, .. }) => a == b,
            _ => false,
        }
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&SelectorString>,
        local_name: &SelectorString,
        operation: &AttrSelectorOperation<&SelectorString>,
    ) -> bool {
        if let NamespaceConstraint::Specific(url) = ns {
            if !url.0.is_empty() {
                return false;
            }
        }
        let Some(actual) = self.attr(&local_name.0) else {
            return false;
        };
        match operation {
            AttrSelectorOperation::Exists => true,
            AttrSelectorOperation::WithValue {
                operator,
                case_sensitivity,
                value,
            } => operator.eval_str(&actual, value.0.as_str(), *case_sensitivity),
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        pseudo: &PseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pseudo {}
    }

    fn match_pseudo_element(
        &self,
        pseudo: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pseudo {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.attr("href").is_some()
            && self
                .local_name()
                .is_some_and(|t| matches!(t, "a" | "area" | "link"))
    }

    fn is_html_slot_element(&self) -> bool {
        self.local_name() == Some("slot")
    }

    fn has_id(&self, id: &SelectorString, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("id")
            .is_some_and(|actual| eq_case(&actual, &id.0, case_sensitivity))
    }

    fn has_class(&self, class: &SelectorString, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("class").is_some_and(|classes| {
            classes
                .split_ascii_whitespace()
                .any(|c| eq_case(c, &class.0, case_sensitivity))
        })
    }

    fn has_custom_state(&self, _name: &SelectorString) -> bool {
        false
    }

    fn imported_part(&self, _name: &SelectorString) -> Option<SelectorString> {
        None
    }

    fn is_part(&self, _name: &SelectorString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self.handle.children.borrow().iter().any(|c| match &c.data {
            NodeData::Element { .. } => true,
            NodeData::Text { contents } => !contents.borrow().is_empty(),
            _ => false,
        })
    }

    fn is_root(&self) -> bool {
        parent_handle(&self.handle).is_some_and(|p| matches!(p.data, NodeData::Document))
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_compound_and_complex_selectors() {
        assert!(parse_selector("#stats").is_ok());
        assert!(parse_selector("nav a").is_ok());
        assert!(parse_selector("header > nav.main[aria-label]").is_ok());
        assert!(parse_selector("a[href='#stats-section']").is_ok());
    }

    #[test]
    fn test_rejects_pseudo_classes_and_garbage() {
        assert!(parse_selector("a:hover").is_err());
        assert!(parse_selector("##").is_err());
        let err = parse_selector("div[").unwrap_err();
        assert_eq!(err.selector, "div[");
    }
}
