// Rule and filter types, and the composed dispatch table.
//
// A rule pairs a filter (which elements it applies to) with a replacement
// function (how the element's converted content becomes Markdown). Rules are
// looked up first-match-wins; a base table and an override table are merged
// once, by name, when the engine is built.

use markup5ever_rcdom::Handle;

use super::util::is_blank;
use super::Context;
use crate::dom::tag_name;

/// Replacement function: `(converted content, element, run context) → Markdown`.
pub type Replacement = fn(&str, &Handle, &mut Context) -> String;

/// Decides which elements a rule (or keep/remove entry) applies to.
#[derive(Clone, Copy)]
pub enum Filter {
    /// Match a single tag name.
    Tag(&'static str),
    /// Match any of several tag names.
    Tags(&'static [&'static str]),
    /// Match with a predicate over the element.
    Predicate(fn(&Handle) -> bool),
}

impl Filter {
    /// Check if this filter matches an element.
    pub fn matches(&self, node: &Handle) -> bool {
        let Some(tag) = tag_name(node) else {
            return false;
        };
        match self {
            Filter::Tag(t) => tag == *t,
            Filter::Tags(tags) => tags.contains(&tag),
            Filter::Predicate(f) => f(node),
        }
    }
}

/// A conversion rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub filter: Filter,
    pub replacement: Replacement,
}

impl Rule {
    pub fn new(filter: Filter, replacement: Replacement) -> Self {
        Self {
            filter,
            replacement,
        }
    }

    /// Apply this rule's replacement.
    pub fn replace(&self, content: &str, node: &Handle, cx: &mut Context) -> String {
        (self.replacement)(content, node, cx)
    }
}

/// An ordered, named collection of rules plus keep and remove filters.
#[derive(Clone, Default)]
pub struct RuleTable {
    rules: Vec<(&'static str, Rule)>,
    keep: Vec<Filter>,
    remove: Vec<Filter>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named rule. A later rule with the same name replaces the earlier
    /// one in place.
    pub fn add(mut self, name: &'static str, rule: Rule) -> Self {
        match self.rules.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = rule,
            None => self.rules.push((name, rule)),
        }
        self
    }

    /// Keep matching elements as raw HTML.
    pub fn keep(mut self, filter: Filter) -> Self {
        self.keep.push(filter);
        self
    }

    /// Drop matching elements entirely.
    pub fn remove(mut self, filter: Filter) -> Self {
        self.remove.push(filter);
        self
    }

    /// Names of the rules in this table, in lookup order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|(name, _)| *name)
    }

    fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|(n, _)| *n == name)
    }
}

/// Outcome of rule lookup for one element.
pub enum RuleMatch<'a> {
    /// Element is blank: drop it, leaving a block gap if it is a block.
    Blank,
    Rule(&'a Rule),
    Keep,
    Remove,
    /// No rule: emit the content, padded with blank lines for blocks.
    Default,
}

/// The composed dispatch table the engine consults.
pub struct Rules {
    table: RuleTable,
}

impl Rules {
    /// Merge `overrides` over `base`: override rules are consulted first, and
    /// a base rule is dropped when an override carries the same name.
    pub fn compose(base: RuleTable, overrides: RuleTable) -> Self {
        let mut rules = overrides.rules.clone();
        rules.extend(
            base.rules
                .iter()
                .filter(|(name, _)| !overrides.contains(name))
                .copied(),
        );
        let mut keep = overrides.keep;
        keep.extend(base.keep);
        let mut remove = overrides.remove;
        remove.extend(base.remove);
        Self {
            table: RuleTable { rules, keep, remove },
        }
    }

    /// Find the rule for an element.
    pub fn for_node(&self, node: &Handle) -> RuleMatch<'_> {
        if is_blank(node) {
            return RuleMatch::Blank;
        }
        if let Some((_, rule)) = self.table.rules.iter().find(|(_, r)| r.filter.matches(node)) {
            return RuleMatch::Rule(rule);
        }
        if self.table.keep.iter().any(|f| f.matches(node)) {
            return RuleMatch::Keep;
        }
        if self.table.remove.iter().any(|f| f.matches(node)) {
            return RuleMatch::Remove;
        }
        RuleMatch::Default
    }

    /// Rule names in lookup order.
    pub fn names(&self) -> Vec<&'static str> {
        self.table.names().collect()
    }
}
