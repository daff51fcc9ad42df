//! Locale-style ordering of child ids

use autoexport_core::Node;
use feruca::{Collator, Tailoring};
use std::cell::RefCell;
use std::cmp::Ordering;

thread_local! {
    // CLDR root collation, punctuation non-ignorable, ties broken by code point
    static COLLATOR: RefCell<Collator> =
        RefCell::new(Collator::new(Tailoring::default(), false, true));
}

/// Compare strings with the Unicode root collation
///
/// Accented letters sort with their base letter, case only breaks ties
/// (lowercase first) and punctuation keeps its collation weight, so `_`
/// sorts before `.`. Strings that collate equal are ordered by code point,
/// which keeps the order total.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| collator.borrow_mut().collate(a, b))
}

/// Default comparator: locale order of node ids
pub fn default_compare(a: &Node, b: &Node) -> Ordering {
    locale_compare(a.id(), b.id())
}
