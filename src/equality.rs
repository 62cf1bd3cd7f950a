//! Structural equality of schema elements
//!
//! Tables compare as unordered collections of (key, element) pairs and
//! unions as unordered member sets of equal size. Arrays compare their
//! member and constraints. Compiled regexes and resolved reference targets
//! never take part, so references compare by path and recursion cannot loop.

use crate::arena::Arena;
use crate::element::{Element, ElementId};
use crate::key::KeyMatcher;

pub(crate) fn elements_equal(
    left: &Arena,
    left_id: ElementId,
    right: &Arena,
    right_id: ElementId,
) -> bool {
    match (left.get(left_id), right.get(right_id)) {
        (Element::String(a), Element::String(b)) => a == b,
        (Element::Enum(a), Element::Enum(b)) => a == b,
        (Element::Pattern(a), Element::Pattern(b)) => a.pattern == b.pattern,
        (Element::Float(a), Element::Float(b)) => {
            same_bound(a.min, b.min) && same_bound(a.max, b.max)
        }
        (Element::Integer(a), Element::Integer(b)) => a == b,
        (Element::Boolean, Element::Boolean)
        | (Element::OffsetDateTime, Element::OffsetDateTime)
        | (Element::LocalDateTime, Element::LocalDateTime)
        | (Element::Date, Element::Date)
        | (Element::Time, Element::Time)
        | (Element::AnyValue, Element::AnyValue) => true,
        (Element::Ref(a), Element::Ref(b)) => a.path == b.path,
        (Element::File(a), Element::File(b)) => a.path == b.path,
        (Element::Table(a), Element::Table(b)) => {
            a.entries.len() == b.entries.len()
                && a.entries.iter().all(|(key_a, value_a)| {
                    b.entries.iter().any(|(key_b, value_b)| {
                        keys_equal(key_a, key_b) && elements_equal(left, *value_a, right, *value_b)
                    })
                })
        }
        (Element::Array(a), Element::Array(b)) => {
            a.min_items == b.min_items
                && a.max_items == b.max_items
                && a.unique_items == b.unique_items
                && elements_equal(left, a.member, right, b.member)
        }
        (Element::Union(a), Element::Union(b)) => {
            a.mode == b.mode
                && a.members.len() == b.members.len()
                && a.members.iter().all(|member_a| {
                    b.members
                        .iter()
                        .any(|member_b| elements_equal(left, *member_a, right, *member_b))
                })
        }
        _ => false,
    }
}

pub(crate) fn keys_equal(a: &KeyMatcher, b: &KeyMatcher) -> bool {
    a.name == b.name
        && a.required == b.required
        && a.hidden == b.hidden
        && a.pattern_source() == b.pattern_source()
        && a.reference_path() == b.reference_path()
}

/// NaN bounds are equal to each other, unlike NaN values.
fn same_bound(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y || (x.is_nan() && y.is_nan()),
        (None, None) => true,
        _ => false,
    }
}
