//! Property-based tests for address encoding and focus counting
//!
//! These verify the path-string round trip over plain and quoted segments
//! and that focus transitions stay paired under arbitrary enter/leave runs.

use proptest::prelude::*;
use resultsview_core::{
    flatten, unflatten, Address, ExportPlan, FocusError, FocusRefCounter, FocusTransition,
    NodeClass,
};

/// A segment with no separator and no quote
fn arb_plain_segment() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-zA-Z0-9_.() -]{1,12}").unwrap()
}

/// A quoted segment that may carry separators inside the quotes
fn arb_quoted_segment() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-zA-Z0-9/ ]{1,10}")
        .unwrap()
        .prop_map(|inner| format!("\"{}\"", inner))
}

fn arb_address() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![3 => arb_plain_segment(), 1 => arb_quoted_segment()],
        0..6,
    )
}

proptest! {
    /// Property: unflatten inverts flatten for unescaped segments
    #[test]
    fn flatten_round_trip(segments in arb_address()) {
        let flat = flatten(&segments);
        prop_assert_eq!(unflatten(&flat), Address::from(segments));
    }

    /// Property: surrounding and doubled separators never produce empty segments
    #[test]
    fn separators_never_yield_empty_segments(segments in arb_address()) {
        let padded = format!("//{}//", flatten(&segments).replace("/", "//"));
        let parsed = unflatten(&padded);
        prop_assert!(parsed.iter().all(|segment| !segment.is_empty()));
    }

    /// Property: a balanced run of enters and leaves gains and loses focus exactly once
    #[test]
    fn balanced_focus_emits_one_pair(depth in 1usize..20) {
        let mut counter = FocusRefCounter::new();
        let mut transitions = Vec::new();

        for _ in 0..depth {
            transitions.extend(counter.enter());
        }
        prop_assert!(counter.is_editing());
        for _ in 0..depth {
            transitions.extend(counter.leave().unwrap());
        }

        prop_assert_eq!(transitions, vec![FocusTransition::Gained, FocusTransition::Lost]);
        prop_assert_eq!(counter.count(), 0);
        prop_assert_eq!(counter.leave(), Err(FocusError::Underflow));
    }

    /// Property: image nodes export the image alone in every mode
    #[test]
    fn image_plan_is_image_only(rich in any::<bool>()) {
        let plan = ExportPlan::for_node(NodeClass::Image, rich);
        prop_assert!(plan.image);
        prop_assert!(!plan.text);
        prop_assert!(!plan.html);
    }
}
