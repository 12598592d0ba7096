//! Negotiation invariants.

use proptest::prelude::*;
use proptest::sample::subsequence;
use shortstack_core::negotiate::negotiate;
use shortstack_core::{Format, MimeTable};

fn declared_sets() -> impl Strategy<Value = Vec<Format>> {
    let table = MimeTable::default();
    let all: Vec<Format> = table.formats().cloned().collect();
    let len = all.len();
    subsequence(all, 1..=len).prop_shuffle()
}

proptest! {
    #[test]
    fn missing_accept_picks_first_declared(declared in declared_sets()) {
        let table = MimeTable::default();
        let picked = negotiate(&table, &declared, None, None).unwrap();
        prop_assert_eq!(&picked, &declared[0]);
    }

    #[test]
    fn full_wildcard_picks_first_declared(
        declared in declared_sets(),
        concrete in prop::sample::select(vec!["application/json", "text/html", "application/xml", "text/plain"]),
        wildcard_first in any::<bool>(),
    ) {
        let table = MimeTable::default();
        let accept = if wildcard_first {
            format!("*/*, {concrete}")
        } else {
            format!("{concrete}, */*;q=0.1")
        };
        let picked = negotiate(&table, &declared, Some(&accept), None).unwrap();
        prop_assert_eq!(&picked, &declared[0]);
    }

    #[test]
    fn explicit_format_ignores_accept(declared in declared_sets(), pick in any::<prop::sample::Index>()) {
        let table = MimeTable::default();
        let wanted = pick.get(&declared).clone();
        let picked = negotiate(&table, &declared, Some("image/png"), Some(wanted.as_str())).unwrap();
        prop_assert_eq!(picked, wanted);
    }

    #[test]
    fn result_is_always_allowed(
        declared in declared_sets(),
        accept in "[a-z*]{1,11}/[a-z*+]{1,8}(;q=0\\.[0-9])?",
    ) {
        let table = MimeTable::default();
        if let Ok(picked) = negotiate(&table, &declared, Some(&accept), None) {
            prop_assert!(declared.contains(&picked));
        }
    }
}
