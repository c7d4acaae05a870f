// tests/serializer_properties.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use proptest::prelude::*;
use stylewatch::engine::{BuildSerializer, BuildState, BuildTicket, CompletionOutcome, RequestOutcome};
use stylewatch::watch::plan_reconcile;

#[derive(Debug, Clone, Copy)]
enum Op {
    Request,
    Complete,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![3 => Just(Op::Request), 1 => Just(Op::Complete)]
}

proptest! {
    /// Replays random request/complete interleavings and checks the
    /// serializer against a simple model: at most one build in flight, and
    /// every request is followed by a build that starts after it.
    #[test]
    fn at_most_one_in_flight_and_no_lost_request(ops in proptest::collection::vec(op_strategy(), 1..200)) {
        let mut s = BuildSerializer::new();
        let mut in_flight: Option<u64> = None;
        // Requests not yet covered by a build that started after them.
        let mut uncovered = 0usize;
        let mut last_seq = 0u64;

        for op in ops {
            match op {
                Op::Request => match s.request() {
                    RequestOutcome::Dispatch(t) => {
                        prop_assert!(in_flight.is_none());
                        prop_assert_eq!(t.seq, last_seq + 1);
                        last_seq = t.seq;
                        in_flight = Some(t.seq);
                    }
                    RequestOutcome::Coalesced | RequestOutcome::AlreadyPending => {
                        prop_assert!(in_flight.is_some());
                        uncovered += 1;
                    }
                },
                Op::Complete => {
                    let Some(seq) = in_flight else { continue };
                    match s.complete(BuildTicket { seq }) {
                        CompletionOutcome::Rerun(next) => {
                            prop_assert!(uncovered > 0);
                            prop_assert_eq!(next.seq, seq + 1);
                            last_seq = next.seq;
                            in_flight = Some(next.seq);
                            uncovered = 0;
                        }
                        CompletionOutcome::Idle => {
                            prop_assert_eq!(uncovered, 0);
                            in_flight = None;
                        }
                        CompletionOutcome::Stale => {
                            prop_assert!(false, "in-flight ticket reported stale");
                        }
                    }
                }
            }

            let expected = match (in_flight, uncovered) {
                (None, _) => BuildState::Idle,
                (Some(_), 0) => BuildState::Running,
                (Some(_), _) => BuildState::RunningWithPendingRerun,
            };
            prop_assert_eq!(s.state(), expected);
        }
    }

    /// Applying a reconcile plan to the current set always yields the target.
    #[test]
    fn reconcile_plan_converges(
        current in proptest::collection::btree_set("[a-e]{1,2}", 0..8),
        target in proptest::collection::btree_set("[a-e]{1,2}", 0..8),
    ) {
        let current: BTreeSet<PathBuf> = current.into_iter().map(PathBuf::from).collect();
        let target: BTreeSet<PathBuf> = target.into_iter().map(PathBuf::from).collect();

        let plan = plan_reconcile(&current, &target);
        let mut applied = current.clone();
        for p in &plan.removed {
            prop_assert!(applied.remove(p));
        }
        for p in &plan.added {
            prop_assert!(applied.insert(p.clone()));
        }
        prop_assert_eq!(applied, target);
    }
}

#[test]
fn n_requests_during_a_build_give_exactly_one_more() {
    for n in 1..20 {
        let mut s = BuildSerializer::new();
        let RequestOutcome::Dispatch(first) = s.request() else {
            panic!("expected dispatch");
        };
        for _ in 0..n {
            s.request();
        }
        let CompletionOutcome::Rerun(second) = s.complete(first) else {
            panic!("expected exactly one rerun for n={n}");
        };
        assert_eq!(s.complete(second), CompletionOutcome::Idle);
        assert_eq!(s.dispatched(), 2);
    }
}
