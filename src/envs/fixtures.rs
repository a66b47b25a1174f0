//! Small hand-written MDPs with known solutions.

use super::tabular::TabularMdp;
use crate::common::defs::*;

/// https://towardsdatascience.com/reinforcement-learning-an-easy-introduction-to-value-iteration-e4cfe0731fd5
///
/// States: 0 = fairway, 1 = green, 2 = in the hole (absorbing).
/// Actions: 0 = hit to green, 1 = hit to fairway, 2 = hit in hole.
/// Pairs the article leaves out keep the ball where it is.
pub fn simple_golf() -> TabularMdp {
    let t = |next_state, probability, reward, done| Transition {
        next_state,
        probability,
        reward,
        done,
    };

    let mut transitions = Transitions::from([
        ((0, 0), vec![t(1, 0.9, 0., false), t(0, 0.1, 0., false)]),
        ((1, 1), vec![t(0, 0.9, 0., false), t(1, 0.1, 0., false)]),
        ((1, 2), vec![t(2, 0.9, 10., true), t(1, 0.1, 0., false)]),
    ]);

    for s in 0..3 {
        for a in 0..3 {
            transitions
                .entry((s, a))
                .or_insert_with(|| vec![t(s, 1., 0., s == 2)]);
        }
    }

    TabularMdp::new("SimpleGolf", 3, 3, transitions, 0, 2718)
        .expect("golf table is complete")
}

/// 0 - 1 - 2 with 2 absorbing. Action 0 moves left, action 1 right.
/// Every move costs 1 except reaching 2, which pays 10.
pub fn chain() -> TabularMdp {
    let t = |next_state, reward, done| Transition {
        next_state,
        probability: 1.,
        reward,
        done,
    };
    let ts = Transitions::from([
        ((0, 0), vec![t(0, -1., false)]),
        ((0, 1), vec![t(1, -1., false)]),
        ((1, 0), vec![t(0, -1., false)]),
        ((1, 1), vec![t(2, 10., true)]),
        ((2, 0), vec![t(2, 0., true)]),
        ((2, 1), vec![t(2, 0., true)]),
    ]);

    TabularMdp::new("Chain", 3, 2, ts, 0, 5).expect("chain table is complete")
}

/// One decision then done. Action 0 pays 2 or 0 with equal odds, action 1
/// pays 0.5.
pub fn bandit() -> TabularMdp {
    let t = |probability, reward| Transition {
        next_state: 1,
        probability,
        reward,
        done: true,
    };
    let ts = Transitions::from([
        ((0, 0), vec![t(0.5, 2.), t(0.5, 0.)]),
        ((0, 1), vec![t(1., 0.5)]),
        ((1, 0), vec![t(1., 0.)]),
        ((1, 1), vec![t(1., 0.)]),
    ]);

    TabularMdp::new("Bandit", 2, 2, ts, 0, 31).expect("bandit table is complete")
}
