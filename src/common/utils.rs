use super::defs::{Continous, Discrete, Transition};
use crate::error::{MdpError, Result};
use ndarray::{Array1, ArrayView1};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

pub trait Weighted {
    fn p(&self) -> Continous;
}

impl Weighted for Transition {
    fn p(&self) -> Continous {
        self.probability
    }
}

/// Tolerance on the sum of a distribution.
pub const PROBABILITY_TOLERANCE: Continous = 1e-9;

/// Rejects a distribution with a probability outside [0, 1] or a sum off 1.
pub fn check_distribution(s: Discrete, a: Discrete, ts: &[Transition]) -> Result<()> {
    if let Some(t) = ts.iter().find(|t| !(0. ..=1.).contains(&t.probability)) {
        return Err(MdpError::InvalidProbability {
            state: s,
            action: a,
            probability: t.probability,
        });
    }

    let sum = ts.iter().map(|t| t.probability).sum::<Continous>();
    if (sum - 1.).abs() > PROBABILITY_TOLERANCE {
        return Err(MdpError::InvalidDistribution {
            state: s,
            action: a,
            sum,
        });
    }

    Ok(())
}

/// Draws one item in proportion to its weight. Items sharing an outcome need not be merged.
pub fn pick_next<'a, T>(rng: &mut StdRng, ts: &'a [T]) -> Result<&'a T>
where
    T: Weighted,
{
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p()))?;
    Ok(&ts[dist.sample(rng)])
}

/// Index of the largest value; ties go to the first one.
pub fn argmax<I>(xs: I) -> Discrete
where
    I: IntoIterator<Item = Continous>,
{
    xs.into_iter()
        .enumerate()
        .fold((0, Continous::NEG_INFINITY), |(bi, bv), (i, v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        })
        .0
}

pub fn one_hot(n: usize, a: Discrete) -> Array1<Continous> {
    let mut x = Array1::zeros(n);
    x[a] = 1.;
    x
}

/// ε/|A| on every action plus (1 - ε) on the greedy one.
pub fn epsilon_greedy(rng: &mut StdRng, q: ArrayView1<Continous>, epsilon: Continous) -> Discrete {
    if rng.gen::<Continous>() < epsilon {
        rng.gen_range(0..q.len())
    } else {
        argmax(q.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use ndarray::array;
    use rstest::rstest;

    struct TX {
        pub p: f64,
    }

    impl Weighted for TX {
        fn p(&self) -> f64 {
            self.p
        }
    }

    #[test]
    fn test_pick_next_seeded() {
        let items = vec![TX { p: 0.2 }, TX { p: 0.8 }];
        let counts = &mut [0usize; 2];

        let rng = &mut StdRng::seed_from_u64(2718);
        let n = 10000;
        for _ in 0..n {
            let picked = pick_next(rng, &items).unwrap();
            let i = if picked.p < 0.5 { 0 } else { 1 };
            counts[i] += 1;
        }

        assert_float_eq!(counts[0] as f64 / n as f64, 0.2, abs <= 2e-2);
        assert_float_eq!(counts[1] as f64 / n as f64, 0.8, abs <= 2e-2);
    }

    #[test]
    fn test_pick_next_rejects_all_zero() {
        let items = vec![TX { p: 0. }, TX { p: 0. }];
        let rng = &mut StdRng::seed_from_u64(1);
        assert!(pick_next(rng, &items).is_err());
    }

    #[rstest]
    #[case(vec![1., 3., 2.], 1)]
    #[case(vec![5., 5., 1.], 0)]
    #[case(vec![-1., -1., -0.5], 2)]
    #[case(vec![0., 0., 0.], 0)]
    fn test_argmax_breaks_ties_by_first_index(#[case] xs: Vec<f64>, #[case] expected: usize) {
        assert_eq!(argmax(xs), expected);
    }

    #[test]
    fn test_check_distribution_rejects_bad_sums() {
        let t = |probability| Transition {
            next_state: 0,
            probability,
            reward: 0.,
            done: false,
        };

        assert!(check_distribution(0, 0, &[t(0.5), t(0.5)]).is_ok());
        assert!(matches!(
            check_distribution(0, 0, &[t(0.5), t(0.4)]),
            Err(MdpError::InvalidDistribution { sum, .. }) if (sum - 0.9).abs() < 1e-12
        ));
        assert!(matches!(
            check_distribution(3, 1, &[t(1.2), t(-0.2)]),
            Err(MdpError::InvalidProbability { state: 3, action: 1, .. })
        ));
    }

    #[test]
    fn test_epsilon_greedy_frequencies() {
        let q = array![0., 2., 1., 0.];
        let rng = &mut StdRng::seed_from_u64(31415);
        let n = 20000;
        let greedy = (0..n)
            .filter(|_| epsilon_greedy(rng, q.view(), 0.2) == 1)
            .count();

        assert_float_eq!(greedy as f64 / n as f64, 0.85, abs <= 2e-2);
    }
}
