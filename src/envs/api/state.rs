use crate::common::defs::Discrete;
use crate::error::MdpError;
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! factor {
    ($name:ident, $factor:literal, [$($level:ident),+ $(,)?]) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($level),+
        }

        impl $name {
            /// Levels in enumeration order.
            pub const ALL: &'static [$name] = &[$($name::$level),+];

            pub const FACTOR: &'static str = $factor;

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$level => stringify!($level)),+
                }
            }

            pub fn index(&self) -> usize {
                *self as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = MdpError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .find(|x| x.label() == s)
                    .copied()
                    .ok_or_else(|| MdpError::UnknownState(s.to_string()))
            }
        }
    };
}

factor!(Availability, "availability", [Offline, Available]);
factor!(Speed, "speed", [Slow, Medium, Fast]);
factor!(Health, "health", [Healthy, Overloaded, Error]);
factor!(Capacity, "capacity", [Low, Medium, High]);

/// Operational condition of the service. Label form: `Available_Fast_Healthy_High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct State {
    pub availability: Availability,
    pub speed: Speed,
    pub health: Health,
    pub capacity: Capacity,
}

impl State {
    pub const COUNT: usize = 2 * 3 * 3 * 3;

    pub fn new(
        availability: Availability,
        speed: Speed,
        health: Health,
        capacity: Capacity,
    ) -> Self {
        Self {
            availability,
            speed,
            health,
            capacity,
        }
    }

    /// Every state, ordered by index.
    pub fn all() -> Vec<State> {
        iproduct!(Availability::ALL, Speed::ALL, Health::ALL, Capacity::ALL)
            .map(|(&a, &s, &h, &c)| State::new(a, s, h, c))
            .collect()
    }

    pub fn index(&self) -> Discrete {
        let n_s = Speed::ALL.len();
        let n_h = Health::ALL.len();
        let n_c = Capacity::ALL.len();

        ((self.availability.index() * n_s + self.speed.index()) * n_h + self.health.index()) * n_c
            + self.capacity.index()
    }

    pub fn from_index(i: Discrete) -> Option<State> {
        if i >= Self::COUNT {
            return None;
        }

        let n_s = Speed::ALL.len();
        let n_h = Health::ALL.len();
        let n_c = Capacity::ALL.len();

        Some(State::new(
            Availability::ALL[i / (n_c * n_h * n_s)],
            Speed::ALL[i / (n_c * n_h) % n_s],
            Health::ALL[i / n_c % n_h],
            Capacity::ALL[i % n_c],
        ))
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.availability, self.speed, self.health, self.capacity
        )
    }
}

impl FromStr for State {
    type Err = MdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || MdpError::UnknownState(s.to_string());

        let parts = s.split('_').collect::<Vec<_>>();
        if parts.len() != 4 {
            return Err(unknown());
        }

        Ok(State::new(
            parts[0].parse().map_err(|_| unknown())?,
            parts[1].parse().map_err(|_| unknown())?,
            parts[2].parse().map_err(|_| unknown())?,
            parts[3].parse().map_err(|_| unknown())?,
        ))
    }
}

impl TryFrom<String> for State {
    type Error = MdpError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<State> for String {
    fn from(s: State) -> Self {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn test_enumeration_has_54_states() {
        assert_eq!(State::all().len(), State::COUNT);
        assert_eq!(State::COUNT, 54);
    }

    #[test]
    fn test_index_round_trip() {
        for (i, s) in State::all().into_iter().enumerate() {
            assert_eq!(s.index(), i);
            assert_eq!(State::from_index(s.index()), Some(s));
        }
    }

    #[test]
    fn test_index_is_injective() {
        let indices = State::all()
            .iter()
            .map(|s| s.index())
            .collect::<HashSet<_>>();
        assert_eq!(indices.len(), State::COUNT);
        assert_eq!(State::from_index(State::COUNT), None);
    }

    #[rstest]
    #[case("Offline_Slow_Healthy_Low", 0)]
    #[case("Offline_Slow_Error_Medium", 7)]
    #[case("Available_Fast_Healthy_High", 47)]
    #[case("Available_Fast_Error_High", 53)]
    fn test_labels_map_to_reference_indices(#[case] label: &str, #[case] index: usize) {
        let s = label.parse::<State>().unwrap();
        assert_eq!(s.index(), index);
        assert_eq!(s.label(), label);
    }

    #[test]
    fn test_label_formatting() {
        let s = State::new(
            Availability::Available,
            Speed::Medium,
            Health::Overloaded,
            Capacity::Low,
        );
        insta::assert_snapshot!(s.label(), @"Available_Medium_Overloaded_Low");
    }

    #[rstest]
    #[case("Available_Fast_Healthy")]
    #[case("Available_Fast_Healthy_High_Extra")]
    #[case("Online_Fast_Healthy_High")]
    #[case("")]
    fn test_bad_labels_are_rejected(#[case] label: &str) {
        assert!(matches!(
            label.parse::<State>(),
            Err(MdpError::UnknownState(_))
        ));
    }

    #[test]
    fn test_serde_uses_labels() {
        let s: State = serde_json::from_str("\"Offline_Slow_Error_Medium\"").unwrap();
        assert_eq!(s.index(), 7);
        assert_eq!(
            serde_json::to_string(&s).unwrap(),
            "\"Offline_Slow_Error_Medium\""
        );
    }
}
