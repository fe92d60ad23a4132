//! Strategy resolution by name.

use crate::load_balancer::{
    round_robin::{RoundRobin, UncheckedRoundRobin},
    weighted::WeightedRoundRobin,
    BalancingStrategy,
};

/// Known balancing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    RoundRobin,
    WeightedRoundRobin,
    /// Legacy lock-free round-robin that never checks liveness.
    UncheckedRoundRobin,
}

impl StrategyKind {
    /// Resolve a configured strategy name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RoundRobin" => Some(Self::RoundRobin),
            "WeightedRoundRobin" => Some(Self::WeightedRoundRobin),
            "UncheckedRoundRobin" => Some(Self::UncheckedRoundRobin),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RoundRobin => "RoundRobin",
            Self::WeightedRoundRobin => "WeightedRoundRobin",
            Self::UncheckedRoundRobin => "UncheckedRoundRobin",
        }
    }

    /// Construct a fresh strategy instance with its own counters.
    pub fn build(self) -> Box<dyn BalancingStrategy> {
        match self {
            Self::RoundRobin => Box::new(RoundRobin::new()),
            Self::WeightedRoundRobin => Box::new(WeightedRoundRobin::new()),
            Self::UncheckedRoundRobin => Box::new(UncheckedRoundRobin::new()),
        }
    }
}

/// Build the strategy named `name`, falling back to round-robin when the name
/// is empty or unknown.
pub fn load_strategy(name: &str) -> Box<dyn BalancingStrategy> {
    match StrategyKind::from_name(name) {
        Some(kind) => kind.build(),
        None => {
            tracing::warn!(
                strategy = %name,
                fallback = StrategyKind::RoundRobin.name(),
                "Unknown balancing strategy, falling back"
            );
            StrategyKind::RoundRobin.build()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_known_strategies() {
        assert_eq!(load_strategy("RoundRobin").name(), "RoundRobin");
        assert_eq!(load_strategy("WeightedRoundRobin").name(), "WeightedRoundRobin");
        assert_eq!(load_strategy("UncheckedRoundRobin").name(), "UncheckedRoundRobin");
    }

    #[test]
    fn test_unknown_or_empty_falls_back_to_round_robin() {
        assert_eq!(load_strategy("LeastConnections").name(), "RoundRobin");
        assert_eq!(load_strategy("roundrobin").name(), "RoundRobin");
        assert_eq!(load_strategy("").name(), "RoundRobin");
    }

    #[test]
    fn test_name_round_trips() {
        for kind in [
            StrategyKind::RoundRobin,
            StrategyKind::WeightedRoundRobin,
            StrategyKind::UncheckedRoundRobin,
        ] {
            assert_eq!(StrategyKind::from_name(kind.name()), Some(kind));
        }
    }
}
