use goose::prelude::*;
use std::time::Duration;

use crate::behaviors::{
    assign_identity, browse_categories, browse_orders, browse_payments, browse_products_catalog,
    browse_shipping, browse_users, health_checks, intensive_browsing, manage_favourites,
};
use crate::checkout::complete_checkout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    BrowseCatalog,
    BrowseCategories,
    BrowseUsers,
    BrowseOrders,
    BrowsePayments,
    ManageFavourites,
    BrowseShipping,
    CompleteCheckout,
    HealthChecks,
    IntensiveBrowsing,
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::BrowseCatalog => "Browse product catalog",
            Behavior::BrowseCategories => "Browse categories",
            Behavior::BrowseUsers => "Browse users",
            Behavior::BrowseOrders => "Browse orders",
            Behavior::BrowsePayments => "Browse payments",
            Behavior::ManageFavourites => "Manage favourites",
            Behavior::BrowseShipping => "Browse shipping",
            Behavior::CompleteCheckout => "Complete checkout",
            Behavior::HealthChecks => "Health checks",
            Behavior::IntensiveBrowsing => "Intensive browsing",
        }
    }

    pub fn transaction(self) -> Transaction {
        let transaction = match self {
            Behavior::BrowseCatalog => transaction!(browse_products_catalog),
            Behavior::BrowseCategories => transaction!(browse_categories),
            Behavior::BrowseUsers => transaction!(browse_users),
            Behavior::BrowseOrders => transaction!(browse_orders),
            Behavior::BrowsePayments => transaction!(browse_payments),
            Behavior::ManageFavourites => transaction!(manage_favourites),
            Behavior::BrowseShipping => transaction!(browse_shipping),
            Behavior::CompleteCheckout => transaction!(complete_checkout),
            Behavior::HealthChecks => transaction!(health_checks),
            Behavior::IntensiveBrowsing => transaction!(intensive_browsing),
        };
        transaction.set_name(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseRange {
    pub min: Duration,
    pub max: Duration,
}

impl PauseRange {
    pub fn seconds(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedBehavior {
    pub behavior: Behavior,
    pub weight: usize,
}

/// A kind of simulated user: think-time plus a weighted behavior table.
/// Variants are derived by copying a base profile and overriding parts of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    /// Share of goose users running this profile, relative to other profiles.
    pub weight: usize,
    pub pause: Option<PauseRange>,
    pub behaviors: Vec<WeightedBehavior>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1,
            pause: None,
            behaviors: Vec::new(),
        }
    }

    pub fn standard() -> Self {
        Self::new("EcommerceUser")
            .with_pause(PauseRange::seconds(2, 6))
            .with_behavior(Behavior::BrowseCatalog, 10)
            .with_behavior(Behavior::BrowseCategories, 8)
            .with_behavior(Behavior::BrowseUsers, 6)
            .with_behavior(Behavior::BrowseOrders, 6)
            .with_behavior(Behavior::BrowsePayments, 4)
            .with_behavior(Behavior::ManageFavourites, 3)
            .with_behavior(Behavior::BrowseShipping, 2)
            .with_behavior(Behavior::CompleteCheckout, 1)
            .with_behavior(Behavior::HealthChecks, 2)
    }

    pub fn high_load() -> Self {
        Self::standard()
            .renamed("HighLoadUser")
            .with_pause(PauseRange::seconds(1, 3))
            .with_behavior(Behavior::IntensiveBrowsing, 15)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_weight(mut self, weight: usize) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_pause(mut self, pause: PauseRange) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Appends `behavior`, or replaces its weight if already present.
    /// A weight of zero removes it.
    pub fn with_behavior(mut self, behavior: Behavior, weight: usize) -> Self {
        if weight == 0 {
            self.behaviors.retain(|entry| entry.behavior != behavior);
        } else if let Some(entry) = self.behaviors.iter_mut().find(|e| e.behavior == behavior) {
            entry.weight = weight;
        } else {
            self.behaviors.push(WeightedBehavior { behavior, weight });
        }
        self
    }

    pub fn weight_of(&self, behavior: Behavior) -> Option<usize> {
        self.behaviors
            .iter()
            .find(|entry| entry.behavior == behavior)
            .map(|entry| entry.weight)
    }

    pub fn total_weight(&self) -> usize {
        self.behaviors.iter().map(|entry| entry.weight).sum()
    }

    /// Probability that `behavior` is picked at a scheduling point.
    pub fn share(&self, behavior: Behavior) -> f64 {
        let total = self.total_weight();
        match self.weight_of(behavior) {
            Some(weight) if total > 0 => weight as f64 / total as f64,
            _ => 0.0,
        }
    }

    pub fn into_scenario(self) -> Result<Scenario, GooseError> {
        let mut scenario = Scenario::new(&self.name)
            .set_weight(self.weight)?
            .register_transaction(
                transaction!(assign_identity)
                    .set_name("Assign identity")
                    .set_on_start(),
            );

        if let Some(pause) = self.pause {
            scenario = scenario.set_wait_time(pause.min, pause.max)?;
        }

        for entry in self.behaviors {
            scenario = scenario.register_transaction(
                entry.behavior.transaction().set_weight(entry.weight)?,
            );
        }

        Ok(scenario)
    }
}

/// Standard and high-load users with the given relative shares. Zero drops a kind.
pub fn user_kinds(standard_weight: usize, high_load_weight: usize) -> Vec<UserProfile> {
    [
        UserProfile::standard().with_weight(standard_weight),
        UserProfile::high_load().with_weight(high_load_weight),
    ]
    .into_iter()
    .filter(|profile| profile.weight > 0)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_matches_shop_traffic_mix() {
        let profile = UserProfile::standard();

        assert_eq!(profile.pause, Some(PauseRange::seconds(2, 6)));
        assert_eq!(profile.weight_of(Behavior::BrowseCatalog), Some(10));
        assert_eq!(profile.weight_of(Behavior::BrowseCategories), Some(8));
        assert_eq!(profile.weight_of(Behavior::BrowseUsers), Some(6));
        assert_eq!(profile.weight_of(Behavior::BrowseOrders), Some(6));
        assert_eq!(profile.weight_of(Behavior::BrowsePayments), Some(4));
        assert_eq!(profile.weight_of(Behavior::ManageFavourites), Some(3));
        assert_eq!(profile.weight_of(Behavior::BrowseShipping), Some(2));
        assert_eq!(profile.weight_of(Behavior::CompleteCheckout), Some(1));
        assert_eq!(profile.weight_of(Behavior::HealthChecks), Some(2));
        assert_eq!(profile.weight_of(Behavior::IntensiveBrowsing), None);
        assert_eq!(profile.total_weight(), 42);
    }

    #[test]
    fn high_load_is_a_modified_copy_of_standard() {
        let standard = UserProfile::standard();
        let high_load = UserProfile::high_load();

        assert_eq!(high_load.name, "HighLoadUser");
        assert_eq!(high_load.pause, Some(PauseRange::seconds(1, 3)));
        assert_eq!(high_load.weight_of(Behavior::IntensiveBrowsing), Some(15));
        assert_eq!(high_load.behaviors[..standard.behaviors.len()], standard.behaviors[..]);
        assert_eq!(high_load.total_weight(), 57);
        // Deriving the variant leaves the base untouched.
        assert_eq!(standard.pause, Some(PauseRange::seconds(2, 6)));
    }

    #[test]
    fn with_behavior_overrides_and_removes() {
        let profile = UserProfile::standard()
            .with_behavior(Behavior::CompleteCheckout, 5)
            .with_behavior(Behavior::HealthChecks, 0);

        assert_eq!(profile.weight_of(Behavior::CompleteCheckout), Some(5));
        assert_eq!(profile.weight_of(Behavior::HealthChecks), None);
        assert_eq!(
            profile
                .behaviors
                .iter()
                .filter(|e| e.behavior == Behavior::CompleteCheckout)
                .count(),
            1
        );
    }

    #[test]
    fn shares_follow_weights() {
        let profile = UserProfile::standard();
        assert!((profile.share(Behavior::BrowseCatalog) - 10.0 / 42.0).abs() < f64::EPSILON);
        assert_eq!(profile.share(Behavior::IntensiveBrowsing), 0.0);
        assert_eq!(UserProfile::new("Empty").share(Behavior::BrowseUsers), 0.0);
    }

    #[test]
    fn zero_weight_drops_a_user_kind() {
        let kinds = user_kinds(3, 0);
        assert_eq!(kinds.len(), 1);
        assert_eq!(kinds[0].name, "EcommerceUser");
        assert_eq!(kinds[0].weight, 3);

        assert_eq!(user_kinds(1, 1).len(), 2);
        assert!(user_kinds(0, 0).is_empty());
    }

    #[test]
    fn profiles_build_into_scenarios() {
        assert!(UserProfile::standard().into_scenario().is_ok());
        assert!(UserProfile::high_load().with_weight(4).into_scenario().is_ok());
        assert!(UserProfile::standard().with_weight(0).into_scenario().is_err());
    }
}
