//! Fare and vehicle class policies
//!
//! An estimate is priced by a [`FarePolicy`] and labelled by a
//! [`VehicleClassPolicy`]. Both are injected through [`Pricing`] so the
//! orchestrator stays independent of the concrete tariff.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use rand::RngExt;

use crate::RideError;
use crate::config::PricingConfig;
use crate::models::{RideEstimate, RouteSummary, VehicleClass};

/// Turns a route into a price in whole currency units
pub trait FarePolicy: Send + Sync {
    fn price(&self, route: &RouteSummary) -> u64;
}

/// Picks the vehicle class offered for a route
pub trait VehicleClassPolicy: Send + Sync {
    fn select(&self, route: &RouteSummary, price: u64) -> VehicleClass;
}

/// Linear distance and time tariff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tariff {
    pub per_km: f64,
    pub per_minute: f64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            per_km: 1.5,
            per_minute: 0.5,
        }
    }
}

impl FarePolicy for Tariff {
    fn price(&self, route: &RouteSummary) -> u64 {
        let raw = route.distance_km * self.per_km + route.duration_minutes * self.per_minute;
        // f64::round rounds half away from zero
        raw.round().max(0.0) as u64
    }
}

/// Uniform over every class, independent of the route
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomClass;

impl VehicleClassPolicy for RandomClass {
    fn select(&self, _route: &RouteSummary, _price: u64) -> VehicleClass {
        let index = rand::rng().random_range(0..VehicleClass::ALL.len());
        VehicleClass::ALL[index]
    }
}

/// Always the same class
#[derive(Debug, Clone, Copy)]
pub struct FixedClass(pub VehicleClass);

impl VehicleClassPolicy for FixedClass {
    fn select(&self, _route: &RouteSummary, _price: u64) -> VehicleClass {
        self.0
    }
}

/// Economy for short trips, Standard from `standard_from_km`, Premium from
/// `premium_from_km`
#[derive(Debug, Clone, Copy)]
pub struct DistanceTiers {
    pub standard_from_km: f64,
    pub premium_from_km: f64,
}

impl VehicleClassPolicy for DistanceTiers {
    fn select(&self, route: &RouteSummary, _price: u64) -> VehicleClass {
        if route.distance_km >= self.premium_from_km {
            VehicleClass::Premium
        } else if route.distance_km >= self.standard_from_km {
            VehicleClass::Standard
        } else {
            VehicleClass::Economy
        }
    }
}

/// The fare and class policies used to quote a ride
#[derive(Clone)]
pub struct Pricing {
    fare: Arc<dyn FarePolicy>,
    vehicle: Arc<dyn VehicleClassPolicy>,
}

impl fmt::Debug for Pricing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pricing").finish_non_exhaustive()
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(Tariff::default(), RandomClass)
    }
}

impl Pricing {
    pub fn new(
        fare: impl FarePolicy + 'static,
        vehicle: impl VehicleClassPolicy + 'static,
    ) -> Self {
        Self {
            fare: Arc::new(fare),
            vehicle: Arc::new(vehicle),
        }
    }

    /// Build the policies named in the `[pricing]` section
    pub fn from_config(config: &PricingConfig) -> crate::Result<Self> {
        let tariff = Tariff {
            per_km: config.per_km,
            per_minute: config.per_minute,
        };

        let pricing = match config.vehicle_policy.as_str() {
            "random" => Self::new(tariff, RandomClass),
            "fixed" => {
                let class = VehicleClass::from_name(&config.fixed_class).ok_or_else(|| {
                    RideError::config(format!("Unknown vehicle class '{}'", config.fixed_class))
                })?;
                Self::new(tariff, FixedClass(class))
            }
            "distance" => Self::new(
                tariff,
                DistanceTiers {
                    standard_from_km: config.standard_from_km,
                    premium_from_km: config.premium_from_km,
                },
            ),
            other => {
                return Err(RideError::config(format!("Unknown vehicle policy '{other}'")));
            }
        };

        Ok(pricing)
    }

    /// Price a route and wrap it into a complete estimate
    #[must_use]
    pub fn quote(&self, route: &RouteSummary) -> RideEstimate {
        let price = self.fare.price(route);
        RideEstimate {
            vehicle_class: self.vehicle.select(route, price),
            price,
            duration_minutes: route.duration_minutes,
            distance_km: route.distance_km,
            quoted_at: Utc::now(),
        }
    }
}
