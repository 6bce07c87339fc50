//! Ride session actor
//!
//! A session owns the pickup and destination fields and the estimate
//! orchestrator. User actions and provider responses arrive as
//! [`SessionEvent`]s on one channel and are applied strictly one at a time, so
//! no state is ever shared between tasks. Provider calls run as spawned tasks
//! that post their tagged result back to the same channel. After every event
//! the full [`SessionSnapshot`] is published on a watch channel.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::RideError;
use crate::config::RideConfig;
use crate::error::{GeocodeError, RouteError, SuggestionError, WeatherError};
use crate::estimate::{EstimateCommand, EstimateOrchestrator, EstimatePanel, WeatherPanel};
use crate::models::{Coordinate, FieldRole, RouteSummary, Suggestion, WeatherSnapshot};
use crate::pricing::Pricing;
use crate::providers::{Providers, bounded};
use crate::resolution::{FieldView, GeocodeLookup, LocationField, RequestToken, SuggestionLookup};

/// Everything that can change a session's state
#[derive(Debug, Clone)]
pub enum SessionEvent {
    TextChanged {
        role: FieldRole,
        text: String,
    },
    SuggestionSelected {
        role: FieldRole,
        description: String,
    },
    SuggestionsArrived {
        role: FieldRole,
        token: RequestToken,
        result: Result<Vec<Suggestion>, SuggestionError>,
    },
    GeocodeArrived {
        role: FieldRole,
        token: RequestToken,
        result: Result<Coordinate, GeocodeError>,
    },
    RouteArrived {
        token: RequestToken,
        result: Result<RouteSummary, RouteError>,
    },
    WeatherArrived {
        token: RequestToken,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

/// Everything a presentation layer needs to render a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub pickup: FieldView,
    pub destination: FieldView,
    pub estimate: EstimatePanel,
    pub weather: WeatherPanel,
}

impl SessionSnapshot {
    #[must_use]
    pub fn field(&self, role: FieldRole) -> &FieldView {
        match role {
            FieldRole::Pickup => &self.pickup,
            FieldRole::Destination => &self.destination,
        }
    }
}

/// The actor state; only ever touched by the session task
pub struct RideSession {
    pickup: LocationField,
    destination: LocationField,
    orchestrator: EstimateOrchestrator,
    providers: Providers,
    events: mpsc::WeakUnboundedSender<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl RideSession {
    /// Start a session on the current tokio runtime
    pub fn spawn(providers: Providers, pricing: Pricing, min_query_chars: usize) -> SessionHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let pickup = LocationField::with_min_query_chars(FieldRole::Pickup, min_query_chars);
        let destination =
            LocationField::with_min_query_chars(FieldRole::Destination, min_query_chars);
        let orchestrator = EstimateOrchestrator::new(pricing);

        let initial = SessionSnapshot {
            pickup: pickup.view(),
            destination: destination.view(),
            estimate: orchestrator.estimate().clone(),
            weather: orchestrator.weather().clone(),
        };
        let (snapshots_tx, snapshots_rx) = watch::channel(initial);

        let session = Self {
            pickup,
            destination,
            orchestrator,
            providers,
            events: events_tx.downgrade(),
            snapshots: snapshots_tx,
        };
        tokio::spawn(session.run(events_rx));

        SessionHandle {
            events: events_tx,
            snapshots: snapshots_rx,
        }
    }

    /// Start a session with the HTTP providers and pricing from configuration
    pub fn spawn_from_config(config: &RideConfig) -> crate::Result<SessionHandle> {
        let providers = Providers::from_config(config)?;
        let pricing = Pricing::from_config(&config.pricing)?;
        let min_query_chars = usize::try_from(config.places.min_query_chars).unwrap_or(1);
        Ok(Self::spawn(providers, pricing, min_query_chars))
    }

    async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        info!("Ride session started");
        while let Some(event) = events.recv().await {
            self.apply(event);
            self.snapshots.send_replace(self.snapshot());
        }
        info!("Ride session ended");
    }

    fn field_mut(&mut self, role: FieldRole) -> &mut LocationField {
        match role {
            FieldRole::Pickup => &mut self.pickup,
            FieldRole::Destination => &mut self.destination,
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TextChanged { role, text } => {
                if let Some(lookup) = self.field_mut(role).on_text_changed(text) {
                    self.fetch_suggestions(role, lookup);
                }
                self.sync_estimate();
            }
            SessionEvent::SuggestionSelected { role, description } => {
                if let Some(lookup) = self.field_mut(role).on_suggestion_selected(&description) {
                    self.fetch_coordinate(role, lookup);
                }
            }
            SessionEvent::SuggestionsArrived {
                role,
                token,
                result,
            } => {
                self.field_mut(role).on_suggestions_received(token, result);
            }
            SessionEvent::GeocodeArrived {
                role,
                token,
                result,
            } => {
                if self.field_mut(role).on_geocode_received(token, result) {
                    self.sync_estimate();
                }
            }
            SessionEvent::RouteArrived { token, result } => {
                self.orchestrator.on_route_received(token, result);
            }
            SessionEvent::WeatherArrived { token, result } => {
                self.orchestrator.on_weather_received(token, result);
            }
        }
    }

    fn sync_estimate(&mut self) {
        let commands = self
            .orchestrator
            .sync(self.pickup.resolved(), self.destination.resolved());

        for command in commands {
            match command {
                EstimateCommand::FetchRoute {
                    token,
                    origin,
                    destination,
                } => self.fetch_route(token, origin, destination),
                EstimateCommand::FetchWeather { token, at } => self.fetch_weather(token, at),
            }
        }
    }

    fn fetch_suggestions(&self, role: FieldRole, lookup: SuggestionLookup) {
        let provider = self.providers.suggestions.clone();
        let limit = self.providers.deadlines.suggestions;
        self.dispatch(async move {
            let result = bounded(limit, provider.suggest(&lookup.text)).await;
            SessionEvent::SuggestionsArrived {
                role,
                token: lookup.token,
                result,
            }
        });
    }

    fn fetch_coordinate(&self, role: FieldRole, lookup: GeocodeLookup) {
        let provider = self.providers.geocoder.clone();
        let limit = self.providers.deadlines.geocode;
        self.dispatch(async move {
            let result = bounded(limit, provider.geocode(&lookup.description)).await;
            SessionEvent::GeocodeArrived {
                role,
                token: lookup.token,
                result,
            }
        });
    }

    fn fetch_route(&self, token: RequestToken, origin: Coordinate, destination: Coordinate) {
        let provider = self.providers.router.clone();
        let limit = self.providers.deadlines.route;
        self.dispatch(async move {
            let result = bounded(limit, provider.route(origin, destination)).await;
            SessionEvent::RouteArrived { token, result }
        });
    }

    fn fetch_weather(&self, token: RequestToken, at: Coordinate) {
        let provider = self.providers.weather.clone();
        let limit = self.providers.deadlines.weather;
        self.dispatch(async move {
            let result = bounded(limit, provider.weather(at)).await;
            SessionEvent::WeatherArrived { token, result }
        });
    }

    /// Run a provider call in the background and post its result back
    fn dispatch<F>(&self, call: F)
    where
        F: Future<Output = SessionEvent> + Send + 'static,
    {
        // No strong sender left means every handle is gone and the session is ending
        let Some(events) = self.events.upgrade() else {
            return;
        };

        tokio::spawn(async move {
            let event = call.await;
            if events.send(event).is_err() {
                debug!("Session closed before a provider answered");
            }
        });
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pickup: self.pickup.view(),
            destination: self.destination.view(),
            estimate: self.orchestrator.estimate().clone(),
            weather: self.orchestrator.weather().clone(),
        }
    }
}

/// Cheap, cloneable handle to a running session.
///
/// The session stops once every handle is dropped and in-flight provider
/// calls have finished.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// The user edited a field
    pub fn type_text(&self, role: FieldRole, text: impl Into<String>) -> crate::Result<()> {
        self.send(SessionEvent::TextChanged {
            role,
            text: text.into(),
        })
    }

    /// The user accepted one of a field's suggestions
    pub fn select_suggestion(
        &self,
        role: FieldRole,
        description: impl Into<String>,
    ) -> crate::Result<()> {
        self.send(SessionEvent::SuggestionSelected {
            role,
            description: description.into(),
        })
    }

    fn send(&self, event: SessionEvent) -> crate::Result<()> {
        self.events
            .send(event)
            .map_err(|_| RideError::general("Ride session is no longer running"))
    }

    /// The most recently published state
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> crate::Result<SessionSnapshot> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(predicate)
            .await
            .map_err(|_| RideError::general("Ride session ended"))?;
        Ok(snapshot.clone())
    }
}
