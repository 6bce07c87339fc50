//! Field Resolution Module
//!
//! One [`LocationField`] per role turns free text into a resolved coordinate.
//! The field never performs I/O itself: each operation returns the lookup it
//! wants issued, tagged with a [`RequestToken`], and responses are fed back in
//! with the token they were issued under. A response whose token is no longer
//! the field's active one is dropped on arrival.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GeocodeError, ProviderFailure, SuggestionError, log_failure};
use crate::models::{Coordinate, FieldRole, Suggestion};

/// Generation stamp of a field lookup; strictly increasing per field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Hands out increasing request tokens
#[derive(Debug, Clone, Default)]
pub(crate) struct Generation(u64);

impl Generation {
    pub(crate) fn next(&mut self) -> RequestToken {
        self.0 += 1;
        RequestToken(self.0)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a field is in its resolution lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldState {
    Empty,
    Typing,
    SuggestionsLoading,
    SuggestionsReady,
    Resolved,
}

/// A failure scoped to one field, rendered next to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "error", rename_all = "snake_case")]
pub enum FieldError {
    Suggestions(SuggestionError),
    Geocode(GeocodeError),
}

impl FieldError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FieldError::Suggestions(e) => e.user_message(),
            FieldError::Geocode(e) => e.user_message(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Suggestions(e) => write!(f, "{e}"),
            FieldError::Geocode(e) => write!(f, "{e}"),
        }
    }
}

/// Suggestion lookup the caller should issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionLookup {
    pub token: RequestToken,
    pub text: String,
}

/// Geocode lookup the caller should issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeLookup {
    pub token: RequestToken,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActiveLookup {
    Suggestions(RequestToken),
    Geocode {
        token: RequestToken,
        description: String,
    },
}

/// Read-only picture of a field at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldView {
    pub role: FieldRole,
    pub text: String,
    pub state: FieldState,
    pub suggestions: Vec<Suggestion>,
    pub resolved: Option<Coordinate>,
    pub resolved_label: Option<String>,
    pub error: Option<FieldError>,
    /// A suggestion lookup is in flight
    pub loading: bool,
    /// A geocode lookup is in flight
    pub resolving: bool,
}

/// Pickup or destination input and its resolution
#[derive(Debug, Clone)]
pub struct LocationField {
    role: FieldRole,
    text: String,
    state: FieldState,
    suggestions: Vec<Suggestion>,
    resolved: Option<Coordinate>,
    resolved_label: Option<String>,
    error: Option<FieldError>,
    generation: Generation,
    active: Option<ActiveLookup>,
    min_query_chars: usize,
}

impl LocationField {
    #[must_use]
    pub fn new(role: FieldRole) -> Self {
        Self::with_min_query_chars(role, 1)
    }

    /// A field that only looks up suggestions once the text has `min_query_chars`
    #[must_use]
    pub fn with_min_query_chars(role: FieldRole, min_query_chars: usize) -> Self {
        Self {
            role,
            text: String::new(),
            state: FieldState::Empty,
            suggestions: Vec::new(),
            resolved: None,
            resolved_label: None,
            error: None,
            generation: Generation::default(),
            active: None,
            min_query_chars: min_query_chars.max(1),
        }
    }

    /// Handle an edit of the raw text.
    ///
    /// Any edit invalidates the resolution and supersedes every pending
    /// lookup. Returns the suggestion lookup to issue, if any.
    pub fn on_text_changed(&mut self, text: impl Into<String>) -> Option<SuggestionLookup> {
        self.text = text.into();
        self.suggestions.clear();
        self.resolved = None;
        self.resolved_label = None;
        self.error = None;
        self.active = None;

        // Bumped even without a lookup so late responses to older edits are stale
        let token = self.generation.next();

        let query = self.text.trim();
        if query.is_empty() {
            self.state = FieldState::Empty;
            return None;
        }

        if query.chars().count() < self.min_query_chars {
            self.state = FieldState::Typing;
            return None;
        }

        self.state = FieldState::SuggestionsLoading;
        self.active = Some(ActiveLookup::Suggestions(token));
        debug!("{} suggestion lookup {} for '{}'", self.role, token, query);

        Some(SuggestionLookup {
            token,
            text: query.to_string(),
        })
    }

    /// Apply a suggestion response. Returns false when the response was stale.
    pub fn on_suggestions_received(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Suggestion>, SuggestionError>,
    ) -> bool {
        if self.active != Some(ActiveLookup::Suggestions(token)) {
            debug!("Dropping stale {} suggestions {}", self.role, token);
            return false;
        }
        self.active = None;

        match result {
            Ok(suggestions) if !suggestions.is_empty() => {
                self.suggestions = suggestions;
                self.error = None;
                self.state = FieldState::SuggestionsReady;
            }
            Ok(_) | Err(SuggestionError::NoResults) => {
                info!("No {} suggestions for '{}'", self.role, self.text.trim());
                self.suggestions.clear();
                self.error = None;
                self.state = FieldState::SuggestionsLoading;
            }
            Err(e) => {
                log_failure(&format!("{} suggestions", self.role), &e);
                self.suggestions.clear();
                self.error = Some(FieldError::Suggestions(e));
                self.state = FieldState::Typing;
            }
        }
        true
    }

    /// Accept one of the offered suggestions and ask for its coordinate.
    ///
    /// Only a description from the current suggestion list is accepted, so
    /// typed text alone never resolves a field. Returns `None` for anything
    /// else, and for a description that is already resolved or being resolved.
    pub fn on_suggestion_selected(&mut self, description: &str) -> Option<GeocodeLookup> {
        if description.trim().is_empty() {
            return None;
        }

        if self.resolved.is_some() && self.resolved_label.as_deref() == Some(description) {
            debug!("{} already resolved to '{}'", self.role, description);
            return None;
        }

        if matches!(
            &self.active,
            Some(ActiveLookup::Geocode { description: pending, .. }) if pending == description
        ) {
            debug!("{} geocode for '{}' already pending", self.role, description);
            return None;
        }

        let offered = self.state == FieldState::SuggestionsReady
            && self.suggestions.iter().any(|s| s.description == description);
        if !offered {
            debug!("Ignoring {} selection '{}': not an offered suggestion", self.role, description);
            return None;
        }

        let token = self.generation.next();
        self.active = Some(ActiveLookup::Geocode {
            token,
            description: description.to_string(),
        });
        debug!("{} geocode lookup {} for '{}'", self.role, token, description);

        Some(GeocodeLookup {
            token,
            description: description.to_string(),
        })
    }

    /// Apply a geocode response. Returns false when the response was stale.
    pub fn on_geocode_received(
        &mut self,
        token: RequestToken,
        result: Result<Coordinate, GeocodeError>,
    ) -> bool {
        let description = match self.active.take() {
            Some(ActiveLookup::Geocode {
                token: active,
                description,
            }) if active == token => description,
            other => {
                self.active = other;
                debug!("Dropping stale {} geocode {}", self.role, token);
                return false;
            }
        };

        match result {
            Ok(coordinate) => {
                info!("{} resolved '{}' to ({})", self.role, description, coordinate);
                self.text = description.clone();
                self.resolved = Some(coordinate);
                self.resolved_label = Some(description);
                self.suggestions.clear();
                self.error = None;
                self.state = FieldState::Resolved;
            }
            Err(e) => {
                log_failure(&format!("{} geocode", self.role), &e);
                self.error = Some(FieldError::Geocode(e));
            }
        }
        true
    }

    #[must_use]
    pub fn role(&self) -> FieldRole {
        self.role
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn state(&self) -> FieldState {
        self.state
    }

    #[must_use]
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    #[must_use]
    pub fn resolved(&self) -> Option<Coordinate> {
        self.resolved
    }

    #[must_use]
    pub fn error(&self) -> Option<&FieldError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn view(&self) -> FieldView {
        FieldView {
            role: self.role,
            text: self.text.clone(),
            state: self.state,
            suggestions: self.suggestions.clone(),
            resolved: self.resolved,
            resolved_label: self.resolved_label.clone(),
            error: self.error.clone(),
            loading: matches!(self.active, Some(ActiveLookup::Suggestions(_))),
            resolving: matches!(self.active, Some(ActiveLookup::Geocode { .. })),
        }
    }
}
