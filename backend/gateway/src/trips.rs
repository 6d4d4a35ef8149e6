//! Trip desk. Owns every traveller's trip runtime and all public profiles.
//!
//! ## Locking
//!
//! * Each `(account, trip)` participation has its own mutex. A lifecycle
//!   event is read, applied and written back under it, so two concurrent
//!   "commit & pay" or "release" calls for the same participation resolve
//!   to one winner and one no-op.
//! * Each profile has its own mutex; rating updates are read-modify-write
//!   under it. Profile locks are taken while the participation lock is held
//!   but never two at once, so lock order is always participation → profile.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use trip_protocol::{
    apply, Applicant, Effect, EscrowLedger, EscrowSummary, LifecycleClock, Outcome,
    PublicProfile, Rating, RatingSummary, Transition, TravelDna, TripEvent,
    TripLifecycleStatus, TripState,
};

use crate::catalog::TripListing;

/// Seed reputation for every organizer in the catalog.
const HOST_SEED_TOURS: u32 = 4;
const HOST_SEED_RATING_COUNT: u32 = 8;
// 4.60
const HOST_SEED_RATING_AVERAGE: Decimal = Decimal::from_parts(460, 0, 0, false, 2);

/// The signed-in traveller an event is applied for.
#[derive(Debug, Clone)]
pub struct Traveller {
    pub account_id: String,
    pub name: String,
    pub is_verified: bool,
    pub dna: Option<TravelDna>,
}

/// Requested lifecycle action, before the desk fills in trip-specific data.
#[derive(Debug, Clone, Copy)]
pub enum TripAction {
    JoinChat,
    CommitAndPay,
    ReleaseCheckInFunds,
    SubmitReview { organizer: Rating, traveler: Rating },
}

/// Client-facing view of a [`TripState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRuntimeView {
    pub status: TripLifecycleStatus,
    pub intro_ends_at: Option<DateTime<Utc>>,
    pub escrow: Option<EscrowSummary>,
    pub funds_released: bool,
    pub has_reviewed: bool,
}

impl From<&TripState> for TripRuntimeView {
    fn from(state: &TripState) -> Self {
        Self {
            status: state.status(),
            intro_ends_at: state.intro_ends_at(),
            escrow: state.escrow().copied(),
            funds_released: state.funds_released(),
            has_reviewed: state.has_reviewed(),
        }
    }
}

/// Wallet totals for one traveller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    #[serde(flatten)]
    pub ledger: EscrowLedger,
    pub completed_trips: usize,
}

/// Profiles keyed by an owner id, one lock per profile.
#[derive(Default)]
struct ProfileBook {
    entries: RwLock<HashMap<String, Arc<Mutex<PublicProfile>>>>,
}

impl ProfileBook {
    async fn get(&self, key: &str) -> Option<Arc<Mutex<PublicProfile>>> {
        self.entries.read().await.get(key).cloned()
    }

    async fn get_or_insert_with<F>(&self, key: &str, make: F) -> Arc<Mutex<PublicProfile>>
    where
        F: FnOnce() -> PublicProfile,
    {
        if let Some(entry) = self.get(key).await {
            return entry;
        }
        self.entries
            .write()
            .await
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(make())))
            .clone()
    }

    async fn snapshot(&self) -> Vec<PublicProfile> {
        let entries: Vec<_> = self.entries.read().await.values().cloned().collect();
        let mut profiles = Vec::with_capacity(entries.len());
        for entry in entries {
            profiles.push(entry.lock().await.clone());
        }
        profiles
    }
}

type ParticipationKey = (String, String);

pub struct TripDesk {
    catalog: Vec<TripListing>,
    intro_period: Duration,
    runtimes: RwLock<HashMap<ParticipationKey, Arc<Mutex<TripState>>>>,
    hosts: ProfileBook,
    travellers: ProfileBook,
}

impl TripDesk {
    /// Build a desk over `catalog`, seeding one profile per organizer.
    pub fn new(catalog: Vec<TripListing>, intro_period: Duration) -> Self {
        let mut hosts: HashMap<String, Arc<Mutex<PublicProfile>>> = HashMap::new();
        for trip in &catalog {
            hosts.entry(trip.host_name.clone()).or_insert_with(|| {
                Arc::new(Mutex::new(PublicProfile {
                    name: trip.host_name.clone(),
                    tours_completed: HOST_SEED_TOURS,
                    rating: RatingSummary::new(HOST_SEED_RATING_AVERAGE, HOST_SEED_RATING_COUNT),
                    is_verified: trip.host_verified,
                }))
            });
        }

        Self {
            catalog,
            intro_period,
            runtimes: RwLock::new(HashMap::new()),
            hosts: ProfileBook {
                entries: RwLock::new(hosts),
            },
            travellers: ProfileBook::default(),
        }
    }

    pub fn listings(&self) -> &[TripListing] {
        &self.catalog
    }

    pub fn listing(&self, trip_id: &str) -> Option<&TripListing> {
        self.catalog.iter().find(|trip| trip.id == trip_id)
    }

    fn clock(&self, now: DateTime<Utc>) -> LifecycleClock {
        LifecycleClock::new(now, self.intro_period)
    }

    async fn runtime(&self, account_id: &str, trip_id: &str) -> Arc<Mutex<TripState>> {
        let key = (account_id.to_string(), trip_id.to_string());
        if let Some(runtime) = self.runtimes.read().await.get(&key) {
            return runtime.clone();
        }
        self.runtimes
            .write()
            .await
            .entry(key)
            .or_default()
            .clone()
    }

    /// Current state of a participation. Untouched participations are `Open`.
    pub async fn state_of(&self, account_id: &str, trip_id: &str) -> TripState {
        let key = (account_id.to_string(), trip_id.to_string());
        let runtime = self.runtimes.read().await.get(&key).cloned();
        match runtime {
            Some(runtime) => runtime.lock().await.clone(),
            None => TripState::Open,
        }
    }

    /// Evaluate a join attempt from someone without a session. Never stores state.
    pub fn join_signed_out(&self, now: DateTime<Utc>) -> Transition {
        apply(
            &TripState::Open,
            TripEvent::JoinChat(Applicant::signed_out()),
            &self.clock(now),
        )
    }

    /// Apply `action` to the traveller's participation in `trip_id`.
    ///
    /// Returns `None` for an unknown trip.
    pub async fn dispatch(
        &self,
        traveller: &Traveller,
        trip_id: &str,
        action: TripAction,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        let trip = self.listing(trip_id)?;
        let event = match action {
            TripAction::JoinChat => TripEvent::JoinChat(Applicant::assess(
                traveller.dna.as_ref(),
                traveller.is_verified,
                &trip.dna,
            )),
            TripAction::CommitAndPay => TripEvent::CommitAndPay {
                price_share: trip.price_share,
            },
            TripAction::ReleaseCheckInFunds => TripEvent::ReleaseCheckInFunds,
            TripAction::SubmitReview {
                organizer,
                traveler,
            } => TripEvent::SubmitReview {
                organizer,
                traveler,
            },
        };

        let runtime = self.runtime(&traveller.account_id, trip_id).await;
        let mut state = runtime.lock().await;
        let transition = apply(&state, event, &self.clock(now));

        match transition.outcome {
            Outcome::Applied(effect) => {
                *state = transition.state.clone();
                info!(
                    "Trip {trip_id} for {}: {:?} -> {:?}",
                    traveller.account_id,
                    action,
                    state.status()
                );
                if let Effect::Reviewed {
                    organizer,
                    traveler,
                } = effect
                {
                    self.record_review(traveller, trip, organizer, traveler)
                        .await;
                }
            }
            Outcome::Rejected(notice) => {
                debug!(
                    "Trip {trip_id} for {}: {:?} rejected ({notice:?})",
                    traveller.account_id, action
                );
            }
        }

        Some(transition)
    }

    async fn record_review(
        &self,
        traveller: &Traveller,
        trip: &TripListing,
        organizer: Rating,
        traveler: Rating,
    ) {
        if let Some(host) = self.hosts.get(&trip.host_name).await {
            let mut host = host.lock().await;
            *host = host.record_tour(organizer);
        }

        let profile = self.traveller_entry(traveller).await;
        let mut profile = profile.lock().await;
        *profile = profile.record_tour(traveler);
    }

    async fn traveller_entry(&self, traveller: &Traveller) -> Arc<Mutex<PublicProfile>> {
        let entry = self
            .travellers
            .get_or_insert_with(&traveller.account_id, || {
                PublicProfile::newcomer(traveller.name.clone(), traveller.is_verified)
            })
            .await;
        {
            let mut profile = entry.lock().await;
            profile.name = traveller.name.clone();
            profile.is_verified = traveller.is_verified;
        }
        entry
    }

    pub async fn traveller_profile(&self, traveller: &Traveller) -> PublicProfile {
        self.traveller_entry(traveller).await.lock().await.clone()
    }

    /// Organizer profiles, most tours first.
    pub async fn host_profiles(&self) -> Vec<PublicProfile> {
        let mut profiles = self.hosts.snapshot().await;
        profiles.sort_by(|a, b| {
            b.tours_completed
                .cmp(&a.tours_completed)
                .then_with(|| a.name.cmp(&b.name))
        });
        profiles
    }

    /// Escrow totals across all of one traveller's participations.
    pub async fn wallet(&self, account_id: &str) -> WalletSummary {
        let runtimes: Vec<_> = self
            .runtimes
            .read()
            .await
            .iter()
            .filter(|((owner, _), _)| owner == account_id)
            .map(|(_, runtime)| runtime.clone())
            .collect();

        let mut summaries = Vec::new();
        let mut completed_trips = 0;
        for runtime in runtimes {
            let state = runtime.lock().await;
            if let Some(escrow) = state.escrow() {
                summaries.push(*escrow);
            }
            if state.status() == TripLifecycleStatus::Completed {
                completed_trips += 1;
            }
        }

        WalletSummary {
            ledger: EscrowLedger::from_summaries(&summaries),
            completed_trips,
        }
    }
}
