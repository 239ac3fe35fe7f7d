//! Drift detection and repair for denormalised reference lists.
//!
//! Every denormalised list (a category's `clubIds`, a club's `memberIds` and
//! `eventIds`, an event's `ticketIds` and `teamIds`, a user's `clubs` and
//! `tickets`) mirrors an authoritative sub-collection. Sequences that fail
//! part-way (including compensations that themselves fail) leave the
//! mirrors stale. The reconciler scans a category tree, reports every
//! discrepancy, and heals the mirrors back towards the authoritative
//! collections.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::error::Error;
use crate::domain::ids::{CategoryId, ClubId, EventId, UserId};
use crate::domain::ports::{DocumentStore, RemoteStoreError};
use crate::domain::store::fields::{
    CATEGORY_CLUB_IDS, CLUB_EVENT_IDS, CLUB_MEMBER_IDS, EVENT_TEAM_IDS, EVENT_TICKET_IDS,
    USER_CLUBS, USER_TICKETS,
};
use crate::domain::store::{CollectionPath, DocPath, Document};

/// Direction of one detected discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum DriftKind {
    /// An authoritative record exists but the mirror list lacks its id.
    MissingReference,
    /// The mirror list holds an id with no authoritative record behind it.
    OrphanReference,
}

/// One discrepancy between a mirror list and its authoritative collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriftEntry {
    /// Document holding the drifting list.
    #[serde(serialize_with = "serialize_path")]
    #[schema(value_type = String)]
    pub path: DocPath,
    /// Name of the drifting list field.
    #[schema(value_type = String)]
    pub field: &'static str,
    /// Id that is missing from or orphaned in the list.
    pub value: String,
    /// Direction of the discrepancy.
    pub kind: DriftKind,
}

fn serialize_path<S: serde::Serializer>(path: &DocPath, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(path)
}

/// Outcome of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    /// Discrepancies found, in scan order.
    pub entries: Vec<DriftEntry>,
}

impl DriftReport {
    /// Whether the scanned tree was consistent.
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}

fn map_store_error(error: &RemoteStoreError) -> Error {
    if error.is_transient() {
        Error::service_unavailable(error.to_string())
    } else {
        Error::internal(error.to_string())
    }
}

/// Scans category trees for drift and heals mirror lists.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn DocumentStore>,
}

impl Reconciler {
    /// Create a reconciler over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Scan one category tree without modifying anything.
    ///
    /// # Errors
    ///
    /// Propagates store failures as domain errors; a partial scan is never
    /// reported.
    pub async fn scan_category(&self, category_id: &CategoryId) -> Result<DriftReport, Error> {
        let mut report = DriftReport::default();

        let clubs = self.collection_ids(&CollectionPath::clubs(category_id)).await?;
        self.diff_list(
            &mut report,
            DocPath::category(category_id),
            CATEGORY_CLUB_IDS,
            &clubs,
        )
        .await?;

        for club_raw in &clubs {
            let club_id = ClubId::new(club_raw)
                .map_err(|error| Error::internal(format!("malformed club id in store: {error}")))?;
            self.scan_club(&mut report, category_id, &club_id).await?;
        }

        Ok(report)
    }

    async fn scan_club(
        &self,
        report: &mut DriftReport,
        category_id: &CategoryId,
        club_id: &ClubId,
    ) -> Result<(), Error> {
        let members = self
            .collection_ids(&CollectionPath::members(category_id, club_id))
            .await?;
        self.diff_list(
            report,
            DocPath::club(category_id, club_id),
            CLUB_MEMBER_IDS,
            &members,
        )
        .await?;

        // Membership records are authoritative for the user-side mirror too.
        for member_raw in &members {
            let user_id = UserId::new(member_raw)
                .map_err(|error| Error::internal(format!("malformed user id in store: {error}")))?;
            self.diff_membership_mirror(report, &user_id, club_id).await?;
        }

        let events = self
            .collection_ids(&CollectionPath::events(category_id, club_id))
            .await?;
        self.diff_list(
            report,
            DocPath::club(category_id, club_id),
            CLUB_EVENT_IDS,
            &events,
        )
        .await?;

        for event_raw in &events {
            let event_id = EventId::new(event_raw)
                .map_err(|error| Error::internal(format!("malformed event id in store: {error}")))?;
            self.scan_event(report, category_id, club_id, &event_id).await?;
        }
        Ok(())
    }

    async fn scan_event(
        &self,
        report: &mut DriftReport,
        category_id: &CategoryId,
        club_id: &ClubId,
        event_id: &EventId,
    ) -> Result<(), Error> {
        let tickets = self
            .collection_ids(&CollectionPath::event_tickets(category_id, club_id, event_id))
            .await?;
        self.diff_list(
            report,
            DocPath::event(category_id, club_id, event_id),
            EVENT_TICKET_IDS,
            &tickets,
        )
        .await?;

        for ticket_doc in self
            .list(&CollectionPath::event_tickets(category_id, club_id, event_id))
            .await?
        {
            let (path, document) = ticket_doc;
            if let Some(user_raw) = document.as_value().get("userId").and_then(|v| v.as_str()) {
                let user_id = UserId::new(user_raw).map_err(|error| {
                    Error::internal(format!("malformed user id on ticket {path}: {error}"))
                })?;
                self.diff_single_mirror(
                    report,
                    DocPath::user(&user_id),
                    USER_TICKETS,
                    path.doc_id(),
                )
                .await?;
            }
        }

        let teams = self
            .collection_ids(&CollectionPath::teams(category_id, club_id, event_id))
            .await?;
        self.diff_list(
            report,
            DocPath::event(category_id, club_id, event_id),
            EVENT_TEAM_IDS,
            &teams,
        )
        .await?;
        Ok(())
    }

    /// Check that one authoritative membership is mirrored on the user doc.
    async fn diff_membership_mirror(
        &self,
        report: &mut DriftReport,
        user_id: &UserId,
        club_id: &ClubId,
    ) -> Result<(), Error> {
        self.diff_single_mirror(report, DocPath::user(user_id), USER_CLUBS, club_id.as_ref())
            .await
    }

    async fn diff_single_mirror(
        &self,
        report: &mut DriftReport,
        path: DocPath,
        field: &'static str,
        value: &str,
    ) -> Result<(), Error> {
        let document = self
            .store
            .get(&path)
            .await
            .map_err(|error| map_store_error(&error))?;
        let Some(document) = document else {
            // No document to mirror into; nothing the list repair can do.
            return Ok(());
        };
        if !document.list_field(field).iter().any(|entry| entry == value) {
            report.entries.push(DriftEntry {
                path,
                field,
                value: value.to_owned(),
                kind: DriftKind::MissingReference,
            });
        }
        Ok(())
    }

    /// Compare a mirror list against the authoritative id set.
    async fn diff_list(
        &self,
        report: &mut DriftReport,
        path: DocPath,
        field: &'static str,
        authoritative: &BTreeSet<String>,
    ) -> Result<(), Error> {
        let document = self
            .store
            .get(&path)
            .await
            .map_err(|error| map_store_error(&error))?;
        let Some(document) = document else {
            return Ok(());
        };
        let mirrored: BTreeSet<String> = document.list_field(field).into_iter().collect();

        for missing in authoritative.difference(&mirrored) {
            report.entries.push(DriftEntry {
                path: path.clone(),
                field,
                value: missing.clone(),
                kind: DriftKind::MissingReference,
            });
        }
        for orphan in mirrored.difference(authoritative) {
            report.entries.push(DriftEntry {
                path: path.clone(),
                field,
                value: orphan.clone(),
                kind: DriftKind::OrphanReference,
            });
        }
        Ok(())
    }

    /// Repair every discrepancy in a report.
    ///
    /// Missing references are appended to the mirror; orphans are removed.
    /// Returns the number of applied repairs.
    ///
    /// # Errors
    ///
    /// Stops at the first store failure; already-applied repairs stay.
    pub async fn heal(&self, report: &DriftReport) -> Result<usize, Error> {
        let mut healed = 0_usize;
        for entry in &report.entries {
            let result = match entry.kind {
                DriftKind::MissingReference => {
                    self.store
                        .append_to_list(&entry.path, entry.field, &entry.value)
                        .await
                }
                DriftKind::OrphanReference => {
                    self.store
                        .remove_from_list(&entry.path, entry.field, &entry.value)
                        .await
                }
            };
            result.map_err(|error| map_store_error(&error))?;
            healed = healed.saturating_add(1);
        }
        if healed > 0 {
            info!(healed, "repaired drifting reference lists");
        }
        Ok(healed)
    }

    /// Scan one category tree and immediately repair what was found.
    ///
    /// # Errors
    ///
    /// Propagates scan and repair failures.
    pub async fn reconcile_category(&self, category_id: &CategoryId) -> Result<DriftReport, Error> {
        let report = self.scan_category(category_id).await?;
        self.heal(&report).await?;
        Ok(report)
    }

    async fn collection_ids(
        &self,
        collection: &CollectionPath,
    ) -> Result<BTreeSet<String>, Error> {
        Ok(self
            .list(collection)
            .await?
            .into_iter()
            .map(|(path, _)| path.doc_id().to_owned())
            .collect())
    }

    async fn list(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<(DocPath, Document)>, Error> {
        self.store
            .list(collection)
            .await
            .map_err(|error| map_store_error(&error))
    }
}
