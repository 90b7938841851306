//! Attended concert log

use std::sync::Arc;

use encore_common::models::{AttendedConcert, NewAttendedConcert, UserId};
use encore_common::Result;
use tracing::{error, info};

use crate::store::ConcertStore;

pub struct ConcertLog<S: ?Sized> {
    store: Arc<S>,
}

impl<S> ConcertLog<S>
where
    S: ConcertStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record attendance. The concert row is reused when date, artist and
    /// venue match an existing one.
    pub async fn add(
        &self,
        user_id: UserId,
        concert: &NewAttendedConcert,
    ) -> Result<AttendedConcert> {
        let attended = self
            .store
            .add_attended_concert(user_id, concert)
            .await
            .inspect_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to add attended concert");
            })?;
        info!(
            user_id = %user_id,
            concert_id = attended.concert_id,
            artist = %attended.artist_name,
            "Added attended concert"
        );
        Ok(attended)
    }

    /// Attended concerts, newest event first
    pub async fn list(&self, user_id: UserId) -> Result<Vec<AttendedConcert>> {
        let mut concerts = self
            .store
            .list_attended_concerts(user_id)
            .await
            .inspect_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to list attended concerts");
            })?;
        concerts.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        Ok(concerts)
    }
}
