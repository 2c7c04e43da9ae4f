//! Admission control for capacity-bounded meetings.
//!
//! The seat check lives in the store's conditional write, never in this
//! module: a count read here would already be stale by the time it was used.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error,
  Result,
  meeting::{Attendance, Meeting, MeetingPatch, MeetingView},
  member::Member,
  store::ClubStore,
};

pub struct AttendanceManager<S> {
  store: Arc<S>,
}

impl<S> Clone for AttendanceManager<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: ClubStore> AttendanceManager<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Join or leave a meeting.
  ///
  /// `MeetingFull` and `MeetingClosed` are ordinary outcomes for the caller
  /// to report; they are never retried here.
  pub async fn toggle_attendance(
    &self,
    meeting_id: Uuid,
    member: &Member,
  ) -> Result<Attendance> {
    if !member.can_attend() {
      return Err(Error::Forbidden(
        "only approved members may RSVP".into(),
      ));
    }

    let now = Utc::now();
    self.settle(meeting_id, now).await?;

    let result = self
      .store
      .toggle_attendance(meeting_id, member.member_id, now)
      .await
      .map_err(Into::<crate::Error>::into);

    match result {
      Ok((attending, meeting)) => {
        tracing::info!(
          %meeting_id,
          member_id = %member.member_id,
          attending,
          attendees = meeting.attendee_count(),
          max_attendees = meeting.max_attendees,
          "attendance toggled"
        );
        Ok(Attendance { attending, meeting: MeetingView::from(meeting) })
      }
      Err(e) => {
        if matches!(
          e,
          Error::MeetingFull(_)
            | Error::MeetingClosed(_)
            | Error::AlreadyRegistered { .. }
        ) {
          tracing::info!(
            %meeting_id,
            member_id = %member.member_id,
            outcome = %e,
            "attendance change rejected"
          );
        }
        Err(e)
      }
    }
  }

  /// Read one meeting with its time transition applied and persisted.
  pub async fn get_meeting(&self, meeting_id: Uuid) -> Result<MeetingView> {
    self.settle(meeting_id, Utc::now()).await?;
    self
      .store
      .get_meeting(meeting_id)
      .await
      .map_err(Into::<crate::Error>::into)?
      .map(MeetingView::from)
      .ok_or(Error::MeetingNotFound(meeting_id))
  }

  /// Read every meeting, settling elapsed ones first.
  pub async fn list_meetings(&self) -> Result<Vec<MeetingView>> {
    let moved = self
      .store
      .settle_meetings(Utc::now(), None)
      .await
      .map_err(Into::<crate::Error>::into)?;
    if moved > 0 {
      tracing::debug!(moved, "meetings moved to past");
    }

    let meetings: Vec<Meeting> = self
      .store
      .list_meetings()
      .await
      .map_err(Into::<crate::Error>::into)?;
    Ok(meetings.into_iter().map(MeetingView::from).collect())
  }

  /// Cancel an upcoming meeting. Admin only; a meeting whose date has
  /// passed settles to `past` first and can then no longer be cancelled.
  pub async fn cancel_meeting(
    &self,
    meeting_id: Uuid,
    actor: &Member,
  ) -> Result<MeetingView> {
    if !actor.is_admin() {
      return Err(Error::Forbidden("only admins may cancel meetings".into()));
    }
    self.settle(meeting_id, Utc::now()).await?;
    let meeting = self
      .store
      .cancel_meeting(meeting_id)
      .await
      .map_err(Into::<crate::Error>::into)?;
    tracing::info!(%meeting_id, "meeting cancelled");
    Ok(MeetingView::from(meeting))
  }

  /// Edit a meeting's details. Admin only; an elapsed meeting is persisted
  /// as `past` before the edit lands.
  pub async fn update_meeting(
    &self,
    meeting_id: Uuid,
    patch: MeetingPatch,
    actor: &Member,
  ) -> Result<MeetingView> {
    if !actor.is_admin() {
      return Err(Error::Forbidden("only admins may edit meetings".into()));
    }
    patch.validate()?;
    self.settle(meeting_id, Utc::now()).await?;
    let meeting = self
      .store
      .update_meeting_details(meeting_id, patch)
      .await
      .map_err(Into::<crate::Error>::into)?;
    tracing::info!(%meeting_id, "meeting updated");
    Ok(MeetingView::from(meeting))
  }

  async fn settle(&self, meeting_id: Uuid, now: DateTime<Utc>) -> Result<()> {
    let moved = self
      .store
      .settle_meetings(now, Some(meeting_id))
      .await
      .map_err(Into::<crate::Error>::into)?;
    if moved > 0 {
      tracing::debug!(%meeting_id, "meeting moved to past");
    }
    Ok(())
  }
}
