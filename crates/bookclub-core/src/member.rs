//! Members: the people who review, RSVP, and track their reading.
//!
//! Authentication happens outside this workspace; a member record only
//! carries what authorization needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Member,
  Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
  pub member_id:  Uuid,
  pub name:       String,
  pub role:       Role,
  /// Unapproved members may read but not RSVP.
  pub approved:   bool,
  pub created_at: DateTime<Utc>,
}

impl Member {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  /// Admins count as approved regardless of the flag.
  pub fn can_attend(&self) -> bool { self.approved || self.is_admin() }

  /// The owner-or-admin rule applied to every mutation of owned content.
  pub fn may_modify(&self, owner_id: Uuid) -> bool {
    self.member_id == owner_id || self.is_admin()
  }
}

/// Input to [`crate::store::ClubStore::add_member`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
  pub name:     String,
  #[serde(default)]
  pub role:     Role,
  #[serde(default)]
  pub approved: bool,
}

/// A resolved member reference as embedded in activity events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
  pub member_id: Uuid,
  pub name:      String,
}
