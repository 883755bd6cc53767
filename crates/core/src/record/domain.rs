use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Draft, Record};
use super::validate::{require_field, ValidationError};

/// Availability of a piece of lab equipment.
///
/// Wire strings match what the deployed backend stores (`"Available"` /
/// `"Not Available"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentStatus {
    Available,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl Default for EquipmentStatus {
    fn default() -> Self {
        EquipmentStatus::Available
    }
}

/// Lab equipment record. The deployed backend keeps these in the `posts`
/// table with images in the `uploads` bucket; the names are the backend's,
/// not ours to rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub status: EquipmentStatus,
    pub content: String,
    pub image_url: Option<String>,
}

impl Record for Equipment {
    const TABLE: &'static str = "posts";
    const ASSET_BUCKET: &'static str = "uploads";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn asset_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// Editor payload for creating or updating equipment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentDraft {
    pub name: String,
    pub status: EquipmentStatus,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Draft for EquipmentDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_field("name", &self.name)
    }

    fn attach_asset_url(&mut self, url: String) {
        self.image_url = Some(url);
    }
}

/// Team member profile record, stored in `team_members` with photos in the
/// `team-images` bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub image_url: Option<String>,
}

impl Record for TeamMember {
    const TABLE: &'static str = "team_members";
    const ASSET_BUCKET: &'static str = "team-images";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn asset_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// Editor payload for creating or updating a team member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMemberDraft {
    pub name: String,
    pub role: String,
    pub department: String,
    pub bio: String,
    pub email: String,
    pub linkedin: String,
    pub github: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Draft for TeamMemberDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_field("name", &self.name)?;
        require_field("role", &self.role)
    }

    fn attach_asset_url(&mut self, url: String) {
        self.image_url = Some(url);
    }
}

/// Split a comma-separated skills string into trimmed, non-empty entries.
/// Matches how the admin form collects the list.
pub fn parse_skills(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
