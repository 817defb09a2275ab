//! Inventory record models.
//!
//! This module defines the structured records emitted by the record builder,
//! their provenance, integration attributes, review bookkeeping and the
//! manual-correction payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::Entity;

/// Coarse migration/integration difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Simple,
    Medium,
    Complex,
    Critical,
}

impl ComplexityTier {
    pub const ALL: [ComplexityTier; 4] = [
        ComplexityTier::Simple,
        ComplexityTier::Medium,
        ComplexityTier::Complex,
        ComplexityTier::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
            Self::Critical => "critical",
        }
    }

    /// Parse the wording found in source documents
    pub fn parse_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "low" | "easy" | "basic" => Some(Self::Simple),
            "medium" | "moderate" | "standard" | "normal" => Some(Self::Medium),
            "complex" | "high" | "hard" | "difficult" => Some(Self::Complex),
            "critical" | "very high" | "mission critical" | "mission-critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentType {
    Saas,
    Cloud,
    Hybrid,
    OnPremises,
    Custom,
    Unknown,
}

impl DeploymentType {
    pub const ALL: [DeploymentType; 6] = [
        DeploymentType::Saas,
        DeploymentType::Cloud,
        DeploymentType::Hybrid,
        DeploymentType::OnPremises,
        DeploymentType::Custom,
        DeploymentType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saas => "saas",
            Self::Cloud => "cloud",
            Self::Hybrid => "hybrid",
            Self::OnPremises => "on_premises",
            Self::Custom => "custom",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse_label(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase().replace(['-', '_'], " ");
        match lower.as_str() {
            "saas" | "software as a service" | "subscription" => Some(Self::Saas),
            "cloud" | "cloud hosted" | "iaas" | "paas" | "hosted" | "private cloud" => Some(Self::Cloud),
            "hybrid" => Some(Self::Hybrid),
            "on prem" | "on premise" | "on premises" | "onprem" | "self hosted" | "data center"
            | "datacenter" => Some(Self::OnPremises),
            "custom" | "bespoke" | "in house" | "homegrown" => Some(Self::Custom),
            "unknown" | "tbd" | "n/a" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the record's attributes were last set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentMethod {
    None,
    Heuristic,
    External,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Provenance {
    pub source_table_id: Uuid,
    pub source_id: String,
    /// Zero-based data row in the normalized table
    pub source_row: usize,
    #[validate(range(min = 0.0, max = 1.0, message = "Extraction confidence must be between 0.0 and 1.0"))]
    pub extraction_confidence: f64,
    #[validate(range(min = 0.0, max = 1.0, message = "Entity confidence must be between 0.0 and 1.0"))]
    pub entity_confidence: f64,
    pub enrichment: EnrichmentMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct IntegrationAttributes {
    pub integration_count: u32,
    pub sso_required: bool,
    #[validate(range(min = 0.0, message = "Data volume cannot be negative"))]
    pub data_volume_gb: f64,
    pub custom_interface_count: u32,
    /// Whether the parent currently hosts the system for the unit
    pub parent_hosted: bool,
}

/// Why a record was flagged for human validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReviewReason {
    LowExtractionQuality { score: f64 },
    LowConfidenceEntity { confidence: f64 },
    UnresolvedCategory,
    LegacyEntityInference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub entity: Entity,
    #[validate(length(min = 1, max = 255, message = "Record name must be between 1 and 255 characters"))]
    pub name: String,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub user_count: Option<u64>,
    pub complexity: Option<ComplexityTier>,
    pub deployment: Option<DeploymentType>,
    /// Classification's view where `complexity` / `deployment` are absent.
    /// Recomputed from the attributes; never read back as an explicit value.
    #[serde(default)]
    pub inferred_complexity: Option<ComplexityTier>,
    #[serde(default)]
    pub inferred_deployment: Option<DeploymentType>,
    #[validate]
    pub integration: IntegrationAttributes,
    #[validate]
    pub provenance: Provenance,
    pub needs_review: bool,
    pub review_reasons: Vec<ReviewReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn new(entity: Entity, name: impl Into<String>, provenance: Provenance) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            entity,
            name: name.into(),
            vendor: None,
            category: None,
            user_count: None,
            complexity: None,
            deployment: None,
            inferred_complexity: None,
            inferred_deployment: None,
            integration: IntegrationAttributes::default(),
            provenance,
            needs_review: false,
            review_reasons: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets `needs_review` and records the reason once.
    pub fn flag_for_review(&mut self, reason: ReviewReason) {
        self.needs_review = true;
        if !self.review_reasons.contains(&reason) {
            self.review_reasons.push(reason);
        }
    }

    /// Applies a manual correction. Provenance becomes manual and the review
    /// flag is cleared regardless of which attributes changed. Inferred
    /// values are dropped since they may no longer follow from the
    /// attributes; classification fills them in again.
    pub fn apply_correction(&mut self, correction: RecordCorrection) {
        if let Some(entity) = correction.entity {
            self.entity = entity;
        }
        if let Some(name) = correction.name {
            self.name = name;
        }
        if let Some(vendor) = correction.vendor {
            self.vendor = Some(vendor);
        }
        if let Some(category) = correction.category {
            self.category = Some(category);
        }
        if let Some(user_count) = correction.user_count {
            self.user_count = Some(user_count);
        }
        if let Some(complexity) = correction.complexity {
            self.complexity = Some(complexity);
        }
        if let Some(deployment) = correction.deployment {
            self.deployment = Some(deployment);
        }
        if let Some(count) = correction.integration_count {
            self.integration.integration_count = count;
        }
        if let Some(sso) = correction.sso_required {
            self.integration.sso_required = sso;
        }
        if let Some(volume) = correction.data_volume_gb {
            self.integration.data_volume_gb = volume;
        }
        if let Some(count) = correction.custom_interface_count {
            self.integration.custom_interface_count = count;
        }
        if let Some(hosted) = correction.parent_hosted {
            self.integration.parent_hosted = hosted;
        }

        self.inferred_complexity = None;
        self.inferred_deployment = None;
        self.provenance.enrichment = EnrichmentMethod::Manual;
        self.needs_review = false;
        self.review_reasons.clear();
        self.updated_at = Utc::now();
    }
}

/// Replacement attribute values supplied by a reviewer. Absent fields are
/// left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RecordCorrection {
    pub entity: Option<Entity>,
    #[validate(length(min = 1, max = 255, message = "Record name must be between 1 and 255 characters"))]
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub user_count: Option<u64>,
    pub complexity: Option<ComplexityTier>,
    pub deployment: Option<DeploymentType>,
    pub integration_count: Option<u32>,
    pub sso_required: Option<bool>,
    #[validate(range(min = 0.0, message = "Data volume cannot be negative"))]
    pub data_volume_gb: Option<f64>,
    pub custom_interface_count: Option<u32>,
    pub parent_hosted: Option<bool>,
}
