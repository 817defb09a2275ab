//! Deal context and cost result models.
//!
//! Breakdowns and summaries are derived views over inventory records; they
//! are recomputed on demand and never act as the system of record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{ComplexityTier, DeploymentType, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    Acquisition,
    Merger,
    CarveOut,
    Divestiture,
}

impl DealType {
    /// Deals where the separated unit may keep relying on parent services
    pub fn separates_from_parent(&self) -> bool {
        matches!(self, DealType::CarveOut | DealType::Divestiture)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acquisition => "acquisition",
            Self::Merger => "merger",
            Self::CarveOut => "carve_out",
            Self::Divestiture => "divestiture",
        }
    }
}

impl std::fmt::Display for DealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deal classification supplied by the deal-context collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DealContext {
    pub deal_type: DealType,
    #[validate(custom(function = "strictly_positive", message = "Deal multiplier must be positive"))]
    pub multiplier: f64,
    /// Restrict costing to one party
    #[serde(default)]
    pub entity_scope: Option<Entity>,
    /// Overrides the configured transition-service duration
    #[serde(default)]
    #[validate(range(min = 1, max = 120, message = "Transition duration must be between 1 and 120 months"))]
    pub tsa_duration_months: Option<u32>,
}

impl DealContext {
    pub fn new(deal_type: DealType, multiplier: f64) -> Self {
        Self {
            deal_type,
            multiplier,
            entity_scope: None,
            tsa_duration_months: None,
        }
    }

    pub fn with_entity_scope(mut self, entity: Entity) -> Self {
        self.entity_scope = Some(entity);
        self
    }

    pub fn with_tsa_duration(mut self, months: u32) -> Self {
        self.tsa_duration_months = Some(months);
        self
    }
}

fn strictly_positive(value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("positive"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedMultipliers {
    pub complexity: f64,
    pub category: f64,
    pub deployment: f64,
    pub deal_context: f64,
}

impl AppliedMultipliers {
    pub fn product(&self) -> f64 {
        self.complexity * self.category * self.deployment * self.deal_context
    }

    pub fn all_positive(&self) -> bool {
        [self.complexity, self.category, self.deployment, self.deal_context]
            .iter()
            .all(|m| *m > 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationCosts {
    pub integrations: f64,
    pub single_sign_on: f64,
    pub data_volume: f64,
    pub custom_interfaces: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionServiceCost {
    pub applies: bool,
    pub monthly_rate: f64,
    pub user_factor: f64,
    pub duration_months: u32,
    pub total: f64,
}

/// Per-record cost result with every intermediate retained for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub record_id: Uuid,
    pub record_name: String,
    pub entity: Entity,
    pub deal_type: DealType,
    pub complexity: ComplexityTier,
    pub deployment: DeploymentType,
    pub base_cost: f64,
    pub multipliers: AppliedMultipliers,
    pub one_time_base: f64,
    pub integration: IntegrationCosts,
    pub transition_service: TransitionServiceCost,
    pub one_time_total: f64,
    pub transition_service_total: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub record_id: Uuid,
    pub record_name: String,
    pub complexity: ComplexityTier,
    pub grand_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierGroup {
    pub record_count: usize,
    pub one_time_total: f64,
    pub grand_total: f64,
    pub record_ids: Vec<Uuid>,
}

/// Portfolio roll-up for one entity scope and deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioCostSummary {
    pub entity_scope: Option<Entity>,
    pub deal_type: DealType,
    pub record_count: usize,
    pub total_one_time: f64,
    pub total_integration: f64,
    pub total_transition_service: f64,
    pub grand_total: f64,
    /// Most expensive first
    pub ranked: Vec<RankedRecord>,
    pub by_tier: BTreeMap<ComplexityTier, TierGroup>,
}

impl PortfolioCostSummary {
    pub fn empty(entity_scope: Option<Entity>, deal_type: DealType) -> Self {
        Self {
            entity_scope,
            deal_type,
            record_count: 0,
            total_one_time: 0.0,
            total_integration: 0.0,
            total_transition_service: 0.0,
            grand_total: 0.0,
            ranked: Vec::new(),
            by_tier: BTreeMap::new(),
        }
    }

    /// The `n` most expensive records.
    pub fn top(&self, n: usize) -> &[RankedRecord] {
        &self.ranked[..n.min(self.ranked.len())]
    }
}
