//! Classification Engine
//! 
//! Derives complexity tier, deployment type and the three record-level
//! multipliers from a record's attributes. Explicit values always win;
//! inference only fills gaps.

use chrono::Utc;
use dealsight_extraction::unicode::{comparison_key, contains_words};
use dealsight_models::{ComplexityTier, DeploymentType, EnrichmentMethod, InventoryRecord};
use dealsight_utils::ClassificationConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    config: ClassificationConfig,
    critical_categories: Vec<String>,
    custom_categories: Vec<String>,
    saas_vendors: Vec<String>,
    /// Category multipliers keyed by comparison key
    category_multipliers: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub complexity: ComplexityTier,
    pub deployment: DeploymentType,
    pub complexity_multiplier: f64,
    pub category_multiplier: f64,
    pub deployment_multiplier: f64,
    /// Whether the tier came from inference rather than the record
    pub inferred_complexity: bool,
    pub inferred_deployment: bool,
}

impl ClassificationEngine {
    pub fn new(config: &ClassificationConfig) -> Self {
        let keys = |words: &[String]| -> Vec<String> {
            words
                .iter()
                .map(|w| comparison_key(w))
                .filter(|w| !w.is_empty())
                .collect()
        };

        Self {
            critical_categories: keys(&config.critical_categories),
            custom_categories: keys(&config.custom_categories),
            saas_vendors: keys(&config.saas_vendors),
            category_multipliers: config
                .category_multipliers
                .iter()
                .map(|(category, multiplier)| (comparison_key(category), *multiplier))
                .collect(),
            config: config.clone(),
        }
    }

    pub fn classify(&self, record: &InventoryRecord) -> Classification {
        let deployment = self.deployment(record);
        let complexity = self.complexity(record, deployment);

        Classification {
            complexity,
            deployment,
            complexity_multiplier: self.config.complexity_multiplier(complexity),
            category_multiplier: self.category_multiplier(record.category.as_deref()),
            deployment_multiplier: self.config.deployment_multiplier(deployment),
            inferred_complexity: record.complexity.is_none(),
            inferred_deployment: record.deployment.is_none(),
        }
    }

    /// Stores the inferred tier and deployment alongside the record's own
    /// values. Explicit fields are never written, so later attribute edits
    /// are reflected the next time the record is classified. Records edited
    /// by hand keep their manual provenance.
    pub fn apply(&self, record: &mut InventoryRecord) -> Classification {
        let classification = self.classify(record);
        let complexity = classification.inferred_complexity.then_some(classification.complexity);
        let deployment = classification.inferred_deployment.then_some(classification.deployment);

        if record.inferred_complexity != complexity || record.inferred_deployment != deployment {
            record.inferred_complexity = complexity;
            record.inferred_deployment = deployment;
            let inferred_any = complexity.is_some() || deployment.is_some();
            if inferred_any && record.provenance.enrichment != EnrichmentMethod::Manual {
                record.provenance.enrichment = EnrichmentMethod::Heuristic;
            }
            record.updated_at = Utc::now();
        }

        classification
    }

    /// Explicit tier, then critical category, then size thresholds, then
    /// small SaaS, else medium.
    pub fn complexity(&self, record: &InventoryRecord, deployment: DeploymentType) -> ComplexityTier {
        if let Some(tier) = record.complexity {
            return tier;
        }
        if self.matches_any(record.category.as_deref(), &self.critical_categories) {
            return ComplexityTier::Critical;
        }

        let users = record.user_count;
        if users.map_or(false, |u| u > self.config.complex_user_threshold)
            || record.integration.integration_count > self.config.complex_integration_threshold
        {
            return ComplexityTier::Complex;
        }
        if deployment == DeploymentType::Saas && users.map_or(false, |u| u < self.config.simple_user_threshold) {
            return ComplexityTier::Simple;
        }
        ComplexityTier::Medium
    }

    pub fn deployment(&self, record: &InventoryRecord) -> DeploymentType {
        if let Some(deployment) = record.deployment {
            return deployment;
        }
        if self.is_saas_vendor(record) {
            DeploymentType::Saas
        } else if self.matches_any(record.category.as_deref(), &self.custom_categories) {
            DeploymentType::Custom
        } else if record.integration.parent_hosted {
            DeploymentType::OnPremises
        } else {
            DeploymentType::Unknown
        }
    }

    /// Exact category first, then the highest multiplier among configured
    /// categories named inside it. Unknown categories get 1.0.
    pub fn category_multiplier(&self, category: Option<&str>) -> f64 {
        let Some(key) = category.map(comparison_key).filter(|k| !k.is_empty()) else {
            return 1.0;
        };
        if let Some(multiplier) = self.category_multipliers.get(&key) {
            return *multiplier;
        }
        self.category_multipliers
            .iter()
            .filter(|(name, _)| contains_words(&key, name))
            .map(|(_, multiplier)| *multiplier)
            .fold(None, |best: Option<f64>, m| Some(best.map_or(m, |b| b.max(m))))
            .unwrap_or(1.0)
    }

    pub fn config(&self) -> &ClassificationConfig {
        &self.config
    }

    fn is_saas_vendor(&self, record: &InventoryRecord) -> bool {
        [record.vendor.as_deref(), Some(record.name.as_str())]
            .into_iter()
            .flatten()
            .map(comparison_key)
            .any(|key| self.saas_vendors.iter().any(|vendor| contains_words(&key, vendor)))
    }

    fn matches_any(&self, text: Option<&str>, keywords: &[String]) -> bool {
        text.map(comparison_key)
            .map_or(false, |key| keywords.iter().any(|k| contains_words(&key, k)))
    }
}
