use chrono::{DateTime, Utc};
use config::{Config, ConfigError, Environment, File};
use dealsight_models::{CanonicalField, ComplexityTier, DealContext, DealType, DeploymentType, Entity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

use crate::error::{DealsightError, DealsightResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub extraction: ExtractionConfig,
    pub classification: ClassificationConfig,
    pub cost: CostModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
    /// Default number of records returned by the portfolio ranking
    pub default_top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Synonyms per canonical field, compared after text normalization
    pub header_synonyms: BTreeMap<CanonicalField, Vec<String>>,
    /// A header must score strictly above this to be mapped
    pub mapping_threshold: f64,
    /// Share of non-numeric cells that makes a leading row a header row
    pub header_row_text_ratio: f64,
    /// Share of numeric cells that marks the first data row
    pub data_row_numeric_ratio: f64,
    /// Maximum number of leading rows folded into the header
    pub max_stacked_header_rows: usize,
    pub header_separator: String,
    /// Records from tables scoring below this are flagged for review
    pub review_threshold: f64,
    pub entity_keywords: EntityKeywords,
    /// Tables ingested before this instant may fall back to the legacy
    /// default entity. `None` disables the exception entirely.
    pub entity_enforcement_cutoff: Option<DateTime<Utc>>,
    pub legacy_default_entity: Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityKeywords {
    pub target: Vec<String>,
    pub acquirer: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub critical_categories: Vec<String>,
    pub custom_categories: Vec<String>,
    /// User counts strictly above this force `complex`
    pub complex_user_threshold: u64,
    /// Integration counts strictly above this force `complex`
    pub complex_integration_threshold: u32,
    /// SaaS records with user counts strictly below this are `simple`
    pub simple_user_threshold: u64,
    pub saas_vendors: Vec<String>,
    pub complexity_multipliers: BTreeMap<ComplexityTier, f64>,
    /// Keyed by lower-case category name
    pub category_multipliers: BTreeMap<String, f64>,
    pub deployment_multipliers: BTreeMap<DeploymentType, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModelConfig {
    pub base_cost: f64,
    pub per_integration_cost: f64,
    pub sso_cost: f64,
    pub per_gb_cost: f64,
    pub per_custom_interface_cost: f64,
    pub tsa_monthly_rates: BTreeMap<ComplexityTier, f64>,
    /// Ascending bands; the last band should be open-ended
    pub tsa_user_bands: Vec<UserBand>,
    pub tsa_default_duration_months: u32,
    /// Multiplier used when a deal context arrives without one
    pub deal_multipliers: BTreeMap<DealType, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserBand {
    /// Inclusive upper bound; `None` covers everything above the previous band
    pub up_to: Option<u64>,
    pub factor: f64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("DEALSIGHT").separator("__"));

        config.build()?.try_deserialize()
    }

    /// Rejects tables that would break the strictly-positive multiplier
    /// invariant or put thresholds outside [0, 1].
    pub fn validate(&self) -> DealsightResult<()> {
        self.extraction.validate()?;
        self.classification.validate()?;
        self.cost.validate()?;
        Ok(())
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> DealsightResult<()> {
        for (name, value) in [
            ("mapping_threshold", self.mapping_threshold),
            ("header_row_text_ratio", self.header_row_text_ratio),
            ("data_row_numeric_ratio", self.data_row_numeric_ratio),
            ("review_threshold", self.review_threshold),
        ] {
            ensure_unit(name, value)?;
        }
        if self.entity_keywords.target.is_empty() || self.entity_keywords.acquirer.is_empty() {
            return Err(DealsightError::configuration(
                "entity keyword lists for target and acquirer must not be empty",
            ));
        }
        Ok(())
    }
}

impl ClassificationConfig {
    pub fn validate(&self) -> DealsightResult<()> {
        for (tier, value) in &self.complexity_multipliers {
            ensure_positive(&format!("complexity_multipliers.{}", tier), *value)?;
        }
        for (category, value) in &self.category_multipliers {
            ensure_positive(&format!("category_multipliers.{}", category), *value)?;
        }
        for (deployment, value) in &self.deployment_multipliers {
            ensure_positive(&format!("deployment_multipliers.{}", deployment), *value)?;
        }
        Ok(())
    }

    pub fn complexity_multiplier(&self, tier: ComplexityTier) -> f64 {
        self.complexity_multipliers.get(&tier).copied().unwrap_or(1.0)
    }

    pub fn deployment_multiplier(&self, deployment: DeploymentType) -> f64 {
        self.deployment_multipliers.get(&deployment).copied().unwrap_or(1.0)
    }
}

impl CostModelConfig {
    pub fn validate(&self) -> DealsightResult<()> {
        for (name, value) in [
            ("base_cost", self.base_cost),
            ("per_integration_cost", self.per_integration_cost),
            ("sso_cost", self.sso_cost),
            ("per_gb_cost", self.per_gb_cost),
            ("per_custom_interface_cost", self.per_custom_interface_cost),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(DealsightError::configuration(format!(
                    "{} must be a non-negative amount, got {}",
                    name, value
                )));
            }
        }
        for (tier, rate) in &self.tsa_monthly_rates {
            ensure_positive(&format!("tsa_monthly_rates.{}", tier), *rate)?;
        }
        for (deal, value) in &self.deal_multipliers {
            ensure_positive(&format!("deal_multipliers.{}", deal), *value)?;
        }

        let mut previous: Option<u64> = None;
        for (idx, band) in self.tsa_user_bands.iter().enumerate() {
            ensure_positive(&format!("tsa_user_bands[{}].factor", idx), band.factor)?;
            match (previous, band.up_to) {
                (Some(prev), Some(up_to)) if up_to <= prev => {
                    return Err(DealsightError::configuration("tsa_user_bands must be ascending"));
                }
                (_, None) if idx + 1 != self.tsa_user_bands.len() => {
                    return Err(DealsightError::configuration(
                        "only the last tsa_user_band may be open-ended",
                    ));
                }
                _ => {}
            }
            previous = band.up_to;
        }

        if self.tsa_default_duration_months == 0 {
            return Err(DealsightError::configuration(
                "tsa_default_duration_months must be at least 1",
            ));
        }
        Ok(())
    }

    /// Deal context carrying the configured default multiplier for `deal_type`.
    pub fn default_deal_context(&self, deal_type: DealType) -> DealContext {
        let multiplier = self.deal_multipliers.get(&deal_type).copied().unwrap_or(1.0);
        DealContext::new(deal_type, multiplier)
    }
}

fn ensure_positive(name: &str, value: f64) -> DealsightResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DealsightError::configuration(format!(
            "{} must be strictly positive, got {}",
            name, value
        )))
    }
}

fn ensure_unit(name: &str, value: f64) -> DealsightResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DealsightError::configuration(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_request_size: 16 * 1024 * 1024, // 16MB
            default_top_n: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: None,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let mut header_synonyms = BTreeMap::new();
        header_synonyms.insert(
            CanonicalField::Application,
            strings(&[
                "app", "application name", "app name", "system", "system name", "software",
                "product", "tool", "platform", "solution",
            ]),
        );
        header_synonyms.insert(
            CanonicalField::Vendor,
            strings(&["supplier", "provider", "manufacturer", "publisher", "vendor name", "software vendor"]),
        );
        header_synonyms.insert(
            CanonicalField::Category,
            strings(&["type", "application type", "business function", "function", "domain", "capability"]),
        );
        header_synonyms.insert(
            CanonicalField::UserCount,
            strings(&[
                "users", "number of users", "no of users", "licensed users", "active users", "seats",
                "licenses", "headcount",
            ]),
        );
        header_synonyms.insert(
            CanonicalField::Complexity,
            strings(&["complexity tier", "complexity level", "migration complexity", "difficulty"]),
        );
        header_synonyms.insert(
            CanonicalField::Deployment,
            strings(&["deployment", "hosting", "hosting model", "deployment model", "environment"]),
        );
        header_synonyms.insert(
            CanonicalField::IntegrationCount,
            strings(&["integrations", "number of integrations", "connected systems", "integration points"]),
        );
        header_synonyms.insert(
            CanonicalField::SsoRequired,
            strings(&["sso", "single sign on", "sso enabled", "requires sso"]),
        );
        header_synonyms.insert(
            CanonicalField::DataVolume,
            strings(&["data size", "data volume gb", "storage", "storage gb", "data gb"]),
        );
        header_synonyms.insert(
            CanonicalField::CustomInterfaces,
            strings(&["custom integrations", "custom apis", "bespoke interfaces", "interfaces"]),
        );
        header_synonyms.insert(
            CanonicalField::ParentHosted,
            strings(&["hosted by parent", "parent hosting", "shared service", "tsa required", "parent provided"]),
        );
        header_synonyms.insert(
            CanonicalField::Entity,
            strings(&["company", "party", "legal entity", "owned by", "entity name", "organization", "organisation"]),
        );

        Self {
            header_synonyms,
            mapping_threshold: 0.6,
            header_row_text_ratio: 0.8,
            data_row_numeric_ratio: 0.5,
            max_stacked_header_rows: 3,
            header_separator: " ".to_string(),
            review_threshold: 0.7,
            entity_keywords: EntityKeywords::default(),
            entity_enforcement_cutoff: None,
            legacy_default_entity: Entity::Target,
        }
    }
}

impl Default for EntityKeywords {
    fn default() -> Self {
        Self {
            target: strings(&[
                "target", "targetco", "target co", "seller", "divested", "carve out", "carved out",
                "spinco", "acquiree",
            ]),
            acquirer: strings(&["acquirer", "acquiror", "buyer", "purchaser", "acquiring", "buyerco"]),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        let complexity_multipliers = BTreeMap::from([
            (ComplexityTier::Simple, 0.5),
            (ComplexityTier::Medium, 1.0),
            (ComplexityTier::Complex, 2.0),
            (ComplexityTier::Critical, 3.0),
        ]);

        let category_multipliers = [
            ("erp", 1.5),
            ("financial", 1.4),
            ("finance", 1.4),
            ("accounting", 1.3),
            ("billing", 1.3),
            ("payroll", 1.3),
            ("security", 1.3),
            ("crm", 1.2),
            ("infrastructure", 1.2),
            ("hr", 1.1),
            ("hcm", 1.1),
            ("analytics", 1.1),
            ("collaboration", 0.8),
            ("communication", 0.8),
            ("productivity", 0.7),
            ("custom", 1.6),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let deployment_multipliers = BTreeMap::from([
            (DeploymentType::Saas, 0.8),
            (DeploymentType::Cloud, 1.0),
            (DeploymentType::Hybrid, 1.2),
            (DeploymentType::OnPremises, 1.3),
            (DeploymentType::Custom, 1.4),
            (DeploymentType::Unknown, 1.0),
        ]);

        Self {
            critical_categories: strings(&[
                "erp", "financial", "finance", "accounting", "general ledger", "core banking", "billing",
                "payroll", "treasury",
            ]),
            custom_categories: strings(&["custom", "bespoke", "in house", "homegrown"]),
            complex_user_threshold: 1000,
            complex_integration_threshold: 10,
            simple_user_threshold: 100,
            saas_vendors: strings(&[
                "salesforce", "workday", "servicenow", "slack", "zoom", "atlassian", "hubspot", "zendesk",
                "docusign", "box", "dropbox", "okta", "netsuite", "concur", "coupa", "adp",
            ]),
            complexity_multipliers,
            category_multipliers,
            deployment_multipliers,
        }
    }
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            base_cost: 25_000.0,
            per_integration_cost: 20_000.0,
            sso_cost: 15_000.0,
            per_gb_cost: 100.0,
            per_custom_interface_cost: 30_000.0,
            tsa_monthly_rates: BTreeMap::from([
                (ComplexityTier::Simple, 2_000.0),
                (ComplexityTier::Medium, 5_000.0),
                (ComplexityTier::Complex, 10_000.0),
                (ComplexityTier::Critical, 20_000.0),
            ]),
            tsa_user_bands: vec![
                UserBand { up_to: Some(100), factor: 1.0 },
                UserBand { up_to: Some(500), factor: 1.25 },
                UserBand { up_to: Some(1000), factor: 1.5 },
                UserBand { up_to: None, factor: 2.0 },
            ],
            tsa_default_duration_months: 12,
            deal_multipliers: BTreeMap::from([
                (DealType::Acquisition, 1.0),
                (DealType::Merger, 1.1),
                (DealType::CarveOut, 1.3),
                (DealType::Divestiture, 1.2),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.extraction.entity_enforcement_cutoff, None);
    }

    #[test]
    fn test_rejects_non_positive_multiplier() {
        let mut config = AppConfig::default();
        config.classification.category_multipliers.insert("crm".into(), 0.0);
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_rejects_unsorted_user_bands() {
        let mut cost = CostModelConfig::default();
        cost.tsa_user_bands = vec![
            UserBand { up_to: Some(500), factor: 1.0 },
            UserBand { up_to: Some(100), factor: 1.2 },
        ];
        assert!(cost.validate().is_err());
    }

    #[test]
    fn test_default_deal_context_uses_table() {
        let cost = CostModelConfig::default();
        let deal = cost.default_deal_context(DealType::CarveOut);
        assert_eq!(deal.multiplier, 1.3);
        assert_eq!(deal.entity_scope, None);
    }

    #[test]
    fn test_partial_json_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server": {"port": 9000}, "cost": {"base_cost": 10000.0}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cost.base_cost, 10_000.0);
        assert_eq!(config.cost.tsa_default_duration_months, 12);
    }
}
