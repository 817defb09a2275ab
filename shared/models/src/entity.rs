//! Business-party attribution models.
//!
//! `Entity` is the only form an attribution takes on a record. `EntityTag`
//! is the resolver's answer for a whole table and may still be `PerRow` or
//! `Unresolved`; neither converts to an `Entity` silently.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Target,
    Acquirer,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Acquirer => "acquirer",
        }
    }
}

impl std::str::FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "target" => Ok(Self::Target),
            "acquirer" => Ok(Self::Acquirer),
            other => Err(format!("unknown entity '{}'", other)),
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Table-level attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityTag {
    Target,
    Acquirer,
    /// The table carries an entity column and must be split before records
    /// are built
    PerRow { column: usize },
    Unresolved,
}

impl EntityTag {
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Self::Target => Some(Entity::Target),
            Self::Acquirer => Some(Entity::Acquirer),
            Self::PerRow { .. } | Self::Unresolved => None,
        }
    }
}

impl From<Entity> for EntityTag {
    fn from(entity: Entity) -> Self {
        match entity {
            Entity::Target => Self::Target,
            Entity::Acquirer => Self::Acquirer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    EntityColumn,
    SectionContext,
    Filename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    High,
    Low,
}

/// One piece of evidence the resolver found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySignal {
    pub source: SignalSource,
    pub entity: Entity,
    pub strength: SignalStrength,
    /// Matched keyword or cell text
    pub evidence: String,
}

impl std::fmt::Display for EntitySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match self.source {
            SignalSource::EntityColumn => "entity column",
            SignalSource::SectionContext => "section context",
            SignalSource::Filename => "filename",
        };
        write!(f, "{} '{}' -> {}", source, self.evidence, self.entity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResolution {
    pub tag: EntityTag,
    pub confidence: f64,
    pub signals: Vec<EntitySignal>,
}

impl EntityResolution {
    pub fn unresolved() -> Self {
        Self {
            tag: EntityTag::Unresolved,
            confidence: 0.0,
            signals: Vec::new(),
        }
    }

    pub fn resolved(entity: Entity, confidence: f64, signals: Vec<EntitySignal>) -> Self {
        Self {
            tag: entity.into(),
            confidence,
            signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_never_yields_entity_for_unresolved() {
        assert_eq!(EntityTag::Unresolved.entity(), None);
        assert_eq!(EntityTag::PerRow { column: 2 }.entity(), None);
        assert_eq!(EntityTag::from(Entity::Acquirer).entity(), Some(Entity::Acquirer));
    }

    #[test]
    fn test_entity_parsing() {
        assert_eq!(" Target ".parse::<Entity>(), Ok(Entity::Target));
        assert_eq!("ACQUIRER".parse::<Entity>(), Ok(Entity::Acquirer));
        assert!("buyer".parse::<Entity>().is_err());
    }

    #[test]
    fn test_signal_display_lists_evidence() {
        let signal = EntitySignal {
            source: SignalSource::Filename,
            entity: Entity::Acquirer,
            strength: SignalStrength::Low,
            evidence: "buyer".into(),
        };
        assert_eq!(signal.to_string(), "filename 'buyer' -> acquirer");
    }
}
