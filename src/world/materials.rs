use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Material tag carried by every body. Contact behaviour is looked up per tag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialTag {
    Default,
    Ground,
    Particle,
    Rubber,
    Stone,
}

impl Default for MaterialTag {
    fn default() -> Self {
        Self::Default
    }
}

/// Friction and restitution used when two tagged bodies touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactProperties {
    pub friction: f32,
    pub restitution: f32,
}

impl ContactProperties {
    pub const fn new(friction: f32, restitution: f32) -> Self {
        Self { friction, restitution }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactMaterialRule {
    pub a: MaterialTag,
    pub b: MaterialTag,
    pub friction: f32,
    pub restitution: f32,
}

/// Per-pair friction/restitution table with a fallback for unlisted pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTable {
    pub default: ContactProperties,
    #[serde(default)]
    pub rules: Vec<ContactMaterialRule>,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self {
            default: ContactProperties::new(0.3, 0.2),
            rules: vec![
                ContactMaterialRule { a: MaterialTag::Ground, b: MaterialTag::Particle, friction: 0.3, restitution: 0.1 },
                ContactMaterialRule { a: MaterialTag::Particle, b: MaterialTag::Particle, friction: 0.2, restitution: 0.3 },
                ContactMaterialRule { a: MaterialTag::Ground, b: MaterialTag::Rubber, friction: 0.9, restitution: 0.6 },
                ContactMaterialRule { a: MaterialTag::Ground, b: MaterialTag::Stone, friction: 0.6, restitution: 0.05 },
            ],
        }
    }
}

impl MaterialTable {
    pub fn new(default: ContactProperties) -> Self {
        Self { default, rules: Vec::new() }
    }

    pub fn with_rule(mut self, a: MaterialTag, b: MaterialTag, friction: f32, restitution: f32) -> Self {
        self.rules.push(ContactMaterialRule { a, b, friction, restitution });
        self
    }

    /// Order-independent lookup. Later rules win over earlier ones for the same pair.
    pub fn lookup(&self, a: MaterialTag, b: MaterialTag) -> ContactProperties {
        let key = ordered(a, b);
        self.rules
            .iter()
            .rev()
            .find(|rule| ordered(rule.a, rule.b) == key)
            .map(|rule| ContactProperties::new(rule.friction, rule.restitution))
            .unwrap_or_else(|| self.mixed(a, b))
    }

    /// Unlisted pairs: geometric-mean friction and max restitution of the tags' self-rules,
    /// or the table default when a tag has no self-rule.
    fn mixed(&self, a: MaterialTag, b: MaterialTag) -> ContactProperties {
        let pa = self.self_rule(a).unwrap_or(self.default);
        let pb = self.self_rule(b).unwrap_or(self.default);
        ContactProperties {
            friction: (pa.friction * pb.friction).abs().sqrt(),
            restitution: pa.restitution.max(pb.restitution),
        }
    }

    fn self_rule(&self, tag: MaterialTag) -> Option<ContactProperties> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.a == tag && rule.b == tag)
            .map(|rule| ContactProperties::new(rule.friction, rule.restitution))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |a: MaterialTag, b: MaterialTag, props: ContactProperties| {
            if !props.friction.is_finite() || props.friction < 0.0 {
                return Err(ConfigError::InvalidMaterial { a, b, reason: "friction must be non-negative" });
            }
            if !(0.0..=1.0).contains(&props.restitution) {
                return Err(ConfigError::InvalidMaterial { a, b, reason: "restitution must lie in [0, 1]" });
            }
            Ok(())
        };
        check(MaterialTag::Default, MaterialTag::Default, self.default)?;
        for rule in &self.rules {
            check(rule.a, rule.b, ContactProperties::new(rule.friction, rule.restitution))?;
        }
        Ok(())
    }
}

fn ordered(a: MaterialTag, b: MaterialTag) -> (MaterialTag, MaterialTag) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_symmetric() {
        let table = MaterialTable::default();
        assert_eq!(
            table.lookup(MaterialTag::Particle, MaterialTag::Ground),
            table.lookup(MaterialTag::Ground, MaterialTag::Particle)
        );
        assert_eq!(table.lookup(MaterialTag::Ground, MaterialTag::Particle).restitution, 0.1);
    }

    #[test]
    fn unlisted_pairs_fall_back_to_mixing() {
        let table = MaterialTable::new(ContactProperties::new(0.5, 0.2))
            .with_rule(MaterialTag::Rubber, MaterialTag::Rubber, 0.8, 0.7);
        let mixed = table.lookup(MaterialTag::Rubber, MaterialTag::Stone);
        assert!((mixed.friction - (0.8f32 * 0.5).sqrt()).abs() < 1e-6);
        assert_eq!(mixed.restitution, 0.7);
    }

    #[test]
    fn out_of_range_restitution_is_rejected() {
        let table = MaterialTable::default().with_rule(MaterialTag::Stone, MaterialTag::Stone, 0.4, 1.5);
        assert!(matches!(table.validate(), Err(ConfigError::InvalidMaterial { .. })));
    }
}
