//! Surface and contact materials

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FRICTION, DEFAULT_RESTITUTION};

/// A named surface material
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceMaterial(pub String);

impl SurfaceMaterial {
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

/// Friction/restitution for a pair of surface materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMaterial {
    pub a: SurfaceMaterial,
    pub b: SurfaceMaterial,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self::self_paired(SurfaceMaterial::default(), DEFAULT_FRICTION, DEFAULT_RESTITUTION)
    }
}

impl ContactMaterial {
    /// Friction is clamped to >= 0 and restitution to [0, 1]
    pub fn new(a: SurfaceMaterial, b: SurfaceMaterial, friction: f32, restitution: f32) -> Self {
        let friction = if friction.is_finite() { friction.max(0.0) } else { 0.0 };
        let restitution = if restitution.is_finite() {
            restitution.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            a,
            b,
            friction,
            restitution,
        }
    }

    pub fn self_paired(material: SurfaceMaterial, friction: f32, restitution: f32) -> Self {
        Self::new(material.clone(), material, friction, restitution)
    }

    /// Order-independent pair match
    pub fn pairs(&self, a: &SurfaceMaterial, b: &SurfaceMaterial) -> bool {
        (self.a == *a && self.b == *b) || (self.a == *b && self.b == *a)
    }
}

/// Registered contact materials with a fallback for unknown pairs
#[derive(Debug, Clone)]
pub struct MaterialTable {
    fallback: ContactMaterial,
    entries: Vec<ContactMaterial>,
}

impl MaterialTable {
    pub fn new(fallback: ContactMaterial) -> Self {
        Self {
            entries: vec![fallback.clone()],
            fallback,
        }
    }

    pub fn fallback(&self) -> &ContactMaterial {
        &self.fallback
    }

    /// Register a contact material, replacing any existing one for the same pair
    pub fn insert(&mut self, material: ContactMaterial) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|m| m.pairs(&material.a, &material.b))
        {
            *existing = material;
        } else {
            self.entries.push(material);
        }
    }

    pub fn lookup(&self, a: &SurfaceMaterial, b: &SurfaceMaterial) -> &ContactMaterial {
        self.entries
            .iter()
            .find(|m| m.pairs(a, b))
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_are_clamped() {
        let m = ContactMaterial::self_paired(SurfaceMaterial::default(), -1.0, 1.7);
        assert_eq!(m.friction, 0.0);
        assert_eq!(m.restitution, 1.0);

        let m = ContactMaterial::self_paired(SurfaceMaterial::default(), f32::NAN, f32::NAN);
        assert_eq!(m.friction, 0.0);
        assert_eq!(m.restitution, 0.0);
    }

    #[test]
    fn test_pairs_is_symmetric() {
        let ice = SurfaceMaterial::new("ice");
        let rubber = SurfaceMaterial::new("rubber");
        let m = ContactMaterial::new(ice.clone(), rubber.clone(), 0.0, 0.9);
        assert!(m.pairs(&ice, &rubber));
        assert!(m.pairs(&rubber, &ice));
        assert!(!m.pairs(&ice, &ice));
    }

    #[test]
    fn test_default_is_self_paired() {
        let m = ContactMaterial::default();
        assert_eq!(m.a, m.b);
        assert_eq!(m.friction, DEFAULT_FRICTION);
        assert_eq!(m.restitution, DEFAULT_RESTITUTION);
    }

    #[test]
    fn test_table_pair_lookup_and_replace() {
        let ice = SurfaceMaterial::new("ice");
        let rubber = SurfaceMaterial::new("rubber");
        let mut table = MaterialTable::new(ContactMaterial::default());
        assert_eq!(table.lookup(&ice, &rubber), table.fallback());

        table.insert(ContactMaterial::new(ice.clone(), rubber.clone(), 0.2, 0.3));
        table.insert(ContactMaterial::new(rubber.clone(), ice.clone(), 0.4, 0.0));
        assert_eq!(table.len(), 2);
        let m = table.lookup(&ice, &rubber);
        assert_eq!(m.friction, 0.4);
        assert_eq!(m.restitution, 0.0);
        assert_eq!(table.lookup(&ice, &ice), table.fallback());
    }
}
