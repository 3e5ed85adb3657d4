//! Camera constraint sets and the fallback order they are tried in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction the camera faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

impl FacingMode {
    /// Value of the `facingMode` constraint.
    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

/// How strictly a facing mode is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingConstraint {
    /// The request fails unless a camera with this facing mode exists.
    Exact(FacingMode),
    /// Preferred, but any camera satisfies the request.
    Ideal(FacingMode),
}

/// Preferred capture size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// One declarative camera request.
///
/// An empty set (no facing, no resolution) asks for any camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    #[serde(default)]
    pub facing: Option<FacingConstraint>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

impl ConstraintSet {
    pub fn any_camera() -> Self {
        Self::default()
    }

    pub fn rear_exact() -> Self {
        Self {
            facing: Some(FacingConstraint::Exact(FacingMode::Environment)),
            resolution: None,
        }
    }

    pub fn rear_preferred() -> Self {
        Self {
            facing: Some(FacingConstraint::Ideal(FacingMode::Environment)),
            resolution: None,
        }
    }

    pub fn with_resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.resolution = resolution;
        self
    }

    /// True when the set places no restriction on the camera.
    pub fn is_any(&self) -> bool {
        self.facing.is_none() && self.resolution.is_none()
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.facing {
            Some(FacingConstraint::Exact(mode)) => write!(f, "facing={} (exact)", mode.as_str())?,
            Some(FacingConstraint::Ideal(mode)) => write!(f, "facing={}", mode.as_str())?,
            None => f.write_str("any camera")?,
        }
        if let Some(res) = self.resolution {
            write!(f, " {}x{}", res.width, res.height)?;
        }
        Ok(())
    }
}

/// Depth of the acquisition fallback chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPlan {
    /// Rear camera exactly, then rear camera preferred, then any camera.
    #[default]
    Full,
    /// A single rear-preferred request.
    Minimal,
}

impl FallbackPlan {
    /// Constraint sets in descending order of preference.
    pub fn constraint_sets(self, resolution: Option<Resolution>) -> Vec<ConstraintSet> {
        let sets = match self {
            FallbackPlan::Full => vec![
                ConstraintSet::rear_exact(),
                ConstraintSet::rear_preferred(),
                ConstraintSet::any_camera(),
            ],
            FallbackPlan::Minimal => vec![ConstraintSet::rear_preferred()],
        };
        sets.into_iter()
            .map(|set| set.with_resolution(resolution))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_plan_descends_from_exact_to_any() {
        let sets = FallbackPlan::Full.constraint_sets(None);
        assert_eq!(
            sets,
            vec![
                ConstraintSet::rear_exact(),
                ConstraintSet::rear_preferred(),
                ConstraintSet::any_camera(),
            ]
        );
        assert!(sets[2].is_any());
    }

    #[test]
    fn minimal_plan_only_prefers_rear_camera() {
        let sets = FallbackPlan::Minimal.constraint_sets(None);
        assert_eq!(sets, vec![ConstraintSet::rear_preferred()]);
    }

    #[test]
    fn resolution_is_applied_to_every_set() {
        let res = Resolution {
            width: 1280,
            height: 720,
        };
        let sets = FallbackPlan::Full.constraint_sets(Some(res));
        assert!(sets.iter().all(|s| s.resolution == Some(res)));
        assert!(!sets[2].is_any());
        assert_eq!(sets[0].to_string(), "facing=environment (exact) 1280x720");
    }
}
