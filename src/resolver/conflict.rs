// src/resolver/conflict.rs

//! Conflict types for dependency resolution
//!
//! Carried by [`crate::Error::ImpossibleConfiguration`] so callers can tell
//! which requirement chains collided.

/// Label used as the requirer of root requests
pub const ROOT_REQUIRER: &str = "<request>";

/// A conflict between package requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// No stored version satisfies a single requirement
    UnsatisfiableConstraint {
        package: String,
        available: Vec<String>,
        required_constraint: String,
        required_by: String,
    },
    /// Every stored version fails at least one of the incoming constraints
    ConflictingConstraints {
        package: String,
        constraints: Vec<(String, String)>, // (requirer, constraint)
    },
}

impl Conflict {
    /// Name of the package the conflict is about
    pub fn package(&self) -> &str {
        match self {
            Conflict::UnsatisfiableConstraint { package, .. }
            | Conflict::ConflictingConstraints { package, .. } => package,
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::UnsatisfiableConstraint {
                package,
                available,
                required_constraint,
                required_by,
            } => write!(
                f,
                "no version of {} satisfies {} required by {} (stored: {})",
                package,
                required_constraint,
                required_by,
                available.join(", ")
            ),
            Conflict::ConflictingConstraints {
                package,
                constraints,
            } => {
                write!(f, "conflicting version requirements for {}:", package)?;
                for (requirer, constraint) in constraints {
                    write!(f, " {} requires {};", requirer, constraint)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_requirer() {
        let conflict = Conflict::ConflictingConstraints {
            package: "DEP-1".to_string(),
            constraints: vec![
                ("A:1".to_string(), "= 0.1.0".to_string()),
                ("B:1".to_string(), "= 0.2.0".to_string()),
            ],
        };
        let text = conflict.to_string();
        assert!(text.contains("A:1 requires = 0.1.0"));
        assert!(text.contains("B:1 requires = 0.2.0"));
        assert_eq!(conflict.package(), "DEP-1");
    }
}
