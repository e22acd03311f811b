//! Frontend Models
//!
//! Data structures matching the server's ingredient resource.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationField};
use crate::hub::Action;

/// Contract for every server-owned record synced by an Mco
pub trait Entity: Clone + PartialEq + Serialize + DeserializeOwned + 'static {
    /// Type of the entity's primary key
    type Id: Copy + Eq + Display;

    /// Partial projection submitted on create and update
    type Patch: Validate + Serialize;

    /// Kind name used in hub topics and identity markers
    const KIND: &'static str;

    /// REST collection path, relative to the API root
    const RESOURCE: &'static str;

    fn id(&self) -> Self::Id;

    /// Identity marker attached to the component rendering this entity
    fn identity_tag(&self) -> String {
        identity_tag::<Self>(self.id())
    }
}

/// `{Kind}-{id}` marker for an entity id
pub fn identity_tag<E: Entity>(id: E::Id) -> String {
    format!("{}-{}", E::KIND, id)
}

/// Client-side checks a patch must pass before it reaches the network
pub trait Validate: Sized {
    /// Check the patch and return it with its fields normalized
    fn validate(self, action: Action) -> Result<Self, ValidationError>;
}

/// Ingredient record (matches server)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Free-form amount and unit, never parsed
    pub quantity: String,
}

impl Ingredient {
    /// Visible label of an ingredient row
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.quantity)
    }

    /// New value with the patch's fields applied; `id` is kept
    pub fn patched(&self, patch: &IngredientPatch) -> Ingredient {
        Ingredient {
            id: self.id,
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            quantity: patch.quantity.clone().unwrap_or_else(|| self.quantity.clone()),
        }
    }
}

impl Entity for Ingredient {
    type Id = i64;
    type Patch = IngredientPatch;

    const KIND: &'static str = "Ingredient";
    const RESOURCE: &'static str = "ingredients";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Any subset of the ingredient fields, without `id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

impl IngredientPatch {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            quantity: Some(quantity.into()),
        }
    }
}

impl From<&Ingredient> for IngredientPatch {
    fn from(ingredient: &Ingredient) -> Self {
        Self::new(ingredient.name.clone(), ingredient.quantity.clone())
    }
}

impl Validate for IngredientPatch {
    fn validate(self, action: Action) -> Result<Self, ValidationError> {
        let name = required(self.name, action, ValidationField::Name)?;
        let quantity = required(self.quantity, action, ValidationField::Quantity)?;
        Ok(Self {
            name: Some(name),
            quantity: Some(quantity),
        })
    }
}

/// Present and non-blank after trimming; returns the trimmed value
fn required(
    value: Option<String>,
    action: Action,
    field: ValidationField,
) -> Result<String, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ValidationError {
            action,
            kind: Ingredient::KIND,
            field,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_tag() {
        let ingredient = Ingredient {
            id: 7,
            name: "flour".to_string(),
            quantity: "2 cups".to_string(),
        };
        assert_eq!(ingredient.identity_tag(), "Ingredient-7");
        assert_eq!(identity_tag::<Ingredient>(8), "Ingredient-8");
        assert_eq!(ingredient.label(), "flour (2 cups)");
    }

    #[test]
    fn test_validate_trims_fields() {
        let patch = IngredientPatch::new("  flour ", " 2 cups\t")
            .validate(Action::Create)
            .unwrap();
        assert_eq!(patch, IngredientPatch::new("flour", "2 cups"));
    }

    #[test]
    fn test_validate_rejects_missing_or_blank() {
        let cases = [
            (IngredientPatch::default(), ValidationField::Name),
            (IngredientPatch::new("   ", "1"), ValidationField::Name),
            (
                IngredientPatch { name: Some("salt".into()), quantity: None },
                ValidationField::Quantity,
            ),
            (IngredientPatch::new("salt", ""), ValidationField::Quantity),
        ];

        for (patch, field) in cases {
            let err = patch.validate(Action::Update).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.action, Action::Update);
        }
    }

    #[test]
    fn test_patch_serialization_skips_absent_fields() {
        let patch = IngredientPatch { name: None, quantity: Some("1 tsp".into()) };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"quantity":"1 tsp"}"#);
    }

    #[test]
    fn test_patched_keeps_id() {
        let ingredient = Ingredient { id: 3, name: "egg".into(), quantity: "2".into() };
        let patch = IngredientPatch { name: None, quantity: Some("3".into()) };
        let next = ingredient.patched(&patch);
        assert_eq!(next.id, 3);
        assert_eq!(next.name, "egg");
        assert_eq!(next.quantity, "3");
    }
}
