//! Schema field descriptor for content-management integration
//!
//! A content system exposes a taxonomy as a selectable field on its content types.
//! The core does not create any types for that; it hands the integration layer a
//! [`FieldDescriptor`] describing the field to generate.

use serde::{Deserialize, Serialize};

use crate::store::TermStore;
use crate::taxonomy::Taxonomy;

/// Prefix of generated field and index names
pub const FIELD_NAME_PREFIX: &str = "taxonomy_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// One term per content item
    SingleSelect,
    /// Any number of terms per content item
    MultiSelect,
}

/// Caller supplied field settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    /// Label of the field; the taxonomy title when unset
    pub field_title: Option<String>,
    pub field_description: String,
    pub required: bool,
    pub single_select: bool,
    /// Permission needed to edit the field
    pub write_permission: Option<String>,
}

/// Which taxonomy a field draws its terms from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRef {
    pub vocabulary_name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Registration name of the generated behavior
    pub behavior_name: String,
    pub title: String,
    pub description: String,
    pub field_name: String,
    pub field_title: String,
    pub kind: FieldKind,
    pub required: bool,
    pub write_permission: Option<String>,
    pub taxonomy: TaxonomyRef,
}

impl FieldDescriptor {
    pub fn for_taxonomy<S: TermStore>(taxonomy: &Taxonomy<S>, options: &FieldOptions) -> Self {
        let kind = if options.single_select {
            FieldKind::SingleSelect
        } else {
            FieldKind::MultiSelect
        };
        FieldDescriptor {
            behavior_name: taxonomy.generated_name(),
            title: taxonomy.title().to_string(),
            description: options.field_description.clone(),
            field_name: format!("{}{}", FIELD_NAME_PREFIX, taxonomy.short_name()),
            field_title: options
                .field_title
                .clone()
                .unwrap_or_else(|| taxonomy.title().to_string()),
            kind,
            required: options.required,
            write_permission: options.write_permission.clone(),
            taxonomy: TaxonomyRef {
                vocabulary_name: taxonomy.vocabulary_name(),
                short_name: taxonomy.short_name().to_string(),
            },
        }
    }
}
