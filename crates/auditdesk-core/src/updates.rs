//! Partial updates for audit items.
//!
//! Only `Some` fields are changed. The same struct is the payload buffered by
//! the debounced persister, the SET list of the UPDATE statement, and the
//! activity log detail (changed fields only).

use serde::Serialize;

use crate::enums::{ItemField, Remark};
use crate::errors::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    /// `Some(None)` clears the remark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<Option<Remark>>,
}

impl ItemChanges {
    /// Build a single-field change from raw input.
    ///
    /// Text fields accept any string, including empty. `remark` must be one of
    /// the allowed values, or `""`/`"unset"` to clear it.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidEnumValue` for a remark outside the allowed set.
    pub fn for_field(field: ItemField, value: &str) -> Result<Self, CoreError> {
        let builder = ItemChangesBuilder::new();
        let builder = match field {
            ItemField::AuditDetails => builder.audit_details(value),
            ItemField::Observation => builder.observation(value),
            ItemField::Remark => builder.remark(Remark::parse_optional(value)?),
        };
        Ok(builder.build())
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.audit_details.is_none() && self.observation.is_none() && self.remark.is_none()
    }

    /// Merge a newer change set into this one. Keys present in `newer`
    /// override; keys only present here are kept.
    pub fn merge(&mut self, newer: Self) {
        if newer.audit_details.is_some() {
            self.audit_details = newer.audit_details;
        }
        if newer.observation.is_some() {
            self.observation = newer.observation;
        }
        if newer.remark.is_some() {
            self.remark = newer.remark;
        }
    }

    /// Fields carried by this change set.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<ItemField> {
        let mut fields = Vec::with_capacity(3);
        if self.audit_details.is_some() {
            fields.push(ItemField::AuditDetails);
        }
        if self.observation.is_some() {
            fields.push(ItemField::Observation);
        }
        if self.remark.is_some() {
            fields.push(ItemField::Remark);
        }
        fields
    }
}

#[derive(Debug, Default)]
pub struct ItemChangesBuilder(ItemChanges);

impl ItemChangesBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ItemChanges::default())
    }

    #[must_use]
    pub fn audit_details(mut self, audit_details: impl Into<String>) -> Self {
        self.0.audit_details = Some(audit_details.into());
        self
    }

    #[must_use]
    pub fn observation(mut self, observation: impl Into<String>) -> Self {
        self.0.observation = Some(observation.into());
        self
    }

    #[must_use]
    pub const fn remark(mut self, remark: Option<Remark>) -> Self {
        self.0.remark = Some(remark);
        self
    }

    #[must_use]
    pub fn build(self) -> ItemChanges {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn for_field_validates_remark() {
        let ok = ItemChanges::for_field(ItemField::Remark, "not_applicable").unwrap();
        assert_eq!(ok.remark, Some(Some(Remark::NotApplicable)));

        let cleared = ItemChanges::for_field(ItemField::Remark, "").unwrap();
        assert_eq!(cleared.remark, Some(None));

        assert!(matches!(
            ItemChanges::for_field(ItemField::Remark, "partially"),
            Err(CoreError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn for_field_accepts_any_text() {
        let empty = ItemChanges::for_field(ItemField::Observation, "").unwrap();
        assert_eq!(empty.observation.as_deref(), Some(""));
        assert!(!empty.is_empty());
    }

    #[test]
    fn merge_newer_overrides_conflicting_keys() {
        let mut pending = ItemChangesBuilder::new()
            .audit_details("first draft")
            .remark(Some(Remark::Yes))
            .build();
        pending.merge(
            ItemChangesBuilder::new()
                .audit_details("second draft")
                .observation("door wedged open")
                .build(),
        );

        assert_eq!(
            pending,
            ItemChanges {
                audit_details: Some("second draft".into()),
                observation: Some("door wedged open".into()),
                remark: Some(Some(Remark::Yes)),
            }
        );
        assert_eq!(
            pending.changed_fields(),
            vec![ItemField::AuditDetails, ItemField::Observation, ItemField::Remark]
        );
    }

    #[test]
    fn serializes_changed_fields_only() {
        let changes = ItemChangesBuilder::new().remark(None).build();
        assert_eq!(serde_json::to_string(&changes).unwrap(), r#"{"remark":null}"#);
    }
}
