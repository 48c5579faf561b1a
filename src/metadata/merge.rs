//! Field-by-field merge of schema metadata onto variables and outputs.
//!
//! Under [`MergePolicy::WriteOnce`] a field that already holds a value is
//! never replaced, so re-running enrichment is a no-op. [`MergePolicy::Overwrite`]
//! lets the incoming value win whenever it is present.

use crate::metadata::AttributeSchema;
use crate::types::{Output, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precedence between an existing field value and an incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// First writer wins
    #[default]
    WriteOnce,
    /// Last writer wins
    Overwrite,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteOnce => write!(f, "write_once"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Whether a field counts as "not yet written".
pub(crate) trait Unset {
    fn is_unset(&self) -> bool;
}

impl Unset for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Unset for Option<T> {
    fn is_unset(&self) -> bool {
        self.is_none()
    }
}

impl<T> Unset for Vec<T> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

fn fill<T: Unset>(target: &mut T, incoming: Option<T>, policy: MergePolicy) {
    let Some(value) = incoming else {
        return;
    };
    if value.is_unset() {
        return;
    }
    if policy == MergePolicy::Overwrite || target.is_unset() {
        *target = value;
    }
}

/// True if a variable of this declared type may receive metadata.
#[must_use]
pub fn is_enrichable(type_name: &str, whitelist: &[String]) -> bool {
    whitelist.iter().any(|t| t == type_name)
}

/// Copy schema fields onto a variable.
///
/// `optional` is only taken once `required` is known to be `false`, and the
/// schema's `secure` flag fills `sensitive`.
pub fn apply_to_variable(variable: &mut Variable, schema: &AttributeSchema, policy: MergePolicy) {
    fill(&mut variable.aliases, schema.aliases.clone().map(Some), policy);
    fill(&mut variable.allowed_values, schema.options.clone(), policy);
    fill(&mut variable.cloud_data_type, schema.cloud_data_type.clone(), policy);
    fill(&mut variable.computed, schema.computed.map(Some), policy);
    fill(&mut variable.default, schema.default.clone().map(Some), policy);
    fill(&mut variable.description, schema.description.clone(), policy);
    fill(&mut variable.elem, schema.elem.clone().map(Some), policy);
    fill(&mut variable.hidden, schema.hidden.map(Some), policy);
    fill(&mut variable.immutable, schema.immutable.map(Some), policy);
    fill(&mut variable.link_status, schema.link_status.clone(), policy);
    fill(&mut variable.matches, schema.matches.clone(), policy);
    fill(&mut variable.max_items, schema.max_items.map(Some), policy);
    fill(&mut variable.max_value, schema.max_value.clone(), policy);
    fill(&mut variable.min_items, schema.min_items.map(Some), policy);
    fill(&mut variable.min_value, schema.min_value.clone(), policy);
    fill(&mut variable.min_value_length, schema.min_length.clone().map(Some), policy);
    fill(&mut variable.max_value_length, schema.max_length.clone().map(Some), policy);
    fill(&mut variable.required, schema.required.map(Some), policy);
    if variable.required == Some(false) {
        fill(&mut variable.optional, schema.optional.map(Some), policy);
    }
    fill(&mut variable.sensitive, schema.secure.map(Some), policy);
    fill(&mut variable.deprecated, schema.deprecated.clone(), policy);
    fill(&mut variable.cloud_data_range, schema.cloud_data_range.clone(), policy);
}

/// Copy the output subset of schema fields onto an output.
pub fn apply_to_output(output: &mut Output, schema: &AttributeSchema, policy: MergePolicy) {
    fill(&mut output.cloud_data_type, schema.cloud_data_type.clone(), policy);
    fill(&mut output.description, schema.description.clone(), policy);
    fill(&mut output.cloud_data_range, schema.cloud_data_range.clone(), policy);
}

fn present<T: Clone>(value: &T) -> Option<T> {
    Some(value.clone())
}

/// Pull a child module variable's overlay fields into the parent variable
/// bound to it. The declared type and provenance are not copied.
pub fn absorb_variable(parent: &mut Variable, child: &Variable, policy: MergePolicy) {
    fill(&mut parent.aliases, present(&child.aliases), policy);
    fill(&mut parent.allowed_values, present(&child.allowed_values), policy);
    fill(&mut parent.cloud_data_range, present(&child.cloud_data_range), policy);
    fill(&mut parent.cloud_data_type, present(&child.cloud_data_type), policy);
    fill(&mut parent.computed, present(&child.computed), policy);
    fill(&mut parent.default, present(&child.default), policy);
    fill(&mut parent.deprecated, present(&child.deprecated), policy);
    fill(&mut parent.description, present(&child.description), policy);
    fill(&mut parent.elem, present(&child.elem), policy);
    fill(&mut parent.hidden, present(&child.hidden), policy);
    fill(&mut parent.immutable, present(&child.immutable), policy);
    fill(&mut parent.link_status, present(&child.link_status), policy);
    fill(&mut parent.max_items, present(&child.max_items), policy);
    fill(&mut parent.max_value, present(&child.max_value), policy);
    fill(&mut parent.max_value_length, present(&child.max_value_length), policy);
    fill(&mut parent.min_value_length, present(&child.min_value_length), policy);
    fill(&mut parent.matches, present(&child.matches), policy);
    fill(&mut parent.min_items, present(&child.min_items), policy);
    fill(&mut parent.min_value, present(&child.min_value), policy);
    fill(&mut parent.optional, present(&child.optional), policy);
    fill(&mut parent.required, present(&child.required), policy);
    fill(&mut parent.sensitive, present(&child.sensitive), policy);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> AttributeSchema {
        AttributeSchema {
            name: "resource_group".to_string(),
            aliases: Some(vec!["rg".to_string()]),
            options: Some("a,b".to_string()),
            cloud_data_type: Some("resource_group_id".to_string()),
            description: Some("The resource group".to_string()),
            hidden: Some(false),
            max_items: Some(2),
            min_value: Some("1".to_string()),
            min_length: Some(json!(3)),
            required: Some(false),
            optional: Some(true),
            secure: Some(true),
            cloud_data_range: Some(vec![json!("resolved_to:id")]),
            ..AttributeSchema::default()
        }
    }

    #[test]
    fn test_apply_fills_empty_fields() {
        let mut variable = Variable::new("rg_id");
        variable.type_name = "string".to_string();

        apply_to_variable(&mut variable, &schema(), MergePolicy::WriteOnce);

        assert_eq!(variable.aliases, Some(vec!["rg".to_string()]));
        assert_eq!(variable.allowed_values, "a,b");
        assert_eq!(variable.cloud_data_type, "resource_group_id");
        assert_eq!(variable.description, "The resource group");
        assert_eq!(variable.hidden, Some(false));
        assert_eq!(variable.max_items, Some(2));
        assert_eq!(variable.min_value, "1");
        assert_eq!(variable.min_value_length, Some(json!(3)));
        assert_eq!(variable.required, Some(false));
        assert_eq!(variable.optional, Some(true));
        assert_eq!(variable.sensitive, Some(true));
        assert_eq!(variable.cloud_data_range, vec![json!("resolved_to:id")]);
    }

    #[test]
    fn test_optional_needs_required_false() {
        let mut variable = Variable::new("rg_id");
        variable.required = Some(true);

        apply_to_variable(&mut variable, &schema(), MergePolicy::WriteOnce);

        assert_eq!(variable.required, Some(true));
        assert_eq!(variable.optional, None);
    }

    #[test]
    fn test_write_once_keeps_first_value() {
        let mut variable = Variable::new("rg_id");
        apply_to_variable(&mut variable, &schema(), MergePolicy::WriteOnce);
        let first = variable.clone();

        let mut other = schema();
        other.description = Some("Something else".to_string());
        other.cloud_data_type = Some("region".to_string());
        other.max_items = Some(9);
        apply_to_variable(&mut variable, &other, MergePolicy::WriteOnce);

        assert_eq!(variable, first);
    }

    #[test]
    fn test_overwrite_replaces_present_values() {
        let mut variable = Variable::new("rg_id");
        variable.description = "Declared".to_string();
        variable.matches = "^a".to_string();

        let mut other = schema();
        other.description = Some("From schema".to_string());
        apply_to_variable(&mut variable, &other, MergePolicy::Overwrite);

        assert_eq!(variable.description, "From schema");
        // absent in the schema, so untouched
        assert_eq!(variable.matches, "^a");
    }

    #[test]
    fn test_apply_to_output_subset() {
        let mut output = Output::new("vpc_id");
        output.description = "Declared".to_string();

        apply_to_output(&mut output, &schema(), MergePolicy::WriteOnce);

        assert_eq!(output.description, "Declared");
        assert_eq!(output.cloud_data_type, "resource_group_id");
        assert_eq!(output.cloud_data_range.len(), 1);
    }

    #[test]
    fn test_absorb_variable_fills_only_empty() {
        let mut parent = Variable::new("db_size");
        parent.description = "Parent".to_string();
        parent.type_name = "string".to_string();

        let mut child = Variable::new("size");
        child.type_name = "number".to_string();
        child.description = "Child".to_string();
        child.allowed_values = "small,large".to_string();
        child.sensitive = Some(true);
        child.source = vec!["ibm_database.instance.plan".to_string()];

        absorb_variable(&mut parent, &child, MergePolicy::WriteOnce);

        assert_eq!(parent.description, "Parent");
        assert_eq!(parent.allowed_values, "small,large");
        assert_eq!(parent.sensitive, Some(true));
        assert_eq!(parent.type_name, "string");
        assert!(parent.source.is_empty());
    }

    #[test]
    fn test_is_enrichable() {
        let whitelist = vec!["string".to_string(), "map".to_string()];
        assert!(is_enrichable("string", &whitelist));
        assert!(!is_enrichable("list(object({a=string}))", &whitelist));
        assert!(!is_enrichable("", &whitelist));
    }
}
