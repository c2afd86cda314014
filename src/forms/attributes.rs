//! Building the attribute document submitted when a wizard completes

use serde_json::{Map, Value};
use uuid::Uuid;

use super::WizardData;

/// Key of the hidden metadata object carried by every component
pub const HIDDEN_KEY: &str = "?";

/// Resolve a `$.<step>.<field>` reference against submitted data
fn resolve_reference<'a>(reference: &str, data: &'a WizardData) -> Option<Option<&'a Value>> {
    let path = reference.strip_prefix("$.")?;
    let (step, field) = path.split_once('.')?;
    Some(data.get(step).and_then(|values| values.get(field)))
}

fn substitute(template: &Value, data: &WizardData) -> Value {
    match template {
        Value::String(s) => match resolve_reference(s, data) {
            Some(resolved) => resolved.cloned().unwrap_or(Value::Null),
            None => template.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, data)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, data)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Build the component attributes from the submitted step data.
///
/// With a template, `$.<step>.<field>` strings are replaced by the submitted
/// values (`null` when never answered). Without one, the answers of `steps`
/// are merged into one flat object, later steps winning on name clashes.
/// Either way the root's `?.type` is set to `type_name` if absent.
pub fn extract_attributes(
    template: Option<&Value>,
    data: &WizardData,
    steps: &[String],
    type_name: &str,
) -> Value {
    let mut attributes = match template {
        Some(template @ Value::Object(_)) => substitute(template, data),
        _ => {
            let mut merged = Map::new();
            for step in steps {
                if let Some(values) = data.get(step) {
                    for (k, v) in values {
                        merged.insert(k.clone(), v.clone());
                    }
                }
            }
            Value::Object(merged)
        }
    };

    if let Some(root) = attributes.as_object_mut() {
        let hidden = root
            .entry(HIDDEN_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(hidden) = hidden.as_object_mut() {
            hidden
                .entry("type")
                .or_insert_with(|| Value::String(type_name.to_string()));
        }
    }

    attributes
}

/// Give every object that carries a `?` section an `?.id`, keeping existing ids
pub fn insert_hidden_ids(mut attributes: Value) -> Value {
    fn walk(value: &mut Value) {
        match value {
            Value::Object(map) => {
                if let Some(Value::Object(hidden)) = map.get_mut(HIDDEN_KEY) {
                    hidden
                        .entry("id")
                        .or_insert_with(|| Value::String(Uuid::new_v4().simple().to_string()));
                }
                for (key, child) in map.iter_mut() {
                    if key != HIDDEN_KEY {
                        walk(child);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(walk),
            _ => {}
        }
    }

    if let Some(root) = attributes.as_object_mut() {
        root.entry(HIDDEN_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
    }
    walk(&mut attributes);
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> WizardData {
        let mut data = WizardData::new();
        data.insert(
            "appConfiguration".to_string(),
            json!({"name": "web", "advanced": true})
                .as_object()
                .unwrap()
                .clone(),
        );
        data.insert(
            "instanceConfiguration".to_string(),
            json!({"flavor": "m1.small", "name": "web-vm"})
                .as_object()
                .unwrap()
                .clone(),
        );
        data
    }

    #[test]
    fn test_template_substitution() {
        let template = json!({
            "?": {"type": "io.murano.apps.Apache"},
            "name": "$.appConfiguration.name",
            "instance": {
                "?": {"type": "io.murano.resources.LinuxInstance"},
                "flavor": "$.instanceConfiguration.flavor",
                "keypair": "$.instanceConfiguration.keypair"
            },
            "ports": ["$.appConfiguration.name", 80]
        });

        let attrs = extract_attributes(Some(&template), &data(), &[], "ignored");

        assert_eq!(attrs["name"], json!("web"));
        assert_eq!(attrs["instance"]["flavor"], json!("m1.small"));
        assert_eq!(attrs["instance"]["keypair"], Value::Null);
        assert_eq!(attrs["ports"], json!(["web", 80]));
        assert_eq!(attrs["?"]["type"], json!("io.murano.apps.Apache"));
    }

    #[test]
    fn test_flat_merge_follows_step_order() {
        let steps = vec![
            "appConfiguration".to_string(),
            "instanceConfiguration".to_string(),
        ];
        let attrs = extract_attributes(None, &data(), &steps, "io.murano.apps.Apache");

        assert_eq!(attrs["name"], json!("web-vm"));
        assert_eq!(attrs["flavor"], json!("m1.small"));
        assert_eq!(attrs["?"]["type"], json!("io.murano.apps.Apache"));
    }

    #[test]
    fn test_flat_merge_skips_unlisted_steps() {
        let steps = vec!["appConfiguration".to_string()];
        let attrs = extract_attributes(None, &data(), &steps, "t");
        assert!(attrs.get("flavor").is_none());
    }

    #[test]
    fn test_insert_hidden_ids() {
        let attrs = insert_hidden_ids(json!({
            "name": "web",
            "instance": {"?": {"type": "vm"}},
            "volumes": [{"?": {"type": "vol", "id": "keep-me"}}]
        }));

        assert!(attrs["?"]["id"].is_string());
        assert!(attrs["instance"]["?"]["id"].is_string());
        assert_ne!(attrs["?"]["id"], attrs["instance"]["?"]["id"]);
        assert_eq!(attrs["volumes"][0]["?"]["id"], json!("keep-me"));
    }
}
