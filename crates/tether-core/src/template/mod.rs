//! Deployment template loading and preparation.

pub mod source;

use serde_json::{Map, Value};

use crate::cloud::TenantResolver;
use crate::error::SetupError;

pub use source::{
    FileTemplateSource, HttpTemplateSource, TemplateLocation, TemplateSource, load_parameters,
};

/// Template parameter that carries the managing tenant id.
pub const DEFAULT_TENANT_PARAMETER: &str = "managedByTenantId";

/// A loaded deployment template and its optional parameter bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub payload: Value,
    pub parameters: Option<Value>,
}

impl Template {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Option<Value>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Template ready to be turned into per-target deployment requests.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTemplate {
    pub payload: Value,
    pub parameters: Option<Value>,
    /// Tenant that will own the delegation, written into every result record.
    pub capability_owner_id: Option<String>,
}

impl PreparedTemplate {
    /// Prepare a template without resolving anything.
    pub fn from_template(template: Template, tenant_parameter: &str) -> Self {
        let capability_owner_id =
            owner_id(&template.payload, template.parameters.as_ref(), tenant_parameter);
        Self {
            payload: template.payload,
            parameters: template.parameters,
            capability_owner_id,
        }
    }

    /// Prepare a template for a run.
    ///
    /// When simulating, the managing tenant id is resolved and injected as the
    /// default value of `tenant_parameter`. Failure to resolve it aborts the run,
    /// since it affects every target identically.
    pub fn prepare(
        template: Template,
        simulate: bool,
        tenants: &dyn TenantResolver,
        tenant_parameter: &str,
    ) -> Result<Self, SetupError> {
        let mut template = template;
        if simulate {
            let tenant_id = match tenants.tenant_id() {
                Ok(Some(id)) => id,
                Ok(None) => {
                    return Err(SetupError::TenantUnresolved {
                        message: "no tenant id reported for the signed-in account".to_string(),
                    });
                }
                Err(err) => {
                    return Err(SetupError::TenantUnresolved {
                        message: format!("{:#}", err),
                    });
                }
            };
            inject_tenant_id(&mut template.payload, tenant_parameter, &tenant_id)?;
        }
        Ok(Self::from_template(template, tenant_parameter))
    }
}

/// Set `parameters.<name>.defaultValue` in a template payload.
pub fn inject_tenant_id(
    payload: &mut Value,
    parameter: &str,
    tenant_id: &str,
) -> Result<(), SetupError> {
    let root = payload
        .as_object_mut()
        .ok_or_else(|| SetupError::TemplateUnavailable {
            location: "template".to_string(),
            message: "template payload is not a JSON object".to_string(),
        })?;
    let parameters = root
        .entry("parameters")
        .or_insert_with(|| Value::Object(Map::new()));
    let parameters = parameters
        .as_object_mut()
        .ok_or_else(|| SetupError::TemplateUnavailable {
            location: "template".to_string(),
            message: "template 'parameters' is not a JSON object".to_string(),
        })?;

    let entry = parameters
        .entry(parameter.to_string())
        .or_insert_with(|| serde_json::json!({ "type": "string" }));
    match entry.as_object_mut() {
        Some(definition) => {
            definition.insert(
                "defaultValue".to_string(),
                Value::String(tenant_id.to_string()),
            );
            Ok(())
        }
        None => Err(SetupError::TemplateUnavailable {
            location: "template".to_string(),
            message: format!("template parameter '{}' is not a JSON object", parameter),
        }),
    }
}

/// Capability owner id: parameter bag value first, then the template default.
fn owner_id(payload: &Value, parameters: Option<&Value>, parameter: &str) -> Option<String> {
    let from_bag = parameters.and_then(|bag| {
        let bag = bag.get("parameters").unwrap_or(bag);
        bag.get(parameter)?.get("value")?.as_str().map(str::to_string)
    });
    from_bag.or_else(|| {
        payload
            .get("parameters")?
            .get(parameter)?
            .get("defaultValue")?
            .as_str()
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn inject_sets_default_value() {
        let mut payload = json!({
            "parameters": { "managedByTenantId": { "type": "string" } }
        });
        inject_tenant_id(&mut payload, DEFAULT_TENANT_PARAMETER, "tenant-1").unwrap();
        assert_eq!(
            payload["parameters"]["managedByTenantId"]["defaultValue"],
            "tenant-1"
        );
    }

    #[test]
    fn inject_creates_missing_parameter() {
        let mut payload = json!({ "resources": [] });
        inject_tenant_id(&mut payload, "owner", "tenant-1").unwrap();
        assert_eq!(payload["parameters"]["owner"]["type"], "string");
        assert_eq!(payload["parameters"]["owner"]["defaultValue"], "tenant-1");
    }

    #[test]
    fn inject_rejects_non_object_payload() {
        let mut payload = json!([1, 2]);
        assert!(inject_tenant_id(&mut payload, "owner", "t").is_err());
    }

    #[test]
    fn owner_prefers_parameter_bag() {
        let payload = json!({
            "parameters": { "managedByTenantId": { "defaultValue": "from-template" } }
        });
        let bag = json!({ "managedByTenantId": { "value": "from-bag" } });
        assert_eq!(
            owner_id(&payload, Some(&bag), DEFAULT_TENANT_PARAMETER).as_deref(),
            Some("from-bag")
        );
        assert_eq!(
            owner_id(&payload, None, DEFAULT_TENANT_PARAMETER).as_deref(),
            Some("from-template")
        );
    }
}
