use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Builds the `x-<app>-alert` / `x-<app>-params` headers sent on writes.
#[derive(Clone)]
pub struct Alerts {
    app_name: String,
    names: Option<(HeaderName, HeaderName)>,
}

impl Alerts {
    pub fn new(app_name: &str) -> Self {
        let app = app_name.to_lowercase();
        let names = match (
            HeaderName::try_from(format!("x-{}-alert", app)),
            HeaderName::try_from(format!("x-{}-params", app)),
        ) {
            (Ok(alert), Ok(params)) => Some((alert, params)),
            _ => {
                tracing::warn!("App name '{}' is not usable in a header; alerts disabled", app_name);
                None
            }
        };

        Self {
            app_name: app_name.to_string(),
            names,
        }
    }

    pub fn created(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert("created", entity, id)
    }

    pub fn updated(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert("updated", entity, id)
    }

    pub fn deleted(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert("deleted", entity, id)
    }

    fn alert(&self, action: &str, entity: &str, id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some((alert_name, params_name)) = &self.names else {
            return headers;
        };

        let message = format!("{}.{}.{}", self.app_name, entity, action);
        if let (Ok(alert), Ok(params)) = (HeaderValue::try_from(message), HeaderValue::try_from(id)) {
            headers.insert(alert_name.clone(), alert);
            headers.insert(params_name.clone(), params);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_alert() {
        let alerts = Alerts::new("cookbookApp");
        let headers = alerts.created("recipe", "12");

        assert_eq!(headers["x-cookbookapp-alert"], "cookbookApp.recipe.created");
        assert_eq!(headers["x-cookbookapp-params"], "12");
    }

    #[test]
    fn test_invalid_app_name_disables_alerts() {
        let alerts = Alerts::new("my app");
        assert!(alerts.deleted("step", "1").is_empty());
    }
}
