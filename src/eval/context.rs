use super::Value;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Stand-in for the browser globals packed player scripts expect to exist
///
/// Only `window`, `document` and `navigator` are visible to evaluated expressions;
/// nothing else is in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    pub location_href: String,
    pub user_agent: String,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            location_href: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl EvalContext {
    #[must_use]
    pub fn with_location_href(mut self, href: impl Into<String>) -> Self {
        self.location_href = href.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        match name {
            "window" => Some(Value::object([(
                "location",
                Value::object([("href", Value::String(self.location_href.clone()))]),
            )])),
            "navigator" => Some(Value::object([(
                "userAgent",
                Value::String(self.user_agent.clone()),
            )])),
            "document" => Some(Value::object::<String>([])),
            _ => None,
        }
    }
}
