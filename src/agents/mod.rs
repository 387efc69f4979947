mod builtin;

use serde::{Deserialize, Serialize};

pub use builtin::{builtin_agents, BuiltinCatalog};

/// Category shown for agents whose category is not in [`CATEGORIES`].
pub const UNCATEGORIZED: &str = "Sin Categoría";

pub const CATEGORIES: &[&str] = &["Marketing", "Productividad", "Finanzas", "Ventas", "Legal"];

/// Normalise a category for display and filtering.
pub fn category_or_default(category: &str) -> &str {
    CATEGORIES
        .iter()
        .find(|known| **known == category)
        .copied()
        .unwrap_or(UNCATEGORIZED)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Claude,
    Gemini,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::Claude => "claude",
            ModelProvider::Gemini => "gemini",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "claude" => Some(ModelProvider::Claude),
            "gemini" => Some(ModelProvider::Gemini),
            _ => None,
        }
    }
}

/// A persona the user can chat with. Read-only for the chat core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub emoji: Option<String>,
    pub description: String,
    pub category: String,
    pub system_prompt: String,
    pub welcome_message: Option<String>,
    #[serde(default)]
    pub model_provider: ModelProvider,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
#[error("agent catalog unavailable: {0}")]
pub struct CatalogError(pub String);

/// Read-only access to the agent catalog.
pub trait AgentCatalog: Send + Sync {
    /// Active agents, in catalog order.
    fn list_agents(&self) -> Result<Vec<Agent>, CatalogError>;

    fn get_agent(&self, id: &str) -> Result<Option<Agent>, CatalogError>;

    fn list_by_category(&self, category: &str) -> Result<Vec<Agent>, CatalogError> {
        Ok(self
            .list_agents()?
            .into_iter()
            .filter(|agent| category_or_default(&agent.category) == category)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_falls_back() {
        assert_eq!(category_or_default("Marketing"), "Marketing");
        assert_eq!(category_or_default("Cocina"), UNCATEGORIZED);
    }

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = BuiltinCatalog::new();
        let agent = catalog.get_agent("coach-ventas").unwrap().unwrap();
        assert_eq!(agent.category, "Ventas");
        assert!(agent.welcome_message.is_some());
        assert!(catalog.get_agent("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_by_category() {
        let catalog = BuiltinCatalog::new();
        let finance = catalog.list_by_category("Finanzas").unwrap();
        assert_eq!(finance.len(), 1);
        assert_eq!(finance[0].id, "estratega-fundraising");
        assert!(catalog.list_by_category(UNCATEGORIZED).unwrap().is_empty());
    }

    #[test]
    fn test_inactive_agents_hidden() {
        let mut agents = builtin_agents();
        agents[0].is_active = false;
        let catalog = BuiltinCatalog::from_agents(agents);
        assert_eq!(catalog.list_agents().unwrap().len(), 4);
        // Lookup by id still resolves so existing conversations keep working.
        assert!(catalog.get_agent("marketing-digital").unwrap().is_some());
    }
}
