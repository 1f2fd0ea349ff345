// Plugin stubs: named objects with an entity-update hook that only logs

use log::info;
use std::fmt::Display;

/// Log target shared by every plugin line
pub const PLUGIN_LOG_TARGET: &str = "plugin";

pub trait Plugin {
    fn name(&self) -> &str;

    /// Logs exactly one line naming the entity and returns that line.
    /// Accepts anything displayable and never panics.
    fn on_entity_update(&self, entity: &dyn Display) -> String {
        let line = format!("{}: entity {} updated", self.name(), entity);
        info!(target: PLUGIN_LOG_TARGET, "{}", line);
        line
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn name(&self) -> &str {
        "physics"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptingPlugin;

impl Plugin for ScriptingPlugin {
    fn name(&self) -> &str {
        "scripting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityId;

    #[test]
    fn test_line_names_plugin_and_entity() {
        let line = PhysicsPlugin.on_entity_update(&"e1");
        assert!(line.contains("e1"));
        assert!(line.starts_with("physics"));
        assert!(ScriptingPlugin.on_entity_update(&EntityId::new("e1")).contains("e1"));
    }

    #[test]
    fn test_any_displayable_input_is_accepted() {
        assert!(PhysicsPlugin.on_entity_update(&42).contains("42"));
        assert!(PhysicsPlugin.on_entity_update(&3.5).contains("3.5"));
        assert!(PhysicsPlugin.on_entity_update(&"").contains("entity  updated"));
    }
}
