use std::collections::HashMap;
use std::fmt;

use super::state::Player;

type Constructor = Box<dyn Fn() -> Player + Send + Sync>;

/// Constructors for players, keyed by template name. Built once at startup
/// and used to create the local mirror of a remote entity.
#[derive(Default)]
pub struct TemplateRegistry {
    constructors: HashMap<String, Constructor>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("TemplateRegistry").field("templates", &names).finish()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Player + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.insert(name.clone(), Box::new(constructor)).is_some() {
            log::warn!("template {name} registered twice; keeping the latest");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// A fresh player for `name`, with its template field filled in.
    pub fn build(&self, name: &str) -> Option<Player> {
        let constructor = self.constructors.get(name)?;
        let mut player = constructor();
        player.template = name.to_string();
        Some(player)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::VehicleClass;

    #[test]
    fn test_build_registered_template() {
        let mut registry = TemplateRegistry::new();
        registry.register("f16", || Player::default().with_class(VehicleClass::Air));
        assert!(registry.contains("f16"));

        let player = registry.build("f16");
        assert!(player.is_some());
        let player = player.unwrap_or_default();
        assert_eq!(player.template, "f16");
        assert_eq!(player.class, VehicleClass::Air);
        assert!(registry.build("mig29").is_none());
    }
}
