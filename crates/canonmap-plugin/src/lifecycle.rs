/// `Unregistered -> Installed -> Enabled <-> Disabled -> Uninstalled`, per
/// spec.md §4.4. `Unregistered` is never observed on a handle inside a
/// [`crate::Pipeline`] — it exists only as the state before `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Installed,
    Enabled,
    Disabled,
    Uninstalled,
}

impl PluginState {
    pub fn can_enable(self) -> bool {
        matches!(self, PluginState::Installed | PluginState::Disabled)
    }

    pub fn can_disable(self) -> bool {
        matches!(self, PluginState::Enabled)
    }

    pub fn is_active(self) -> bool {
        matches!(self, PluginState::Enabled)
    }
}
