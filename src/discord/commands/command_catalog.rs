// Discord commands module.
// Each command group gets its own file.

pub mod leveling;
pub mod rewards;
pub mod settings;
pub mod xp;
