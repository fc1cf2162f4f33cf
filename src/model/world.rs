use serde::{Deserialize, Serialize};

/* =========================
   World Setup
   ========================= */

/// What the player configured before the opening turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldSetup {
    pub world_name: String,
    pub genre: String,
    /// Power system / setting overview; also recorded as a lore entry.
    pub setting: String,

    pub character: CharacterSetup,

    pub core_rules: Vec<String>,
    pub enable_stats_system: bool,
}

impl Default for WorldSetup {
    fn default() -> Self {
        Self {
            world_name: "Cuộc phiêu lưu không tên".into(),
            genre: "Tiên hiệp".into(),
            setting: String::new(),
            character: CharacterSetup::default(),
            core_rules: Vec::new(),
            enable_stats_system: true,
        }
    }
}

/* =========================
   Character Setup
   ========================= */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterSetup {
    pub name: String,
    pub gender: String,
    pub personality: String,
    pub bio: String,
    pub motivation: String,
}

impl Default for CharacterSetup {
    fn default() -> Self {
        Self {
            name: "Vô Danh".into(),
            gender: String::new(),
            personality: String::new(),
            bio: "Describe your character's origin, motivations, and past.".into(),
            motivation: String::new(),
        }
    }
}
