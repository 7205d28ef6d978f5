use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::geometry::Direction;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("pan directions must not be empty")]
    EmptyDirections,
    #[error("pan directions may only contain left, right, up or down")]
    NoneDirection,
    #[error("duplicate recognizer name '{0}'")]
    DuplicateName(String),
    #[error("unknown recognizer '{0}' in block rule")]
    UnknownRecognizer(String),
    #[error("recognizer '{0}' cannot block itself")]
    SelfBlock(String),
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    pub max_distance: f64,
    pub max_duration_ms: u64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            max_distance: 10.0,
            max_duration_ms: 200,
        }
    }
}

impl TapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tap.max_distance", self.max_distance)?;
        positive("tap.max_duration_ms", self.max_duration_ms as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressConfig {
    pub duration_ms: u64,
    pub max_move_distance: f64,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            max_move_distance: 10.0,
        }
    }
}

impl PressConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("press.duration_ms", self.duration_ms as f64)?;
        positive("press.max_move_distance", self.max_move_distance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    pub min_distance: f64,
    /// None = any direction.
    pub directions: Option<Vec<Direction>>,
    /// px/ms over the final segment
    pub swipe_velocity: f64,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            min_distance: 15.0,
            directions: None,
            swipe_velocity: 0.3,
        }
    }
}

impl PanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("pan.min_distance", self.min_distance)?;
        positive("pan.swipe_velocity", self.swipe_velocity)?;
        if let Some(dirs) = &self.directions {
            if dirs.is_empty() {
                return Err(ConfigError::EmptyDirections);
            }
            if dirs.contains(&Direction::None) {
                return Err(ConfigError::NoneDirection);
            }
        }
        Ok(())
    }

    pub fn allows(&self, d: Direction) -> bool {
        match &self.directions {
            Some(dirs) => dirs.contains(&d),
            None => d != Direction::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    /// |scale - 1| needed to begin
    pub min_scale_delta: f64,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            min_scale_delta: 0.1,
        }
    }
}

impl PinchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("pinch.min_scale_delta", self.min_scale_delta)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    /// degrees
    pub min_rotation: f64,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self { min_rotation: 5.0 }
    }
}

impl RotateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("rotate.min_rotation", self.min_rotation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoFingerPanConfig {
    pub min_distance: f64,
}

impl Default for TwoFingerPanConfig {
    fn default() -> Self {
        Self { min_distance: 20.0 }
    }
}

impl TwoFingerPanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("two_finger_pan.min_distance", self.min_distance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognizerConfig {
    Tap(TapConfig),
    Press(PressConfig),
    Pan(PanConfig),
    Pinch(PinchConfig),
    Rotate(RotateConfig),
    TwoFingerPan(TwoFingerPanConfig),
}

impl RecognizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            RecognizerConfig::Tap(c) => c.validate(),
            RecognizerConfig::Press(c) => c.validate(),
            RecognizerConfig::Pan(c) => c.validate(),
            RecognizerConfig::Pinch(c) => c.validate(),
            RecognizerConfig::Rotate(c) => c.validate(),
            RecognizerConfig::TwoFingerPan(c) => c.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerEntry {
    pub name: String,
    /// Opt in to the raw touch-move stream.
    #[serde(default)]
    pub claim_touch_move: bool,
    #[serde(flatten)]
    pub config: RecognizerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRule {
    pub recognizer: String,
    pub blocks: String,
    #[serde(default)]
    pub mutual: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, rename = "recognizer")]
    pub recognizers: Vec<RecognizerEntry>,
    #[serde(default, rename = "block")]
    pub blocks: Vec<BlockRule>,
}

impl Profile {
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(txt)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Self::from_toml_str(&txt).with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for r in &self.recognizers {
            if !seen.insert(r.name.as_str()) {
                return Err(ConfigError::DuplicateName(r.name.clone()));
            }
            r.config.validate()?;
        }
        for b in &self.blocks {
            for n in [&b.recognizer, &b.blocks] {
                if !seen.contains(n.as_str()) {
                    return Err(ConfigError::UnknownRecognizer(n.clone()));
                }
            }
            if b.recognizer == b.blocks {
                return Err(ConfigError::SelfBlock(b.recognizer.clone()));
            }
        }
        Ok(())
    }
}

pub fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

/// Installed profiles and the active-profile pointer under the user's
/// config directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub active_name: String,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("gesturectl"))
}

impl ProfileStore {
    pub fn open_or_install_default() -> Result<Self> {
        Self::open_at(config_dir()?)
    }

    pub fn open_at(config_dir: PathBuf) -> Result<Self> {
        let profiles_dir = config_dir.join("profiles");
        fs::create_dir_all(&profiles_dir)?;

        let def_path = profiles_dir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = config_dir.join("active");
        if !active_ptr.exists() {
            fs::write(&active_ptr, b"default")?;
        }
        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();

        Ok(Self {
            active_name,
            config_dir,
            profiles_dir,
            active_ptr,
        })
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    pub fn load(&self, name: &str) -> Result<Profile> {
        Profile::from_path(&self.profile_path(name))
    }

    pub fn load_active(&self) -> Result<Profile> {
        self.load(&self.active_name)
    }

    /// Validates the profile before switching to it.
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profile_path(name);
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        self.load(name)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        info!("switched active profile to {name}");
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_parses() {
        let p = Profile::from_toml_str(default_profile_text()).unwrap();
        assert_eq!(p.meta.name.as_deref(), Some("default"));
        let names: Vec<_> = p.recognizers.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["tap", "press", "pan", "pinch", "rotate", "two_finger_pan"]
        );
        assert!(p.blocks.iter().any(|b| b.mutual));
    }

    #[test]
    fn missing_thresholds_take_defaults() {
        let p = Profile::from_toml_str(
            r#"
            [[recognizer]]
            name = "p"
            kind = "pan"
            directions = ["left", "right"]
            "#,
        )
        .unwrap();
        match &p.recognizers[0].config {
            RecognizerConfig::Pan(c) => {
                assert_eq!(c.min_distance, 15.0);
                assert!(c.allows(Direction::Left));
                assert!(!c.allows(Direction::Up));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!p.recognizers[0].claim_touch_move);
    }

    #[test]
    fn empty_direction_set_is_rejected() {
        let cfg = PanConfig {
            directions: Some(vec![]),
            ..PanConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyDirections));
        let cfg = PanConfig {
            directions: Some(vec![Direction::None]),
            ..PanConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoneDirection));
    }

    #[test]
    fn non_positive_thresholds_are_rejected() {
        let cfg = TapConfig {
            max_distance: -1.0,
            ..TapConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NotPositive { field: "tap.max_distance", .. })
        ));
        assert!(PinchConfig { min_scale_delta: f64::NAN }.validate().is_err());
        assert!(PressConfig { duration_ms: 0, ..PressConfig::default() }.validate().is_err());
    }

    #[test]
    fn block_rules_must_name_known_recognizers() {
        let err = Profile::from_toml_str(
            r#"
            [[recognizer]]
            name = "pinch"
            kind = "pinch"

            [[block]]
            recognizer = "pinch"
            blocks = "nope"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown recognizer 'nope'"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Profile::from_toml_str(
            r#"
            [[recognizer]]
            name = "a"
            kind = "tap"

            [[recognizer]]
            name = "a"
            kind = "press"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn store_installs_default_and_switches() {
        let dir = std::env::temp_dir().join(format!("gesturectl-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let mut store = ProfileStore::open_at(dir.clone()).unwrap();
        assert_eq!(store.active_name, "default");
        assert_eq!(store.list_profiles(), vec!["default".to_string()]);
        assert!(store.load_active().is_ok());

        fs::write(
            store.profile_path("quick"),
            "[[recognizer]]\nname = \"tap\"\nkind = \"tap\"\n",
        )
        .unwrap();
        store.set_active("quick").unwrap();
        assert_eq!(fs::read_to_string(&store.active_ptr).unwrap(), "quick");
        assert!(store.set_active("missing").is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
