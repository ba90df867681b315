//! Canonical setting catalog.
//!
//! One declaration-ordered list of every setting the engine manages, with
//! its target file, file-side key or tag pattern, and write style. The
//! reconciler walks batches in this order so file output is reproducible.

use serde::{Deserialize, Serialize};

/// A typed setting value. The value type is fixed per key for the
/// lifetime of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    /// Render the value as it is written into a target file.
    ///
    /// Booleans become `1`/`0`; some consumers store booleans as words
    /// instead, in which case `keep_boolean_text` renders `true`/`false`.
    pub fn render(&self, keep_boolean_text: bool) -> String {
        match self {
            SettingValue::Bool(b) if keep_boolean_text => b.to_string(),
            SettingValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            SettingValue::Int(n) => n.to_string(),
            SettingValue::Text(s) => s.clone(),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

/// The external configuration surface a setting is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFile {
    /// Raspberry Pi bootloader config, plain `key=value` lines.
    BootConfig,
    /// Kodi guisettings.xml, one element per line.
    GuiSettings,
    /// ALSA routing file, marker-delimited block.
    AsoundConf,
    /// No file of its own; the change is realized by restarting the unit.
    ServiceUnit,
}

impl TargetFile {
    /// What it takes for a change to this surface to become effective.
    pub fn restart_kind(self) -> RestartKind {
        match self {
            TargetFile::BootConfig => RestartKind::Reboot,
            TargetFile::GuiSettings | TargetFile::ServiceUnit => RestartKind::Service,
            // Routing changes are reloaded live via alsactl.
            TargetFile::AsoundConf => RestartKind::None,
        }
    }
}

/// Disruptive action required for a change set to take effect.
/// Ordered so the union of several targets is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RestartKind {
    None,
    Service,
    Reboot,
}

/// How the rendered value is written into the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStyle {
    /// Rewrite the whole line as `key=value`.
    PlainKv,
    /// Rewrite the whole line as `<key>value</key>`.
    XmlTag,
    /// Like [`WriteStyle::XmlTag`] but the opening tag carries
    /// ` default="true"`, which the consuming application requires to
    /// treat the setting as user-overridden.
    XmlTagWithDefaultAttr,
}

/// One managed setting: store key, file-side pattern and write style.
#[derive(Debug, Clone, Copy)]
pub struct SettingDef {
    /// Key in the settings store.
    pub key: &'static str,
    /// File-side key (`PlainKv`) or XML element name (XML styles).
    /// Matched at a tag boundary, so both the bare and attributed forms
    /// of the tag are covered; trailing boundary syntax such as
    /// `[[:space:]]` is tolerated and stripped.
    pub pattern: &'static str,
    pub target: TargetFile,
    pub style: WriteStyle,
    /// Render booleans as `true`/`false` instead of `1`/`0`.
    pub keep_boolean_text: bool,
}

impl SettingDef {
    fn new(
        key: &'static str,
        pattern: &'static str,
        target: TargetFile,
        style: WriteStyle,
    ) -> Self {
        Self {
            key,
            pattern,
            target,
            style,
            keep_boolean_text: false,
        }
    }

    fn boolean_text(mut self) -> Self {
        self.keep_boolean_text = true;
        self
    }
}

/// Declaration-ordered catalog of managed settings.
#[derive(Debug, Clone)]
pub struct Catalog {
    defs: Vec<SettingDef>,
}

impl Catalog {
    /// The canonical catalog for the Kodi plugin.
    pub fn standard() -> Self {
        use TargetFile::*;
        use WriteStyle::*;

        Self {
            defs: vec![
                SettingDef::new("gpu_mem_1024", "gpu_mem_1024", BootConfig, PlainKv),
                SettingDef::new("gpu_mem_512", "gpu_mem_512", BootConfig, PlainKv),
                SettingDef::new("gpu_mem_256", "gpu_mem_256", BootConfig, PlainKv),
                SettingDef::new("hdmihotplug", "hdmi_force_hotplug", BootConfig, PlainKv),
                // usedac selects the routing block's card index; it has no
                // line pattern of its own.
                SettingDef::new("usedac", "", AsoundConf, PlainKv),
                SettingDef::new("audiodelay", "audiodelay", GuiSettings, XmlTag),
                SettingDef::new("kodi_gui_sounds", "guisoundmode", GuiSettings, XmlTag),
                SettingDef::new(
                    "kodi_audio_keepalive",
                    "streamsilence",
                    GuiSettings,
                    XmlTagWithDefaultAttr,
                ),
                SettingDef::new(
                    "kodi_enable_webserver",
                    "webserver[[:space:]]",
                    GuiSettings,
                    XmlTagWithDefaultAttr,
                )
                .boolean_text(),
                SettingDef::new(
                    "kodi_webserver_port",
                    "webserverport",
                    GuiSettings,
                    XmlTagWithDefaultAttr,
                ),
                SettingDef::new(
                    "kodi_webserver_username",
                    "webserverusername",
                    GuiSettings,
                    XmlTag,
                ),
                SettingDef::new(
                    "kodi_webserver_password",
                    "webserverpassword",
                    GuiSettings,
                    XmlTag,
                ),
            ],
        }
    }

    /// Build a catalog from explicit definitions (used by tests and by
    /// hosts that manage a different setting surface).
    pub fn with_defs(defs: Vec<SettingDef>) -> Self {
        Self { defs }
    }

    pub fn get(&self, key: &str) -> Option<&SettingDef> {
        self.defs.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Definitions in declaration order.
    pub fn defs(&self) -> &[SettingDef] {
        &self.defs
    }
}
