use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::{EnvLookup, CONFIG_FILE_NAME, LEGACY_KEY_FILE_NAME};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
    let _guard = ENV_LOCK.lock().unwrap();
    let backup: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| ((*key).to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    f();
    for (key, value) in backup {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

pub fn env_from(vars: &[(&str, &str)]) -> EnvLookup {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    Arc::new(move |name| map.get(name).cloned())
}

pub fn write_config(dir: &Path, config: &Value) {
    std::fs::write(
        dir.join(CONFIG_FILE_NAME),
        serde_json::to_string_pretty(config).unwrap(),
    )
    .unwrap();
}

pub fn write_legacy_key(dir: &Path, content: &str) {
    std::fs::write(dir.join(LEGACY_KEY_FILE_NAME), content).unwrap();
}

/// 1x1 RGBA PNG。
pub fn tiny_png(rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
