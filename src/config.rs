use once_cell::sync::Lazy;
use serde::Deserialize;

/// The static config instance.
#[allow(dead_code)]
pub static INSTANCE: Lazy<Config> = Lazy::new(|| {
    #[cfg(not(test))]
    {
        use std::{fs::File, io::Read};

        return toml::from_str(&{
            let mut string = String::new();
            File::open("./data/config.toml")
                .unwrap()
                .read_to_string(&mut string)
                .unwrap();
            string
        })
        .unwrap();
    }

    #[cfg(test)]
    Config::default()
});

/// Describing the server configuration.
#[derive(Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub mess: Mess,
}

#[derive(Deserialize)]
pub struct Server {
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Mess-hall constants used by the overview aggregation.
#[derive(Deserialize)]
pub struct Mess {
    /// Total enrolled students eating at the mess.
    pub total_students: u32,
}

impl Default for Mess {
    fn default() -> Self {
        Self {
            total_students: 621,
        }
    }
}
