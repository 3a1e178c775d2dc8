use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub maximized: bool,
    pub user_agent: Option<String>,
    /// Extra command line switches passed to the browser binary.
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport: Viewport::default(),
            maximized: true,
            user_agent: None,
            args: vec![],
        }
    }
}

impl BrowserConfig {
    /// Switches every launch gets, independent of user configuration.
    ///
    /// Site isolation is turned off so that cross-origin payment frames live in
    /// the same renderer and their documents show up in the page's DOM tree.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-site-isolation-trials".to_string(),
            "--disable-features=IsolateOrigins,site-per-process".to_string(),
            format!(
                "--window-size={},{}",
                self.viewport.width, self.viewport.height
            ),
        ];

        if self.maximized {
            args.push("--start-maximized".to_string());
        }

        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={}", ua));
        }

        args.extend(self.args.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_args_carry_window_size_and_user_agent() {
        let config = BrowserConfig {
            user_agent: Some("PayCheck/1.0".to_string()),
            args: vec!["--lang=ru".to_string()],
            ..Default::default()
        };
        let args = config.launch_args();
        assert!(args.contains(&"--window-size=1920,1080".to_string()));
        assert!(args.contains(&"--user-agent=PayCheck/1.0".to_string()));
        assert!(args.contains(&"--start-maximized".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=ru"));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: BrowserConfig = serde_json::from_str(r#"{"headless": true}"#).unwrap();
        assert!(config.headless);
        assert_eq!(config.viewport, Viewport::default());
        assert!(config.args.is_empty());
    }
}
