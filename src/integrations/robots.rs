//! robots.txt integration.

use super::traits::{HookError, Integration};
use crate::build::{BuildContext, OutputFile};
use crate::config::Options;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RobotsOptions {
    #[serde(default)]
    disallow: Vec<String>,
    #[serde(default = "default_sitemap")]
    sitemap: String,
}

fn default_sitemap() -> String {
    "sitemap.xml".to_string()
}

/// Writes `robots.txt` during `build:done`.
///
/// A `Sitemap:` line pointing at `<site>/<sitemap>` is added when `site` is set.
#[derive(Debug, Clone)]
pub struct Robots {
    disallow: Vec<String>,
    sitemap: String,
}

impl Robots {
    pub fn from_options(options: &Options) -> Result<Self, String> {
        let value = serde_json::to_value(options).map_err(|e| e.to_string())?;
        let parsed: RobotsOptions = serde_json::from_value(value).map_err(|e| e.to_string())?;
        Ok(Self { disallow: parsed.disallow, sitemap: parsed.sitemap })
    }

    fn render(&self, site: Option<&str>) -> String {
        let mut text = String::from("User-agent: *\n");
        if self.disallow.is_empty() {
            text.push_str("Allow: /\n");
        }
        for path in &self.disallow {
            text.push_str(&format!("Disallow: {}\n", path));
        }
        if let Some(site) = site {
            text.push_str(&format!("\nSitemap: {}/{}\n", site.trim_end_matches('/'), self.sitemap));
        }
        text
    }
}

impl Integration for Robots {
    fn on_build_done(&mut self, ctx: &mut BuildContext) -> Result<(), HookError> {
        let text = self.render(ctx.site());
        ctx.add_output(OutputFile::generated("robots.txt".to_string(), text.into_bytes()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use serde_json::json;

    #[test]
    fn test_robots_default() {
        let robots = Robots::from_options(&Options::new()).unwrap();
        assert_eq!(robots.render(None), "User-agent: *\nAllow: /\n");
    }

    #[test]
    fn test_robots_with_site_and_disallow() {
        let options: Options = [("disallow".to_string(), json!(["/admin", "/drafts"]))].into_iter().collect();
        let robots = Robots::from_options(&options).unwrap();
        let text = robots.render(Some("https://relocation.quest/"));
        assert!(text.contains("Disallow: /admin\n"));
        assert!(text.contains("Disallow: /drafts\n"));
        assert!(!text.contains("Allow: /\n"));
        assert!(text.ends_with("Sitemap: https://relocation.quest/sitemap.xml\n"));
    }

    #[test]
    fn test_robots_hook_adds_output() {
        let config = SiteConfig { site: Some("https://a.dev".to_string()), ..Default::default() };
        let mut ctx = BuildContext::new(config, "/project".into());
        let mut robots = Robots::from_options(&Options::new()).unwrap();
        robots.on_build_done(&mut ctx).unwrap();
        assert!(ctx.outputs().get("robots.txt").is_some());
    }
}
