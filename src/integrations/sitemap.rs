//! Sitemap integration: lists every emitted page as an absolute URL.

use super::traits::{HookError, Integration};
use crate::build::{BuildContext, OutputFile, OutputKind};
use crate::config::Options;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SitemapOptions {
    #[serde(default = "default_filename")]
    filename: String,
    #[serde(default)]
    exclude: Vec<String>,
}

fn default_filename() -> String {
    "sitemap.xml".to_string()
}

/// Writes `sitemap.xml` during `build:done`. Requires `site`.
#[derive(Debug, Clone)]
pub struct Sitemap {
    filename: String,
    exclude: Vec<String>,
}

impl Sitemap {
    pub fn from_options(options: &Options) -> Result<Self, String> {
        let value = serde_json::to_value(options).map_err(|e| e.to_string())?;
        let parsed: SitemapOptions = serde_json::from_value(value).map_err(|e| e.to_string())?;
        Ok(Self { filename: parsed.filename, exclude: parsed.exclude })
    }

    fn is_excluded(&self, page: &str) -> bool {
        let url_path = format!("/{}", page);
        self.exclude.iter().any(|prefix| url_path.starts_with(prefix.as_str()))
    }
}

impl Integration for Sitemap {
    fn on_config_done(&mut self, ctx: &mut BuildContext) -> Result<(), HookError> {
        if ctx.site().is_none() {
            return Err(HookError::new("the sitemap integration requires `site` to be set"));
        }
        Ok(())
    }

    fn on_build_done(&mut self, ctx: &mut BuildContext) -> Result<(), HookError> {
        let site = ctx
            .site()
            .ok_or_else(|| HookError::new("the sitemap integration requires `site` to be set"))?
            .to_string();

        let urls: Vec<String> = ctx
            .outputs()
            .iter()
            .filter(|file| file.kind == OutputKind::Page)
            .filter(|file| !self.is_excluded(&file.path))
            .map(|file| page_url(&site, &file.path))
            .collect();

        debug!(pages = urls.len(), file = %self.filename, "writing sitemap");
        let xml = render_sitemap(&urls);
        ctx.add_output(OutputFile::generated(self.filename.clone(), xml.into_bytes()));
        Ok(())
    }
}

/// Absolute URL for an emitted page path.
///
/// `index.html` maps to its directory, other `.html` files drop the extension.
pub fn page_url(site: &str, page: &str) -> String {
    let base = site.trim_end_matches('/');
    let route = if page == "index.html" {
        String::new()
    } else if let Some(dir) = page.strip_suffix("/index.html") {
        format!("{}/", dir)
    } else if let Some(stem) = page.strip_suffix(".html") {
        stem.to_string()
    } else {
        page.to_string()
    };
    format!("{}/{}", base, route)
}

fn render_sitemap(urls: &[String]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str("  <url><loc>");
        xml.push_str(&escape_xml(url));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
