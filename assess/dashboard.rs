//! The lender dashboard page: a fixed external report shown in an iframe.

pub const DASHBOARD_TITLE: &str = "Interactive Credit Dashboard";
pub const DASHBOARD_CAPTION: &str =
    "This dashboard visualizes the overall credit profile of farmers across Nigeria.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardEmbed {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub scrolling: bool,
}

impl DashboardEmbed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: 1200,
            height: 800,
            scrolling: true,
        }
    }

    pub fn to_iframe_html(&self) -> String {
        format!(
            "<iframe src=\"{}\" width=\"{}\" height=\"{}\" scrolling=\"{}\" frameborder=\"0\"></iframe>",
            escape_attribute(&self.url),
            self.width,
            self.height,
            if self.scrolling { "yes" } else { "no" }
        )
    }

    /// A standalone page with the heading, caption and frame.
    pub fn to_page_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{DASHBOARD_TITLE}</title></head>\n<body>\n<h1>{DASHBOARD_TITLE}</h1>\n<p>{DASHBOARD_CAPTION}</p>\n{}\n</body>\n</html>\n",
            self.to_iframe_html()
        )
    }
}

fn escape_attribute(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
