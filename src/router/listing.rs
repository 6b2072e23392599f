//! HTML directory listing.

use minijinja::{Environment, context};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

// The `.html` name turns on HTML auto-escaping.
const LISTING_NAME: &str = "listing.html";

const LISTING_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width,initial-scale=1" />
    <title>Index of {{ title }}</title>
    <style>
        :root { font-family: system-ui, sans-serif; font-size: 14px; color: #111; }
        body { margin: 24px; }
        h1 { font-size: 16px; margin-bottom: 12px; }
        table { width: 100%; border-collapse: collapse; }
        th, td { text-align: left; padding: 6px 8px; }
        th { color: #666; font-size: 12px; font-weight: 600; border-bottom: 1px solid #ccc; }
        td.size { text-align: right; color: #666; font-variant-numeric: tabular-nums; }
        a { color: inherit; text-decoration: none; }
    </style>
</head>
<body>
    <h1>Index of {{ title }}</h1>
    <table>
        <thead>
            <tr><th>Name</th><th class="size">Size (kb)</th></tr>
        </thead>
        <tbody>
{%- for entry in entries %}
            <tr><td><a href="{{ entry.name }}{% if entry.is_dir %}/{% endif %}">{{ entry.name }}{% if entry.is_dir %}/{% endif %}</a></td><td class="size">{{ entry.size | kib }}</td></tr>
{%- endfor %}
        </tbody>
    </table>
</body>
</html>
"#;

fn kib(size: u64) -> String {
    format!("{:.2}", size as f64 / 1024.0)
}

/// Renders `entries` as a table. Directories get a trailing `/`; sizes are
/// in KiB with two decimals.
pub fn render_listing(title: &str, entries: &[ListingEntry]) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_filter("kib", kib);
    env.add_template(LISTING_NAME, LISTING_TEMPLATE)?;

    env.get_template(LISTING_NAME)?.render(context! { title, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_names() {
        let html = render_listing(
            "/files/",
            &[ListingEntry {
                name: "<b>.txt".to_string(),
                is_dir: false,
                size: 2048,
            }],
        )
        .unwrap();

        assert!(html.contains("&lt;b&gt;.txt"));
        assert!(!html.contains("<b>.txt"));
        assert!(html.contains("2.00"));
    }

    #[test]
    fn directories_get_trailing_slash() {
        let html = render_listing(
            "/files/",
            &[
                ListingEntry {
                    name: "blog".to_string(),
                    is_dir: true,
                    size: 4096,
                },
                ListingEntry {
                    name: "a.txt".to_string(),
                    is_dir: false,
                    size: 0,
                },
            ],
        )
        .unwrap();

        assert!(html.contains(r#"<a href="blog/">blog/</a>"#));
        assert!(html.contains(r#"<a href="a.txt">a.txt</a></td><td class="size">0.00</td>"#));
    }
}
