//! HTML page for directory listings.

use std::fmt::Write;

use crate::assets::ASSETS_PREFIX;
use crate::listing::{DirInfo, ListingSort, SortColumn};
use crate::{APP_NAME, APP_VERSION};

/// Renders [`DirInfo`] as an HTML page.
#[derive(Debug, Clone, Default)]
pub struct ListingTemplate {
    /// Prefix prepended to links to builtin assets
    pub path_prefix: String,
}

impl ListingTemplate {
    pub fn new(path_prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
        }
    }

    pub fn render(&self, dir: &DirInfo, sort: ListingSort) -> String {
        let assets = format!("{}{}", self.path_prefix, ASSETS_PREFIX);
        let name = html_escape(&dir.name);
        let sort_class = if sort.ascending { "sort-asc" } else { "sort-desc" };
        let mut html = String::with_capacity(2048 + dir.entries.len() * 256);

        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{APP_NAME} - Directory listing for {name}</title>
    <link rel="shortcut icon" type="image/svg+xml" href="{assets}/logo.svg">
    <link rel="stylesheet" type="text/css" href="{assets}/style.css">
  </head>
  <body>
    <header>
      <span class="logo"><img src="{assets}/logo.svg" alt="{APP_NAME}"></span>
      <h1>Directory listing for <span class="path">{name}</span></h1>
    </header>
    <main>
      <section class="listing">
        <div class="row sort {sort_class}">
"#
        );

        for (column, label) in [(SortColumn::Name, "Name"), (SortColumn::Size, "Size")] {
            let _ = writeln!(
                html,
                r#"          <a class="col col-{}{}" href="?c={}&o={}">{label}</a>"#,
                label.to_lowercase(),
                if column == sort.column { " sorted" } else { "" },
                column.as_param(),
                if sort.ascending { "d" } else { "a" },
            );
        }
        html.push_str("        </div>\n");

        if !dir.is_root {
            html.push_str(
                r#"        <div class="row">
          <a title="Up one directory" href=".." class="col col-name type-dir-up">..</a>
        </div>
"#,
            );
        }

        for (index, entry) in dir.entries.iter().enumerate() {
            let (title, href, class) = if entry.is_dir {
                (
                    format!("{}/", html_escape(&entry.name)),
                    format!("{}/", urlencoding::encode(&entry.name)),
                    "type-dir",
                )
            } else {
                (
                    html_escape(&entry.name),
                    urlencoding::encode(&entry.name).into_owned(),
                    "type-file",
                )
            };
            let (size, suffix) = match &entry.human_size {
                Some(human) => (human.value_string(), human.suffix),
                None => (String::new(), ""),
            };
            let _ = write!(
                html,
                r#"        <div class="row">
          <a title="{title}" href="{href}" class="col col-name {class}" tabindex="{tabindex}">{title}</a>
          <span class="col col-size">{size}<span class="size-suffix">{suffix}</span></span>
        </div>
"#,
                tabindex = index + 1,
            );
        }

        let _ = write!(
            html,
            r#"      </section>
    </main>
    <footer>
      <div class="powered-by">
        Powered by <a href="https://github.com/albertodonato/h2static">{APP_NAME} {APP_VERSION}</a>
      </div>
    </footer>
  </body>
</html>
"#
        );
        html
    }
}

/// Escape HTML entities
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
