use std::path::PathBuf;

use crate::error::AppError;
use crate::models::Post;

/// Renders the static HTML skeletons in the template directory.
///
/// Templates are re-read from disk on every call; nothing is cached.
/// Placeholders look like `<%= post.title %>` and every occurrence of a
/// placeholder is replaced. Values are substituted raw: stored content is
/// NOT HTML-escaped before it lands in the page.
#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Templates { dir: dir.into() }
    }

    /// Read a template file verbatim, without substitution.
    pub async fn load(&self, name: &str) -> Result<String, AppError> {
        let path = self.dir.join(name);
        let html = tokio::fs::read_to_string(&path).await.map_err(|e| {
            tracing::error!("Failed to read template {}: {}", path.display(), e);
            AppError::Io(e)
        })?;
        Ok(html)
    }

    /// Read a template and substitute each `(key, value)` pair into every
    /// `<%= key %>` occurrence.
    pub async fn render(&self, name: &str, values: &[(&str, &str)]) -> Result<String, AppError> {
        let mut html = self.load(name).await?;
        for (key, value) in values {
            html = html.replace(&format!("<%= {} %>", key), value);
        }
        Ok(html)
    }
}

/// Build the heading-plus-link-list fragment used by the index and search
/// pages: one `<li>` anchor per post, linking to its detail view.
pub fn post_links(heading: &str, posts: &[Post]) -> String {
    let mut html = format!("<h1>{}</h1>", heading);
    html.push_str("<ul>");
    for post in posts {
        html.push_str(&format!(
            "<li><a href=\"/post?id={}\">{}</a></li>",
            post.id, post.title
        ));
    }
    html.push_str("</ul>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates_with(name: &str, body: &str) -> (tempfile::TempDir, Templates) {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(tmp.path().join(name), body).expect("Failed to write template");
        let templates = Templates::new(tmp.path());
        (tmp, templates)
    }

    #[tokio::test]
    async fn test_render_replaces_every_occurrence() {
        let (_tmp, templates) = templates_with(
            "post.html",
            "<title><%= post.title %></title><h1><%= post.title %></h1><p><%= post.content %></p>",
        );

        let html = templates
            .render("post.html", &[("post.title", "A"), ("post.content", "B")])
            .await
            .expect("Failed to render");

        assert_eq!(html, "<title>A</title><h1>A</h1><p>B</p>");
    }

    #[tokio::test]
    async fn test_render_does_not_escape_html() {
        let (_tmp, templates) = templates_with("post.html", "<div><%= post.content %></div>");

        let html = templates
            .render("post.html", &[("post.content", "<script>alert(1)</script>")])
            .await
            .expect("Failed to render");

        assert_eq!(html, "<div><script>alert(1)</script></div>");
    }

    #[tokio::test]
    async fn test_render_leaves_unknown_placeholders() {
        let (_tmp, templates) = templates_with("edit.html", "<%= post.id %>/<%= post.title %>");

        let html = templates
            .render("edit.html", &[("post.id", "7")])
            .await
            .expect("Failed to render");

        assert_eq!(html, "7/<%= post.title %>");
    }

    #[tokio::test]
    async fn test_missing_template_is_an_error() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let templates = Templates::new(tmp.path());

        let result = templates.load("nope.html").await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_post_links_fragment() {
        let posts = vec![
            Post {
                id: 1,
                title: "첫 번째".to_string(),
                content: "c".to_string(),
                image_url1: "a".to_string(),
                image_url2: "b".to_string(),
                image_url3: "c".to_string(),
                image_url4: "d".to_string(),
            },
            Post {
                id: 2,
                title: "두 번째".to_string(),
                content: "c".to_string(),
                image_url1: "a".to_string(),
                image_url2: "b".to_string(),
                image_url3: "c".to_string(),
                image_url4: "d".to_string(),
            },
        ];

        let html = post_links("검색 결과", &posts);

        assert!(html.starts_with("<h1>검색 결과</h1><ul>"));
        assert!(html.contains("<li><a href=\"/post?id=1\">첫 번째</a></li>"));
        assert!(html.contains("<li><a href=\"/post?id=2\">두 번째</a></li>"));
        assert!(html.ends_with("</ul>"));
    }

    #[test]
    fn test_post_links_with_no_posts() {
        let html = post_links("이상향 월드컵", &[]);
        assert_eq!(html, "<h1>이상향 월드컵</h1><ul></ul>");
    }
}
