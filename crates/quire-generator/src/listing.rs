//! Listing rendering for indexed collections.
//!
//! A listing is one rendered item per entry, concatenated in order and wrapped
//! in the style's list markup. The index page puts the listing inside a small
//! chrome fragment (`<title>` plus heading) and hands it to the assembler.

use quire_core::{
    IndexEntry, Page,
    config::{CollectionConfig, ListingStyle},
};

use crate::{
    assembler::PageAssembler,
    template::{Result, Template, TemplateContext},
};

/// Variables available to item templates.
pub const ITEM_VARIABLES: [&str; 4] = ["key", "title", "date", "preview"];

const DATED_ITEM: &str =
    r#"<p><a href="{{ key }}"><b>{{ title }}</b></a><br>{{ date }}<br><i>{{ preview }}</i></p>"#;
const DATED_LIST: &str = "{{ items }}";
const DATED_CHROME: &str =
    "<title>{{ title }}</title><div><h1>{{ heading }}</h1>{{ listing }}</div>";

const COMPACT_ITEM: &str =
    r#"<li><a href="{{ key }}"><p><b>{{ title }}</b><br><i>{{ preview }}</i></p></a></li>"#;
const COMPACT_LIST: &str = r#"<ul class="nobullet">{{ items }}</ul>"#;
const COMPACT_CHROME: &str =
    "<title>{{ title }}</title><main><div><h2>{{ heading }}</h2>{{ listing }}</div></main>";

/// The three pieces of markup that make up a listing page.
#[derive(Debug, Clone)]
pub struct ListingTemplate {
    item: Template,
    list: Template,
    chrome: Template,
}

impl ListingTemplate {
    /// Built-in markup for a listing style.
    #[must_use]
    pub fn new(style: ListingStyle) -> Self {
        let (item, list, chrome) = match style {
            ListingStyle::Dated => (DATED_ITEM, DATED_LIST, DATED_CHROME),
            ListingStyle::Compact => (COMPACT_ITEM, COMPACT_LIST, COMPACT_CHROME),
        };
        Self {
            item: Template::new("item", item),
            list: Template::new("list", list),
            chrome: Template::new("chrome", chrome),
        }
    }

    /// Replace the item markup.
    ///
    /// Fails if the markup is unbalanced or names a variable other than
    /// [`ITEM_VARIABLES`].
    pub fn with_item_template(
        mut self,
        name: impl Into<String>,
        markup: impl Into<String>,
    ) -> Result<Self> {
        let item = Template::new(name, markup);
        item.check_variables(&ITEM_VARIABLES)?;
        self.item = item;
        Ok(self)
    }

    /// Markup configured for a collection.
    pub fn for_collection(collection: &CollectionConfig) -> Result<Self> {
        let template = Self::new(collection.listing);
        match &collection.item_template {
            Some(markup) => template
                .with_item_template(format!("{} item_template", collection.name), markup.as_str()),
            None => Ok(template),
        }
    }

    /// Render one entry.
    pub fn render_item(&self, entry: &IndexEntry) -> Result<String> {
        let ctx = TemplateContext::new()
            .with_var("key", entry.key.as_str())
            .with_var("title", entry.metadata.title.as_str())
            .with_var("date", entry.metadata.date.as_str())
            .with_var("preview", entry.metadata.preview.as_str());
        self.item.render(&ctx)
    }

    /// Render every entry, in order, inside the list markup.
    pub fn render_listing(&self, entries: &[IndexEntry]) -> Result<String> {
        let mut items = String::new();
        for entry in entries {
            items.push_str(&self.render_item(entry)?);
        }
        self.list.render(&TemplateContext::new().with_var("items", items))
    }

    /// Render the unwrapped index fragment: chrome around the listing.
    pub fn render_fragment(
        &self,
        title: &str,
        heading: &str,
        entries: &[IndexEntry],
    ) -> Result<String> {
        let listing = self.render_listing(entries)?;
        let ctx = TemplateContext::new()
            .with_var("title", title)
            .with_var("heading", heading)
            .with_var("listing", listing);
        self.chrome.render(&ctx)
    }
}

/// Render entries with a listing template.
pub fn render_listing(entries: &[IndexEntry], template: &ListingTemplate) -> Result<String> {
    template.render_listing(entries)
}

/// Render an index fragment and wrap it into a finished page.
pub fn build_index_page(
    assembler: &PageAssembler,
    template: &ListingTemplate,
    title: &str,
    heading: &str,
    entries: &[IndexEntry],
    nav_tab: Option<&str>,
) -> Result<Page> {
    let fragment = template.render_fragment(title, heading, entries)?;
    Ok(assembler.assemble(&fragment, nav_tab))
}

#[cfg(test)]
mod tests {
    use quire_core::ContentMetadata;

    use super::*;
    use crate::{assembler::MetaTemplate, template::TemplateError};

    fn entry(key: &str, title: &str, date: &str, preview: &str) -> IndexEntry {
        IndexEntry::new(
            key,
            ContentMetadata {
                title: title.to_string(),
                date: date.to_string(),
                preview: preview.to_string(),
            },
        )
    }

    #[test]
    fn test_dated_item() {
        let template = ListingTemplate::new(ListingStyle::Dated);
        let html = template
            .render_item(&entry("a.html", "A", "Jan 5, 2024", "Body..."))
            .unwrap();

        assert_eq!(
            html,
            r#"<p><a href="a.html"><b>A</b></a><br>Jan 5, 2024<br><i>Body...</i></p>"#
        );
    }

    #[test]
    fn test_dated_fragment() {
        let template = ListingTemplate::new(ListingStyle::Dated);
        let entries = [
            entry("b.html", "B", "Mar 5, 2024", "b..."),
            entry("a.html", "A", "Jan 1, 2023", "a..."),
        ];

        let html = template.render_fragment("Tidings", "Posts", &entries).unwrap();

        assert_eq!(
            html,
            concat!(
                "<title>Tidings</title><div><h1>Posts</h1>",
                r#"<p><a href="b.html"><b>B</b></a><br>Mar 5, 2024<br><i>b...</i></p>"#,
                r#"<p><a href="a.html"><b>A</b></a><br>Jan 1, 2023<br><i>a...</i></p>"#,
                "</div>"
            )
        );
    }

    #[test]
    fn test_compact_fragment() {
        let template = ListingTemplate::new(ListingStyle::Compact);
        let entries = [entry("post.html", "Post", "Jan 5, 2024", "Preview")];

        let html = template.render_fragment("Blog", "Posts", &entries).unwrap();

        assert_eq!(
            html,
            concat!(
                r#"<title>Blog</title><main><div><h2>Posts</h2><ul class="nobullet">"#,
                r#"<li><a href="post.html"><p><b>Post</b><br><i>Preview</i></p></a></li>"#,
                "</ul></div></main>"
            )
        );
    }

    #[test]
    fn test_empty_listing() {
        let dated = ListingTemplate::new(ListingStyle::Dated);
        let compact = ListingTemplate::new(ListingStyle::Compact);

        assert_eq!(render_listing(&[], &dated).unwrap(), "");
        assert_eq!(
            render_listing(&[], &compact).unwrap(),
            r#"<ul class="nobullet"></ul>"#
        );
    }

    #[test]
    fn test_values_are_not_escaped() {
        let template = ListingTemplate::new(ListingStyle::Dated);
        let html = template
            .render_item(&entry("a.html", "Fish &amp; <em>Chips</em>", "Jan 5, 2024", "..."))
            .unwrap();

        assert!(html.contains("<b>Fish &amp; <em>Chips</em></b>"));
    }

    #[test]
    fn test_custom_item_template() {
        let template = ListingTemplate::new(ListingStyle::Compact)
            .with_item_template("custom", r#"<li data-date="{{ date }}">{{ title }}</li>"#)
            .unwrap();

        let html = template
            .render_listing(&[entry("a.html", "A", "Jan 5, 2024", "...")])
            .unwrap();
        assert_eq!(
            html,
            r#"<ul class="nobullet"><li data-date="Jan 5, 2024">A</li></ul>"#
        );
    }

    #[test]
    fn test_custom_item_template_rejects_unknown_variable() {
        let result = ListingTemplate::new(ListingStyle::Dated)
            .with_item_template("custom", "<p>{{ author }}</p>");

        assert!(matches!(
            result,
            Err(TemplateError::UnknownVariable { ref name, .. }) if name == "author"
        ));
    }

    #[test]
    fn test_for_collection_uses_configured_template() {
        let mut collection = CollectionConfig {
            name: "notes".to_string(),
            dir: None,
            tab: None,
            index: true,
            title: None,
            heading: "Posts".to_string(),
            metadata: Default::default(),
            table: None,
            listing: ListingStyle::Dated,
            item_template: Some("<i>{{ key }}</i>".to_string()),
            index_file: "index.html".to_string(),
        };

        let template = ListingTemplate::for_collection(&collection).unwrap();
        let html = template
            .render_item(&entry("n.html", "N", "Jan 5, 2024", "..."))
            .unwrap();
        assert_eq!(html, "<i>n.html</i>");

        collection.item_template = Some("<i>{{ nope }}</i>".to_string());
        let err = ListingTemplate::for_collection(&collection).unwrap_err();
        assert!(err.to_string().contains("notes item_template"));
    }

    #[test]
    fn test_build_index_page_wraps_fragment() {
        let meta = MetaTemplate::parse("<html><body>\n</body></html>").unwrap();
        let assembler = PageAssembler::new(meta, "<nav></nav>");
        let template = ListingTemplate::new(ListingStyle::Dated);

        let page = build_index_page(
            &assembler,
            &template,
            "Tidings",
            "Posts",
            &[entry("a.html", "A", "Jan 5, 2024", "...")],
            Some("tidings"),
        )
        .unwrap();

        assert!(
            page.as_str()
                .starts_with("<html><body>\n<nav></nav><title>Tidings</title><div><h1>Posts</h1>")
        );
        assert!(page.as_str().contains(r#"getElementById("nav-tidings")"#));
        assert!(page.as_str().ends_with("\n</body></html>"));
    }
}
