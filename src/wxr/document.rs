//! Export document model
//!
//! The whole export is parsed once into a tree of `XmlElement`s with every
//! element's namespace already resolved. Lookups are then made against the
//! namespace URIs of the detected WXR version, carried in `Namespaces`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::borrow::Cow;
use std::path::Path;

use super::error::WxrError;

/// Dublin Core namespace (`dc:creator`)
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// RSS content module namespace (`content:encoded`)
pub const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

/// Supported WXR versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WxrVersion {
    V1_2,
    V1_1,
    V1_0,
}

impl WxrVersion {
    /// Probe order, newest first
    pub const ALL: [WxrVersion; 3] = [WxrVersion::V1_2, WxrVersion::V1_1, WxrVersion::V1_0];

    pub fn as_str(&self) -> &'static str {
        match self {
            WxrVersion::V1_2 => "1.2",
            WxrVersion::V1_1 => "1.1",
            WxrVersion::V1_0 => "1.0",
        }
    }

    /// `wp:` namespace URI for this version
    pub fn wp_namespace(&self) -> String {
        format!("http://wordpress.org/export/{}/", self.as_str())
    }

    /// `excerpt:` namespace URI for this version
    pub fn excerpt_namespace(&self) -> String {
        format!("http://wordpress.org/export/{}/excerpt/", self.as_str())
    }
}

impl std::fmt::Display for WxrVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Namespace URIs resolved for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    pub version: WxrVersion,
    pub wp: String,
    pub excerpt: String,
}

impl Namespaces {
    pub fn new(version: WxrVersion) -> Self {
        Self {
            version,
            wp: version.wp_namespace(),
            excerpt: version.excerpt_namespace(),
        }
    }
}

/// Owned XML element with a resolved namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Namespace URI, `None` when unqualified
    pub namespace: Option<String>,
    /// Local name
    pub name: String,
    /// Attributes keyed by local name
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Concatenated text and CDATA content
    pub text: String,
}

impl XmlElement {
    fn open(namespace: Option<String>, start: &BytesStart<'_>) -> Self {
        let mut attributes = Vec::new();
        for attr in start.attributes().flatten() {
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            attributes.push((key, value));
        }

        Self {
            namespace,
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Whether this element has the given namespace and local name
    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    /// First child with the given namespace and local name
    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// All children with the given namespace and local name, in document order
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// Text of the first matching child
    pub fn child_text(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.child(namespace, name).map(|c| c.text.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed export with its resolved namespace version
#[derive(Debug, Clone)]
pub struct ExportDocument {
    root: XmlElement,
    namespaces: Namespaces,
}

impl ExportDocument {
    /// Read and parse an export file
    pub fn load(path: &Path) -> Result<Self, WxrError> {
        let xml = std::fs::read_to_string(path).map_err(|e| WxrError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&xml)
    }

    /// Parse an export from a string and detect its version.
    ///
    /// Fails with `UnresolvedNamespace` when no supported version matches.
    pub fn parse(xml: &str) -> Result<Self, WxrError> {
        let root = parse_tree(xml)?;
        let version = detect_version(&root)?;
        tracing::debug!("Detected WXR version {}", version);

        Ok(Self {
            root,
            namespaces: Namespaces::new(version),
        })
    }

    pub fn version(&self) -> WxrVersion {
        self.namespaces.version
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// The `<channel>` element. Present by construction.
    pub fn channel(&self) -> &XmlElement {
        find_channel(&self.root).unwrap_or(&self.root)
    }

    /// Every `<item>` of the channel, in document order
    pub fn items(&self) -> impl Iterator<Item = Item<'_>> + '_ {
        self.channel()
            .children_named(None, "item")
            .map(move |node| Item::new(node, &self.namespaces))
    }

    /// Items whose post type is `post`
    pub fn posts(&self) -> impl Iterator<Item = Item<'_>> + '_ {
        self.items().filter(|item| item.post_type() == Some("post"))
    }

    /// Every `<wp:category>` of the channel, in document order
    pub fn categories(&self) -> impl Iterator<Item = CategoryNode<'_>> + '_ {
        self.channel()
            .children_named(Some(self.namespaces.wp.as_str()), "category")
            .map(move |node| CategoryNode {
                node,
                namespaces: &self.namespaces,
            })
    }

    /// The attachment item with the given post id
    pub fn find_attachment(&self, post_id: &str) -> Option<Item<'_>> {
        self.items()
            .find(|item| item.post_type() == Some("attachment") && item.post_id() == Some(post_id))
    }
}

/// Find `<channel>` directly under `<rss>` (or the root itself)
fn find_channel(root: &XmlElement) -> Option<&XmlElement> {
    if root.is(None, "channel") {
        return Some(root);
    }
    root.child(None, "channel")
}

/// Probe supported versions newest first; the first one whose `wxr_version`
/// marker exists under the channel wins.
pub fn detect_version(root: &XmlElement) -> Result<WxrVersion, WxrError> {
    let channel = find_channel(root).ok_or(WxrError::MissingChannel)?;

    for version in WxrVersion::ALL {
        let wp = version.wp_namespace();
        if channel.child(Some(wp.as_str()), "wxr_version").is_some() {
            return Ok(version);
        }
    }

    Err(WxrError::UnresolvedNamespace {
        tried: WxrVersion::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn resolved_namespace(result: ResolveResult<'_>) -> Option<String> {
    match result {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Parse XML into an owned element tree
fn parse_tree(xml: &str) -> Result<XmlElement, WxrError> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let (ns, event) = reader.read_resolved_event().map_err(|e| WxrError::Xml {
            position,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                stack.push(XmlElement::open(resolved_namespace(ns), &start));
            }
            Event::Empty(start) => {
                let element = XmlElement::open(resolved_namespace(ns), &start);
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let value = text
                        .unescape()
                        .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&text).into_owned()));
                    current.text.push_str(&value);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(WxrError::Xml {
            position: xml.len() as u64,
            message: format!("unexpected end of document inside <{}>", stack[stack.len() - 1].name),
        });
    }

    root.ok_or_else(|| WxrError::Xml {
        position: 0,
        message: "document has no root element".to_string(),
    })
}

/// A `<category domain=".." nicename="..">` term attached to an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term<'a> {
    pub domain: &'a str,
    pub nicename: &'a str,
    pub name: &'a str,
}

impl Term<'_> {
    /// Domain mentions "tag" and a nicename is present
    pub fn is_tag(&self) -> bool {
        self.domain.contains("tag") && !self.nicename.is_empty()
    }

    /// Domain is exactly "category"
    pub fn is_category(&self) -> bool {
        self.domain == "category"
    }
}

/// Typed view over an `<item>`
#[derive(Debug, Clone, Copy)]
pub struct Item<'a> {
    node: &'a XmlElement,
    namespaces: &'a Namespaces,
}

impl<'a> Item<'a> {
    pub fn new(node: &'a XmlElement, namespaces: &'a Namespaces) -> Self {
        Self { node, namespaces }
    }

    pub fn node(&self) -> &'a XmlElement {
        self.node
    }

    fn wp(&self, name: &str) -> Option<&'a str> {
        self.node
            .child_text(Some(self.namespaces.wp.as_str()), name)
            .map(str::trim)
    }

    pub fn post_type(&self) -> Option<&'a str> {
        self.wp("post_type")
    }

    pub fn post_id(&self) -> Option<&'a str> {
        self.wp("post_id")
    }

    pub fn post_date(&self) -> Option<&'a str> {
        self.wp("post_date")
    }

    pub fn post_date_gmt(&self) -> Option<&'a str> {
        self.wp("post_date_gmt")
    }

    pub fn status(&self) -> Option<&'a str> {
        self.wp("status")
    }

    pub fn attachment_url(&self) -> Option<&'a str> {
        self.wp("attachment_url")
    }

    pub fn title(&self) -> &'a str {
        self.node.child_text(None, "title").unwrap_or_default().trim()
    }

    /// `dc:creator`, untouched
    pub fn creator(&self) -> Option<&'a str> {
        self.node.child_text(Some(DC_NAMESPACE), "creator")
    }

    /// `content:encoded`
    pub fn content(&self) -> &'a str {
        self.node
            .child_text(Some(CONTENT_NAMESPACE), "encoded")
            .unwrap_or_default()
    }

    /// `excerpt:encoded`
    pub fn excerpt(&self) -> &'a str {
        self.node
            .child_text(Some(self.namespaces.excerpt.as_str()), "encoded")
            .unwrap_or_default()
    }

    /// Category and tag terms, in document order
    pub fn terms(&self) -> impl Iterator<Item = Term<'a>> + 'a {
        self.node.children_named(None, "category").map(|node| Term {
            domain: node.attr("domain").unwrap_or_default(),
            nicename: node.attr("nicename").unwrap_or_default(),
            name: node.text.trim(),
        })
    }

    /// `(meta_key, meta_value)` pairs of `<wp:postmeta>` entries
    pub fn postmeta(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let wp = self.namespaces.wp.as_str();
        self.node.children_named(Some(wp), "postmeta").map(move |meta| {
            (
                meta.child_text(Some(wp), "meta_key").unwrap_or_default().trim(),
                meta.child_text(Some(wp), "meta_value").unwrap_or_default().trim(),
            )
        })
    }

    /// Value of the `_thumbnail_id` post meta
    pub fn header_image_id(&self) -> Option<&'a str> {
        self.postmeta()
            .find(|(key, _)| *key == "_thumbnail_id")
            .map(|(_, value)| value)
    }

    /// A post worth importing: type `post` with a title and a body
    pub fn is_importable_post(&self) -> bool {
        self.post_type() == Some("post") && !self.title().is_empty() && !self.content().is_empty()
    }
}

/// Typed view over a channel-level `<wp:category>`
#[derive(Debug, Clone, Copy)]
pub struct CategoryNode<'a> {
    node: &'a XmlElement,
    namespaces: &'a Namespaces,
}

impl<'a> CategoryNode<'a> {
    fn wp(&self, name: &str) -> Option<&'a str> {
        self.node
            .child_text(Some(self.namespaces.wp.as_str()), name)
            .map(str::trim)
    }

    /// `wp:cat_name`
    pub fn name(&self) -> &'a str {
        self.wp("cat_name").unwrap_or_default()
    }

    /// `wp:category_nicename`
    pub fn nicename(&self) -> &'a str {
        self.wp("category_nicename").unwrap_or_default()
    }

    /// `wp:category_parent`, `None` when absent or empty
    pub fn parent(&self) -> Option<&'a str> {
        self.wp("category_parent").filter(|p| !p.is_empty())
    }
}
